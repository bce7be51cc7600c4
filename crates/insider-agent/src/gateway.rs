use async_trait::async_trait;
use insider_models::{QueryDescriptor, RawTable};

use crate::error::FetchError;

/// Source of raw screener tables. Mockable for testing.
///
/// Implementations own request construction (see
/// [`QueryDescriptor::fetch_key`]) and locating the trade table in the
/// response. Retries and timeouts are the implementation's concern.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, query: &QueryDescriptor) -> Result<RawTable, FetchError>;
}
