use std::path::{Path, PathBuf};

use async_trait::async_trait;
use insider_agent::{FetchError, FetchGateway};
use insider_models::{QueryDescriptor, RawTable};
use tracing::debug;

/// Gateway serving a screener table saved as JSON (`{"header": [..], "rows": [[..]]}`).
///
/// The file is re-read on every fetch. Rows are served in file order and
/// truncated to the request's result cap; value bounds are not applied,
/// so the post-filter does that work.
pub struct SnapshotGateway {
    path: PathBuf,
}

impl SnapshotGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FetchGateway for SnapshotGateway {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn fetch(&self, query: &QueryDescriptor) -> Result<RawTable, FetchError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let mut table: RawTable = serde_json::from_str(&contents)?;
        table.rows.truncate(query.num_results() as usize);
        debug!(path = %self.path.display(), rows = table.len(), "Snapshot loaded");
        Ok(table)
    }
}
