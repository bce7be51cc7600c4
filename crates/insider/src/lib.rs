//! insider - query insider-trading filings with a reusable result cache
//!
//! Requests are validated and canonicalized, answered from previously
//! fetched data whenever an earlier fetch covers them, and narrowed
//! locally by trade type, trade size and result count.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use insider::models::{InsiderConfig, ScrapeRequest};
//! use insider::agent::{QueryAgent, FetchGateway};
//! use insider::cache::ResultCache;
//! use insider::SnapshotGateway;
//! ```

pub use insider_agent as agent;
pub use insider_cache as cache;
pub use insider_models as models;

pub mod snapshot;

pub use snapshot::SnapshotGateway;

use std::sync::Arc;

use insider_agent::{aggregate, top_n, AggregateRow, Aggregation, FetchGateway, GroupBy, QueryAgent, QueryError};
use insider_models::{Dataset, InsiderConfig, ScrapeRequest};

/// Build a QueryAgent over `gateway` from configuration.
pub fn build_agent(config: &InsiderConfig, gateway: Arc<dyn FetchGateway>) -> QueryAgent {
    QueryAgent::new(gateway, config)
}

/// Run each request in order against one agent, so later requests can
/// reuse data fetched for earlier ones.
pub async fn scrape_batch(
    agent: &mut QueryAgent,
    requests: &[ScrapeRequest],
) -> Result<Vec<Dataset>, QueryError> {
    let mut results = Vec::with_capacity(requests.len());
    for request in requests {
        results.push(agent.scrape(request).await?);
    }
    Ok(results)
}

/// Aggregate `dataset` and optionally keep only the `top` largest groups.
pub fn summarize(
    dataset: &Dataset,
    group_by: GroupBy,
    aggregation: Aggregation,
    top: Option<usize>,
) -> Vec<AggregateRow> {
    let rows = aggregate(dataset, group_by, aggregation);
    match top {
        Some(n) => top_n(rows, n),
        None => rows,
    }
}
