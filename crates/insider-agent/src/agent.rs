use std::sync::Arc;
use std::time::Instant;

use insider_cache::ResultCache;
use insider_models::{AgentConfig, Dataset, InsiderConfig, ParamError, QueryDescriptor, ScrapeRequest};
use tracing::{info, warn};

use crate::error::{FetchError, QueryError};
use crate::filter::ValidatedQuery;
use crate::gateway::FetchGateway;
use crate::normalizer::normalize;

/// Answers scrape requests from the cache when a previous fetch covers
/// them, and from the gateway otherwise.
///
/// One agent per session. `scrape` and `clear` take `&mut self`, so at
/// most one fetch is in flight and the cache is never shared.
pub struct QueryAgent {
    gateway: Arc<dyn FetchGateway>,
    cache: ResultCache,
    config: AgentConfig,
}

impl QueryAgent {
    pub fn new(gateway: Arc<dyn FetchGateway>, config: &InsiderConfig) -> Self {
        let cache = ResultCache::new(config.cache.capacity, config.agent.effective_max_rows());
        info!(
            gateway = gateway.name(),
            max_rows = cache.max_rows(),
            capacity = ?cache.capacity(),
            "QueryAgent initialized"
        );
        Self {
            gateway,
            cache,
            config: config.agent.clone(),
        }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn validate(&self, request: &ScrapeRequest) -> Result<ValidatedQuery, ParamError> {
        ValidatedQuery::from_request(request, self.config.default_num_results)
    }

    /// Fetch trades matching `request`, reusing cached data when possible.
    ///
    /// A gateway failure is logged and answered with an empty dataset,
    /// so an empty result may mean either "no matches" or "fetch failed".
    /// Invalid parameters and malformed tables are returned as errors.
    pub async fn scrape(&mut self, request: &ScrapeRequest) -> Result<Dataset, QueryError> {
        let query = self.validate(request)?;
        info!(
            query = %query.descriptor,
            trade_types = ?query.trade_types,
            "Scrape requested"
        );

        let source = match self.cache.find_covering(&query.descriptor) {
            Some(dataset) => {
                info!(rows = dataset.len(), fetch_id = ?dataset.fetch_id, "Cache hit, reusing fetched data");
                dataset
            }
            None => {
                info!("Cache miss");
                match self.fetch_fresh(&query.descriptor).await {
                    Ok(dataset) => dataset,
                    Err(QueryError::Fetch(e)) => {
                        warn!(gateway = self.gateway.name(), error = %e, "Fetch failed, returning empty dataset");
                        return Ok(Dataset::empty());
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let result = query.post_filter().apply(&source);
        info!(rows = result.len(), from = source.len(), "Post-filter complete");
        Ok(result)
    }

    /// Fetch, normalize and cache the unfiltered dataset for `descriptor`.
    /// Nothing is cached unless normalization succeeds.
    async fn fetch_fresh(&mut self, descriptor: &QueryDescriptor) -> Result<Arc<Dataset>, QueryError> {
        let start = Instant::now();
        info!(fetch_key = %descriptor.fetch_key(), gateway = self.gateway.name(), "Fetching");

        let table = self.gateway.fetch(descriptor).await?;
        if !table.is_usable() {
            return Err(FetchError::Unavailable("gateway returned a table without a header".to_string()).into());
        }
        info!(
            rows = table.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetch complete"
        );

        let dataset = Arc::new(normalize(&table)?);
        self.cache.insert(descriptor.clone(), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop all cached datasets, e.g. for an explicit refresh.
    pub fn clear(&mut self) {
        info!("Clearing cached data");
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataFormatError;
    use crate::test_support::{sample_table, screener_table, raw_row, MockGateway};
    use insider_models::{CacheConfig, RawTable};

    fn config(capacity: Option<usize>) -> InsiderConfig {
        InsiderConfig {
            cache: CacheConfig { capacity },
            agent: AgentConfig::default(),
        }
    }

    #[test]
    fn cache_takes_clamped_ceiling_from_config() {
        let mut insider_config = config(Some(3));
        insider_config.agent.max_rows = 9000;
        let agent = QueryAgent::new(MockGateway::screener(sample_table()), &insider_config);

        assert_eq!(agent.cache().max_rows(), 5000);
        assert_eq!(agent.cache().capacity(), Some(3));
    }

    #[tokio::test]
    async fn miss_then_hit() {
        let gateway = MockGateway::screener(sample_table());
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));
        let request = ScrapeRequest::new().num_results(5000);

        let first = agent.scrape(&request).await.unwrap();
        let second = agent.scrape(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(gateway.calls(), 1);
        assert_eq!(agent.cache().len(), 1);
    }

    #[tokio::test]
    async fn below_max_cap_is_always_refetched() {
        let gateway = MockGateway::screener(sample_table());
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));
        let request = ScrapeRequest::new().num_results(1000);

        agent.scrape(&request).await.unwrap();
        agent.scrape(&request).await.unwrap();
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn trade_types_never_reach_the_gateway() {
        let gateway = MockGateway::screener(sample_table());
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

        let purchases = agent
            .scrape(&ScrapeRequest::new().trade_types("P").num_results(5000))
            .await
            .unwrap();
        let sales = agent
            .scrape(&ScrapeRequest::new().trade_types("S").num_results(5000))
            .await
            .unwrap();

        assert_eq!(gateway.calls(), 1);
        assert_eq!(purchases.len(), 3);
        assert_eq!(sales.len(), 3);
        // The cached dataset itself is unfiltered.
        let cached = agent.cache().entries().next().unwrap();
        assert_eq!(cached.dataset.len(), 6);
    }

    #[tokio::test]
    async fn fetch_failure_returns_empty() {
        let gateway = MockGateway::failing("connection reset");
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

        let result = agent.scrape(&ScrapeRequest::new()).await.unwrap();
        assert!(result.is_empty());
        assert!(result.fetch_id.is_none());
        assert!(agent.cache().is_empty());
    }

    #[tokio::test]
    async fn headerless_table_is_a_fetch_failure() {
        let gateway = MockGateway::verbatim(RawTable::default());
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

        let result = agent.scrape(&ScrapeRequest::new()).await.unwrap();
        assert!(result.is_empty());
        assert!(agent.cache().is_empty());
    }

    #[tokio::test]
    async fn invalid_parameters_fail_before_fetching() {
        let gateway = MockGateway::screener(sample_table());
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

        let err = agent
            .scrape(&ScrapeRequest::new().job_titles(vec!["CEO", "Intern"]))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidParameter(ParamError::UnknownOption { param: "job_titles", .. })));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_table_is_not_cached() {
        let mut bad = raw_row("P - Purchase", "+$1,000", "+1%");
        bad[8] = "N/A".to_string();
        let gateway = MockGateway::verbatim(screener_table(vec![bad]));
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

        let err = agent
            .scrape(&ScrapeRequest::new().num_results(5000))
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::DataFormat(DataFormatError::Cell { column: "Price", .. })));
        assert!(agent.cache().is_empty());
    }

    #[tokio::test]
    async fn clear_forces_refetch() {
        let gateway = MockGateway::screener(sample_table());
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));
        let request = ScrapeRequest::new().num_results(5000);

        let first = agent.scrape(&request).await.unwrap();
        agent.clear();
        let second = agent.scrape(&request).await.unwrap();

        assert_eq!(gateway.calls(), 2);
        assert_ne!(first.fetch_id, second.fetch_id);
    }

    #[tokio::test]
    async fn disabled_cache_always_fetches() {
        let gateway = MockGateway::screener(sample_table());
        let mut agent = QueryAgent::new(gateway.clone(), &config(Some(0)));
        let request = ScrapeRequest::new().num_results(5000);

        agent.scrape(&request).await.unwrap();
        agent.scrape(&request).await.unwrap();
        assert_eq!(gateway.calls(), 2);
    }
}
