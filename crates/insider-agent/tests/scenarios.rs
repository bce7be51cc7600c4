//! End-to-end query scenarios.
//!
//! Each test drives a `QueryAgent` against a scripted gateway and checks
//! which requests reach the gateway, what the cache retains, and what the
//! caller gets back.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use insider_agent::test_support::{
    raw_row, sample_table, screener_table, table_from_specs, MockGateway, RowSpec,
};
use insider_agent::{DataFormatError, FetchError, FetchGateway, QueryAgent, QueryError};
use insider_models::{
    AgentConfig, CacheConfig, InsiderConfig, QueryDescriptor, RawTable, ScrapeRequest,
};
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

fn config(capacity: Option<usize>) -> InsiderConfig {
    InsiderConfig {
        cache: CacheConfig { capacity },
        agent: AgentConfig::default(),
    }
}

fn config_with_max_rows(capacity: Option<usize>, max_rows: u32) -> InsiderConfig {
    InsiderConfig {
        cache: CacheConfig { capacity },
        agent: AgentConfig {
            max_rows,
            ..AgentConfig::default()
        },
    }
}

/// `n` purchases with distinct values, largest last.
fn many_purchases(n: i64) -> RawTable {
    let specs: Vec<RowSpec> = (1..=n)
        .map(|i| RowSpec::purchase("Acme Corp", 1_000 + i))
        .collect();
    table_from_specs(&specs)
}

/// Serves queued tables in order, one per fetch.
struct SequenceGateway {
    tables: Mutex<VecDeque<RawTable>>,
    calls: AtomicUsize,
}

impl SequenceGateway {
    fn new(tables: Vec<RawTable>) -> Arc<Self> {
        Arc::new(Self {
            tables: Mutex::new(tables.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FetchGateway for SequenceGateway {
    fn name(&self) -> &str {
        "sequence"
    }

    async fn fetch(&self, _query: &QueryDescriptor) -> Result<RawTable, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tables
            .lock()
            .await
            .pop_front()
            .ok_or_else(|| FetchError::Unavailable("no more tables".to_string()))
    }
}

#[tokio::test]
async fn broad_fetch_answers_narrower_request_locally() {
    let gateway = MockGateway::screener(sample_table());
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

    let all = agent
        .scrape(&ScrapeRequest::new().num_results(5000))
        .await
        .unwrap();
    assert_eq!(all.len(), 6);

    let narrowed = agent
        .scrape(
            &ScrapeRequest::new()
                .trade_val_min(100_000)
                .trade_val_max(900_000)
                .num_results(1000),
        )
        .await
        .unwrap();

    assert_eq!(gateway.calls(), 1);
    let values: Vec<_> = narrowed.rows.iter().map(|r| r.value).collect();
    assert_eq!(values, vec![dec!(-150000), dec!(400000), dec!(900000)]);
    assert_eq!(narrowed.fetch_id, all.fetch_id);
}

#[tokio::test]
async fn repeated_request_is_idempotent() {
    let gateway = MockGateway::screener(sample_table());
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));
    let request = ScrapeRequest::new()
        .job_titles(vec!["CEO", "Director"])
        .trade_val_min(10_000)
        .num_results(5000);

    let first = agent.scrape(&request).await.unwrap();
    let second = agent.scrape(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn title_subset_is_not_covered() {
    let gateway = MockGateway::screener(sample_table());
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(4)));

    agent
        .scrape(&ScrapeRequest::new().job_titles("CEO").num_results(5000))
        .await
        .unwrap();
    agent
        .scrape(&ScrapeRequest::new().job_titles(vec!["CEO", "CFO"]).num_results(5000))
        .await
        .unwrap();
    // All titles is a superset of the cached title sets, still not covered.
    agent
        .scrape(&ScrapeRequest::new().num_results(5000))
        .await
        .unwrap();

    assert_eq!(gateway.calls(), 3);
    let keys = gateway.requests().await;
    assert_eq!(keys[0].as_str(), "cnt=5000&isceo=1");
    assert_eq!(keys[1].as_str(), "cnt=5000&isceo=1&iscfo=1");
}

#[tokio::test]
async fn enclosing_bounds_cover_and_wider_bounds_do_not() {
    let gateway = MockGateway::screener(sample_table());
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

    agent
        .scrape(
            &ScrapeRequest::new()
                .trade_val_min(100_000)
                .trade_val_max(1_000_000)
                .num_results(5000),
        )
        .await
        .unwrap();

    let inner = agent
        .scrape(
            &ScrapeRequest::new()
                .trade_val_min(150_000)
                .trade_val_max(900_000)
                .num_results(5000),
        )
        .await
        .unwrap();
    assert_eq!(gateway.calls(), 1);
    assert_eq!(inner.len(), 3);

    let wider = agent
        .scrape(
            &ScrapeRequest::new()
                .trade_val_min(10_000)
                .trade_val_max(900_000)
                .num_results(5000),
        )
        .await
        .unwrap();
    assert_eq!(gateway.calls(), 2);
    assert_eq!(wider.len(), 4);
}

#[tokio::test]
async fn oldest_entry_is_evicted_past_capacity() {
    let gateway = MockGateway::screener(sample_table());
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));
    let request = |title: &str| ScrapeRequest::new().job_titles(title).num_results(5000);

    for title in ["CEO", "CFO", "Director"] {
        agent.scrape(&request(title)).await.unwrap();
    }
    assert_eq!(agent.cache().len(), 2);
    assert_eq!(gateway.calls(), 3);

    // CFO and Director are still cached, CEO was evicted.
    agent.scrape(&request("Director")).await.unwrap();
    agent.scrape(&request("CFO")).await.unwrap();
    assert_eq!(gateway.calls(), 3);
    agent.scrape(&request("CEO")).await.unwrap();
    assert_eq!(gateway.calls(), 4);
}

#[tokio::test]
async fn result_cap_is_clamped_before_fetching() {
    let gateway = MockGateway::screener(sample_table());
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

    agent
        .scrape(&ScrapeRequest::new().job_titles("CEO").num_results(20))
        .await
        .unwrap();
    agent
        .scrape(&ScrapeRequest::new().job_titles("CFO").num_results(9000))
        .await
        .unwrap();

    let keys = gateway.requests().await;
    assert_eq!(keys[0].as_str(), "cnt=100&isceo=1");
    assert_eq!(keys[1].as_str(), "cnt=5000&iscfo=1");
}

#[tokio::test]
async fn malformed_fetch_leaves_cache_unchanged() {
    let mut bad = raw_row("S - Sale", "-$10,000", "-1%");
    bad[8] = "N/A".to_string();
    let gateway = SequenceGateway::new(vec![sample_table(), screener_table(vec![bad])]);
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

    agent
        .scrape(&ScrapeRequest::new().job_titles("CEO").num_results(5000))
        .await
        .unwrap();
    let err = agent
        .scrape(&ScrapeRequest::new().job_titles("CFO").num_results(5000))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        QueryError::DataFormat(DataFormatError::Cell { column: "Price", .. })
    ));
    assert_eq!(gateway.calls(), 2);
    assert_eq!(agent.cache().len(), 1);
    let cached = agent.cache().entries().next().unwrap();
    assert_eq!(cached.dataset.len(), 6);
}

#[tokio::test]
async fn empty_fetch_is_cached_and_reused() {
    let gateway = MockGateway::verbatim(screener_table(vec![]));
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));
    let request = ScrapeRequest::new().num_results(5000);

    let first = agent.scrape(&request).await.unwrap();
    assert!(first.is_empty());
    assert!(first.fetch_id.is_some());

    let second = agent
        .scrape(&ScrapeRequest::new().trade_val_min(1_000).num_results(5000))
        .await
        .unwrap();
    assert!(second.is_empty());
    assert_eq!(gateway.calls(), 1);
    assert_eq!(agent.cache().len(), 1);
}

#[tokio::test]
async fn failed_fetch_is_retried_on_next_request() {
    let gateway = SequenceGateway::new(vec![]);
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));
    let request = ScrapeRequest::new().num_results(5000);

    assert!(agent.scrape(&request).await.unwrap().is_empty());
    assert!(agent.scrape(&request).await.unwrap().is_empty());
    assert_eq!(gateway.calls(), 2);
    assert!(agent.cache().is_empty());
}

#[tokio::test]
async fn unbounded_cache_never_evicts() {
    let gateway = MockGateway::screener(sample_table());
    let mut agent = QueryAgent::new(gateway.clone(), &config(None));

    for title in ["CEO", "CFO", "Director", "VP", "COO"] {
        agent
            .scrape(&ScrapeRequest::new().job_titles(title).num_results(5000))
            .await
            .unwrap();
    }
    assert_eq!(agent.cache().len(), 5);
}

#[tokio::test]
async fn json_request_shapes_are_accepted() {
    let gateway = MockGateway::screener(sample_table());
    let mut agent = QueryAgent::new(gateway.clone(), &config(Some(2)));

    let request = ScrapeRequest::from_json(&serde_json::json!({
        "trade_types": ["S"],
        "trade_val_min": 100000.0,
        "num_results": 5000
    }))
    .unwrap();
    let sales = agent.scrape(&request).await.unwrap();

    assert_eq!(sales.len(), 3);
    assert!(sales.rows.iter().all(|r| r.trade_kind.code == "S"));
}

#[tokio::test]
async fn low_ceiling_fetch_does_not_cover_larger_cap() {
    let gateway = MockGateway::screener(many_purchases(300));
    let mut agent = QueryAgent::new(gateway.clone(), &config_with_max_rows(Some(2), 100));

    let first = agent
        .scrape(&ScrapeRequest::new().num_results(100))
        .await
        .unwrap();
    let second = agent
        .scrape(&ScrapeRequest::new().num_results(300))
        .await
        .unwrap();

    assert_eq!(first.len(), 100);
    assert_eq!(second.len(), 300);
    assert_eq!(gateway.calls(), 2);

    // The 300-row fetch is at the ceiling and covers anything up to its own cap.
    let third = agent
        .scrape(&ScrapeRequest::new().num_results(200))
        .await
        .unwrap();
    assert_eq!(third.len(), 200);
    assert_eq!(third.fetch_id, second.fetch_id);
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn request_above_cached_cap_is_refetched() {
    let gateway = MockGateway::screener(many_purchases(300));
    let mut agent = QueryAgent::new(gateway.clone(), &config_with_max_rows(Some(2), 1000));

    let cached = agent
        .scrape(&ScrapeRequest::new().num_results(1000))
        .await
        .unwrap();
    assert_eq!(cached.len(), 300);

    let reused = agent
        .scrape(&ScrapeRequest::new().trade_val_min(1_200).num_results(500))
        .await
        .unwrap();
    assert_eq!(gateway.calls(), 1);
    assert_eq!(reused.len(), 101);

    agent
        .scrape(&ScrapeRequest::new().num_results(5000))
        .await
        .unwrap();
    assert_eq!(gateway.calls(), 2);
    let keys = gateway.requests().await;
    assert!(keys[1].as_str().starts_with("cnt=5000&"));
}
