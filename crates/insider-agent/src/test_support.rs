//! Shared test fixtures: screener-shaped raw tables and a scripted gateway.
//!
//! Used by the crate's unit tests and the `tests/` scenarios.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use insider_models::{FetchKey, QueryDescriptor, RawTable};
use tokio::sync::Mutex;

use crate::error::FetchError;
use crate::gateway::FetchGateway;
use crate::normalizer::parse_currency;

/// Header row as the screener renders it, non-breaking spaces included.
pub fn screener_header() -> Vec<String> {
    [
        "X",
        "Filing\u{a0}Date",
        "Trade\u{a0}Date",
        "Ticker",
        "Insider Name",
        "Company Name",
        "Title",
        "Trade\u{a0}Type",
        "Price",
        "Qty",
        "Owned",
        "ΔOwn",
        "Value",
        "1d",
        "1w",
        "1m",
        "6m",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// One screener row, described by the fields tests usually vary.
#[derive(Debug, Clone)]
pub struct RowSpec {
    pub filing_type: String,
    pub filing_date: String,
    pub trade_date: String,
    pub ticker: String,
    pub insider: String,
    pub company: String,
    pub title: String,
    pub trade_type: String,
    pub price: String,
    pub quantity: String,
    pub owned: String,
    pub delta: String,
    pub value: String,
}

impl Default for RowSpec {
    fn default() -> Self {
        Self {
            filing_type: "M".to_string(),
            filing_date: "2024-03-01 18:05:12".to_string(),
            trade_date: "2024-02-28".to_string(),
            ticker: "ACME".to_string(),
            insider: "Doe John".to_string(),
            company: "Acme Corp".to_string(),
            title: "CEO, Dir".to_string(),
            trade_type: "P - Purchase".to_string(),
            price: "$24.69".to_string(),
            quantity: "+50,000".to_string(),
            owned: "1,250,000".to_string(),
            delta: "+4%".to_string(),
            value: "+$1,234,500".to_string(),
        }
    }
}

impl RowSpec {
    /// Purchase of `value` dollars.
    pub fn purchase(company: &str, value: i64) -> Self {
        Self {
            company: company.to_string(),
            trade_type: "P - Purchase".to_string(),
            quantity: "+1,000".to_string(),
            value: format!("+${value}"),
            ..Self::default()
        }
    }

    /// Sale of `value` dollars; the value cell carries the minus sign.
    pub fn sale(company: &str, value: i64) -> Self {
        Self {
            company: company.to_string(),
            trade_type: "S - Sale".to_string(),
            quantity: "-1,000".to_string(),
            delta: "-3%".to_string(),
            value: format!("-${value}"),
            ..Self::default()
        }
    }

    pub fn trade_date(mut self, date: &str) -> Self {
        self.trade_date = date.to_string();
        self
    }

    pub fn insider(mut self, name: &str) -> Self {
        self.insider = name.to_string();
        self
    }

    pub fn cells(&self) -> Vec<String> {
        vec![
            self.filing_type.clone(),
            self.filing_date.clone(),
            self.trade_date.clone(),
            self.ticker.clone(),
            self.insider.clone(),
            self.company.clone(),
            self.title.clone(),
            self.trade_type.clone(),
            self.price.clone(),
            self.quantity.clone(),
            self.owned.clone(),
            self.delta.clone(),
            self.value.clone(),
            "+1%".to_string(),
            "-2%".to_string(),
            "".to_string(),
            "".to_string(),
        ]
    }
}

/// Default row with the given trade type, value and ownership-delta cells.
pub fn raw_row(trade_type: &str, value: &str, delta: &str) -> Vec<String> {
    let quantity = if value.starts_with('-') {
        "-50,000"
    } else {
        "+50,000"
    };
    RowSpec {
        trade_type: trade_type.to_string(),
        value: value.to_string(),
        delta: delta.to_string(),
        quantity: quantity.to_string(),
        ..RowSpec::default()
    }
    .cells()
}

pub fn screener_table(rows: Vec<Vec<String>>) -> RawTable {
    RawTable::new(screener_header(), rows)
}

pub fn table_from_specs(specs: &[RowSpec]) -> RawTable {
    screener_table(specs.iter().map(RowSpec::cells).collect())
}

/// A mixed page of purchases and sales across three companies.
pub fn sample_table() -> RawTable {
    table_from_specs(&[
        RowSpec::purchase("Acme Corp", 50_000).trade_date("2024-03-04"),
        RowSpec::sale("Acme Corp", 150_000).trade_date("2024-03-04"),
        RowSpec::purchase("Globex", 400_000).trade_date("2024-02-20").insider("Roe Jane"),
        RowSpec::sale("Globex", 2_500_000).trade_date("2024-02-12").insider("Roe Jane"),
        RowSpec::purchase("Initech", 900_000).trade_date("2024-01-30"),
        RowSpec::sale("Initech", 1_000_000).trade_date("2023-12-29"),
    ])
}

enum Script {
    /// Serve this table, applying value bounds and the row cap like the site.
    Screener(RawTable),
    /// Serve this table verbatim.
    Verbatim(RawTable),
    Fail(String),
}

/// Scripted gateway that counts calls and records requested fetch keys.
pub struct MockGateway {
    script: Script,
    calls: AtomicUsize,
    requests: Mutex<Vec<FetchKey>>,
}

impl MockGateway {
    pub fn screener(table: RawTable) -> Arc<Self> {
        Arc::new(Self::with_script(Script::Screener(table)))
    }

    pub fn verbatim(table: RawTable) -> Arc<Self> {
        Arc::new(Self::with_script(Script::Verbatim(table)))
    }

    pub fn failing(reason: &str) -> Arc<Self> {
        Arc::new(Self::with_script(Script::Fail(reason.to_string())))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<FetchKey> {
        self.requests.lock().await.clone()
    }
}

/// Value cells are located by header name so tests can reshape tables.
fn screener_slice(table: &RawTable, query: &QueryDescriptor) -> RawTable {
    let value_idx = table.header.iter().position(|h| h == "Value");
    let bounds = query.bounds();
    let rows = table
        .rows
        .iter()
        .filter(|row| {
            let value = value_idx
                .and_then(|i| row.get(i))
                .and_then(|cell| parse_currency(cell));
            // Unparseable rows pass through so normalization can reject them.
            value.map_or(true, |v| bounds.contains(v.abs()))
        })
        .take(query.num_results() as usize)
        .cloned()
        .collect();
    RawTable::new(table.header.clone(), rows)
}

#[async_trait]
impl FetchGateway for MockGateway {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, query: &QueryDescriptor) -> Result<RawTable, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().await.push(query.fetch_key());
        match &self.script {
            Script::Screener(table) => Ok(screener_slice(table, query)),
            Script::Verbatim(table) => Ok(table.clone()),
            Script::Fail(reason) => Err(FetchError::Unavailable(reason.clone())),
        }
    }
}
