use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::vocab::{FilingType, TradeType};

/// Canonical column names of a normalized dataset, in display order.
pub const COLUMNS: [&str; 13] = [
    "Filing Type",
    "Filing Date",
    "Trade Date",
    "Ticker",
    "Insider Name",
    "Company Name",
    "Title",
    "Trade Type",
    "Price",
    "Quantity",
    "Owned",
    "ΔOwn",
    "Value",
];

/// Screener table as handed over by a fetch gateway: one header row
/// plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    /// A table without a header carries no schema to normalize.
    pub fn is_usable(&self) -> bool {
        !self.header.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Trade type as reported: the transaction code plus the site's
/// description (e.g. `S` / `Sale+OE`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TradeKind {
    pub code: String,
    pub description: String,
}

impl TradeKind {
    /// Parsed transaction code; `None` when the site reports a code
    /// outside the known vocabulary.
    pub fn trade_type(&self) -> Option<TradeType> {
        self.code.parse().ok()
    }

    pub fn label(&self) -> String {
        format!("{} - {}", self.code, self.description)
    }
}

/// One normalized insider transaction.
///
/// `value` is signed: positive for acquisitions, negative for
/// dispositions, so `value.abs()` is always the trade's dollar size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsiderTrade {
    pub filing_type: FilingType,
    pub filing_date: NaiveDateTime,
    pub trade_date: NaiveDate,
    pub ticker: String,
    pub insider_name: String,
    pub company_name: String,
    pub titles: Vec<String>,
    pub trade_kind: TradeKind,
    pub price: Decimal,
    pub quantity: i64,
    pub owned: i64,
    /// Fractional change in holdings; `None` marks a new position.
    pub ownership_delta: Option<Decimal>,
    pub value: Decimal,
}

impl InsiderTrade {
    pub fn magnitude(&self) -> Decimal {
        self.value.abs()
    }
}

/// A normalized result set together with the fetch it came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub rows: Vec<InsiderTrade>,
    /// Identifies the remote fetch; `None` for the empty dataset returned
    /// when no fetch succeeded.
    pub fetch_id: Option<Uuid>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl Dataset {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fetched(rows: Vec<InsiderTrade>) -> Self {
        Self {
            rows,
            fetch_id: Some(Uuid::new_v4()),
            fetched_at: Some(Utc::now()),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A view containing the rows matching `pred`, same provenance.
    pub fn filtered<F>(&self, mut pred: F) -> Dataset
    where
        F: FnMut(&InsiderTrade) -> bool,
    {
        Dataset {
            rows: self.rows.iter().filter(|r| pred(*r)).cloned().collect(),
            fetch_id: self.fetch_id,
            fetched_at: self.fetched_at,
        }
    }

    /// Keep rows whose company is one of `companies`; an empty list keeps all.
    pub fn retain_companies(&self, companies: &[String]) -> Dataset {
        if companies.is_empty() {
            return self.clone();
        }
        self.filtered(|r| companies.contains(&r.company_name))
    }

    /// Keep rows whose insider is one of `insiders`; an empty list keeps all.
    pub fn retain_insiders(&self, insiders: &[String]) -> Dataset {
        if insiders.is_empty() {
            return self.clone();
        }
        self.filtered(|r| insiders.contains(&r.insider_name))
    }
}
