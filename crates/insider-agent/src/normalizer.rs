//! Conversion of raw screener tables into typed datasets.
//!
//! Normalization is all-or-nothing: the first bad cell fails the whole
//! table, so a partially parsed dataset never reaches the cache.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use insider_models::{Dataset, Direction, FilingType, InsiderTrade, RawTable, TradeKind};
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::DataFormatError;

/// Short-horizon return columns the screener appends; not part of the schema.
const DROPPED_COLUMNS: [&str; 4] = ["1d", "1w", "1m", "6m"];

const NEW_POSITION: &str = "New";
const TITLE_DELIMITER: &str = ", ";

/// Map a header cell to its canonical column name.
fn canonical_header(raw: &str) -> String {
    let cleaned = raw.replace('\u{a0}', " ");
    match cleaned.trim() {
        "X" => "Filing Type".to_string(),
        "Qty" => "Quantity".to_string(),
        other => other.to_string(),
    }
}

struct Columns {
    index: HashMap<String, usize>,
    width: usize,
}

impl Columns {
    fn from_header(header: &[String]) -> Self {
        let mut index = HashMap::new();
        for (i, cell) in header.iter().enumerate() {
            let name = canonical_header(cell);
            if DROPPED_COLUMNS.contains(&name.as_str()) {
                continue;
            }
            index.entry(name).or_insert(i);
        }
        Self {
            index,
            width: header.len(),
        }
    }

    fn require(&self, names: &[&'static str]) -> Result<(), DataFormatError> {
        match names.iter().find(|n| !self.index.contains_key(**n)) {
            Some(missing) => Err(DataFormatError::MissingColumn(missing.to_string())),
            None => Ok(()),
        }
    }

    fn cell<'a>(&self, row: &'a [String], column: &'static str) -> &'a str {
        // `require` has already checked every canonical column.
        self.index
            .get(column)
            .and_then(|&i| row.get(i))
            .map(|s| s.trim())
            .unwrap_or("")
    }
}

fn cell_error(row: usize, column: &'static str, value: &str, reason: impl Into<String>) -> DataFormatError {
    DataFormatError::Cell {
        row,
        column,
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// `"-$1,234.50"` → `-1234.50`; `"+$12"` → `12`.
pub fn parse_currency(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '+'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// `"+1,500"` → `1500`.
pub fn parse_shares(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '+'))
        .collect();
    cleaned.parse().ok()
}

/// Percentage change in holdings as a fraction. `Ok(None)` for a new position.
pub fn parse_ownership_delta(raw: &str) -> Result<Option<Decimal>, String> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case(NEW_POSITION) {
        return Ok(None);
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '+' | '%' | '>'))
        .collect();
    Decimal::from_str(&cleaned)
        .map(|pct| Some(pct / Decimal::ONE_HUNDRED))
        .map_err(|e| e.to_string())
}

fn parse_filing_date(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn parse_trade_kind(raw: &str) -> Option<TradeKind> {
    let (code, description) = match raw.split_once(" - ") {
        Some((code, description)) => (code.trim(), description.trim().to_string()),
        None => {
            let code = raw.trim();
            let description = code
                .parse::<insider_models::TradeType>()
                .map(|t| t.description().to_string())
                .unwrap_or_default();
            (code, description)
        }
    };
    if code.is_empty() {
        return None;
    }
    Some(TradeKind {
        code: code.to_string(),
        description,
    })
}

/// Titles are kept as reported; codes outside the filter vocabulary
/// (e.g. `Dir`, `10%`) are preserved rather than rejected.
fn parse_titles(raw: &str) -> Vec<String> {
    raw.split(TITLE_DELIMITER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_row(columns: &Columns, row_idx: usize, row: &[String]) -> Result<InsiderTrade, DataFormatError> {
    if row.len() != columns.width {
        return Err(DataFormatError::RowWidth {
            row: row_idx,
            expected: columns.width,
            found: row.len(),
        });
    }
    let cell = |column: &'static str| columns.cell(row, column);

    let filing_date = parse_filing_date(cell("Filing Date"))
        .ok_or_else(|| cell_error(row_idx, "Filing Date", cell("Filing Date"), "expected YYYY-MM-DD[ HH:MM:SS]"))?;
    let trade_date = NaiveDate::parse_from_str(cell("Trade Date"), "%Y-%m-%d")
        .map_err(|e| cell_error(row_idx, "Trade Date", cell("Trade Date"), e.to_string()))?;
    let trade_kind = parse_trade_kind(cell("Trade Type"))
        .ok_or_else(|| cell_error(row_idx, "Trade Type", cell("Trade Type"), "empty trade type"))?;
    let price = parse_currency(cell("Price"))
        .ok_or_else(|| cell_error(row_idx, "Price", cell("Price"), "not a currency amount"))?;
    let value = parse_currency(cell("Value"))
        .ok_or_else(|| cell_error(row_idx, "Value", cell("Value"), "not a currency amount"))?;
    let quantity = parse_shares(cell("Quantity"))
        .ok_or_else(|| cell_error(row_idx, "Quantity", cell("Quantity"), "not a whole share count"))?;
    let owned = parse_shares(cell("Owned"))
        .ok_or_else(|| cell_error(row_idx, "Owned", cell("Owned"), "not a whole share count"))?;
    let ownership_delta = parse_ownership_delta(cell("ΔOwn"))
        .map_err(|reason| cell_error(row_idx, "ΔOwn", cell("ΔOwn"), reason))?;

    let direction = trade_kind.trade_type().and_then(|t| t.direction());
    let contradicts = match direction {
        Some(Direction::Acquired) => value.is_sign_negative() && !value.is_zero(),
        Some(Direction::Disposed) => value.is_sign_positive() && !value.is_zero(),
        None => false,
    };
    if contradicts {
        return Err(cell_error(
            row_idx,
            "Value",
            cell("Value"),
            format!("sign contradicts trade type {}", trade_kind.label()),
        ));
    }

    Ok(InsiderTrade {
        filing_type: FilingType::new(cell("Filing Type")),
        filing_date,
        trade_date,
        ticker: cell("Ticker").to_string(),
        insider_name: cell("Insider Name").to_string(),
        company_name: cell("Company Name").to_string(),
        titles: parse_titles(cell("Title")),
        trade_kind,
        price,
        quantity,
        owned,
        ownership_delta,
        value,
    })
}

/// Normalize a raw screener table. An empty table yields an empty dataset.
pub fn normalize(table: &RawTable) -> Result<Dataset, DataFormatError> {
    let columns = Columns::from_header(&table.header);
    columns.require(&insider_models::COLUMNS)?;

    let rows = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| normalize_row(&columns, i, row))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = rows.len(), "Normalized screener table");
    Ok(Dataset::fetched(rows))
}
