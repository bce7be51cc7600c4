//! Group-by and aggregation over a normalized dataset.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use insider_models::{Dataset, InsiderTrade};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    Company,
    Day,
    Month,
    Year,
}

impl GroupBy {
    pub const ALL: [GroupBy; 4] = [GroupBy::Company, GroupBy::Day, GroupBy::Month, GroupBy::Year];

    fn key(&self, row: &InsiderTrade) -> String {
        match self {
            GroupBy::Company => row.company_name.clone(),
            GroupBy::Day => row.trade_date.format("%Y-%m-%d").to_string(),
            GroupBy::Month => row.trade_date.format("%Y-%m").to_string(),
            GroupBy::Year => row.trade_date.format("%Y").to_string(),
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GroupBy::Company => "company",
            GroupBy::Day => "day",
            GroupBy::Month => "month",
            GroupBy::Year => "year",
        };
        f.write_str(s)
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GroupBy::ALL
            .into_iter()
            .find(|g| g.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("{s}: invalid group-by; choose from company, day, month, year"))
    }
}

/// Aggregations are over trade size, `|value|`, so purchases and sales
/// add up instead of cancelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    Total,
    Average,
    Count,
}

impl Aggregation {
    pub const ALL: [Aggregation; 3] = [Aggregation::Total, Aggregation::Average, Aggregation::Count];

    fn apply(&self, rows: &[&InsiderTrade]) -> Decimal {
        let total = || rows.iter().map(|r| r.magnitude()).sum::<Decimal>();
        match self {
            Aggregation::Count => Decimal::from(rows.len()),
            Aggregation::Total => total(),
            Aggregation::Average if rows.is_empty() => Decimal::ZERO,
            Aggregation::Average => total() / Decimal::from(rows.len()),
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Aggregation::Total => "total",
            Aggregation::Average => "average",
            Aggregation::Count => "count",
        };
        f.write_str(s)
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregation::ALL
            .into_iter()
            .find(|a| a.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("{s}: invalid aggregation; choose from total, average, count"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: String,
    pub value: Decimal,
}

/// Group rows and aggregate each group; output is sorted by group key.
pub fn aggregate(dataset: &Dataset, group_by: GroupBy, aggregation: Aggregation) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<String, Vec<&InsiderTrade>> = BTreeMap::new();
    for row in &dataset.rows {
        groups.entry(group_by.key(row)).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(key, rows)| AggregateRow {
            value: aggregation.apply(&rows),
            key,
        })
        .collect()
}

/// Keep the `n` largest groups, largest first. Ties keep key order.
pub fn top_n(mut rows: Vec<AggregateRow>, n: usize) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| b.value.cmp(&a.value));
    rows.truncate(n);
    rows
}
