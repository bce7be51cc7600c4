use std::collections::BTreeSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::ParamError;
use crate::params::{validate_result_cap, validate_titles, validate_value_bounds, Number, Selection};
use crate::vocab::JobTitle;

/// Trade-value bounds. An unset lower bound compares as negative infinity,
/// an unset upper bound as positive infinity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ValueBounds {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl ValueBounds {
    pub fn new(min: Option<u64>, max: Option<u64>) -> Self {
        Self { min, max }
    }

    /// True when every value admitted by `other` is admitted by `self`.
    pub fn encloses(&self, other: &ValueBounds) -> bool {
        let lower = match (self.min, other.min) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a <= b,
        };
        let upper = match (self.max, other.max) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(a), Some(b)) => a >= b,
        };
        lower && upper
    }

    pub fn contains(&self, value: Decimal) -> bool {
        self.min.map_or(true, |min| value >= Decimal::from(min))
            && self.max.map_or(true, |max| value <= Decimal::from(max))
    }
}

/// Canonical encoding of a descriptor's remote request parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FetchKey(String);

impl FetchKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FetchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The validated, remotely expressible part of a scrape request.
///
/// Fields are private and the only constructor runs every validator,
/// so any instance is canonical: the title set is never empty or open,
/// bounds are non-negative, and the cap sits inside the clamp range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QueryDescriptor {
    job_titles: BTreeSet<JobTitle>,
    bounds: ValueBounds,
    num_results: u32,
}

impl QueryDescriptor {
    pub fn new(
        job_titles: Option<&Selection>,
        trade_val_min: Option<Number>,
        trade_val_max: Option<Number>,
        num_results: Number,
    ) -> Result<Self, ParamError> {
        let job_titles = validate_titles(job_titles)?;
        let (min, max) = validate_value_bounds(trade_val_min, trade_val_max)?;
        let num_results = validate_result_cap(num_results)?;
        Ok(Self {
            job_titles,
            bounds: ValueBounds::new(min, max),
            num_results,
        })
    }

    pub fn job_titles(&self) -> &BTreeSet<JobTitle> {
        &self.job_titles
    }

    pub fn trade_val_min(&self) -> Option<u64> {
        self.bounds.min
    }

    pub fn trade_val_max(&self) -> Option<u64> {
        self.bounds.max
    }

    pub fn bounds(&self) -> ValueBounds {
        self.bounds
    }

    pub fn num_results(&self) -> u32 {
        self.num_results
    }

    /// `cnt=<n>&<title flags>&vl=<min>&vh=<max>`, titles in vocabulary order.
    pub fn fetch_key(&self) -> FetchKey {
        let mut parts = vec![format!("cnt={}", self.num_results)];
        parts.extend(
            self.job_titles
                .iter()
                .map(|t| format!("{}=1", t.request_flag())),
        );
        if let Some(min) = self.bounds.min {
            parts.push(format!("vl={min}"));
        }
        if let Some(max) = self.bounds.max {
            parts.push(format!("vh={max}"));
        }
        FetchKey(parts.join("&"))
    }

    /// Whether data fetched for `self` contains every row `request` could match.
    ///
    /// Titles must match exactly since the remote title filter is not a range.
    /// The fetch must also have been made at `max_rows` or above, and at no
    /// less than the request's own cap; a smaller cap may have truncated
    /// rows that the request needs.
    pub fn covers(&self, request: &QueryDescriptor, max_rows: u32) -> bool {
        self.job_titles == request.job_titles
            && self.bounds.encloses(&request.bounds)
            && self.num_results >= max_rows
            && self.num_results >= request.num_results
    }
}

impl fmt::Display for QueryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let titles: Vec<&str> = self.job_titles.iter().map(JobTitle::code).collect();
        let bound = |b: Option<u64>| b.map_or_else(|| "-".to_string(), |v| v.to_string());
        write!(
            f,
            "titles=[{}] value=[{}, {}] cap={}",
            titles.join(", "),
            bound(self.bounds.min),
            bound(self.bounds.max),
            self.num_results
        )
    }
}
