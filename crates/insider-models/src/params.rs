//! Parameter validators.
//!
//! Each filter dimension arrives in one of a few loose shapes (a bare
//! string or a list, an integer or a float) and leaves as a single
//! canonical, comparable value. Nothing downstream of this module ever
//! sees the loose shapes.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParamError;
use crate::vocab::{JobTitle, TradeType};

pub const MIN_RESULTS: u32 = 100;
pub const MAX_RESULTS: u32 = 5000;

/// A set-valued parameter as supplied by a caller: one value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Selection {
    One(String),
    Many(Vec<String>),
}

impl Selection {
    pub fn values(&self) -> Vec<&str> {
        match self {
            Selection::One(v) => vec![v.as_str()],
            Selection::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// Accept a dynamically typed value: null, a string, or a list of strings.
    pub fn from_json(
        param: &'static str,
        value: &serde_json::Value,
    ) -> Result<Option<Self>, ParamError> {
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => Ok(Some(Selection::One(s.clone()))),
            serde_json::Value::Array(items) => {
                let strings: Option<Vec<String>> = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect();
                strings.map(|s| Some(Selection::Many(s))).ok_or_else(|| {
                    ParamError::WrongType {
                        param,
                        found: format!(
                            "[{}]",
                            items.iter().map(json_type).collect::<Vec<_>>().join(", ")
                        ),
                        expected: "a list of strings",
                    }
                })
            }
            other => Err(ParamError::WrongType {
                param,
                found: json_type(other).to_string(),
                expected: "None, a string, or a list of strings",
            }),
        }
    }
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::One(value.to_string())
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Selection::One(value)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(values: Vec<&str>) -> Self {
        Selection::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Selection {
    fn from(values: Vec<String>) -> Self {
        Selection::Many(values)
    }
}

/// A numeric parameter as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn from_json(
        param: &'static str,
        value: &serde_json::Value,
    ) -> Result<Option<Self>, ParamError> {
        match value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Number(n) => Ok(n
                .as_i64()
                .map(Number::Int)
                .or_else(|| n.as_f64().map(Number::Float))),
            other => Err(ParamError::WrongType {
                param,
                found: json_type(other).to_string(),
                expected: "an integer, float, or None",
            }),
        }
    }

    fn render(&self) -> String {
        match self {
            Number::Int(v) => v.to_string(),
            Number::Float(v) => v.to_string(),
        }
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::Int(value)
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::Int(value.into())
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number::Int(value.into())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::Float(value)
    }
}

fn json_type(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(n) if n.is_f64() => "float",
        serde_json::Value::Number(_) => "int",
        serde_json::Value::String(_) => "str",
        serde_json::Value::Array(_) => "list",
        serde_json::Value::Object(_) => "dict",
    }
}

fn validate_selection<T>(
    param: &'static str,
    input: Option<&Selection>,
    all: &[T],
    options: Vec<&'static str>,
) -> Result<BTreeSet<T>, ParamError>
where
    T: FromStr + Ord + Copy,
{
    let values = match input {
        Some(selection) => selection.values(),
        None => return Ok(all.iter().copied().collect()),
    };
    // An empty list asks for no restriction, same as leaving it unset.
    if values.is_empty() {
        return Ok(all.iter().copied().collect());
    }

    let mut parsed = BTreeSet::new();
    let mut invalid = Vec::new();
    for value in values {
        match value.parse::<T>() {
            Ok(v) => {
                parsed.insert(v);
            }
            Err(_) => invalid.push(value.to_string()),
        }
    }

    if !invalid.is_empty() {
        return Err(ParamError::UnknownOption {
            param,
            invalid,
            options,
        });
    }
    Ok(parsed)
}

/// Canonical job-title set. Unset expands to the whole vocabulary.
pub fn validate_titles(input: Option<&Selection>) -> Result<BTreeSet<JobTitle>, ParamError> {
    validate_selection("job_titles", input, &JobTitle::ALL, JobTitle::codes())
}

/// Canonical trade-type set. Unset expands to the whole vocabulary.
pub fn validate_trade_types(input: Option<&Selection>) -> Result<BTreeSet<TradeType>, ParamError> {
    validate_selection("trade_types", input, &TradeType::ALL, TradeType::codes())
}

fn validate_bound(param: &'static str, value: Option<Number>) -> Result<Option<u64>, ParamError> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value {
        Number::Int(v) if v < 0 => Err(ParamError::Negative {
            param,
            value: value.render(),
        }),
        Number::Int(v) => Ok(Some(v as u64)),
        Number::Float(f) if !f.is_finite() => Err(ParamError::NotFinite {
            param,
            value: value.render(),
        }),
        Number::Float(f) if f.fract() != 0.0 => Err(ParamError::Fractional {
            param,
            value: value.render(),
        }),
        Number::Float(f) if f < 0.0 => Err(ParamError::Negative {
            param,
            value: value.render(),
        }),
        // u64::MAX as f64 rounds up to 2^64, which is already out of range.
        Number::Float(f) if f >= u64::MAX as f64 => Err(ParamError::OutOfRange {
            param,
            value: value.render(),
        }),
        Number::Float(f) => Ok(Some(f as u64)),
    }
}

/// Validate trade-value bounds independently. An inverted range is allowed.
pub fn validate_value_bounds(
    min: Option<Number>,
    max: Option<Number>,
) -> Result<(Option<u64>, Option<u64>), ParamError> {
    Ok((
        validate_bound("trade_val_min", min)?,
        validate_bound("trade_val_max", max)?,
    ))
}

/// Clamp the result-count cap into `[MIN_RESULTS, MAX_RESULTS]`.
/// Out-of-range values are clamped, never rejected.
pub fn validate_result_cap(n: Number) -> Result<u32, ParamError> {
    match n {
        Number::Int(v) => Ok(v.clamp(MIN_RESULTS.into(), MAX_RESULTS.into()) as u32),
        Number::Float(f) if f.is_nan() => Err(ParamError::NotFinite {
            param: "num_results",
            value: n.render(),
        }),
        Number::Float(f) => Ok(f.clamp(MIN_RESULTS as f64, MAX_RESULTS as f64) as u32),
    }
}

/// The five optional parameters of a scrape request, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeRequest {
    pub trade_types: Option<Selection>,
    pub job_titles: Option<Selection>,
    pub trade_val_min: Option<Number>,
    pub trade_val_max: Option<Number>,
    pub num_results: Option<Number>,
}

impl ScrapeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trade_types(mut self, value: impl Into<Selection>) -> Self {
        self.trade_types = Some(value.into());
        self
    }

    pub fn job_titles(mut self, value: impl Into<Selection>) -> Self {
        self.job_titles = Some(value.into());
        self
    }

    pub fn trade_val_min(mut self, value: impl Into<Number>) -> Self {
        self.trade_val_min = Some(value.into());
        self
    }

    pub fn trade_val_max(mut self, value: impl Into<Number>) -> Self {
        self.trade_val_max = Some(value.into());
        self
    }

    pub fn num_results(mut self, value: impl Into<Number>) -> Self {
        self.num_results = Some(value.into());
        self
    }

    /// Build a request from a loosely typed JSON object, validating the
    /// shape of every field.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ParamError> {
        let field = |name: &str| value.get(name).unwrap_or(&serde_json::Value::Null);
        Ok(Self {
            trade_types: Selection::from_json("trade_types", field("trade_types"))?,
            job_titles: Selection::from_json("job_titles", field("job_titles"))?,
            trade_val_min: Number::from_json("trade_val_min", field("trade_val_min"))?,
            trade_val_max: Number::from_json("trade_val_max", field("trade_val_max"))?,
            num_results: Number::from_json("num_results", field("num_results"))?,
        })
    }
}
