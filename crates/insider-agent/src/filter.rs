use std::collections::BTreeSet;

use insider_models::{
    validate_trade_types, Dataset, Number, ParamError, QueryDescriptor, ScrapeRequest, TradeType,
    ValueBounds,
};

/// A scrape request after every parameter has been validated.
///
/// The descriptor holds what the remote request can express; trade types
/// never reach the remote side and are only ever applied locally.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedQuery {
    pub descriptor: QueryDescriptor,
    pub trade_types: BTreeSet<TradeType>,
}

impl ValidatedQuery {
    pub fn from_request(request: &ScrapeRequest, default_num_results: u32) -> Result<Self, ParamError> {
        let trade_types = validate_trade_types(request.trade_types.as_ref())?;
        let descriptor = QueryDescriptor::new(
            request.job_titles.as_ref(),
            request.trade_val_min,
            request.trade_val_max,
            request.num_results.unwrap_or(Number::from(default_num_results)),
        )?;
        Ok(Self {
            descriptor,
            trade_types,
        })
    }

    pub fn post_filter(&self) -> PostFilter {
        PostFilter {
            trade_types: (self.trade_types.len() < TradeType::ALL.len())
                .then(|| self.trade_types.clone()),
            bounds: self.descriptor.bounds(),
            limit: self.descriptor.num_results() as usize,
        }
    }
}

/// Local narrowing of a fetched dataset.
///
/// Cached datasets may have been fetched under wider value bounds and
/// always include every trade type, so both are re-applied here.
#[derive(Debug, Clone, PartialEq)]
pub struct PostFilter {
    /// `None` admits every row, including codes outside the vocabulary.
    pub trade_types: Option<BTreeSet<TradeType>>,
    /// Compared against the trade's dollar size, `|value|`.
    pub bounds: ValueBounds,
    pub limit: usize,
}

impl PostFilter {
    pub fn apply(&self, dataset: &Dataset) -> Dataset {
        let mut narrowed = dataset.filtered(|row| {
            let type_ok = match &self.trade_types {
                Some(types) => row
                    .trade_kind
                    .trade_type()
                    .is_some_and(|t| types.contains(&t)),
                None => true,
            };
            type_ok && self.bounds.contains(row.magnitude())
        });
        narrowed.rows.truncate(self.limit);
        narrowed
    }
}
