pub mod config;
pub mod dataset;
pub mod descriptor;
pub mod error;
pub mod params;
pub mod vocab;

pub use config::{AgentConfig, CacheConfig, InsiderConfig};
pub use dataset::{Dataset, InsiderTrade, RawTable, TradeKind, COLUMNS};
pub use descriptor::{FetchKey, QueryDescriptor, ValueBounds};
pub use error::ParamError;
pub use params::{
    validate_result_cap, validate_titles, validate_trade_types, validate_value_bounds, Number,
    ScrapeRequest, Selection, MAX_RESULTS, MIN_RESULTS,
};
pub use vocab::{Direction, FilingType, JobTitle, TradeType};
