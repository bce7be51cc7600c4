pub mod agent;
pub mod aggregate;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod normalizer;

pub mod test_support;

pub use agent::QueryAgent;
pub use aggregate::{aggregate, top_n, AggregateRow, Aggregation, GroupBy};
pub use error::{DataFormatError, FetchError, QueryError};
pub use filter::{PostFilter, ValidatedQuery};
pub use gateway::FetchGateway;
pub use normalizer::normalize;
