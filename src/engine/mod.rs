//! Query engine over an in-memory transaction history.
//!
//! Every function here is pure: it takes a slice of transactions and returns
//! new data. Nothing in this module touches the store, the network or the
//! terminal.

mod aggregate;
mod errors;
mod insights;
mod query;

pub use aggregate::{aggregate, percentage, Aggregates, AmountBuckets, ScoreBands, StatusCounts, StatusRates, TodaySummary};
pub use errors::QueryError;
pub use insights::{insights, Insight, Severity};
pub use query::{filter, group_by_date, load, sort, DateGroup, FilterCriteria, SortKey};
