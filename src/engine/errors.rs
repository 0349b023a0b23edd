use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Unknown sort key '{0}', expected one of: date-asc, date-desc, score-asc, score-desc, amount-asc, amount-desc")]
    UnknownSortKey(String)
}
