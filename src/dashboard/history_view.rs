use crate::engine::{filter, group_by_date, sort, DateGroup, FilterCriteria, SortKey, StatusCounts};
use crate::models::Transaction;

/// What a history view has to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// A fetch is in flight and nothing has been loaded yet.
    Loading,
    /// There are transactions matching the current criteria.
    Ready,
    /// The history itself holds no transactions.
    Empty,
    /// The history has transactions, but none match the current criteria.
    NoMatches,
    /// The last fetch failed; the reason is shown instead of the history.
    Failed(String)
}

/// Filtered, sorted and date-grouped history with its counters.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryView {
    pub state: ViewState,
    pub groups: Vec<DateGroup>,
    pub sorted: Vec<Transaction>,
    pub shown: usize,
    pub total: usize,
    /// Status breakdown of the shown transactions.
    pub statuses: StatusCounts
}

impl HistoryView {
    pub fn build(transactions: &[Transaction], criteria: &FilterCriteria, sort_key: SortKey) -> Self {
        let filtered = filter(transactions, criteria);
        let sorted = sort(&filtered, sort_key);
        let groups = group_by_date(&sorted);

        let mut statuses = StatusCounts::default();
        for transaction in &sorted {
            statuses.record(transaction.status());
        }

        let state = if transactions.is_empty() {
            ViewState::Empty
        } else if sorted.is_empty() {
            ViewState::NoMatches
        } else {
            ViewState::Ready
        };

        Self {
            state,
            groups,
            shown: sorted.len(),
            total: transactions.len(),
            sorted,
            statuses
        }
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            state: ViewState::Failed(reason.to_string()),
            groups: Vec::new(),
            sorted: Vec::new(),
            shown: 0,
            total: 0,
            statuses: StatusCounts::default()
        }
    }
}
