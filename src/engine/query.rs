use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::engine::errors::QueryError;
use crate::models::Transaction;

/// Predicates applied by [`filter`]. Absent or blank fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub search_term: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    DateAsc,
    #[default]
    DateDesc,
    ScoreAsc,
    ScoreDesc,
    AmountAsc,
    AmountDesc
}

/// Transactions sharing one calendar date, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup {
    pub date: String,
    pub transactions: Vec<Transaction>
}

/// Flattens a date-grouped history payload into a single list.
///
/// No order is implied by the grouping; callers sort explicitly. A payload that
/// is not an object of arrays yields an empty list, and individual entries that
/// fail to deserialize are skipped so the rest of the history survives.
pub fn load(raw: &Value) -> Vec<Transaction> {
    let Some(groups) = raw.as_object() else {
        if !raw.is_null() {
            warn!("History payload is not grouped by date, ignoring it");
        }
        return Vec::new();
    };

    let mut transactions = Vec::new();

    for (date, entries) in groups {
        let Some(entries) = entries.as_array() else {
            warn!("History group [{date}] is not a list, skipping it");
            continue;
        };

        for entry in entries {
            match Transaction::deserialize(entry) {
                Ok(transaction) => transactions.push(transaction),
                Err(error) => warn!("Skipping malformed transaction in group [{date}]: {error}")
            }
        }
    }

    debug!("Loaded {} transactions from {} date groups", transactions.len(), groups.len());

    transactions
}

/// Returns the transactions matching every predicate in `criteria`, in input order.
pub fn filter(transactions: &[Transaction], criteria: &FilterCriteria) -> Vec<Transaction> {
    let search_term = criteria.search_term.as_deref()
        .map(|term| term.to_lowercase())
        .filter(|term| !term.is_empty());
    let status = criteria.status.as_deref()
        .map(str::trim)
        .filter(|status| !status.is_empty());
    //NOTE: ISO dates sort lexicographically in chronological order, so plain string comparison is enough
    let date_from = criteria.date_from.map(|date| date.to_string());
    let date_to = criteria.date_to.map(|date| date.to_string());

    transactions.iter()
        .filter(|transaction| search_term.as_deref().is_none_or(|term| matches_search(transaction, term)))
        .filter(|transaction| status.is_none_or(|status| transaction.status().matches(status)))
        .filter(|transaction| date_from.as_deref().is_none_or(|from| transaction.date() >= from))
        .filter(|transaction| date_to.as_deref().is_none_or(|to| transaction.date() <= to))
        .cloned()
        .collect()
}

/// Returns a sorted copy. The sort is stable, so equal keys keep their input order.
pub fn sort(transactions: &[Transaction], key: SortKey) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();

    match key {
        SortKey::DateAsc => sorted.sort_by(compare_timestamps),
        SortKey::DateDesc => sorted.sort_by(|a, b| compare_timestamps(b, a)),
        SortKey::ScoreAsc => sorted.sort_by(compare_scores),
        SortKey::ScoreDesc => sorted.sort_by(|a, b| compare_scores(b, a)),
        SortKey::AmountAsc => sorted.sort_by(|a, b| a.amount().cmp(&b.amount())),
        SortKey::AmountDesc => sorted.sort_by(|a, b| b.amount().cmp(&a.amount()))
    }

    sorted
}

/// Buckets transactions by date; dates newest first, each bucket newest first.
pub fn group_by_date(transactions: &[Transaction]) -> Vec<DateGroup> {
    let mut groups: BTreeMap<&str, Vec<Transaction>> = BTreeMap::new();

    for transaction in transactions {
        groups.entry(transaction.date()).or_default().push(transaction.clone());
    }

    groups.into_iter()
        .rev()
        .map(|(date, mut transactions)| {
            transactions.sort_by(|a, b| compare_timestamps(b, a));
            DateGroup { date: date.to_string(), transactions }
        })
        .collect()
}

fn matches_search(transaction: &Transaction, term: &str) -> bool {
    let input = &transaction.input;
    let contains = |field: Option<&str>| field.is_some_and(|text| text.to_lowercase().contains(term));

    contains(input.name.as_deref())
        || contains(input.account.as_deref())
        || contains(input.country.as_deref())
        || contains(input.ifsc.as_deref())
        || contains(Some(input.amount.raw()))
        || contains(transaction.result.reason.as_deref())
        || transaction.result.risk_factors.iter()
            .any(|factor| contains(Some(factor.factor.as_str())) || contains(Some(factor.comment.as_str())))
}

//NOTE: Missing scores order before every present one, like missing amounts
fn compare_scores(a: &Transaction, b: &Transaction) -> Ordering {
    match (a.fraud_score(), b.fraud_score()) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (a, b) => a.is_some().cmp(&b.is_some())
    }
}

//NOTE: Unparseable timestamps order before every parseable one, then by raw text, to keep the order total
fn compare_timestamps(a: &Transaction, b: &Transaction) -> Ordering {
    (a.parsed_timestamp(), &a.timestamp).cmp(&(b.parsed_timestamp(), &b.timestamp))
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::DateAsc => "date-asc",
            SortKey::DateDesc => "date-desc",
            SortKey::ScoreAsc => "score-asc",
            SortKey::ScoreDesc => "score-desc",
            SortKey::AmountAsc => "amount-asc",
            SortKey::AmountDesc => "amount-desc"
        }
    }
}

impl FromStr for SortKey {
    type Err = QueryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "date-asc" => Ok(SortKey::DateAsc),
            "date-desc" => Ok(SortKey::DateDesc),
            "score-asc" => Ok(SortKey::ScoreAsc),
            "score-desc" => Ok(SortKey::ScoreDesc),
            "amount-asc" => Ok(SortKey::AmountAsc),
            "amount-desc" => Ok(SortKey::AmountDesc),
            _ => Err(QueryError::UnknownSortKey(value.to_string()))
        }
    }
}

impl Display for SortKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
