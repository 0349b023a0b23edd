use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{RiskClass, Status, Transaction};

const SMALL_LIMIT: i64 = 10_000;
const MEDIUM_LIMIT: i64 = 50_000;
const LARGE_LIMIT: i64 = 100_000;

/// Per-status totals. `unknown` holds statuses outside the three known outcomes,
/// so the four fields always add up to the number of transactions counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub approved: usize,
    pub review: usize,
    pub declined: usize,
    pub unknown: usize
}

/// Amount ranges: small < 10 000, medium < 50 000, large < 100 000, very large otherwise.
/// Amounts that could not be read as numbers land in `unbucketed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmountBuckets {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
    pub very_large: usize,
    pub unbucketed: usize
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBands {
    pub low: usize,
    pub medium: usize,
    pub high: usize
}

/// Percentages (0-100) per known status.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusRates {
    pub approved: f64,
    pub review: f64,
    pub declined: f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct TodaySummary {
    pub date: NaiveDate,
    pub count: usize,
    pub statuses: StatusCounts,
    /// Mean fraud score of today's scored transactions as a percentage, 0 when there are none.
    pub average_score_percent: f64
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub total: usize,
    pub statuses: StatusCounts,
    pub rates: StatusRates,
    pub countries: BTreeMap<String, usize>,
    pub amounts: AmountBuckets,
    pub score_bands: ScoreBands,
    /// Mean fraud score per status as a percentage, over the transactions that carry a score.
    pub average_scores: StatusRates,
    pub daily: BTreeMap<String, StatusCounts>,
    pub today: TodaySummary
}

impl StatusCounts {
    pub fn record(&mut self, status: &Status) {
        match status {
            Status::Approved => self.approved += 1,
            Status::Review => self.review += 1,
            Status::Declined => self.declined += 1,
            Status::Unknown(raw) => {
                debug!("Counting unknown status '{raw}' separately");
                self.unknown += 1
            }
        }
    }

    pub fn total(&self) -> usize {
        self.approved + self.review + self.declined + self.unknown
    }
}

impl AmountBuckets {
    pub fn record(&mut self, amount: Option<Decimal>) {
        let Some(amount) = amount else {
            self.unbucketed += 1;
            return;
        };

        if amount < Decimal::from(SMALL_LIMIT) {
            self.small += 1;
        } else if amount < Decimal::from(MEDIUM_LIMIT) {
            self.medium += 1;
        } else if amount < Decimal::from(LARGE_LIMIT) {
            self.large += 1;
        } else {
            self.very_large += 1;
        }
    }
}

impl ScoreBands {
    pub fn record(&mut self, score: f64) {
        match RiskClass::from_score(score) {
            RiskClass::Low => self.low += 1,
            RiskClass::Medium => self.medium += 1,
            RiskClass::High => self.high += 1
        }
    }
}

impl Aggregates {
    /// Countries by transaction count, highest first, ties in name order.
    pub fn top_countries(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut countries: Vec<(&str, usize)> = self.countries.iter()
            .map(|(country, count)| (country.as_str(), *count))
            .collect();

        countries.sort_by(|a, b| b.1.cmp(&a.1));
        countries.truncate(limit);
        countries
    }

    /// Total transactions per day in ascending date order.
    pub fn timeline(&self) -> Vec<(&str, usize)> {
        self.daily.iter()
            .map(|(date, counts)| (date.as_str(), counts.total()))
            .collect()
    }

    /// Share of large and very large amounts, as a percentage of all transactions.
    pub fn large_amount_rate(&self) -> f64 {
        percentage(self.amounts.large + self.amounts.very_large, self.total)
    }
}

/// Computes every aggregate over `transactions`. `today` selects the daily summary.
pub fn aggregate(transactions: &[Transaction], today: NaiveDate) -> Aggregates {
    let today_key = today.to_string();
    let mut statuses = StatusCounts::default();
    let mut countries = BTreeMap::new();
    let mut amounts = AmountBuckets::default();
    let mut score_bands = ScoreBands::default();
    let mut daily: BTreeMap<String, StatusCounts> = BTreeMap::new();
    let mut score_sums = StatusRates::default();
    let mut scored = StatusCounts::default();
    let mut today_statuses = StatusCounts::default();
    let mut today_score_sum = 0.0;
    let mut today_scored = 0;

    for transaction in transactions {
        let status = transaction.status();
        let score = transaction.fraud_score();

        statuses.record(status);
        *countries.entry(transaction.input.country().to_string()).or_insert(0) += 1;
        amounts.record(transaction.amount());
        daily.entry(transaction.date().to_string()).or_default().record(status);

        let is_today = transaction.date() == today_key;
        if is_today {
            today_statuses.record(status);
        }

        //NOTE: Transactions without a score still count above, they only stay out of the score figures
        let Some(score) = score else {
            debug!("Transaction {} has no fraud score, leaving it out of score aggregates", transaction.key);
            continue;
        };

        score_bands.record(score);
        scored.record(status);

        match status {
            Status::Approved => score_sums.approved += score,
            Status::Review => score_sums.review += score,
            Status::Declined => score_sums.declined += score,
            Status::Unknown(_) => {}
        }

        if is_today {
            today_score_sum += score;
            today_scored += 1;
        }
    }

    let total = transactions.len();
    let today_count = today_statuses.total();

    Aggregates {
        total,
        statuses,
        rates: StatusRates {
            approved: percentage(statuses.approved, total),
            review: percentage(statuses.review, total),
            declined: percentage(statuses.declined, total)
        },
        countries,
        amounts,
        score_bands,
        average_scores: StatusRates {
            approved: average_percent(score_sums.approved, scored.approved),
            review: average_percent(score_sums.review, scored.review),
            declined: average_percent(score_sums.declined, scored.declined)
        },
        daily,
        today: TodaySummary {
            date: today,
            count: today_count,
            statuses: today_statuses,
            average_score_percent: average_percent(today_score_sum, today_scored)
        }
    }
}

/// `part / total` as a percentage; 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }

    part as f64 / total as f64 * 100.0
}

fn average_percent(sum: f64, count: usize) -> f64 {
    sum / count.max(1) as f64 * 100.0
}
