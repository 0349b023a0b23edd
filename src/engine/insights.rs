use crate::engine::aggregate::Aggregates;
use crate::models::Transaction;

const ELEVATED_DECLINE_RATE: f64 = 20.0;
const MODERATE_DECLINE_RATE: f64 = 10.0;
const LOW_DECLINE_RATE: f64 = 5.0;
const HIGH_LARGE_AMOUNT_RATE: f64 = 30.0;
const HIGH_REVIEW_RATE: f64 = 20.0;
const TOP_COUNTRY_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Danger
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub severity: Severity,
    pub message: String
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Success => "OK",
            Severity::Info => "INFO",
            Severity::Warning => "WARN",
            Severity::Danger => "ALERT"
        }
    }
}

/// Plain-language observations about a history. Empty when there is nothing to observe.
pub fn insights(aggregates: &Aggregates, transactions: &[Transaction]) -> Vec<Insight> {
    if aggregates.total == 0 {
        return Vec::new();
    }

    let mut insights = Vec::with_capacity(5);
    insights.push(decline_rate(aggregates));
    insights.push(top_countries(aggregates));
    insights.push(large_amounts(aggregates));
    insights.push(review_rate(aggregates));

    if let Some(insight) = highest_score(transactions) {
        insights.push(insight);
    }

    insights
}

fn decline_rate(aggregates: &Aggregates) -> Insight {
    let rate = to_tenth(aggregates.rates.declined);
    let severity = if rate > ELEVATED_DECLINE_RATE {
        Severity::Danger
    } else if rate > MODERATE_DECLINE_RATE {
        Severity::Warning
    } else {
        Severity::Success
    };
    let verdict = if rate > ELEVATED_DECLINE_RATE {
        "This is elevated - review your risk rules!"
    } else if rate < LOW_DECLINE_RATE {
        "Good acceptance rate."
    } else {
        "Moderate fraud detection."
    };

    Insight {
        severity,
        message: format!(
            "Fraud decline rate is {rate:.1}% ({} declined out of {} transactions). {verdict}",
            aggregates.statuses.declined, aggregates.total
        )
    }
}

fn top_countries(aggregates: &Aggregates) -> Insight {
    let countries = aggregates.top_countries(TOP_COUNTRY_COUNT).iter()
        .map(|(country, count)| format!("{country} ({count})"))
        .collect::<Vec<_>>()
        .join(", ");

    Insight {
        severity: Severity::Info,
        message: format!("Top countries by transaction volume: {countries}")
    }
}

fn large_amounts(aggregates: &Aggregates) -> Insight {
    let rate = to_tenth(aggregates.large_amount_rate());

    if rate > HIGH_LARGE_AMOUNT_RATE {
        Insight {
            severity: Severity::Warning,
            message: format!("{rate:.1}% of transactions are large amounts (>50K). Monitor high-value transactions carefully.")
        }
    } else {
        Insight {
            severity: Severity::Success,
            message: format!("{rate:.1}% of transactions are large amounts (>50K). Good distribution of transaction sizes.")
        }
    }
}

fn review_rate(aggregates: &Aggregates) -> Insight {
    let rate = to_tenth(aggregates.rates.review);

    if rate > HIGH_REVIEW_RATE {
        Insight {
            severity: Severity::Warning,
            message: format!("{rate:.1}% of transactions are under review. You may want to review your threshold settings.")
        }
    } else {
        Insight {
            severity: Severity::Success,
            message: format!("{rate:.1}% of transactions are under review. Good balance between approved and flagged transactions.")
        }
    }
}

fn highest_score(transactions: &[Transaction]) -> Option<Insight> {
    let highest = transactions.iter()
        .filter_map(|transaction| transaction.fraud_score().map(|score| (transaction, score)))
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })
        .map(|(transaction, _)| transaction)?;

    Some(Insight {
        severity: Severity::Danger,
        message: format!(
            "Highest fraud score: {} for transaction by {} from {}. Status: {}",
            highest.fraud_percent(),
            highest.input.name(),
            highest.input.country(),
            highest.status().as_str().to_uppercase()
        )
    })
}

//NOTE: Thresholds apply to the rate as displayed, so 20.04% reads and rates as 20.0%
fn to_tenth(rate: f64) -> f64 {
    (rate * 10.0).round() / 10.0
}
