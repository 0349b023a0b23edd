use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::{RiskClass, Status, NOT_AVAILABLE};
use crate::types::{Amount, TransactionKey};

/// A single scored payment request from the history.
///
/// Transactions are immutable once the store has ingested them; every query
/// produces a new list instead of editing this one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Transaction {
    /// Assigned by the store on ingestion, unique within that store.
    #[serde(skip)]
    pub key: TransactionKey,
    /// Identifier sent by the backend, if any. Not guaranteed unique.
    #[serde(default, deserialize_with = "deserialize_opaque_id")]
    pub id: Option<String>,
    /// ISO-8601 date-time; the ordering and grouping key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub input: PaymentInput,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Decision
}

/// The payment request as submitted for scoring.
///
/// The backend stores the submitted form body verbatim, so both the short
/// field names and the form's own names are accepted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PaymentInput {
    #[serde(default, alias = "accountHolder")]
    pub name: Option<String>,
    #[serde(default, alias = "accountNumber")]
    pub account: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default, alias = "ifscCode")]
    pub ifsc: Option<String>,
    #[serde(default)]
    pub amount: Amount
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Decision {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: Status,
    /// `None` when the backend sent no usable score; such transactions stay out of score aggregates.
    #[serde(rename = "fraudScore", default, deserialize_with = "deserialize_score")]
    pub fraud_score: Option<f64>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(rename = "riskFactors", default, deserialize_with = "null_as_default")]
    pub risk_factors: Vec<RiskFactor>
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RiskFactor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub factor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub risk: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String
}

impl Transaction {
    /// The date portion of the timestamp (`YYYY-MM-DD`).
    pub fn date(&self) -> &str {
        self.timestamp.split('T').next().unwrap_or_default()
    }

    /// The time-of-day portion of the timestamp, without fractional seconds.
    pub fn time(&self) -> &str {
        let Some((_, time)) = self.timestamp.split_once('T') else {
            return "";
        };

        time.split(['.', 'Z', '+']).next().unwrap_or_default()
    }

    /// Parsed timestamp, `None` when the backend sent something that is not ISO-8601.
    pub fn parsed_timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp.parse::<NaiveDateTime>().ok()
            .or_else(|| DateTime::parse_from_rfc3339(&self.timestamp).ok().map(|moment| moment.naive_utc()))
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.input.amount.value()
    }

    pub fn status(&self) -> &Status {
        &self.result.status
    }

    pub fn fraud_score(&self) -> Option<f64> {
        self.result.fraud_score
    }

    /// Fraud score as a percentage with one decimal place, e.g. `85.0%`, or `N/A` without a score.
    pub fn fraud_percent(&self) -> String {
        match self.result.fraud_score {
            Some(score) => format!("{:.1}%", score * 100.0),
            None => NOT_AVAILABLE.to_string()
        }
    }

    pub fn risk_class(&self) -> Option<RiskClass> {
        self.result.fraud_score.map(RiskClass::from_score)
    }

    pub fn reason(&self) -> &str {
        self.result.reason.as_deref().unwrap_or_default()
    }
}

impl PaymentInput {
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn account(&self) -> &str {
        self.account.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn country(&self) -> &str {
        self.country.as_deref().unwrap_or(NOT_AVAILABLE)
    }

    pub fn ifsc(&self) -> &str {
        self.ifsc.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string())
    };

    Ok(id)
}

//NOTE: The backend echoes stored records, so `null` shows up wherever a value was never set
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Value::deserialize(deserializer)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None
    };

    Ok(score.filter(|score| score.is_finite()))
}
