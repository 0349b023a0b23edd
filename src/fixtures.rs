use anyhow::Result;
use serde_json::{json, Map, Value};

use crate::models::Transaction;

/// A backend history entry in the shape `/get-history-by-date` returns.
pub fn raw_transaction(timestamp: &str, status: &str, score: f64, amount: Value, country: &str) -> Value {
    json!({
        "timestamp": timestamp,
        "input": {
            "name": format!("holder {country}"),
            "account": "123456789012",
            "country": country,
            "ifsc": "SBIN0001234",
            "amount": amount
        },
        "result": {
            "status": status,
            "fraudScore": score,
            "reason": format!("Scored {status}"),
            "riskFactors": [
                { "factor": "Geographic Risk", "risk": "Low", "comment": format!("Country '{country}' has normal fraud risk") }
            ]
        }
    })
}

pub fn transaction(timestamp: &str, status: &str, score: f64, amount: Value, country: &str) -> Result<Transaction> {
    Ok(serde_json::from_value(raw_transaction(timestamp, status, score, amount, country))?)
}

/// Groups raw entries by the date portion of their timestamp.
pub fn grouped(entries: Vec<Value>) -> Value {
    let mut groups = Map::new();

    for entry in entries {
        let date = entry["timestamp"].as_str().unwrap_or_default().split('T').next().unwrap_or_default().to_string();
        let group = groups.entry(date).or_insert_with(|| Value::Array(Vec::new()));

        if let Value::Array(items) = group {
            items.push(entry);
        }
    }

    Value::Object(groups)
}

/// Three transactions on 2024-01-01 (approved, review, declined) and one approved on 2024-01-02.
pub fn sample_history() -> Value {
    grouped(vec![
        raw_transaction("2024-01-01T09:00:00", "approved", 0.12, json!(5000), "IN"),
        raw_transaction("2024-01-01T12:30:00", "review", 0.55, json!("45000"), "US"),
        raw_transaction("2024-01-01T18:45:00", "declined", 0.85, json!(150000), "NG"),
        raw_transaction("2024-01-02T08:15:00", "approved", 0.2, json!("75000.50"), "IN"),
    ])
}
