mod errors;

use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;
use tracing::info;

use crate::models::{Transaction, NOT_AVAILABLE};

pub use errors::ExportError;

pub const HEADER: [&str; 10] = [
    "Date", "Time", "Name", "Account", "Amount", "Country", "IFSC", "Fraud Score", "Status", "Reason"
];

/// Writes the transactions as CSV, in the order given, and returns the number of rows written.
///
/// Text fields are quoted with embedded quotes doubled; amount and fraud score
/// (as a percentage with one decimal) are written as bare numbers.
pub fn write_csv<W: Write>(transactions: &[Transaction], mut output: W) -> Result<usize, ExportError> {
    if transactions.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    //NOTE: The header goes out unquoted, the csv writer would quote every non-numeric field of it
    writeln!(output, "{}", HEADER.join(","))?;

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(output);

    for transaction in transactions {
        let input = &transaction.input;
        let amount = input.amount.to_string();
        let score = transaction.fraud_score()
            .map(|score| format!("{:.1}", score * 100.0))
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        writer.write_record([
            transaction.date(),
            transaction.time(),
            input.name(),
            input.account(),
            amount.as_str(),
            input.country(),
            input.ifsc(),
            score.as_str(),
            transaction.status().as_str(),
            transaction.reason()
        ])?;
    }

    writer.flush()?;

    info!("Exported {} transactions to CSV", transactions.len());

    Ok(transactions.len())
}

pub fn to_csv_string(transactions: &[Transaction]) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_csv(transactions, &mut buffer)?;

    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
