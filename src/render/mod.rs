
use chrono::NaiveDate;
use std::io::{self, Write};

use crate::dashboard::{HistoryView, ViewState};
use crate::engine::{Aggregates, Insight, StatusCounts};
use crate::models::{Transaction, NOT_AVAILABLE};

const TOP_COUNTRY_LIMIT: usize = 8;

/// Writes the grouped history with its shown/total counter, newest date first.
pub fn write_history<W: Write>(view: &HistoryView, output: &mut W) -> io::Result<()> {
    match &view.state {
        ViewState::Loading => return writeln!(output, "Loading history..."),
        ViewState::Empty => return writeln!(output, "No transactions yet."),
        ViewState::NoMatches => {
            return writeln!(output, "No transactions match the current filters ({} in history).", view.total);
        },
        ViewState::Failed(reason) => return writeln!(output, "Error loading history: {reason}"),
        ViewState::Ready => {}
    }

    writeln!(output, "Showing {} of {} transactions ({})", view.shown, view.total, status_line(&view.statuses))?;

    for group in &view.groups {
        writeln!(output)?;
        writeln!(output, "{}", date_heading(&group.date))?;

        for transaction in &group.transactions {
            let input = &transaction.input;

            writeln!(
                output,
                "  {}  {:<8}  {:>6} ({})  {}  {}  {}  {}",
                display_time(transaction),
                transaction.status().as_str().to_uppercase(),
                transaction.fraud_percent(),
                transaction.risk_class().map_or(NOT_AVAILABLE, |class| class.label()),
                input.name(),
                input.amount,
                input.country(),
                transaction.reason()
            )?;
        }
    }

    Ok(())
}

/// Writes the aggregate figures followed by the insights.
pub fn write_stats<W: Write>(aggregates: &Aggregates, insights: &[Insight], output: &mut W) -> io::Result<()> {
    let statuses = &aggregates.statuses;
    let rates = &aggregates.rates;

    writeln!(output, "Total transactions: {}", aggregates.total)?;
    writeln!(output, "  Approved: {} ({:.1}%)", statuses.approved, rates.approved)?;
    writeln!(output, "  Review:   {} ({:.1}%)", statuses.review, rates.review)?;
    writeln!(output, "  Declined: {} ({:.1}%)", statuses.declined, rates.declined)?;

    if statuses.unknown > 0 {
        writeln!(output, "  Unknown:  {}", statuses.unknown)?;
    }

    let today = &aggregates.today;
    writeln!(output)?;
    writeln!(
        output,
        "Today ({}): {} transactions ({}), average fraud score {:.1}%",
        today.date, today.count, status_line(&today.statuses), today.average_score_percent
    )?;

    let averages = &aggregates.average_scores;
    writeln!(
        output,
        "Average fraud score: approved {:.1}%, review {:.1}%, declined {:.1}%",
        averages.approved, averages.review, averages.declined
    )?;

    let bands = &aggregates.score_bands;
    writeln!(output, "Risk: low {}, medium {}, high {}", bands.low, bands.medium, bands.high)?;

    let amounts = &aggregates.amounts;
    writeln!(
        output,
        "Amounts: <10K {}, 10K-50K {}, 50K-100K {}, >100K {}",
        amounts.small, amounts.medium, amounts.large, amounts.very_large
    )?;

    if amounts.unbucketed > 0 {
        writeln!(output, "  Unreadable amounts: {}", amounts.unbucketed)?;
    }

    let countries = aggregates.top_countries(TOP_COUNTRY_LIMIT);
    if !countries.is_empty() {
        writeln!(output)?;
        writeln!(output, "Top countries:")?;

        for (country, count) in countries {
            writeln!(output, "  {country:<12} {count}")?;
        }
    }

    let timeline = aggregates.timeline();
    if !timeline.is_empty() {
        writeln!(output)?;
        writeln!(output, "Timeline:")?;

        for (date, count) in timeline {
            writeln!(output, "  {date}  {count}")?;
        }
    }

    if !insights.is_empty() {
        writeln!(output)?;
        writeln!(output, "Insights:")?;

        for insight in insights {
            writeln!(output, "  [{}] {}", insight.severity.label(), insight.message)?;
        }
    }

    Ok(())
}

/// Plain-text detail block for one transaction.
pub fn copy_text(transaction: &Transaction) -> String {
    format!(
        "Transaction Details\n-------------------\nName: {}\nStatus: {}\nFraud Score: {}\nTimestamp: {}",
        transaction.input.name(),
        transaction.status().as_str().to_uppercase(),
        transaction.fraud_percent(),
        transaction.timestamp
    )
}

fn status_line(statuses: &StatusCounts) -> String {
    let mut line = format!(
        "approved {}, review {}, declined {}",
        statuses.approved, statuses.review, statuses.declined
    );

    if statuses.unknown > 0 {
        line.push_str(&format!(", unknown {}", statuses.unknown));
    }

    line
}

fn date_heading(date: &str) -> String {
    date.parse::<NaiveDate>()
        .map(|day| day.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

fn display_time(transaction: &Transaction) -> String {
    transaction.parsed_timestamp()
        .map(|moment| moment.format("%I:%M:%S %p").to_string())
        .unwrap_or_else(|| transaction.time().to_string())
}
