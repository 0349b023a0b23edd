use std::io::{stderr, stdout, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use fraud_history::config::Config;
use fraud_history::dashboard::Dashboard;
use fraud_history::engine::{FilterCriteria, SortKey};
use fraud_history::export::write_csv;
use fraud_history::poller::PollEvent;
use fraud_history::render::{write_history, write_stats};
use fraud_history::session::Session;
use fraud_history::source::{FileHistorySource, HistorySource, HttpHistorySource};
use fraud_history::storage::TransactionStore;

#[derive(Parser, Debug)]
#[command(name = "fraud-history")]
#[command(version)]
#[command(about = "Browse, analyse and export fraud-scored payment history", long_about = None)]
struct Cli {
    /// Log level written to stderr: error, warn, info, debug, trace
    #[arg(long, default_value = "error")]
    log_level: String,
    /// Read history from a local JSON snapshot instead of the backend
    #[arg(long)]
    input: Option<PathBuf>,
    /// Backend base URL, overrides FRAUD_API_URL
    #[arg(long)]
    api_url: Option<String>,
    /// Session token, overrides FRAUD_API_TOKEN
    #[arg(long)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the filtered history grouped by date
    History(FilterArgs),
    /// Show aggregate figures and insights
    Stats {
        /// Day used for the daily summary, defaults to the local date
        #[arg(long)]
        today: Option<NaiveDate>
    },
    /// Write the filtered history as CSV to stdout
    Export(FilterArgs),
    /// Poll for new transactions until interrupted
    Watch {
        /// Poll interval, overrides FRAUD_POLL_INTERVAL_MS
        #[arg(long)]
        interval_ms: Option<u64>
    },
    /// Clear all history at the source
    Clear
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Case-insensitive text matched against every transaction field
    #[arg(long)]
    search: Option<String>,
    /// approved, review or declined
    #[arg(long)]
    status: Option<String>,
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,
    /// date-desc, date-asc, score-desc, score-asc, amount-desc or amount-asc
    #[arg(long, default_value_t = SortKey::DateDesc)]
    sort: SortKey
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            search_term: self.search.clone(),
            status: self.status.clone(),
            date_from: self.from,
            date_to: self.to
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(parse_log_level(&cli.log_level));

    let config = Config::from_env();
    let source: Arc<dyn HistorySource> = match &cli.input {
        Some(path) => Arc::new(FileHistorySource::new(path.clone())),
        None => {
            let api_url = cli.api_url.as_deref().unwrap_or(&config.api_url);
            Arc::new(HttpHistorySource::new(api_url, config.request_timeout)?)
        }
    };

    let session = Arc::new(Session::new(cli.token.clone().or(config.token.clone())));
    let storage = Arc::new(TransactionStore::new());
    let mut dashboard = Dashboard::open(storage, source, session)?;

    match cli.command {
        Command::Clear => {
            dashboard.clear_history().await?;
            println!("All history cleared");
            return Ok(());
        },
        Command::Watch { interval_ms } => {
            let period = interval_ms.map(Duration::from_millis).unwrap_or(config.poll_interval);
            return watch(dashboard, period).await;
        },
        _ => {}
    }

    let timer = Instant::now();
    dashboard.refresh().await?;
    info!("Loaded history in: {:?}", timer.elapsed());

    let mut output = BufWriter::new(stdout().lock());

    match &cli.command {
        Command::History(filters) => {
            let view = dashboard.view(&filters.criteria(), filters.sort);
            write_history(&view, &mut output)?;
        },
        Command::Export(filters) => {
            let view = dashboard.view(&filters.criteria(), filters.sort);
            write_csv(&view.sorted, &mut output)?;
        },
        Command::Stats { today } => {
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            write_stats(&dashboard.aggregates(today), &dashboard.insights(today), &mut output)?;
        },
        Command::Watch { .. } | Command::Clear => {}
    }

    output.flush()?;

    Ok(())
}

async fn watch(mut dashboard: Dashboard<TransactionStore>, period: Duration) -> Result<()> {
    let count = dashboard.refresh().await?;
    println!("Watching {count} transactions, polling every {period:?} (Ctrl-C to stop)");

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let handle = dashboard.start_polling(period, sender);
    let mut unauthorized = false;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = receiver.recv() => match event {
                Some(PollEvent::NewData { previous, current }) => {
                    println!("{} new transactions ({previous} -> {current})", current - previous);
                },
                Some(PollEvent::Unauthorized) => {
                    unauthorized = true;
                    break;
                },
                Some(PollEvent::Failed(reason)) => warn!("Poll failed: {reason}"),
                None => break
            }
        }
    }

    handle.shutdown().await?;

    if unauthorized {
        bail!("Session expired, log in again to keep watching");
    }

    Ok(())
}

fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        _ => {
            eprintln!("Invalid log level '{}', defaulting to 'error'", level);
            LevelFilter::ERROR
        }
    }
}

fn setup_logging(level: LevelFilter) {
    //NOTE: stdout carries command output such as CSV, so logging goes to stderr
    let terminal_log = fmt::layer()
        .with_target(false)
        .with_writer(stderr)
        .with_filter(level);

    tracing_subscriber::registry()
        .with(terminal_log)
        .init();
}
