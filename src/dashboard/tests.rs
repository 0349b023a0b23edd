use super::{Dashboard, ViewState};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::engine::{FilterCriteria, SortKey};
use crate::fixtures::sample_history;
use crate::poller::PollEvent;
use crate::session::{Session, SessionError};
use crate::source::{FileHistorySource, HistorySource, SourceError};
use crate::storage::{Storage, TransactionStore};

struct RejectingSource;

#[async_trait]
impl HistorySource for RejectingSource {
    async fn fetch_history(&self, _credential: &str) -> Result<Value, SourceError> {
        Err(SourceError::Unauthorized)
    }

    async fn clear_history(&self) -> Result<(), SourceError> {
        Err(SourceError::Unauthorized)
    }

    fn describe(&self) -> String {
        "rejecting".to_string()
    }
}

fn history_file(contents: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    write!(file, "{contents}")?;
    Ok(file)
}

fn file_dashboard(file: &NamedTempFile) -> Result<Dashboard<TransactionStore>> {
    let source = Arc::new(FileHistorySource::new(file.path()));
    Ok(Dashboard::open(Arc::new(TransactionStore::new()), source, Arc::new(Session::new(None)))?)
}

fn today() -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(2024, 1, 2).ok_or_else(|| anyhow::anyhow!("invalid date"))
}

#[test]
fn test_open_requires_credential_for_authenticated_sources() {
    let result = Dashboard::open(Arc::new(TransactionStore::new()), Arc::new(RejectingSource), Arc::new(Session::new(None)));

    assert!(matches!(result, Err(SessionError::MissingCredential)));
}

#[tokio::test]
async fn test_refresh_loads_history_into_ready_view() -> Result<()> {
    let file = history_file(&sample_history().to_string())?;
    let mut dashboard = file_dashboard(&file)?;

    assert_eq!(dashboard.state(), &ViewState::Loading);
    assert_eq!(dashboard.refresh().await?, 4);
    assert_eq!(dashboard.state(), &ViewState::Ready);

    let view = dashboard.view(&FilterCriteria::default(), SortKey::DateDesc);

    assert_eq!(view.state, ViewState::Ready);
    assert_eq!(view.shown, 4);
    assert_eq!(view.total, 4);
    assert_eq!(view.groups.len(), 2);
    assert_eq!(view.groups[0].date, "2024-01-02");
    assert_eq!(view.statuses.approved, 2);

    Ok(())
}

#[tokio::test]
async fn test_view_distinguishes_empty_history_from_no_matches() -> Result<()> {
    let empty_file = history_file("{}")?;
    let mut empty = file_dashboard(&empty_file)?;
    empty.refresh().await?;

    assert_eq!(empty.view(&FilterCriteria::default(), SortKey::DateDesc).state, ViewState::Empty);

    let file = history_file(&sample_history().to_string())?;
    let mut dashboard = file_dashboard(&file)?;
    dashboard.refresh().await?;

    let criteria = FilterCriteria {
        search_term: Some("nobody matches this".to_string()),
        ..FilterCriteria::default()
    };
    let view = dashboard.view(&criteria, SortKey::DateDesc);

    assert_eq!(view.state, ViewState::NoMatches);
    assert_eq!(view.shown, 0);
    assert_eq!(view.total, 4);
    assert_eq!(dashboard.session().recent_searches(), vec!["nobody matches this".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_refresh_failure_is_shown_in_the_view() -> Result<()> {
    let file = history_file("{ broken")?;
    let mut dashboard = file_dashboard(&file)?;

    assert!(matches!(dashboard.refresh().await, Err(SourceError::Decode(_))));
    assert!(matches!(dashboard.state(), ViewState::Failed(_)));
    assert!(matches!(dashboard.view(&FilterCriteria::default(), SortKey::DateDesc).state, ViewState::Failed(_)));

    Ok(())
}

#[tokio::test]
async fn test_rejected_credential_is_cleared_on_refresh() -> Result<()> {
    let session = Arc::new(Session::new(Some("stale".to_string())));
    let mut dashboard = Dashboard::open(Arc::new(TransactionStore::new()), Arc::new(RejectingSource), session.clone())?;

    assert!(matches!(dashboard.refresh().await, Err(SourceError::Unauthorized)));
    assert!(!session.is_authenticated());

    Ok(())
}

#[tokio::test]
async fn test_clear_history_empties_source_and_store() -> Result<()> {
    let file = history_file(&sample_history().to_string())?;
    let mut dashboard = file_dashboard(&file)?;
    dashboard.refresh().await?;

    dashboard.clear_history().await?;

    assert!(dashboard.transactions().is_empty());
    assert_eq!(dashboard.refresh().await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_aggregates_and_insights_follow_the_store() -> Result<()> {
    let file = history_file(&sample_history().to_string())?;
    let mut dashboard = file_dashboard(&file)?;
    dashboard.refresh().await?;

    let aggregates = dashboard.aggregates(today()?);

    assert_eq!(aggregates.total, 4);
    assert_eq!(aggregates.today.count, 1);
    assert_eq!(dashboard.insights(today()?).len(), 5);

    Ok(())
}

#[tokio::test]
async fn test_polling_picks_up_appended_history() -> Result<()> {
    let file = history_file("{}")?;
    let mut dashboard = file_dashboard(&file)?;
    dashboard.refresh().await?;

    let (sender, mut receiver) = mpsc::unbounded_channel();
    let handle = dashboard.start_polling(Duration::from_millis(10), sender);

    std::fs::write(file.path(), sample_history().to_string())?;

    //NOTE: A tick can observe the file mid-write, those show up as failed polls
    let event = timeout(Duration::from_secs(5), async {
        loop {
            match receiver.recv().await {
                Some(PollEvent::Failed(_)) => continue,
                other => return other
            }
        }
    }).await?;

    assert_eq!(event, Some(PollEvent::NewData { previous: 0, current: 4 }));
    assert_eq!(dashboard.transactions().len(), 4);

    handle.shutdown().await?;

    Ok(())
}
