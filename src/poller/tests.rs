use super::{HistoryPoller, PollEvent};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

use crate::engine::load;
use crate::fixtures::{grouped, raw_transaction, sample_history};
use crate::session::Session;
use crate::source::{HistorySource, SourceError};
use crate::storage::{Storage, TransactionStore};

const PERIOD: Duration = Duration::from_millis(10);
const WAIT: Duration = Duration::from_secs(5);

/// Replays scripted responses, repeating the last one once the script runs out.
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<Value, SourceError>>>,
    fallback: Value,
    calls: AtomicUsize
}

impl ScriptedSource {
    fn new(responses: Vec<Result<Value, SourceError>>, fallback: Value) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            fallback,
            calls: AtomicUsize::new(0)
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistorySource for ScriptedSource {
    async fn fetch_history(&self, _credential: &str) -> Result<Value, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().map_err(|_| SourceError::Status(500))?.pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }

    async fn clear_history(&self) -> Result<(), SourceError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

fn one_transaction() -> Value {
    grouped(vec![raw_transaction("2024-01-01T09:00:00", "approved", 0.1, json!(100), "IN")])
}

async fn next_event(receiver: &mut mpsc::UnboundedReceiver<PollEvent>) -> Result<PollEvent> {
    timeout(WAIT, receiver.recv()).await?
        .ok_or_else(|| anyhow!("Poller closed its event channel"))
}

#[tokio::test]
async fn test_poller_replaces_store_when_more_transactions_appear() -> Result<()> {
    let storage = Arc::new(TransactionStore::new());
    storage.replace(load(&one_transaction()));
    let source = ScriptedSource::new(vec![Ok(one_transaction())], sample_history());
    let session = Arc::new(Session::new(Some("token".to_string())));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let handle = HistoryPoller::spawn(source.clone(), storage.clone(), session, PERIOD, sender);

    assert_eq!(next_event(&mut receiver).await?, PollEvent::NewData { previous: 1, current: 4 });
    assert_eq!(storage.len(), 4);

    handle.shutdown().await?;

    Ok(())
}

#[tokio::test]
async fn test_poller_ignores_unchanged_or_smaller_history() -> Result<()> {
    let storage = Arc::new(TransactionStore::new());
    storage.replace(load(&sample_history()));
    let source = ScriptedSource::new(vec![Ok(sample_history())], one_transaction());
    let session = Arc::new(Session::new(Some("token".to_string())));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let handle = HistoryPoller::spawn(source.clone(), storage.clone(), session, PERIOD, sender);

    timeout(WAIT, async {
        while source.calls() < 3 {
            sleep(PERIOD).await;
        }
    }).await?;
    handle.shutdown().await?;

    assert_eq!(storage.len(), 4);
    assert!(receiver.try_recv().is_err());

    Ok(())
}

#[tokio::test]
async fn test_poller_stops_and_clears_credential_on_unauthorized() -> Result<()> {
    let storage = Arc::new(TransactionStore::new());
    let source = ScriptedSource::new(vec![Err(SourceError::Unauthorized)], sample_history());
    let session = Arc::new(Session::new(Some("token".to_string())));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let handle = HistoryPoller::spawn(source.clone(), storage.clone(), session.clone(), PERIOD, sender);

    assert_eq!(next_event(&mut receiver).await?, PollEvent::Unauthorized);
    assert_eq!(timeout(WAIT, receiver.recv()).await?, None);
    assert!(handle.is_stopped());
    assert!(!session.is_authenticated());
    assert_eq!(source.calls(), 1);
    assert!(storage.is_empty());

    handle.shutdown().await?;

    Ok(())
}

#[tokio::test]
async fn test_poller_keeps_polling_after_transient_failures() -> Result<()> {
    let storage = Arc::new(TransactionStore::new());
    let source = ScriptedSource::new(vec![Err(SourceError::Status(503))], sample_history());
    let session = Arc::new(Session::new(Some("token".to_string())));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let handle = HistoryPoller::spawn(source.clone(), storage.clone(), session, PERIOD, sender);

    assert!(matches!(next_event(&mut receiver).await?, PollEvent::Failed(_)));
    assert_eq!(next_event(&mut receiver).await?, PollEvent::NewData { previous: 0, current: 4 });

    handle.shutdown().await?;

    Ok(())
}

#[tokio::test]
async fn test_poller_without_credential_reports_unauthorized_without_fetching() -> Result<()> {
    let storage = Arc::new(TransactionStore::new());
    let source = ScriptedSource::new(Vec::new(), sample_history());
    let session = Arc::new(Session::new(None));
    let (sender, mut receiver) = mpsc::unbounded_channel();

    let handle = HistoryPoller::spawn(source.clone(), storage, session, PERIOD, sender);

    assert_eq!(next_event(&mut receiver).await?, PollEvent::Unauthorized);
    assert_eq!(source.calls(), 0);

    handle.shutdown().await?;

    Ok(())
}

#[tokio::test]
async fn test_stop_is_idempotent_and_halts_fetching() -> Result<()> {
    let storage = Arc::new(TransactionStore::new());
    storage.replace(load(&sample_history()));
    let source = ScriptedSource::new(Vec::new(), sample_history());
    let session = Arc::new(Session::new(Some("token".to_string())));
    let (sender, _receiver) = mpsc::unbounded_channel();

    let handle = HistoryPoller::spawn(source.clone(), storage, session, Duration::from_secs(3600), sender);

    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());

    timeout(WAIT, handle.shutdown()).await??;

    assert_eq!(source.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_dropping_the_handle_stops_polling() -> Result<()> {
    let storage = Arc::new(TransactionStore::new());
    let source = ScriptedSource::new(Vec::new(), sample_history());
    let session = Arc::new(Session::new(Some("token".to_string())));
    let (sender, _receiver) = mpsc::unbounded_channel();

    let handle = HistoryPoller::spawn(source.clone(), storage, session, PERIOD, sender);

    timeout(WAIT, async {
        while source.calls() < 2 {
            sleep(PERIOD).await;
        }
    }).await?;
    drop(handle);

    //NOTE: A fetch already in flight when the handle drops may still complete
    sleep(PERIOD * 3).await;
    let settled = source.calls();
    sleep(PERIOD * 10).await;

    assert_eq!(source.calls(), settled);

    Ok(())
}

#[tokio::test]
async fn test_dropping_the_event_receiver_stops_polling() -> Result<()> {
    let storage = Arc::new(TransactionStore::new());
    let source = ScriptedSource::new(Vec::new(), sample_history());
    let session = Arc::new(Session::new(Some("token".to_string())));
    let (sender, receiver) = mpsc::unbounded_channel();

    let handle = HistoryPoller::spawn(source.clone(), storage, session, PERIOD, sender);
    drop(receiver);

    timeout(WAIT, async {
        while !handle.is_stopped() {
            sleep(PERIOD).await;
        }
    }).await?;

    let settled = source.calls();
    sleep(PERIOD * 10).await;

    assert_eq!(source.calls(), settled);
    assert!(settled <= 1);

    handle.shutdown().await?;

    Ok(())
}
