use std::sync::Arc;
use std::time::Duration;

use tokio::spawn;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::load;
use crate::session::Session;
use crate::source::{HistorySource, SourceError};
use crate::storage::Storage;

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// What a poll tick observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEvent {
    /// The backend holds more transactions than last seen; the store was replaced.
    NewData { previous: usize, current: usize },
    /// The credential is missing or was rejected; polling has stopped.
    Unauthorized,
    /// The fetch failed; the next tick retries.
    Failed(String)
}

/// Stop signal and join handle for a running poller. Dropping the handle stops the poller.
pub struct PollerHandle {
    stop: Arc<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>
}

impl PollerHandle {
    /// Asks the poller to stop before its next tick. Safe to call any number of times.
    pub fn stop(&self) {
        if !self.stop.send_replace(true) {
            info!("History polling stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Stops the poller and waits for an in-flight fetch to finish.
    pub async fn shutdown(mut self) -> Result<(), JoinError> {
        self.stop();

        match self.task.take() {
            Some(task) => task.await,
            None => Ok(())
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct HistoryPoller;

impl HistoryPoller {
    /// Spawns a fixed-interval full-resync poller and returns its handle.
    ///
    /// Each tick fetches the whole history and replaces the store only when the
    /// backend reports more transactions than last seen. A tick never starts
    /// while the previous fetch is still in flight.
    pub fn spawn<S: Storage>(
        source: Arc<dyn HistorySource>,
        storage: Arc<S>,
        session: Arc<Session>,
        period: Duration,
        events: mpsc::UnboundedSender<PollEvent>
    ) -> PollerHandle {
        let (stop, mut stopped) = watch::channel(false);
        let stop = Arc::new(stop);
        let stop_on_fatal = stop.clone();

        let task = spawn(async move {
            let mut last_count = storage.len();
            let mut ticker = interval(period.max(MIN_PERIOD));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            //NOTE: The first tick of a tokio interval completes immediately, the initial fetch is the caller's job
            ticker.tick().await;

            info!("History polling started every {period:?} against {}", source.describe());

            loop {
                tokio::select! {
                    _ = ticker.tick() => {},
                    changed = stopped.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }

                //NOTE: Nobody listens once the receiver is gone, so there is no view left to refresh
                if *stopped.borrow() || events.is_closed() {
                    break;
                }

                let credential = if source.requires_credential() {
                    match session.credential() {
                        Ok(credential) => credential,
                        Err(error) => {
                            warn!("{error}");
                            let _ = events.send(PollEvent::Unauthorized);
                            break;
                        }
                    }
                } else {
                    String::new()
                };

                match source.fetch_history(&credential).await {
                    Ok(raw) => {
                        let transactions = load(&raw);
                        let current = transactions.len();

                        if current > last_count {
                            info!("New transactions detected: {last_count} -> {current}");
                            storage.replace(transactions);
                            let previous = last_count;
                            last_count = current;

                            if events.send(PollEvent::NewData { previous, current }).is_err() {
                                break;
                            }
                        } else {
                            debug!("No new transactions ({current} known)");
                        }
                    },
                    Err(SourceError::Unauthorized) => {
                        warn!("Backend rejected the session credential, stopping history polling");
                        session.clear_credential();
                        let _ = events.send(PollEvent::Unauthorized);
                        break;
                    },
                    Err(error) => {
                        warn!("Error checking for new transactions: {error}");

                        if events.send(PollEvent::Failed(error.to_string())).is_err() {
                            break;
                        }
                    }
                }
            }

            stop_on_fatal.send_replace(true);
            debug!("History poller exited");
        });

        PollerHandle { stop, task: Some(task) }
    }
}
