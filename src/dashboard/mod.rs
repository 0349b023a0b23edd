mod history_view;
#[cfg(test)]
mod tests;

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

use crate::engine::{aggregate, insights, Aggregates, FilterCriteria, Insight, SortKey};
use crate::models::Transaction;
use crate::poller::{HistoryPoller, PollEvent, PollerHandle};
use crate::session::{Session, SessionError};
use crate::source::{HistorySource, SourceError};
use crate::storage::Storage;

pub use history_view::{HistoryView, ViewState};

/// One view session over the transaction history.
///
/// Owns the explicit lifecycle the dashboard needs: it is opened behind the
/// credential check, refreshed from its source, queried for views, and torn
/// down together with any poller it started.
pub struct Dashboard<S: Storage> {
    storage: Arc<S>,
    source: Arc<dyn HistorySource>,
    session: Arc<Session>,
    state: ViewState
}

impl<S: Storage> Dashboard<S> {
    /// Opens a view session; refuses when the source needs a credential and there is none.
    pub fn open(storage: Arc<S>, source: Arc<dyn HistorySource>, session: Arc<Session>) -> Result<Self, SessionError> {
        if source.requires_credential() {
            session.credential()?;
        }

        Ok(Self {
            storage,
            source,
            session,
            state: ViewState::Loading
        })
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn transactions(&self) -> Arc<Vec<Transaction>> {
        self.storage.snapshot()
    }

    /// Fetches the full history once and replaces the store with it. No retry on failure.
    pub async fn refresh(&mut self) -> Result<usize, SourceError> {
        self.state = ViewState::Loading;
        info!("Loading history from {}", self.source.describe());

        match self.fetch().await {
            Ok(count) => {
                self.state = ViewState::Ready;
                info!("Loaded {count} transactions");
                Ok(count)
            },
            Err(source_error) => {
                if source_error.is_fatal() {
                    self.session.clear_credential();
                }

                error!("Error loading history: {source_error}");
                self.state = ViewState::Failed(source_error.to_string());
                Err(source_error)
            }
        }
    }

    /// Filters, sorts and groups the current history. Records the search term as a recent search.
    pub fn view(&self, criteria: &FilterCriteria, sort_key: SortKey) -> HistoryView {
        if let Some(term) = &criteria.search_term {
            self.session.record_search(term);
        }

        if let ViewState::Failed(reason) = &self.state {
            return HistoryView::failed(reason);
        }

        HistoryView::build(&self.storage.snapshot(), criteria, sort_key)
    }

    pub fn aggregates(&self, today: NaiveDate) -> Aggregates {
        aggregate(&self.storage.snapshot(), today)
    }

    pub fn insights(&self, today: NaiveDate) -> Vec<Insight> {
        let transactions = self.storage.snapshot();
        insights(&aggregate(&transactions, today), &transactions)
    }

    /// Clears the history at the source, then empties the local store.
    pub async fn clear_history(&mut self) -> Result<(), SourceError> {
        self.source.clear_history().await?;
        self.storage.clear();
        self.state = ViewState::Ready;

        info!("All history cleared");

        Ok(())
    }

    /// Starts background polling against the same source and store.
    pub fn start_polling(&self, period: Duration, events: mpsc::UnboundedSender<PollEvent>) -> PollerHandle {
        HistoryPoller::spawn(self.source.clone(), self.storage.clone(), self.session.clone(), period, events)
    }

    async fn fetch(&self) -> Result<usize, SourceError> {
        let credential = if self.source.requires_credential() {
            self.session.credential().map_err(|_| SourceError::Unauthorized)?
        } else {
            String::new()
        };

        let raw = self.source.fetch_history(&credential).await?;
        Ok(self.storage.replace(crate::engine::load(&raw)))
    }
}
