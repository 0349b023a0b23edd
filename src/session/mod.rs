mod recent_searches;

use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::info;

pub use recent_searches::RecentSearches;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No session credential, log in to the dashboard first")]
    MissingCredential
}

/// Per-view session state: the opaque credential and the recent search terms.
///
/// The credential is never interpreted here, only checked for presence and
/// dropped when the backend rejects it.
pub struct Session {
    credential: Mutex<Option<String>>,
    recent_searches: Mutex<RecentSearches>
}

impl Session {
    pub fn new(credential: Option<String>) -> Self {
        let credential = credential.filter(|value| !value.trim().is_empty());

        Self {
            credential: Mutex::new(credential),
            recent_searches: Mutex::new(RecentSearches::new())
        }
    }

    pub fn credential(&self) -> Result<String, SessionError> {
        self.credential.lock().unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(SessionError::MissingCredential)
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential().is_ok()
    }

    /// Forgets the credential. Idempotent.
    pub fn clear_credential(&self) {
        let previous = self.credential.lock().unwrap_or_else(PoisonError::into_inner).take();

        if previous.is_some() {
            info!("Session credential cleared, log in again to continue");
        }
    }

    pub fn record_search(&self, term: &str) {
        self.recent_searches.lock().unwrap_or_else(PoisonError::into_inner).record(term);
    }

    pub fn recent_searches(&self) -> Vec<String> {
        self.recent_searches.lock().unwrap_or_else(PoisonError::into_inner).terms()
    }
}
