use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

use crate::source::{HistorySource, SourceError};

/// A saved `/get-history-by-date` response on disk, for offline use.
pub struct FileHistorySource {
    path: PathBuf
}

impl FileHistorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl HistorySource for FileHistorySource {
    async fn fetch_history(&self, _credential: &str) -> Result<Value, SourceError> {
        let contents = tokio::fs::read_to_string(&self.path).await?;

        debug!("Read {} bytes of history from {}", contents.len(), self.path.display());

        if contents.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }

        Ok(serde_json::from_str(&contents)?)
    }

    async fn clear_history(&self) -> Result<(), SourceError> {
        tokio::fs::write(&self.path, "{}").await?;
        Ok(())
    }

    fn requires_credential(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
