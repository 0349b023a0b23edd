use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Backend rejected the session credential")]
    Unauthorized,
    #[error("Backend returned status {0}")]
    Status(u16),
    #[error("Backend request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("History payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("History file error: {0}")]
    Io(#[from] std::io::Error)
}

impl SourceError {
    /// A rejected credential ends the session; every other failure can be retried later.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SourceError::Unauthorized)
    }
}
