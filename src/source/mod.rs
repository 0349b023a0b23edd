mod errors;
mod file_source;
mod http_source;

use async_trait::async_trait;
use serde_json::Value;

pub use errors::SourceError;
pub use file_source::FileHistorySource;
pub use http_source::HttpHistorySource;

/// Where the dashboard's history comes from.
///
/// `fetch_history` returns the payload grouped by date exactly as received;
/// flattening and validation happen in [`crate::engine::load`].
#[async_trait]
pub trait HistorySource: Send + Sync + 'static {
    async fn fetch_history(&self, credential: &str) -> Result<Value, SourceError>;
    async fn clear_history(&self) -> Result<(), SourceError>;

    /// Whether this source is guarded by a session credential.
    fn requires_credential(&self) -> bool {
        true
    }

    fn describe(&self) -> String;
}
