//! History store trait definition.

use crate::core::HistoryError;
use crate::history::entry::LogEntry;

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// Trait for scan history storage.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use sentinel_bridge::history::{HistoryStore, LogEntry};
/// use sentinel_bridge::core::HistoryError;
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct SyslogHistory;
///
/// #[async_trait]
/// impl HistoryStore for SyslogHistory {
///     async fn append(&self, entry: LogEntry) -> Result<(), HistoryError> {
///         tracing::info!(target = %entry.target, "scan recorded");
///         Ok(())
///     }
///
///     async fn recent(&self, _limit: usize) -> Result<Vec<LogEntry>, HistoryError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait HistoryStore: Send + Sync + Debug {
    /// Records one entry.
    async fn append(&self, entry: LogEntry) -> Result<(), HistoryError>;

    /// Returns up to `limit` of the most recent entries, oldest first.
    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, HistoryError>;

    /// Returns the number of stored entries.
    async fn count(&self) -> Result<usize, HistoryError> {
        Ok(self.recent(usize::MAX).await?.len())
    }
}

/// Shared handle to a history store.
pub type ArcHistory = Arc<dyn HistoryStore>;
