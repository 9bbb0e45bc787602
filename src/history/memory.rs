//! In-memory history store.

use crate::core::HistoryError;
use crate::history::entry::LogEntry;
use crate::history::file::DEFAULT_HISTORY_CAPACITY;
use crate::history::traits::HistoryStore;

use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// History kept in process memory, capped like the file store.
#[derive(Debug)]
pub struct MemoryHistory {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl MemoryHistory {
    /// Creates a store with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates a store keeping at most `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistory {
    async fn append(&self, entry: LogEntry) -> Result<(), HistoryError> {
        let mut entries = self.entries.lock().await;
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, HistoryError> {
        let entries = self.entries.lock().await;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.iter().skip(skip).cloned().collect())
    }

    async fn count(&self) -> Result<usize, HistoryError> {
        Ok(self.entries.lock().await.len())
    }
}
