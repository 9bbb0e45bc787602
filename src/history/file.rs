//! JSON-file history store.

use crate::core::HistoryError;
use crate::history::entry::LogEntry;
use crate::history::traits::HistoryStore;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Number of entries kept by default.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// History stored as one pretty-printed JSON array.
///
/// Each append rewrites the file with the newest `capacity` entries.
/// An unreadable or corrupt file is treated as empty and replaced on the
/// next append.
///
/// # File Format
///
/// ```text
/// [
///   { "timestamp": 1700000000, "datetime": "...", "target": "...", "type": "url", ... },
///   ...
/// ]
/// ```
#[derive(Debug)]
pub struct JsonFileHistory {
    path: PathBuf,
    capacity: usize,
    // Serializes read-modify-write cycles.
    lock: Mutex<()>,
}

impl JsonFileHistory {
    /// Creates a store at `path` with the default capacity.
    ///
    /// The file and its parent directory are created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            capacity: DEFAULT_HISTORY_CAPACITY,
            lock: Mutex::new(()),
        }
    }

    /// Sets the number of entries kept.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Vec<LogEntry> {
        let content = match tokio::fs::read(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "history file unreadable");
                return Vec::new();
            }
        };

        serde_json::from_slice(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "history file corrupt, starting over");
            Vec::new()
        })
    }

    async fn save(&self, entries: &[LogEntry]) -> Result<(), HistoryError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for JsonFileHistory {
    async fn append(&self, entry: LogEntry) -> Result<(), HistoryError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.load().await;
        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }

        self.save(&entries).await?;
        tracing::trace!(count = entries.len(), "history entry appended");
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>, HistoryError> {
        let _guard = self.lock.lock().await;

        let mut entries = self.load().await;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{IsolationMethod, ScanRequest, ScanResult, ThreatLevel, ThreatScore};

    fn entry(target: &str, score: u32) -> LogEntry {
        LogEntry::from_result(
            &ScanRequest::new(target),
            &ScanResult::analyzed(
                "LLM Analysis: SAFE",
                IsolationMethod::LlmAnalysis,
                ThreatScore::new(ThreatLevel::from_score(score), score, 0.6),
            ),
        )
    }

    #[tokio::test]
    async fn test_append_creates_file_and_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("scan_history.json");
        let history = JsonFileHistory::new(&path);

        history.append(entry("https://a.example", 45)).await.unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw.as_array().unwrap().len(), 1);
        assert_eq!(raw[0]["threat_level"], "MEDIUM");
        assert_eq!(raw[0]["type"], "url");
    }

    #[tokio::test]
    async fn test_capacity_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        let history = JsonFileHistory::new(dir.path().join("h.json")).with_capacity(3);

        for i in 0..5 {
            history.append(entry(&format!("https://{i}.example"), i)).await.unwrap();
        }

        assert_eq!(history.count().await.unwrap(), 3);
        let recent = history.recent(10).await.unwrap();
        assert_eq!(recent.first().unwrap().target, "https://2.example");
        assert_eq!(recent.last().unwrap().target, "https://4.example");

        let last_two = history.recent(2).await.unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].target, "https://3.example");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("h.json");
        std::fs::write(&path, b"{not json").unwrap();
        let history = JsonFileHistory::new(&path);

        assert!(history.recent(10).await.unwrap().is_empty());
        history.append(entry("https://a.example", 0)).await.unwrap();
        assert_eq!(history.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let history = JsonFileHistory::new(dir.path().join("absent.json"));
        assert!(history.recent(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unwritable_path_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        // The parent is a regular file, so creating the directory fails.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let history = JsonFileHistory::new(blocker.join("h.json"));

        let err = history.append(entry("https://a.example", 0)).await.unwrap_err();
        assert!(matches!(err, HistoryError::Io(_)));
    }
}
