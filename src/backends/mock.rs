//! Mock classifier for testing.
//!
//! This module provides a deterministic classifier that can be used in
//! tests to exercise the URL backend without a network.

use crate::backends::classifier::{Classifier, ClassifierReply};
use crate::core::DispatchError;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

/// Creation time reported by mock replies.
pub const MOCK_CREATED: i64 = 1_700_000_000;

/// A mock classifier for testing purposes.
///
/// Replies are looked up by exact URL, falling back to a default reply.
///
/// # Examples
///
/// ```rust
/// use sentinel_bridge::backends::MockClassifier;
/// use std::time::Duration;
///
/// // Clears every URL
/// let classifier = MockClassifier::new_safe();
///
/// // Flags every URL, slowly
/// let classifier = MockClassifier::new_malicious().with_latency(Duration::from_millis(50));
///
/// // Answers 503 for every URL
/// let classifier = MockClassifier::new().with_http_status(503);
/// ```
#[derive(Debug)]
pub struct MockClassifier {
    /// Replies keyed by URL.
    replies: RwLock<HashMap<String, String>>,
    /// Reply for URLs not in the map.
    default_reply: String,
    /// Simulated latency.
    latency: Option<Duration>,
    /// Status returned instead of a reply.
    http_status: Option<u16>,
    /// Transport failure returned instead of a reply.
    transport_error: Option<String>,
    /// Number of classify calls.
    call_count: AtomicU64,
}

impl MockClassifier {
    /// Creates a mock that answers `SAFE`.
    pub fn new() -> Self {
        Self {
            replies: RwLock::new(HashMap::new()),
            default_reply: "SAFE".to_string(),
            latency: None,
            http_status: None,
            transport_error: None,
            call_count: AtomicU64::new(0),
        }
    }

    /// Creates a mock that clears every URL.
    pub fn new_safe() -> Self {
        Self::new()
    }

    /// Creates a mock that flags every URL.
    pub fn new_malicious() -> Self {
        Self::new().with_default_reply("MALICIOUS - this URL imitates a bank login page.")
    }

    /// Sets the default reply text.
    pub fn with_default_reply(mut self, reply: impl Into<String>) -> Self {
        self.default_reply = reply.into();
        self
    }

    /// Adds a reply for a specific URL.
    pub fn with_reply(self, url: impl Into<String>, reply: impl Into<String>) -> Self {
        if let Ok(mut replies) = self.replies.write() {
            replies.insert(url.into(), reply.into());
        }
        self
    }

    /// Sets the simulated latency.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every call fail with the given HTTP status.
    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Makes every call fail with a transport error.
    pub fn with_transport_error(mut self, message: impl Into<String>) -> Self {
        self.transport_error = Some(message.into());
        self
    }

    /// Returns the number of classify calls.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }
}

impl Default for MockClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn classify(&self, url: &str) -> Result<ClassifierReply, DispatchError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(message) = &self.transport_error {
            return Err(DispatchError::transport(message.clone()));
        }
        if let Some(status) = self.http_status {
            return Err(DispatchError::HttpStatus { status });
        }

        let content = self
            .replies
            .read()
            .ok()
            .and_then(|replies| replies.get(url).cloned())
            .unwrap_or_else(|| self.default_reply.clone());

        Ok(ClassifierReply::new(content).with_created(MOCK_CREATED))
    }
}
