//! URL analysis: whitelist check, then remote classification and scoring.

use crate::backends::classifier::Classifier;
use crate::core::{
    unix_now, Backend, DispatchError, IsolationMethod, ScanRequest, ScanResult, TargetKind,
};
use crate::scoring::{host_of, ClassifierVerdict, ScoringEngine};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Default bound on one classification.
pub const DEFAULT_URL_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of reply characters copied into `details`.
pub const DEFAULT_DETAILS_CHARS: usize = 200;

/// The URL strategy.
///
/// Whitelisted hosts are answered locally and never reach the classifier.
#[derive(Debug, Clone)]
pub struct UrlBackend {
    engine: ScoringEngine,
    classifier: Arc<dyn Classifier>,
    timeout: Duration,
    details_chars: usize,
}

impl UrlBackend {
    /// Creates a URL backend over a scoring engine and a classifier.
    pub fn new(engine: ScoringEngine, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            engine,
            classifier,
            timeout: DEFAULT_URL_TIMEOUT,
            details_chars: DEFAULT_DETAILS_CHARS,
        }
    }

    /// Sets the classification bound.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how much of the reply is copied into `details`.
    pub fn with_details_chars(mut self, chars: usize) -> Self {
        self.details_chars = chars;
        self
    }

    /// Returns the scoring engine.
    pub fn engine(&self) -> &ScoringEngine {
        &self.engine
    }
}

#[async_trait]
impl Backend for UrlBackend {
    fn name(&self) -> &str {
        "url"
    }

    fn kind(&self) -> TargetKind {
        TargetKind::Url
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ScanResult, DispatchError> {
        let url = request.target.as_str();
        let features = self.engine.features(url);

        if features.whitelisted {
            let host = host_of(url);
            tracing::debug!(host = %host, "whitelisted host, skipping classifier");
            return Ok(ScanResult::analyzed(
                format!("Domain {host} is on the trusted whitelist"),
                IsolationMethod::WhitelistCheck,
                self.engine.score(&features),
            ));
        }

        let reply = tokio::time::timeout(self.timeout, self.classifier.classify(url))
            .await
            .map_err(|_| DispatchError::Timeout {
                subject: "URL",
                elapsed: self.timeout,
            })??;

        let verdict = ClassifierVerdict::from_reply(&reply.content);
        tracing::debug!(
            classifier = self.classifier.name(),
            verdict = ?verdict,
            "classifier replied"
        );

        let score = self.engine.score(&features.with_verdict(verdict));
        let summary: String = reply.content.chars().take(self.details_chars).collect();

        Ok(ScanResult::analyzed(
            format!("LLM Analysis: {summary}"),
            IsolationMethod::LlmAnalysis,
            score,
        )
        .with_timestamp(reply.created.unwrap_or_else(unix_now)))
    }
}
