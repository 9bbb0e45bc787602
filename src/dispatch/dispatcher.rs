//! The dispatcher implementation.

use crate::audit::{emit_request_received, emit_scan_completed, ScanAuditEvent};
use crate::backends::{Classifier, SandboxBackend, UrlBackend};
use crate::codec::Message;
use crate::config::BridgeConfig;
use crate::core::{
    ArcBackend, Backend, ConfigError, DispatchError, ScanRequest, ScanResult, TargetKind,
    DEFAULT_ACTION,
};
use crate::dispatch::request::parse_request;
use crate::history::{ArcHistory, HistoryStore, JsonFileHistory, LogEntry};
use crate::scoring::ScoringEngine;

use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Builder for creating a `Dispatcher`.
#[derive(Default)]
pub struct DispatcherBuilder {
    url_backend: Option<ArcBackend>,
    file_backend: Option<ArcBackend>,
    history: Option<ArcHistory>,
}

impl DispatcherBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backend for URL targets.
    pub fn with_url_backend<B: Backend + 'static>(mut self, backend: B) -> Self {
        self.url_backend = Some(Arc::new(backend));
        self
    }

    /// Sets the backend for file targets.
    pub fn with_file_backend<B: Backend + 'static>(mut self, backend: B) -> Self {
        self.file_backend = Some(Arc::new(backend));
        self
    }

    /// Sets a backend wrapped in an Arc, routed by its [`Backend::kind`].
    pub fn with_arc_backend(mut self, backend: ArcBackend) -> Self {
        match backend.kind() {
            TargetKind::Url => self.url_backend = Some(backend),
            TargetKind::File => self.file_backend = Some(backend),
        }
        self
    }

    /// Sets the history store.
    pub fn with_history<H: HistoryStore + 'static>(mut self, history: H) -> Self {
        self.history = Some(Arc::new(history));
        self
    }

    /// Sets a history store wrapped in an Arc.
    pub fn with_arc_history(mut self, history: ArcHistory) -> Self {
        self.history = Some(history);
        self
    }

    /// Builds the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` if either backend is missing or registered for the
    /// wrong target kind.
    pub fn build(self) -> Result<Dispatcher, ConfigError> {
        let url = self
            .url_backend
            .ok_or_else(|| ConfigError::invalid("a URL backend is required"))?;
        let file = self
            .file_backend
            .ok_or_else(|| ConfigError::invalid("a file backend is required"))?;

        if url.kind() != TargetKind::Url {
            return Err(ConfigError::invalid(format!(
                "backend {} cannot serve URL targets",
                url.name()
            )));
        }
        if file.kind() != TargetKind::File {
            return Err(ConfigError::invalid(format!(
                "backend {} cannot serve file targets",
                file.name()
            )));
        }

        Ok(Dispatcher {
            url,
            file,
            history: self.history,
        })
    }
}

/// Routes requests to backends and normalizes every outcome.
///
/// Holds no per-request state; the same dispatcher can serve any number
/// of bridge loops.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    url: ArcBackend,
    file: ArcBackend,
    history: Option<ArcHistory>,
}

impl Dispatcher {
    /// Creates a new builder.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Builds a dispatcher from configuration with the given classifier.
    pub fn from_config_with_classifier(
        config: &BridgeConfig,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let url = UrlBackend::new(ScoringEngine::new(config.scoring.clone()), classifier)
            .with_timeout(config.classifier.timeout)
            .with_details_chars(config.classifier.details_chars);
        let file = SandboxBackend::new(config.sandbox.clone());

        let mut builder = Self::builder()
            .with_url_backend(url)
            .with_file_backend(file);
        if let Some(path) = &config.history.path {
            builder = builder
                .with_history(JsonFileHistory::new(path).with_capacity(config.history.capacity));
        }
        builder.build()
    }

    /// Builds a dispatcher from configuration using the HTTP classifier.
    #[cfg(feature = "http-classifier")]
    pub fn from_config(config: &BridgeConfig) -> Result<Self, ConfigError> {
        let classifier = crate::backends::HttpClassifier::new(config.classifier.clone())?;
        Self::from_config_with_classifier(config, Arc::new(classifier))
    }

    /// Returns the backend serving the given target kind.
    pub fn backend_for(&self, kind: TargetKind) -> &ArcBackend {
        match kind {
            TargetKind::Url => &self.url,
            TargetKind::File => &self.file,
        }
    }

    /// Handles one decoded message.
    ///
    /// Never fails: malformed requests become `ERROR` results.
    pub async fn handle_message(&self, message: &Message) -> ScanResult {
        match parse_request(message) {
            Ok(request) => self.dispatch(&request).await,
            Err(e) => {
                tracing::warn!(error = %e, "rejecting malformed request");
                ScanResult::error(e.to_string())
            }
        }
    }

    /// Scans one request and returns its normalized result.
    ///
    /// Never fails: backend errors, timeouts and panics become `ERROR`
    /// results. The outcome is recorded to history before returning.
    pub async fn dispatch(&self, request: &ScanRequest) -> ScanResult {
        let request_id = uuid::Uuid::new_v4().to_string();
        let started = Instant::now();
        emit_request_received(&request_id, request);

        let result = match self.run(request).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(
                    request_id = %request_id,
                    error_kind = e.kind(),
                    error = %e,
                    "scan failed"
                );
                into_error_result(e)
            }
        };

        self.record(request, &result).await;
        emit_scan_completed(&ScanAuditEvent::new(
            &request_id,
            request,
            &result,
            started.elapsed(),
        ));

        result
    }

    async fn run(&self, request: &ScanRequest) -> Result<ScanResult, DispatchError> {
        if request.action != DEFAULT_ACTION {
            return Err(DispatchError::UnsupportedAction {
                action: request.action.clone(),
            });
        }

        let backend = self.backend_for(request.kind());
        tracing::debug!(backend = backend.name(), target = %request.target, "dispatching");

        match AssertUnwindSafe(backend.scan(request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(panic) => Err(DispatchError::internal(format!(
                "backend {} panicked: {}",
                backend.name(),
                panic_message(panic.as_ref())
            ))),
        }
    }

    async fn record(&self, request: &ScanRequest, result: &ScanResult) {
        let Some(history) = &self.history else {
            return;
        };
        if let Err(e) = history.append(LogEntry::from_result(request, result)).await {
            tracing::warn!(error = %e, "failed to record scan history");
        }
    }
}

fn into_error_result(error: DispatchError) -> ScanResult {
    let code = error.exit_code();
    let result = ScanResult::error(error.to_string());
    match code {
        Some(code) => result.with_code(code),
        None => result,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{MockClassifier, SandboxConfig};
    use crate::core::{IsolationMethod, ThreatLevel};
    use crate::history::MemoryHistory;
    use async_trait::async_trait;
    use serde_json::json;

    #[derive(Debug)]
    struct PanickingBackend;

    #[async_trait]
    impl Backend for PanickingBackend {
        fn name(&self) -> &str {
            "panicking"
        }

        fn kind(&self) -> TargetKind {
            TargetKind::File
        }

        async fn scan(&self, _request: &ScanRequest) -> Result<ScanResult, DispatchError> {
            panic!("sandbox state corrupted");
        }
    }

    fn url_backend(classifier: MockClassifier) -> UrlBackend {
        UrlBackend::new(ScoringEngine::default(), Arc::new(classifier))
    }

    fn dispatcher(classifier: MockClassifier) -> Dispatcher {
        Dispatcher::builder()
            .with_url_backend(url_backend(classifier))
            .with_file_backend(SandboxBackend::new(SandboxConfig::new(
                "/nonexistent/sentinel_cli",
            )))
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_both_backends() {
        let err = Dispatcher::builder()
            .with_url_backend(url_backend(MockClassifier::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("file backend"));
    }

    #[test]
    fn test_builder_routes_arc_backends_by_kind() {
        let dispatcher = Dispatcher::builder()
            .with_arc_backend(Arc::new(PanickingBackend))
            .with_arc_backend(Arc::new(url_backend(MockClassifier::new())))
            .build()
            .unwrap();
        assert_eq!(dispatcher.backend_for(TargetKind::File).name(), "panicking");
        assert_eq!(dispatcher.backend_for(TargetKind::Url).name(), "url");
    }

    #[test]
    fn test_builder_rejects_wrong_kind() {
        let err = Dispatcher::builder()
            .with_url_backend(PanickingBackend)
            .with_file_backend(SandboxBackend::new(SandboxConfig::default()))
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[tokio::test]
    async fn test_url_request_analyzed() {
        let result = dispatcher(MockClassifier::new_malicious())
            .dispatch(&ScanRequest::new("http://paypal-login.tk/verify"))
            .await;

        assert!(result.is_analyzed());
        assert_eq!(result.isolation_method, IsolationMethod::LlmAnalysis);
        let score = result.verdict().unwrap();
        assert_eq!(score.level, ThreatLevel::High);
        assert_eq!(score.score, 120);
    }

    #[tokio::test]
    async fn test_url_request_idempotent() {
        let dispatcher = dispatcher(MockClassifier::new_safe());
        let request = ScanRequest::new("http://example.com/verify-account");

        let first = dispatcher.dispatch(&request).await;
        let second = dispatcher.dispatch(&request).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_http_error_normalized() {
        let result = dispatcher(MockClassifier::new().with_http_status(401))
            .dispatch(&ScanRequest::new("https://example.org"))
            .await;

        assert!(result.is_error());
        assert_eq!(result.details, "LLM API error: 401");
        assert!(result.threat_score.is_none());
    }

    #[tokio::test]
    async fn test_transport_error_normalized() {
        let result = dispatcher(MockClassifier::new().with_transport_error("connection refused"))
            .dispatch(&ScanRequest::new("https://example.org"))
            .await;

        assert_eq!(result.details, "URL scan error: connection refused");
    }

    #[tokio::test]
    async fn test_unsupported_action() {
        let classifier = Arc::new(MockClassifier::new());
        let dispatcher = Dispatcher::builder()
            .with_url_backend(UrlBackend::new(ScoringEngine::default(), classifier.clone()))
            .with_file_backend(SandboxBackend::new(SandboxConfig::default()))
            .build()
            .unwrap();

        let result = dispatcher
            .dispatch(&ScanRequest::new("https://example.org").with_action("delete"))
            .await;

        assert!(result.is_error());
        assert_eq!(result.details, "Unsupported action: delete");
        assert_eq!(classifier.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_executable_normalized() {
        let result = dispatcher(MockClassifier::new())
            .dispatch(&ScanRequest::new("/tmp/sample.exe"))
            .await;

        assert!(result.is_error());
        assert!(result.details.starts_with("Scan error: "));
        assert!(result.code.is_none());
    }

    #[tokio::test]
    async fn test_panic_becomes_error_result() {
        let dispatcher = Dispatcher::builder()
            .with_url_backend(url_backend(MockClassifier::new()))
            .with_file_backend(PanickingBackend)
            .build()
            .unwrap();

        let result = dispatcher.dispatch(&ScanRequest::new("/tmp/a.bin")).await;

        assert!(result.is_error());
        assert_eq!(
            result.details,
            "Internal error: backend panicking panicked: sandbox state corrupted"
        );
    }

    #[tokio::test]
    async fn test_malformed_message() {
        let message = match json!({"action": "scan"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        let result = dispatcher(MockClassifier::new()).handle_message(&message).await;

        assert!(result.is_error());
        assert_eq!(result.details, "Invalid request: missing target");
    }

    #[tokio::test]
    async fn test_history_records_each_dispatch() {
        let history = Arc::new(MemoryHistory::new());
        let dispatcher = Dispatcher::builder()
            .with_url_backend(url_backend(MockClassifier::new()))
            .with_file_backend(SandboxBackend::new(SandboxConfig::new("/nonexistent")))
            .with_arc_history(history.clone())
            .build()
            .unwrap();

        dispatcher.dispatch(&ScanRequest::new("https://github.com/a")).await;
        dispatcher.dispatch(&ScanRequest::new("/tmp/a.bin")).await;

        let entries = history.recent(10).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, "url");
        assert_eq!(entries[0].isolation_method, "whitelist_check");
        assert_eq!(entries[1].kind, "file");
        assert_eq!(entries[1].status, "ERROR");
    }

    #[tokio::test]
    async fn test_history_failure_does_not_change_result() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let dispatcher = Dispatcher::builder()
            .with_url_backend(url_backend(MockClassifier::new()))
            .with_file_backend(SandboxBackend::new(SandboxConfig::default()))
            .with_history(JsonFileHistory::new(blocker.join("h.json")))
            .build()
            .unwrap();

        let result = dispatcher
            .dispatch(&ScanRequest::new("https://github.com/a"))
            .await;
        assert!(result.is_analyzed());
    }

    #[tokio::test]
    async fn test_from_config_with_classifier() {
        let dir = tempfile::tempdir().unwrap();
        let config = BridgeConfig::default().with_history_path(dir.path().join("h.json"));

        let dispatcher =
            Dispatcher::from_config_with_classifier(&config, Arc::new(MockClassifier::new()))
                .unwrap();
        let result = dispatcher
            .dispatch(&ScanRequest::new("http://example.com/verify"))
            .await;

        assert_eq!(result.verdict().unwrap().score, 45);
        assert!(dir.path().join("h.json").exists());
    }
}
