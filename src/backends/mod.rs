//! Scan strategy implementations.
//!
//! This module contains the implementations of the `Backend` trait that
//! the dispatcher selects between, plus the classifier they depend on.
//!
//! ## Available Backends
//!
//! - [`url`] - Whitelist check, then a remote [`Classifier`] and scoring
//! - [`sandbox`] - External sandbox executable for files
//!
//! ## Classifiers
//!
//! - [`classifier`] - Chat-completion HTTP classifier (requires the
//!   `http-classifier` feature)
//! - [`mock`] - A deterministic classifier for testing
//!
//! ## Implementing a Custom Classifier
//!
//! ```rust,ignore
//! use sentinel_bridge::backends::{Classifier, ClassifierReply};
//! use sentinel_bridge::core::DispatchError;
//! use async_trait::async_trait;
//!
//! #[derive(Debug)]
//! pub struct KeywordClassifier;
//!
//! #[async_trait]
//! impl Classifier for KeywordClassifier {
//!     fn name(&self) -> &str {
//!         "keyword"
//!     }
//!
//!     async fn classify(&self, url: &str) -> Result<ClassifierReply, DispatchError> {
//!         let verdict = if url.contains("login") { "MALICIOUS" } else { "SAFE" };
//!         Ok(ClassifierReply::new(verdict))
//!     }
//! }
//! ```

pub mod classifier;
pub mod mock;
pub mod sandbox;
pub mod url;

// Re-exports
pub use classifier::{
    ChatChoice, ChatMessage, ChatRequest, ChatResponse, Classifier, ClassifierConfig,
    ClassifierReply, URL_PLACEHOLDER,
};
pub use mock::{MockClassifier, MOCK_CREATED};
pub use sandbox::{normalize_verdict, SandboxBackend, SandboxConfig};
pub use url::{UrlBackend, DEFAULT_DETAILS_CHARS, DEFAULT_URL_TIMEOUT};

#[cfg(feature = "http-classifier")]
pub use classifier::HttpClassifier;
