//! # Sentinel Bridge
//!
//! A framed request/response bridge that routes scan requests to the right
//! analysis backend and answers with one normalized verdict.
//!
//! ## Overview
//!
//! A client (typically a browser extension host) writes length-prefixed
//! JSON requests naming a target. The bridge:
//!
//! - Classifies the target as a URL or a file path
//! - Answers URLs from a trusted-domain whitelist, or asks a remote text
//!   classifier and scores the result
//! - Runs files through an external sandbox executable and extracts the
//!   verdict it prints
//! - Writes back exactly one `ScanResult` per request
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sentinel_bridge::{Bridge, BridgeConfig, Dispatcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BridgeConfig::load("sentinel.toml")?.apply_env();
//!     let dispatcher = Dispatcher::from_config(&config)?;
//!
//!     Bridge::new(tokio::io::stdin(), tokio::io::stdout(), dispatcher)
//!         .with_max_frame_size(config.max_frame_size)
//!         .run()
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `default` - Includes the HTTP classifier
//! - `http-classifier` - Chat-completion classifier over HTTPS (reqwest)
//!
//! ## Architecture
//!
//! - **Core**: Requests, results, threat vocabulary, errors, the `Backend` trait
//! - **Codec**: Length-prefixed JSON frames
//! - **Extract**: Recovering the verdict object from sandbox output
//! - **Scoring**: URL threat scoring
//! - **Backends**: URL and sandbox strategies, classifiers
//! - **Dispatch**: Routing and error normalization
//! - **Bridge**: The request/response loop
//! - **History**: Capped scan history
//! - **Audit**: Structured lifecycle events
//! - **Config**: TOML and environment configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod audit;
pub mod backends;
pub mod bridge;
pub mod codec;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod extract;
pub mod history;
pub mod scoring;

// Re-export commonly used types at the crate root
pub use crate::core::{
    Backend, DispatchError, FrameError, IsolationMethod, ScanRequest, ScanResult, ScanStatus,
    TargetKind, ThreatLevel, ThreatScore,
};

pub use crate::bridge::{Bridge, BridgeError, BridgeStats};
pub use crate::config::BridgeConfig;
pub use crate::dispatch::Dispatcher;
pub use crate::history::{HistoryStore, JsonFileHistory, LogEntry};
pub use crate::scoring::{ScoringEngine, ScoringTables};

/// Prelude module for convenient imports.
///
/// ```rust
/// use sentinel_bridge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backends::{Classifier, MockClassifier, SandboxBackend, UrlBackend};
    pub use crate::bridge::{Bridge, BridgeError, BridgeStats};
    pub use crate::config::BridgeConfig;
    pub use crate::core::{
        Backend, DispatchError, FrameError, IsolationMethod, ScanRequest, ScanResult, ScanStatus,
        TargetKind, ThreatLevel, ThreatScore,
    };
    pub use crate::dispatch::Dispatcher;
    pub use crate::history::{HistoryStore, LogEntry};
    pub use crate::scoring::{ScoringEngine, ScoringTables};
}
