//! Core types and traits for the bridge.
//!
//! - [`types`] - Requests, target classification, threat vocabulary
//! - [`result`] - The normalized `ScanResult`
//! - [`traits`] - The `Backend` strategy trait
//! - [`error`] - Structured error types

pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{ConfigError, DispatchError, DispatchResult, ExtractError, FrameError, HistoryError};
pub use result::{unix_now, ScanResult};
pub use traits::{ArcBackend, Backend};
pub use types::{
    IsolationMethod, ScanRequest, ScanStatus, TargetKind, ThreatLevel, ThreatScore, DEFAULT_ACTION,
};
