//! The normalized scan result.
//!
//! Both backends produce a [`ScanResult`]; it is the only response shape
//! ever written back over the channel.

use crate::core::types::{IsolationMethod, ScanStatus, ThreatScore};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Returns the current time as unix seconds.
pub fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// The single response shape for every request.
///
/// When `status` is [`ScanStatus::Error`] the `threat_score` is absent and
/// `details` explains the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Whether a verdict was produced.
    pub status: ScanStatus,

    /// Free-text summary.
    #[serde(default)]
    pub details: String,

    /// How the verdict was obtained.
    #[serde(default)]
    pub isolation_method: IsolationMethod,

    /// The assessment; only meaningful when `status` is `ANALYZED`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_score: Option<ThreatScore>,

    /// When the verdict was produced (unix seconds).
    pub timestamp: i64,

    /// Exit code of a failed sandbox process.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,

    /// Additional fields reported by the sandbox, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScanResult {
    /// Creates an analyzed result stamped with the current time.
    pub fn analyzed(
        details: impl Into<String>,
        isolation_method: IsolationMethod,
        threat_score: ThreatScore,
    ) -> Self {
        Self {
            status: ScanStatus::Analyzed,
            details: details.into(),
            isolation_method,
            threat_score: Some(threat_score),
            timestamp: unix_now(),
            code: None,
            extra: Map::new(),
        }
    }

    /// Creates an error result stamped with the current time.
    pub fn error(details: impl Into<String>) -> Self {
        Self {
            status: ScanStatus::Error,
            details: details.into(),
            isolation_method: IsolationMethod::None,
            threat_score: None,
            timestamp: unix_now(),
            code: None,
            extra: Map::new(),
        }
    }

    /// Sets the timestamp.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the process exit code.
    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    /// Adds a pass-through field.
    pub fn with_extra(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Returns `true` if a verdict was produced.
    pub fn is_analyzed(&self) -> bool {
        self.status == ScanStatus::Analyzed
    }

    /// Returns `true` if the scan failed.
    pub fn is_error(&self) -> bool {
        self.status == ScanStatus::Error
    }

    /// Returns the threat score only when it may be read.
    pub fn verdict(&self) -> Option<&ThreatScore> {
        if self.is_analyzed() {
            self.threat_score.as_ref()
        } else {
            None
        }
    }
}
