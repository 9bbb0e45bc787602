//! History entry.

use crate::core::{ScanRequest, ScanResult, ThreatLevel};

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

/// One recorded scan.
///
/// ERROR results are recorded with an `UNKNOWN` level and a zero score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unix seconds, copied from the result.
    pub timestamp: i64,

    /// `timestamp` rendered as RFC 3339 in local time.
    pub datetime: String,

    /// The scanned URL or path.
    pub target: String,

    /// `"url"` or `"file"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Threat level name.
    pub threat_level: ThreatLevel,

    /// Threat score.
    pub score: u32,

    /// Confidence.
    pub confidence: f64,

    /// Indicators.
    #[serde(default)]
    pub indicators: Vec<String>,

    /// `ANALYZED` or `ERROR`.
    pub status: String,

    /// Isolation method name; empty for errors.
    #[serde(default)]
    pub isolation_method: String,
}

impl LogEntry {
    /// Builds an entry from a request and the response sent for it.
    pub fn from_result(request: &ScanRequest, result: &ScanResult) -> Self {
        let score = result.verdict().cloned().unwrap_or_default();

        Self {
            timestamp: result.timestamp,
            datetime: render_datetime(result.timestamp),
            target: request.target.clone(),
            kind: request.kind().as_str().to_string(),
            threat_level: score.level,
            score: score.score,
            confidence: score.confidence,
            indicators: score.indicators,
            status: result.status.as_str().to_string(),
            isolation_method: result.isolation_method.as_str().to_string(),
        }
    }
}

fn render_datetime(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).single() {
        Some(local) => local.to_rfc3339(),
        None => DateTime::from_timestamp(0, 0)
            .map(|epoch| epoch.to_rfc3339())
            .unwrap_or_default(),
    }
}
