//! Audit event types and emission functions.

use crate::core::{FrameError, ScanRequest, ScanResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tracing target for audit events.
pub const AUDIT_TARGET: &str = "sentinel_bridge::audit";

/// Base trait for audit events.
pub trait AuditEvent: Serialize {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Returns the timestamp of the event.
    fn timestamp(&self) -> DateTime<Utc>;
}

/// Audit event for a completed scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanAuditEvent {
    /// Event type.
    pub event_type: String,

    /// Timestamp of the event.
    pub timestamp: DateTime<Utc>,

    /// Per-request identifier.
    pub request_id: String,

    /// Scanned URL or path.
    pub target: String,

    /// `"url"` or `"file"`.
    pub kind: String,

    /// `ANALYZED` or `ERROR`.
    pub status: String,

    /// Threat level, when analyzed.
    pub threat_level: Option<String>,

    /// Threat score, when analyzed.
    pub score: Option<u32>,

    /// Isolation method name.
    pub isolation_method: String,

    /// Handling time in milliseconds.
    pub duration_ms: u64,
}

impl ScanAuditEvent {
    /// Builds the event for one request and its response.
    pub fn new(
        request_id: &str,
        request: &ScanRequest,
        result: &ScanResult,
        duration: Duration,
    ) -> Self {
        let verdict = result.verdict();
        Self {
            event_type: "scan_completed".to_string(),
            timestamp: Utc::now(),
            request_id: request_id.to_string(),
            target: request.target.clone(),
            kind: request.kind().as_str().to_string(),
            status: result.status.as_str().to_string(),
            threat_level: verdict.map(|v| v.level.as_str().to_string()),
            score: verdict.map(|v| v.score),
            isolation_method: result.isolation_method.as_str().to_string(),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

impl AuditEvent for ScanAuditEvent {
    fn event_type(&self) -> &'static str {
        "scan_completed"
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Emits an audit event for a decoded request.
pub fn emit_request_received(request_id: &str, request: &ScanRequest) {
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = "request_received",
        request_id = %request_id,
        target_kind = request.kind().as_str(),
        scan_target = %request.target,
        action = %request.action,
        "Request received"
    );
}

/// Emits an audit event for a completed scan.
pub fn emit_scan_completed(event: &ScanAuditEvent) {
    tracing::info!(
        target: AUDIT_TARGET,
        event_type = event.event_type(),
        request_id = %event.request_id,
        target_kind = %event.kind,
        scan_target = %event.target,
        status = %event.status,
        threat_level = ?event.threat_level,
        score = ?event.score,
        isolation_method = %event.isolation_method,
        duration_ms = event.duration_ms,
        "Scan completed"
    );
}

/// Emits an audit event for a frame that could not be decoded.
pub fn emit_frame_rejected(error: &FrameError) {
    tracing::warn!(
        target: AUDIT_TARGET,
        event_type = "frame_rejected",
        error = %error,
        fatal = error.is_fatal(),
        "Frame rejected"
    );
}
