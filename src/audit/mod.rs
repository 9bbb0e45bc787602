//! Structured audit logging.
//!
//! This module provides functions for emitting request lifecycle events
//! through the `tracing` crate under the `sentinel_bridge::audit` target.
//! Events can be captured by any tracing subscriber; the binary writes
//! them to standard error.

mod events;

pub use events::{
    emit_frame_rejected, emit_request_received, emit_scan_completed, AuditEvent,
    ScanAuditEvent, AUDIT_TARGET,
};
