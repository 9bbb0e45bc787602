//! Error types for the bridge.
//!
//! Only [`FrameError`] is ever fatal. Everything that goes wrong while
//! handling one request is a [`DispatchError`], and its `Display` text is
//! exactly what ends up in the `details` of the `ERROR` response.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure reading or writing one frame on the channel.
#[derive(Debug, Error)]
pub enum FrameError {
    /// The stream ended inside a payload.
    #[error("truncated frame: expected {expected} payload bytes, received {received}")]
    Truncated {
        /// Length announced by the prefix.
        expected: usize,
        /// Bytes that actually arrived.
        received: usize,
    },

    /// The announced or encoded payload exceeds the configured limit.
    #[error("frame of {size} bytes exceeds maximum {max} bytes")]
    Oversized {
        /// Payload size in bytes.
        size: usize,
        /// Maximum allowed size in bytes.
        max: usize,
    },

    /// The payload is not valid UTF-8.
    #[error("frame payload is not valid UTF-8: {reason}")]
    InvalidUtf8 {
        /// Decoder message.
        reason: String,
    },

    /// The payload is not valid JSON, or a message could not be serialized.
    #[error("frame payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is JSON but not an object.
    #[error("frame payload is not a JSON object")]
    NotAnObject,

    /// An I/O error on the underlying stream.
    #[error("channel I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Returns `true` if the stream position is no longer at a frame
    /// boundary, so the channel cannot be used any further.
    ///
    /// Payload-level errors leave the channel aligned: the whole payload
    /// was consumed before it was rejected.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Truncated { .. } | Self::Oversized { .. } | Self::Io(_)
        )
    }
}

/// Failure locating or parsing the structured result in backend output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    /// No balanced object containing the marker key was found.
    #[error("No valid JSON in output")]
    MarkerNotFound {
        /// The key that was searched for.
        marker: String,
    },

    /// An object containing the marker key starts but never closes.
    #[error("No valid JSON in output (unterminated object at byte {start})")]
    Unbalanced {
        /// Byte offset of the opening brace.
        start: usize,
    },

    /// The located object is not valid JSON.
    #[error("Malformed scan result: {reason}")]
    Malformed {
        /// Parser message.
        reason: String,
    },
}

/// Failure while handling a single request.
///
/// Every variant is recovered by the dispatcher and turned into an `ERROR`
/// response.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The remote classifier could not be reached.
    #[error("URL scan error: {message}")]
    Transport {
        /// Transport error message.
        message: String,
    },

    /// The remote classifier answered with a non-200 status.
    #[error("LLM API error: {status}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The remote classifier answered 200 with an unusable body.
    #[error("LLM API error: unexpected response: {details}")]
    UnexpectedResponse {
        /// What was wrong with the body.
        details: String,
    },

    /// A backend exceeded its time bound.
    #[error("{subject} scan timed out after {elapsed:?}")]
    Timeout {
        /// "URL" or "File".
        subject: &'static str,
        /// The bound that was exceeded.
        elapsed: Duration,
    },

    /// The sandbox executable exited unsuccessfully.
    #[error("{stderr}")]
    ProcessFailed {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Standard error text, or a generic message when empty.
        stderr: String,
    },

    /// The sandbox executable could not be started.
    #[error("Scan error: {message}")]
    Spawn {
        /// Path of the executable.
        executable: PathBuf,
        /// OS error message.
        message: String,
    },

    /// The sandbox output held no usable result.
    #[error(transparent)]
    Extraction(#[from] ExtractError),

    /// The request message is not a valid scan request.
    #[error("Invalid request: {reason}")]
    InvalidRequest {
        /// What was wrong with it.
        reason: String,
    },

    /// The request asked for something other than a scan.
    #[error("Unsupported action: {action}")]
    UnsupportedAction {
        /// The requested action.
        action: String,
    },

    /// A backend failed unexpectedly.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl DispatchError {
    /// Generic `details` text for a failed sandbox run with no stderr.
    pub const PROCESS_FAILED_FALLBACK: &'static str = "File scan failed";

    /// Creates a `ProcessFailed` error, substituting a generic message for
    /// empty stderr.
    pub fn process_failed(code: Option<i32>, stderr: impl Into<String>) -> Self {
        let stderr = stderr.into();
        let stderr = if stderr.trim().is_empty() {
            Self::PROCESS_FAILED_FALLBACK.to_string()
        } else {
            stderr
        };
        Self::ProcessFailed { code, stderr }
    }

    /// Creates a `Transport` error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates an `InvalidRequest` error.
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Creates an `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns the process exit code carried by this error, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ProcessFailed { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns `true` if this error is a time bound being exceeded.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Short machine-friendly name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } | Self::HttpStatus { .. } | Self::UnexpectedResponse { .. } => {
                "transport"
            }
            Self::Timeout { .. } => "timeout",
            Self::ProcessFailed { .. } | Self::Spawn { .. } => "process",
            Self::Extraction(ExtractError::Malformed { .. }) => "malformed_result",
            Self::Extraction(_) => "extraction",
            Self::InvalidRequest { .. } | Self::UnsupportedAction { .. } => "request",
            Self::Internal { .. } => "internal",
        }
    }
}

/// Failure loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {message}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// A value is out of range or missing.
    #[error("invalid configuration: {message}")]
    Invalid {
        /// Description of the problem.
        message: String,
    },
}

impl ConfigError {
    /// Creates an `Invalid` error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

/// Failure persisting scan history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The history file could not be read or written.
    #[error("history I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The history file could not be (de)serialized.
    #[error("history serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A specialized `Result` type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
