//! Core types used throughout the bridge.
//!
//! This module defines the request shape read off the channel, the target
//! classification, and the verdict vocabulary (status, threat level,
//! isolation method, threat score) shared by both backends.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The action performed when a request omits one.
pub const DEFAULT_ACTION: &str = "scan";

fn default_action() -> String {
    DEFAULT_ACTION.to_string()
}

/// A scan request as received over the framed channel.
///
/// ```rust
/// use sentinel_bridge::core::{ScanRequest, TargetKind};
///
/// let request: ScanRequest = serde_json::from_str(r#"{"target":"https://example.com"}"#).unwrap();
/// assert_eq!(request.action, "scan");
/// assert_eq!(request.kind(), TargetKind::Url);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// A URL (`http://` or `https://`) or a filesystem path.
    pub target: String,

    /// Requested action; only `"scan"` is supported.
    #[serde(default = "default_action")]
    pub action: String,
}

impl ScanRequest {
    /// Creates a scan request for the given target with the default action.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            action: default_action(),
        }
    }

    /// Sets the action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    /// Returns how the target should be routed.
    pub fn kind(&self) -> TargetKind {
        TargetKind::classify(&self.target)
    }
}

/// Which backend a target is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A web address, analyzed by the remote classifier.
    Url,
    /// A local file, analyzed by the sandbox executable.
    File,
}

impl TargetKind {
    /// Classifies a target string. Only an exact `http://` or `https://`
    /// prefix makes a URL; everything else is a file path.
    pub fn classify(target: &str) -> Self {
        if target.starts_with("http://") || target.starts_with("https://") {
            Self::Url
        } else {
            Self::File
        }
    }

    /// Returns the lowercase name used in history records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::File => "file",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a scan produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
    /// The backend produced a verdict.
    Analyzed,
    /// The scan failed; any threat score must be ignored.
    Error,
}

impl ScanStatus {
    /// Parses a status reported by an external backend.
    ///
    /// Anything other than `ANALYZED` (case-insensitive) counts as an error.
    pub fn from_reported(status: &str) -> Self {
        if status.trim().eq_ignore_ascii_case("analyzed") {
            Self::Analyzed
        } else {
            Self::Error
        }
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analyzed => "ANALYZED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete threat level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    /// Score below 30.
    Low,
    /// Score in `30..70`.
    Medium,
    /// Score of 70 or more.
    High,
    /// No usable level was reported.
    Unknown,
}

impl ThreatLevel {
    /// Lowest score classified as [`ThreatLevel::Medium`].
    pub const MEDIUM_THRESHOLD: u32 = 30;

    /// Lowest score classified as [`ThreatLevel::High`].
    pub const HIGH_THRESHOLD: u32 = 70;

    /// Maps a numeric score onto a level using exclusive upper bounds.
    pub fn from_score(score: u32) -> Self {
        if score < Self::MEDIUM_THRESHOLD {
            Self::Low
        } else if score < Self::HIGH_THRESHOLD {
            Self::Medium
        } else {
            Self::High
        }
    }

    /// Parses a level reported by an external backend, falling back to
    /// [`ThreatLevel::Unknown`] for anything unrecognized.
    pub fn parse_lenient(level: &str) -> Self {
        match level.trim().to_ascii_uppercase().as_str() {
            "LOW" => Self::Low,
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl Default for ThreatLevel {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a verdict was obtained.
///
/// Sandbox executables may report their own method names; those are kept
/// verbatim in [`IsolationMethod::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IsolationMethod {
    /// Target matched the trusted-domain whitelist.
    WhitelistCheck,
    /// Target was judged by the remote classifier.
    LlmAnalysis,
    /// Target was run through the sandbox executable.
    SandboxExec,
    /// No method applies (errors).
    #[default]
    None,
    /// A method name reported by an external backend.
    Other(String),
}

impl IsolationMethod {
    /// Returns the wire representation.
    pub fn as_str(&self) -> &str {
        match self {
            Self::WhitelistCheck => "whitelist_check",
            Self::LlmAnalysis => "llm_analysis",
            Self::SandboxExec => "sandbox_exec",
            Self::None => "",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for IsolationMethod {
    fn from(value: String) -> Self {
        match value.as_str() {
            "whitelist_check" => Self::WhitelistCheck,
            "llm_analysis" => Self::LlmAnalysis,
            "sandbox_exec" => Self::SandboxExec,
            "" => Self::None,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for IsolationMethod {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<IsolationMethod> for String {
    fn from(value: IsolationMethod) -> Self {
        match value {
            IsolationMethod::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for IsolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric threat assessment with its explanation.
///
/// `level` and `score` are carried as reported and are not cross-checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatScore {
    /// Discrete level.
    #[serde(default)]
    pub level: ThreatLevel,

    /// Additive score; nominally 0-100 but not clamped.
    #[serde(default)]
    pub score: u32,

    /// Confidence in the assessment (0.0 to 1.0).
    #[serde(default)]
    pub confidence: f64,

    /// Human-readable contributing factors, in the order they were added.
    #[serde(default)]
    pub indicators: Vec<String>,
}

impl ThreatScore {
    /// Creates a score with no indicators.
    pub fn new(level: ThreatLevel, score: u32, confidence: f64) -> Self {
        Self {
            level,
            score,
            confidence,
            indicators: Vec::new(),
        }
    }

    /// The fallback used when a backend reports no score at all.
    pub fn unknown() -> Self {
        Self::new(ThreatLevel::Unknown, 0, 0.0)
    }

    /// Appends an indicator.
    pub fn with_indicator(mut self, indicator: impl Into<String>) -> Self {
        self.indicators.push(indicator.into());
        self
    }

    /// Returns `true` if `level` is what `score` would map to.
    ///
    /// Backends are free to disagree; this only reports it.
    pub fn is_consistent(&self) -> bool {
        self.level == ThreatLevel::from_score(self.score)
    }
}

impl Default for ThreatScore {
    fn default() -> Self {
        Self::unknown()
    }
}
