//! Sandbox executable backend.
//!
//! This module runs an external sandboxing program against a file and
//! reads its verdict from standard output.
//!
//! # Protocol
//!
//! The executable is invoked as `<executable> [args...] --path <file>`.
//! On success it exits 0 after printing progress text followed by one JSON
//! object with at least a `status` key. On failure it exits non-zero with a
//! diagnostic on standard error.

use crate::core::{
    unix_now, Backend, DispatchError, IsolationMethod, ScanRequest, ScanResult, ScanStatus,
    TargetKind, ThreatLevel, ThreatScore,
};
use crate::extract::{extract_result, STATUS_MARKER};

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Sandbox backend configuration.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Path to the sandbox executable.
    pub executable: PathBuf,

    /// Arguments placed before `--path <file>`.
    pub args: Vec<String>,

    /// Bound on one run, process start included.
    pub timeout: Duration,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("sentinel_cli"),
            args: Vec::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl SandboxConfig {
    /// Creates a configuration for the given executable.
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            ..Self::default()
        }
    }

    /// Adds an argument placed before `--path`.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The file strategy.
///
/// # Example
///
/// ```rust,ignore
/// use sentinel_bridge::backends::{SandboxBackend, SandboxConfig};
///
/// let backend = SandboxBackend::new(SandboxConfig::new("/opt/sentinel/sentinel_cli"));
/// ```
#[derive(Debug, Clone)]
pub struct SandboxBackend {
    config: SandboxConfig,
}

impl SandboxBackend {
    /// Creates a sandbox backend.
    pub fn new(config: SandboxConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Runs the executable and collects its output within the bound.
    ///
    /// The child is killed if the bound is exceeded.
    async fn run(&self, path: &str) -> Result<Output, DispatchError> {
        let mut command = Command::new(&self.config.executable);
        command
            .args(&self.config.args)
            .arg("--path")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = command.spawn().map_err(|e| DispatchError::Spawn {
            executable: self.config.executable.clone(),
            message: e.to_string(),
        })?;

        match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(DispatchError::Spawn {
                executable: self.config.executable.clone(),
                message: e.to_string(),
            }),
            Err(_) => Err(DispatchError::Timeout {
                subject: "File",
                elapsed: self.config.timeout,
            }),
        }
    }
}

#[async_trait]
impl Backend for SandboxBackend {
    fn name(&self) -> &str {
        "sandbox"
    }

    fn kind(&self) -> TargetKind {
        TargetKind::File
    }

    async fn scan(&self, request: &ScanRequest) -> Result<ScanResult, DispatchError> {
        let output = self.run(&request.target).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DispatchError::process_failed(
                output.status.code(),
                stderr.trim_end(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        tracing::trace!(bytes = output.stdout.len(), "sandbox output captured");
        let verdict = extract_result(&stdout, STATUS_MARKER)?;

        Ok(normalize_verdict(verdict))
    }
}

/// Converts a sandbox verdict object into a [`ScanResult`].
///
/// The verdict is passed through: status, details, method, score and
/// timestamp are taken as reported. Missing score fields default to
/// `UNKNOWN`/0/0.0/empty, a missing method to `sandbox_exec`, a missing
/// timestamp to now. Unrecognized keys are kept in `extra`.
pub fn normalize_verdict(mut verdict: Map<String, Value>) -> ScanResult {
    let status = match verdict.remove("status") {
        Some(Value::String(status)) => ScanStatus::from_reported(&status),
        _ => ScanStatus::Error,
    };

    let details = match verdict.remove("details") {
        Some(Value::String(details)) => details,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    };

    let isolation_method = match verdict.remove("isolation_method") {
        Some(Value::String(method)) => IsolationMethod::from(method),
        _ => IsolationMethod::SandboxExec,
    };

    let threat_score = match verdict.remove("threat_score") {
        Some(Value::Object(score)) => parse_threat_score(&score),
        _ => ThreatScore::unknown(),
    };

    let timestamp = verdict
        .remove("timestamp")
        .and_then(|t| t.as_i64().or_else(|| t.as_f64().map(|f| f as i64)))
        .unwrap_or_else(unix_now);

    let code = verdict
        .remove("code")
        .and_then(|c| c.as_i64())
        .and_then(|c| i32::try_from(c).ok());

    ScanResult {
        status,
        details,
        isolation_method,
        threat_score: Some(threat_score),
        timestamp,
        code,
        extra: verdict,
    }
}

fn parse_threat_score(score: &Map<String, Value>) -> ThreatScore {
    let level = score
        .get("level")
        .and_then(Value::as_str)
        .map(ThreatLevel::parse_lenient)
        .unwrap_or(ThreatLevel::Unknown);

    let numeric = score
        .get("score")
        .and_then(|s| {
            s.as_u64()
                .or_else(|| s.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
        })
        .map(|s| u32::try_from(s).unwrap_or(u32::MAX))
        .unwrap_or(0);

    let confidence = score
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.0);

    let indicators = score
        .get("indicators")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    ThreatScore {
        level,
        score: numeric,
        confidence,
        indicators,
    }
}
