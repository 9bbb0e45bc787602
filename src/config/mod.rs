//! Bridge configuration.
//!
//! Everything the bridge needs is injected through [`BridgeConfig`]: the
//! classifier endpoint and token, the sandbox executable, the scoring
//! tables, frame limits and the history file. Nothing secret is compiled in.
//!
//! Configuration is read from a TOML file, then overlaid with environment
//! variables:
//!
//! - `SENTINEL_API_TOKEN` - classifier bearer token
//! - `SENTINEL_CLASSIFIER_URL` - classifier endpoint
//! - `SENTINEL_SANDBOX_BIN` - sandbox executable path
//!
//! ```toml
//! max_frame_size = 1048576
//!
//! [classifier]
//! model = "google/gemma-2-2b-it"
//! timeout_secs = 30
//!
//! [sandbox]
//! executable = "/opt/sentinel/sentinel_cli"
//! timeout_secs = 60
//!
//! [history]
//! path = "/var/lib/sentinel/scan_history.json"
//! ```

mod file;

use crate::backends::{ClassifierConfig, SandboxConfig};
use crate::codec::DEFAULT_MAX_FRAME_SIZE;
use crate::core::ConfigError;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::scoring::ScoringTables;

use file::ConfigFile;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the classifier token.
pub const ENV_API_TOKEN: &str = "SENTINEL_API_TOKEN";
/// Environment variable overriding the classifier endpoint.
pub const ENV_CLASSIFIER_URL: &str = "SENTINEL_CLASSIFIER_URL";
/// Environment variable overriding the sandbox executable.
pub const ENV_SANDBOX_BIN: &str = "SENTINEL_SANDBOX_BIN";

/// History settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryConfig {
    /// History file; `None` disables recording.
    pub path: Option<PathBuf>,
    /// Entries kept.
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Complete bridge configuration.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Remote classifier settings.
    pub classifier: ClassifierConfig,
    /// Sandbox executable settings.
    pub sandbox: SandboxConfig,
    /// Whitelist, keyword and TLD tables plus score weights.
    pub scoring: ScoringTables,
    /// Largest accepted or emitted frame payload.
    pub max_frame_size: usize,
    /// History settings.
    pub history: HistoryConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            sandbox: SandboxConfig::default(),
            scoring: ScoringTables::default(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            history: HistoryConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a TOML configuration file over the defaults.
    ///
    /// # Errors
    ///
    /// Returns `Read` if the file cannot be read and `Parse` if it is not
    /// valid for this schema.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;

        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Parses TOML text over the defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;

        let mut config = Self::default();
        config.merge(file);
        Ok(config)
    }

    fn merge(&mut self, file: ConfigFile) {
        let c = file.classifier;
        if let Some(endpoint) = c.endpoint {
            self.classifier.endpoint = endpoint;
        }
        if let Some(token) = c.api_token {
            self.classifier = std::mem::take(&mut self.classifier).with_api_token(token);
        }
        if let Some(model) = c.model {
            self.classifier.model = model;
        }
        if let Some(max_tokens) = c.max_tokens {
            self.classifier.max_tokens = max_tokens;
        }
        if let Some(secs) = c.timeout_secs {
            self.classifier.timeout = Duration::from_secs(secs);
        }
        if let Some(template) = c.prompt_template {
            self.classifier.prompt_template = template;
        }
        if let Some(chars) = c.details_chars {
            self.classifier.details_chars = chars;
        }

        let s = file.sandbox;
        if let Some(executable) = s.executable {
            self.sandbox.executable = executable;
        }
        if let Some(args) = s.args {
            self.sandbox.args = args;
        }
        if let Some(secs) = s.timeout_secs {
            self.sandbox.timeout = Duration::from_secs(secs);
        }

        if let Some(scoring) = file.scoring {
            self.scoring = scoring;
        }
        if let Some(size) = file.max_frame_size {
            self.max_frame_size = size;
        }

        if let Some(path) = file.history.path {
            self.history.path = Some(path);
        }
        if let Some(capacity) = file.history.capacity {
            self.history.capacity = capacity;
        }
    }

    /// Overlays values from the process environment.
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlays values from an arbitrary variable lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = lookup(ENV_API_TOKEN) {
            tracing::debug!("classifier token taken from environment");
            self.classifier = self.classifier.with_api_token(token);
        }
        if let Some(endpoint) = lookup(ENV_CLASSIFIER_URL) {
            tracing::debug!(endpoint = %endpoint, "classifier endpoint taken from environment");
            self.classifier.endpoint = endpoint;
        }
        if let Some(executable) = lookup(ENV_SANDBOX_BIN) {
            tracing::debug!(executable = %executable, "sandbox executable taken from environment");
            self.sandbox.executable = PathBuf::from(executable);
        }
        self
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for zero timeouts, a zero frame size, a zero
    /// history capacity or an empty sandbox path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classifier.timeout.is_zero() {
            return Err(ConfigError::invalid("classifier timeout must be non-zero"));
        }
        if self.sandbox.timeout.is_zero() {
            return Err(ConfigError::invalid("sandbox timeout must be non-zero"));
        }
        if self.max_frame_size == 0 {
            return Err(ConfigError::invalid("max_frame_size must be non-zero"));
        }
        if self.sandbox.executable.as_os_str().is_empty() {
            return Err(ConfigError::invalid("sandbox executable path is empty"));
        }
        if self.history.capacity == 0 {
            return Err(ConfigError::invalid("history capacity must be non-zero"));
        }
        if self.classifier.endpoint.trim().is_empty() {
            return Err(ConfigError::invalid("classifier endpoint is empty"));
        }
        Ok(())
    }

    /// Sets the classifier configuration.
    pub fn with_classifier(mut self, classifier: ClassifierConfig) -> Self {
        self.classifier = classifier;
        self
    }

    /// Sets the sandbox configuration.
    pub fn with_sandbox(mut self, sandbox: SandboxConfig) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// Sets the scoring tables.
    pub fn with_scoring(mut self, scoring: ScoringTables) -> Self {
        self.scoring = scoring;
        self
    }

    /// Sets the frame size limit.
    pub fn with_max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets the history file.
    pub fn with_history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.history.path = Some(path.into());
        self
    }
}
