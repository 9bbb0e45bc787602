//! On-disk TOML schema.
//!
//! Every field is optional; absent fields keep their defaults.

use serde::Deserialize;
use std::path::PathBuf;

use crate::scoring::ScoringTables;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    pub classifier: ClassifierSection,
    pub sandbox: SandboxSection,
    pub scoring: Option<ScoringTables>,
    pub history: HistorySection,
    pub max_frame_size: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ClassifierSection {
    pub endpoint: Option<String>,
    pub api_token: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub prompt_template: Option<String>,
    pub details_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SandboxSection {
    pub executable: Option<PathBuf>,
    pub args: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct HistorySection {
    pub path: Option<PathBuf>,
    pub capacity: Option<usize>,
}
