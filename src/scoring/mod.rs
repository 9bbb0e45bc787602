//! Threat scoring.
//!
//! A pure mapping from URL signals (whitelist hit, classifier verdict,
//! lexical features) to a level, score, confidence and indicator list.
//! File verdicts are not scored here; the sandbox reports its own.

mod engine;
mod tables;

pub use engine::{
    ClassifierVerdict, ScoringEngine, UrlFeatures, INDICATOR_KEYWORD, INDICATOR_LLM_MALICIOUS,
    INDICATOR_LLM_SAFE, INDICATOR_PLAINTEXT, INDICATOR_TLD, INDICATOR_TRUSTED,
    INDICATOR_WHITELISTED,
};
pub use tables::{host_of, ScoreWeights, ScoringTables};
