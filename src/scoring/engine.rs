//! The URL scoring function.

use crate::core::{ThreatLevel, ThreatScore};
use crate::scoring::tables::ScoringTables;

use serde::{Deserialize, Serialize};

/// Indicator for a whitelisted domain.
pub const INDICATOR_TRUSTED: &str = "Verified legitimate domain";
/// Secondary indicator for a whitelisted domain.
pub const INDICATOR_WHITELISTED: &str = "On whitelist";
/// Indicator when the classifier flags the URL.
pub const INDICATOR_LLM_MALICIOUS: &str = "LLM flagged as potentially suspicious";
/// Indicator when the classifier clears the URL.
pub const INDICATOR_LLM_SAFE: &str = "LLM analysis: appears safe";
/// Indicator for a risky keyword.
pub const INDICATOR_KEYWORD: &str = "URL contains high-risk keywords";
/// Indicator for plain HTTP.
pub const INDICATOR_PLAINTEXT: &str = "No HTTPS encryption";
/// Indicator for a suspicious TLD.
pub const INDICATOR_TLD: &str = "Suspicious top-level domain";

/// The remote classifier's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierVerdict {
    /// The reply mentions `MALICIOUS`.
    Malicious,
    /// Anything else.
    Safe,
}

impl ClassifierVerdict {
    /// Reads a verdict from free-text classifier output.
    pub fn from_reply(reply: &str) -> Self {
        if reply.to_uppercase().contains("MALICIOUS") {
            Self::Malicious
        } else {
            Self::Safe
        }
    }
}

/// Signals extracted for one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UrlFeatures {
    /// The host matched the trusted whitelist.
    pub whitelisted: bool,
    /// The classifier verdict, if one was obtained.
    pub verdict: Option<ClassifierVerdict>,
    /// The URL contains a risky keyword.
    pub risky_keyword: bool,
    /// The URL uses `http://`.
    pub plaintext: bool,
    /// The URL contains a suspicious TLD.
    pub suspicious_tld: bool,
}

impl UrlFeatures {
    /// Extracts the lexical features of a URL. The verdict is left unset.
    pub fn from_url(url: &str, tables: &ScoringTables) -> Self {
        Self {
            whitelisted: tables.is_trusted(url),
            verdict: None,
            risky_keyword: tables.has_risky_keyword(url),
            plaintext: url.starts_with("http://"),
            suspicious_tld: tables.has_suspicious_tld(url),
        }
    }

    /// Sets the classifier verdict.
    pub fn with_verdict(mut self, verdict: ClassifierVerdict) -> Self {
        self.verdict = Some(verdict);
        self
    }
}

/// Maps URL features onto a threat score.
///
/// Each signal adds a fixed amount and a fixed indicator; nothing is
/// re-weighted or deduplicated. A whitelisted host short-circuits
/// everything else.
///
/// ```rust
/// use sentinel_bridge::core::ThreatLevel;
/// use sentinel_bridge::scoring::{ClassifierVerdict, ScoringEngine, UrlFeatures};
///
/// let engine = ScoringEngine::default();
/// let features = UrlFeatures::from_url("http://example.com/verify-account", engine.tables())
///     .with_verdict(ClassifierVerdict::Safe);
/// let score = engine.score(&features);
/// assert_eq!(score.score, 45);
/// assert_eq!(score.level, ThreatLevel::Medium);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine {
    tables: ScoringTables,
}

impl ScoringEngine {
    /// Creates an engine over the given tables.
    pub fn new(tables: ScoringTables) -> Self {
        Self { tables }
    }

    /// Returns the tables.
    pub fn tables(&self) -> &ScoringTables {
        &self.tables
    }

    /// Extracts features from a URL without a verdict.
    pub fn features(&self, url: &str) -> UrlFeatures {
        UrlFeatures::from_url(url, &self.tables)
    }

    /// Scores a set of features.
    pub fn score(&self, features: &UrlFeatures) -> ThreatScore {
        let weights = &self.tables.weights;

        if features.whitelisted {
            return ThreatScore::new(
                ThreatLevel::Low,
                weights.whitelist_score,
                weights.whitelist_confidence,
            )
            .with_indicator(INDICATOR_TRUSTED)
            .with_indicator(INDICATOR_WHITELISTED);
        }

        let mut score = 0u32;
        let mut confidence = weights.baseline_confidence;
        let mut indicators = Vec::new();

        match features.verdict {
            Some(ClassifierVerdict::Malicious) => {
                score = score.saturating_add(weights.malicious_delta);
                confidence = weights.malicious_confidence;
                indicators.push(INDICATOR_LLM_MALICIOUS.to_string());
            }
            Some(ClassifierVerdict::Safe) => indicators.push(INDICATOR_LLM_SAFE.to_string()),
            None => {}
        }

        if features.risky_keyword {
            score = score.saturating_add(weights.keyword_delta);
            indicators.push(INDICATOR_KEYWORD.to_string());
        }
        if features.plaintext {
            score = score.saturating_add(weights.plaintext_delta);
            indicators.push(INDICATOR_PLAINTEXT.to_string());
        }
        if features.suspicious_tld {
            score = score.saturating_add(weights.tld_delta);
            indicators.push(INDICATOR_TLD.to_string());
        }

        ThreatScore {
            level: ThreatLevel::from_score(score),
            score,
            confidence,
            indicators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScoringEngine {
        ScoringEngine::default()
    }

    #[test]
    fn test_keyword_over_http_safe_is_medium() {
        let engine = engine();
        let features = engine
            .features("http://example.com/verify-account")
            .with_verdict(ClassifierVerdict::Safe);
        let score = engine.score(&features);

        assert_eq!(score.score, 45);
        assert_eq!(score.level, ThreatLevel::Medium);
        assert_eq!(score.confidence, 0.6);
        assert_eq!(
            score.indicators,
            vec![INDICATOR_LLM_SAFE, INDICATOR_KEYWORD, INDICATOR_PLAINTEXT]
        );
    }

    #[test]
    fn test_keyword_over_http_malicious_is_high() {
        let engine = engine();
        let features = engine
            .features("http://example.com/verify-account")
            .with_verdict(ClassifierVerdict::Malicious);
        let score = engine.score(&features);

        assert_eq!(score.score, 95);
        assert_eq!(score.level, ThreatLevel::High);
        assert_eq!(score.confidence, 0.75);
        assert_eq!(score.indicators[0], INDICATOR_LLM_MALICIOUS);
    }

    #[test]
    fn test_whitelist_short_circuits() {
        let engine = engine();
        let features = engine
            .features("https://github.com/verify/urgent.xyz")
            .with_verdict(ClassifierVerdict::Malicious);
        assert!(features.whitelisted);

        let score = engine.score(&features);
        assert_eq!(score.level, ThreatLevel::Low);
        assert_eq!(score.score, 5);
        assert_eq!(score.confidence, 0.95);
        assert_eq!(score.indicators, vec![INDICATOR_TRUSTED, INDICATOR_WHITELISTED]);
    }

    #[test]
    fn test_every_signal_accumulates() {
        let engine = engine();
        let features = engine
            .features("http://urgent-login.tk/confirm")
            .with_verdict(ClassifierVerdict::Malicious);
        let score = engine.score(&features);

        // 50 + 30 + 15 + 25, unclamped
        assert_eq!(score.score, 120);
        assert_eq!(score.level, ThreatLevel::High);
        assert_eq!(score.indicators.len(), 4);
    }

    #[test]
    fn test_clean_https_is_low() {
        let engine = engine();
        let features = engine
            .features("https://example.org/docs")
            .with_verdict(ClassifierVerdict::Safe);
        let score = engine.score(&features);

        assert_eq!(score.score, 0);
        assert_eq!(score.level, ThreatLevel::Low);
        assert_eq!(score.indicators, vec![INDICATOR_LLM_SAFE]);
    }

    #[test]
    fn test_tld_alone_is_low() {
        let engine = engine();
        let features = engine
            .features("https://shop.xyz/")
            .with_verdict(ClassifierVerdict::Safe);
        let score = engine.score(&features);
        assert_eq!(score.score, 25);
        assert_eq!(score.level, ThreatLevel::Low);
    }

    #[test]
    fn test_verdict_from_reply() {
        assert_eq!(
            ClassifierVerdict::from_reply("This looks malicious to me."),
            ClassifierVerdict::Malicious
        );
        assert_eq!(ClassifierVerdict::from_reply("SAFE"), ClassifierVerdict::Safe);
        assert_eq!(ClassifierVerdict::from_reply(""), ClassifierVerdict::Safe);
    }

    #[test]
    fn test_custom_weights() {
        let tables = ScoringTables::default().with_weights(crate::scoring::ScoreWeights {
            keyword_delta: 80,
            ..Default::default()
        });
        let engine = ScoringEngine::new(tables);
        let features = engine
            .features("https://example.com/urgent")
            .with_verdict(ClassifierVerdict::Safe);
        assert_eq!(engine.score(&features).level, ThreatLevel::High);
    }

    #[test]
    fn test_huge_weights_saturate() {
        let tables = ScoringTables::default().with_weights(crate::scoring::ScoreWeights {
            malicious_delta: u32::MAX,
            keyword_delta: u32::MAX,
            ..Default::default()
        });
        let engine = ScoringEngine::new(tables);
        let features = engine
            .features("http://example.tk/verify")
            .with_verdict(ClassifierVerdict::Malicious);

        let score = engine.score(&features);
        assert_eq!(score.score, u32::MAX);
        assert_eq!(score.level, ThreatLevel::High);
        assert_eq!(score.indicators.len(), 4);
    }
}
