//! Read-only lookup tables and weights for URL scoring.

use serde::{Deserialize, Serialize};

const TRUSTED_DOMAINS: &[&str] = &[
    "google.com",
    "youtube.com",
    "facebook.com",
    "twitter.com",
    "instagram.com",
    "linkedin.com",
    "netflix.com",
    "amazon.com",
    "microsoft.com",
    "apple.com",
    "github.com",
    "stackoverflow.com",
    "reddit.com",
    "wikipedia.org",
];

const RISKY_KEYWORDS: &[&str] = &["verify", "suspend", "urgent", "confirm", "secure-account"];

const SUSPICIOUS_TLDS: &[&str] = &[".tk", ".ml", ".ga", ".cf", ".gq", ".xyz"];

fn owned(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Point values and confidences for each URL signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Score reported for a whitelisted domain.
    pub whitelist_score: u32,
    /// Confidence reported for a whitelisted domain.
    pub whitelist_confidence: f64,
    /// Confidence when the classifier says safe.
    pub baseline_confidence: f64,
    /// Added when the classifier says malicious.
    pub malicious_delta: u32,
    /// Confidence when the classifier says malicious.
    pub malicious_confidence: f64,
    /// Added when the URL contains a risky keyword.
    pub keyword_delta: u32,
    /// Added for an unencrypted `http://` URL.
    pub plaintext_delta: u32,
    /// Added when the URL contains a suspicious TLD.
    pub tld_delta: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            whitelist_score: 5,
            whitelist_confidence: 0.95,
            baseline_confidence: 0.6,
            malicious_delta: 50,
            malicious_confidence: 0.75,
            keyword_delta: 30,
            plaintext_delta: 15,
            tld_delta: 25,
        }
    }
}

/// Domain, keyword and TLD tables plus weights.
///
/// Shared read-only across all requests and bridge instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTables {
    /// Known-safe domains; matched as substrings of the host.
    pub trusted_domains: Vec<String>,
    /// Phishing keywords; matched as substrings of the whole URL.
    pub risky_keywords: Vec<String>,
    /// Suspicious TLDs; matched as substrings of the whole URL.
    pub suspicious_tlds: Vec<String>,
    /// Signal weights.
    pub weights: ScoreWeights,
}

impl Default for ScoringTables {
    fn default() -> Self {
        Self {
            trusted_domains: owned(TRUSTED_DOMAINS),
            risky_keywords: owned(RISKY_KEYWORDS),
            suspicious_tlds: owned(SUSPICIOUS_TLDS),
            weights: ScoreWeights::default(),
        }
    }
}

impl ScoringTables {
    /// Creates the default tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the trusted domain list.
    pub fn with_trusted_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.trusted_domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a trusted domain.
    pub fn with_trusted_domain(mut self, domain: impl Into<String>) -> Self {
        self.trusted_domains.push(domain.into());
        self
    }

    /// Replaces the weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Returns `true` if the URL's host contains a trusted domain.
    pub fn is_trusted(&self, url: &str) -> bool {
        let host = host_of(url).to_lowercase();
        self.trusted_domains
            .iter()
            .any(|domain| host.contains(&domain.to_lowercase()))
    }

    /// Returns `true` if the URL contains any risky keyword.
    pub fn has_risky_keyword(&self, url: &str) -> bool {
        contains_any(&url.to_lowercase(), &self.risky_keywords)
    }

    /// Returns `true` if the URL contains any suspicious TLD.
    pub fn has_suspicious_tld(&self, url: &str) -> bool {
        contains_any(&url.to_lowercase(), &self.suspicious_tlds)
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}

/// Returns the segment after the scheme: the third `/`-separated piece,
/// or the whole input when there are fewer than three.
///
/// The host keeps any port or userinfo; trusted-domain matching is a
/// substring test and tolerates both.
pub fn host_of(url: &str) -> &str {
    url.split('/').nth(2).unwrap_or(url)
}
