//! Remote text classifier.
//!
//! The classifier is a chat-completion style HTTP endpoint. It receives a
//! prompt naming the URL and answers in free text; the verdict is read out
//! of that text by the scoring engine.
//!
//! # Requirements
//!
//! - Network access to the configured endpoint
//! - A bearer token, unless the endpoint is unauthenticated

use crate::core::DispatchError;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

/// Placeholder replaced by the URL in the prompt template.
pub const URL_PLACEHOLDER: &str = "{url}";

/// A classifier reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierReply {
    /// The generated text.
    pub content: String,
    /// Server-side creation time (unix seconds), if reported.
    pub created: Option<i64>,
}

impl ClassifierReply {
    /// Creates a reply with no creation time.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            created: None,
        }
    }

    /// Sets the creation time.
    pub fn with_created(mut self, created: i64) -> Self {
        self.created = Some(created);
        self
    }
}

/// Something that judges a URL and answers in text.
#[async_trait]
pub trait Classifier: Send + Sync + Debug {
    /// Returns a stable identifier for logs.
    fn name(&self) -> &str;

    /// Classifies one URL.
    ///
    /// # Errors
    ///
    /// - `Transport` - the service could not be reached.
    /// - `HttpStatus` - the service answered with a non-200 status.
    /// - `UnexpectedResponse` - a 200 answer without usable text.
    async fn classify(&self, url: &str) -> Result<ClassifierReply, DispatchError>;
}

/// Remote classifier configuration.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Chat-completion endpoint.
    pub endpoint: String,

    /// Bearer token (kept secret).
    pub api_token: Option<SecretString>,

    /// Model identifier sent with each request.
    pub model: String,

    /// Completion length limit.
    pub max_tokens: u32,

    /// Bound on one classification, connection included.
    pub timeout: Duration,

    /// Prompt with a `{url}` placeholder.
    pub prompt_template: String,

    /// Characters of the reply copied into `details`.
    pub details_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://router.huggingface.co/v1/chat/completions".to_string(),
            api_token: None,
            model: "google/gemma-2-2b-it".to_string(),
            max_tokens: 100,
            timeout: Duration::from_secs(30),
            prompt_template: "Analyze this URL for phishing: {url}. Reply with MALICIOUS or SAFE."
                .to_string(),
            details_chars: 200,
        }
    }
}

impl ClassifierConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Sets the bearer token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the prompt template.
    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = template.into();
        self
    }

    /// Renders the prompt for a URL.
    pub fn prompt_for(&self, url: &str) -> String {
        self.prompt_template.replace(URL_PLACEHOLDER, url)
    }
}

/// Chat-completion request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation; always one user message.
    pub messages: Vec<ChatMessage>,
    /// Completion length limit.
    pub max_tokens: u32,
}

impl ChatRequest {
    /// Builds the request for one URL.
    pub fn for_url(config: &ClassifierConfig, url: &str) -> Self {
        Self {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: config.prompt_for(url),
            }],
            max_tokens: config.max_tokens,
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role.
    pub role: String,
    /// Message text.
    #[serde(default)]
    pub content: String,
}

/// Chat-completion response body; only the fields the bridge reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Generated choices.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    /// Creation time (unix seconds).
    #[serde(default)]
    pub created: Option<i64>,
}

/// One generated choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// The generated message.
    pub message: ChatMessage,
}

impl ChatResponse {
    /// Converts the response into a reply using the first choice.
    pub fn into_reply(self) -> Result<ClassifierReply, DispatchError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DispatchError::UnexpectedResponse {
                details: "no choices in response".to_string(),
            })?;
        Ok(ClassifierReply {
            content: choice.message.content,
            created: self.created,
        })
    }
}

/// Classifier backed by a chat-completion HTTP endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use sentinel_bridge::backends::{ClassifierConfig, HttpClassifier};
///
/// let config = ClassifierConfig::new().with_api_token("hf_...");
/// let classifier = HttpClassifier::new(config)?;
/// ```
#[cfg(feature = "http-classifier")]
#[derive(Debug)]
pub struct HttpClassifier {
    config: ClassifierConfig,
    client: reqwest::Client,
}

#[cfg(feature = "http-classifier")]
impl HttpClassifier {
    /// Creates a classifier with the given configuration.
    pub fn new(config: ClassifierConfig) -> Result<Self, crate::core::ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                crate::core::ConfigError::invalid(format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self { config, client })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    fn map_transport(&self, e: reqwest::Error) -> DispatchError {
        if e.is_timeout() {
            DispatchError::Timeout {
                subject: "URL",
                elapsed: self.config.timeout,
            }
        } else {
            DispatchError::transport(e.to_string())
        }
    }
}

#[cfg(feature = "http-classifier")]
#[async_trait]
impl Classifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(&self, url: &str) -> Result<ClassifierReply, DispatchError> {
        use secrecy::ExposeSecret;

        let body = ChatRequest::for_url(&self.config, url);
        let mut request = self.client.post(&self.config.endpoint).json(&body);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| self.map_transport(e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::debug!(status = status.as_u16(), "classifier returned non-200 status");
            return Err(DispatchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_transport(e)
            } else {
                DispatchError::UnexpectedResponse {
                    details: e.to_string(),
                }
            }
        })?;

        parsed.into_reply()
    }
}
