// src/insight/client.rs
//! Text-generation client abstraction + concrete providers.
//!
//! Providers only move bytes: they return the decoded JSON body or a
//! transport error. Interpreting the body shape is the requestor's job.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};

use crate::config::insight::InsightConfig;
use crate::error::{DashboardError, Result};

/// Trait object used by the service and tests.
#[async_trait::async_trait]
pub trait InsightClient: Send + Sync {
    /// One outbound request carrying `prompt` as the sole user turn.
    async fn generate(&self, prompt: &str) -> Result<Value>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

/// Convenient alias used by callers.
pub type DynInsightClient = Arc<dyn InsightClient>;

/// Factory: build a client according to config and environment variables.
///
/// * If `INSIGHT_TEST_MODE=mock`, returns a deterministic mock client.
/// * Else if `config.enabled == false`, returns a disabled client.
/// * Else builds the real `generateContent` client.
pub fn build_client(config: &InsightConfig) -> Result<DynInsightClient> {
    if std::env::var("INSIGHT_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Ok(Arc::new(MockClient::replying_text(
            "Solid open rate; test a stronger call to action to lift clicks (mock).",
        )));
    }
    if !config.enabled {
        return Ok(Arc::new(DisabledClient));
    }
    Ok(Arc::new(GeminiClient::from_config(config)?))
}

// ------------------------------------------------------------
// generateContent provider
// ------------------------------------------------------------

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

impl<'a> GenerateRequest<'a> {
    fn single_turn(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        }
    }
}

/// POSTs to `{endpoint}/{model}:generateContent`.
pub struct GeminiClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl GeminiClient {
    pub fn from_config(config: &InsightConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "campaign-insights/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| DashboardError::Config(format!("http client: {e}")))?;
        Ok(Self {
            http,
            url: config.generate_url(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl InsightClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Value> {
        let mut req = self
            .http
            .post(&self.url)
            .json(&GenerateRequest::single_turn(prompt));
        if !self.api_key.is_empty() {
            req = req.query(&[("key", self.api_key.as_str())]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| DashboardError::Transport(format!("request failed: {e}")))?;

        // Status is not inspected: an error body without candidates is a shape problem.
        let status = resp.status();
        resp.json::<Value>().await.map_err(|e| {
            DashboardError::Transport(format!("response body is not JSON (HTTP {status}): {e}"))
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

// ------------------------------------------------------------
// Disabled + mock
// ------------------------------------------------------------

/// Always fails with a transport error; used when generation is disabled.
pub struct DisabledClient;

#[async_trait::async_trait]
impl InsightClient for DisabledClient {
    async fn generate(&self, _prompt: &str) -> Result<Value> {
        Err(DashboardError::Transport(
            "insight generation is disabled".into(),
        ))
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Canned replies for tests/local runs. Remembers every prompt it was sent.
pub struct MockClient {
    reply: Result<Value>,
    prompts: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn replying(body: Value) -> Self {
        Self {
            reply: Ok(body),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Well-formed single-candidate body carrying `text`.
    pub fn replying_text(text: &str) -> Self {
        Self::replying(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        }))
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            reply: Err(DashboardError::Transport(reason.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("poisoned prompts").clone()
    }
}

#[async_trait::async_trait]
impl InsightClient for MockClient {
    async fn generate(&self, prompt: &str) -> Result<Value> {
        self.prompts
            .lock()
            .expect("poisoned prompts")
            .push(prompt.to_string());
        self.reply.clone()
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
