// src/config/insight.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

use crate::session::StaleResponsePolicy;

pub const ENV_CONFIG_PATH: &str = "INSIGHT_CONFIG_PATH";
pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_ENDPOINT: &str = "INSIGHT_ENDPOINT";

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta/models".to_string()
}
fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

/// Deployment-time settings for the text-generation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Base URL; the model path and `:generateContent` are appended.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from GEMINI_API_KEY
    #[serde(default)]
    pub api_key: String,
    /// What to do with a response that arrives after the selection moved on.
    #[serde(default)]
    pub stale_policy: StaleResponsePolicy,
    /// No timeout unless set.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: String::new(),
            stale_policy: StaleResponsePolicy::default(),
            request_timeout_secs: None,
        }
    }
}

impl InsightConfig {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading insight config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&data, &ext)?;
        cfg.finish()
    }

    /// Load using env var + fallbacks:
    /// 1) $INSIGHT_CONFIG_PATH
    /// 2) config/insight.toml
    /// 3) config/insight.json
    /// 4) built-in defaults (generation disabled)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from_file(&pb);
        }
        for candidate in ["config/insight.toml", "config/insight.json"] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
        }
        Self::default().finish()
    }

    /// Full `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model.trim()
        )
    }

    /// Apply env overrides and resolve the "ENV" api key.
    fn finish(mut self) -> Result<Self> {
        if let Ok(ep) = env::var(ENV_ENDPOINT) {
            if !ep.trim().is_empty() {
                self.endpoint = ep.trim().to_string();
            }
        }
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = match env::var(ENV_API_KEY) {
                Ok(k) => k,
                Err(_) if self.enabled => {
                    return Err(anyhow!("Missing {ENV_API_KEY} env var"));
                }
                Err(_) => String::new(),
            };
        }
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
        Ok(self)
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<InsightConfig> {
    match hint_ext {
        "toml" => toml::from_str(s).context("parsing TOML insight config"),
        "json" => serde_json::from_str(s).context("parsing JSON insight config"),
        _ => serde_json::from_str(s)
            .or_else(|_| toml::from_str(s))
            .map_err(|_| anyhow!("unsupported insight config format")),
    }
}
