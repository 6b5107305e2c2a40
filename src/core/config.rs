//! Configuration management for the proxy.
//!
//! This module handles loading and parsing configuration from YAML files,
//! with support for environment variable expansion and overrides.

use anyhow::{bail, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::sync::OnceLock;
use std::time::Duration;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, stream cap)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream Anakin API settings
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Public model name -> upstream chatbot app id
    #[serde(default)]
    pub models: HashMap<String, u64>,
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of streaming responses open at the same time
    #[serde(default = "default_max_concurrent_streams")]
    pub max_concurrent_streams: usize,
}

/// Settings for the outbound HTTP exchange with the Anakin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL, without a trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `X-Anakin-Api-Version` header
    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Bound on a whole upstream call, streaming body included
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Maximum silence between two reads of a streaming body
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Whether to verify TLS certificates of the upstream
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_concurrent_streams: default_max_concurrent_streams(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            connect_timeout_secs: default_connect_timeout(),
            request_timeout_secs: default_request_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            verify_ssl: default_verify_ssl(),
        }
    }
}

impl UpstreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    18000
}

fn default_max_concurrent_streams() -> usize {
    256
}

fn default_base_url() -> String {
    "https://api.anakin.ai".to_string()
}

fn default_api_version() -> String {
    "2024-05-06".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    300
}

fn default_idle_timeout() -> u64 {
    60
}

fn default_verify_ssl() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment variables `HOST`, `PORT`, `VERIFY_SSL`,
    /// `REQUEST_TIMEOUT_SECS` and `ANAKIN_BASE_URL` take precedence over the
    /// file. The result is validated before it is returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use open_anakin::core::config::AppConfig;
    ///
    /// let config = AppConfig::load("config.yaml").expect("Failed to load config");
    /// ```
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let mut config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration text after expanding `${VAR}` references.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = expand_env_vars(content);
        let config: AppConfig = serde_yaml::from_str(&expanded)?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }

        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                self.server.port = port;
            }
        }

        if let Ok(verify_ssl_str) = std::env::var("VERIFY_SSL") {
            self.upstream.verify_ssl = str_to_bool(&verify_ssl_str);
        }

        if let Ok(timeout_str) = std::env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                self.upstream.request_timeout_secs = timeout;
            }
        }

        if let Ok(base_url) = std::env::var("ANAKIN_BASE_URL") {
            self.upstream.base_url = base_url;
        }
    }

    /// Reject configurations the proxy cannot serve with.
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            bail!("No models configured: `models` must map at least one model name to an app id");
        }
        if let Some(key) = self.models.keys().find(|k| k.trim().is_empty()) {
            bail!("Invalid model name {:?}: model names must be non-empty", key);
        }
        if self.upstream.base_url.trim().is_empty() {
            bail!("upstream.base_url must not be empty");
        }
        if self.upstream.connect_timeout_secs == 0
            || self.upstream.request_timeout_secs == 0
            || self.upstream.idle_timeout_secs == 0
        {
            bail!("upstream timeouts must be greater than zero");
        }
        if self.server.max_concurrent_streams == 0 {
            bail!("server.max_concurrent_streams must be greater than zero");
        }
        Ok(())
    }

    /// Base URL with any trailing slash removed.
    pub fn upstream_base_url(&self) -> &str {
        self.upstream.base_url.trim_end_matches('/')
    }
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"\$\{([^}:]+)(?::-?([^}]*))?\}"#).expect("env var pattern is valid")
    })
}

/// Expand environment variables in configuration content.
///
/// Supports patterns: ${VAR}, ${VAR:-default}, ${VAR:default}
fn expand_env_vars(content: &str) -> String {
    env_var_pattern()
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .to_string()
}

/// Convert string to boolean.
///
/// Accepts: "true", "1", "yes", "on" (case-insensitive)
fn str_to_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}
