//! Configuration management for Jarvis
//!
//! Credentials come from `GOOGLE_API_KEY` and `EXA_API_KEY`. Everything else
//! is read from `JARVIS_*` environment variables (nested with `__`, e.g.
//! `JARVIS_LLM__MODEL`) on top of built-in defaults. A `.env` file in the
//! working directory is loaded first if present.

use crate::{Error, Result};
use config::Environment;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Environment variable holding the Gemini API key
pub const GOOGLE_API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Environment variable holding the Exa API key
pub const EXA_API_KEY_VAR: &str = "EXA_API_KEY";

fn default_secret() -> SecretString {
    SecretString::from(String::new())
}

/// Gemini (language model) configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key
    #[serde(skip_deserializing, default = "default_secret")]
    pub api_key: SecretString,
    /// Model identifier
    pub model: String,
    /// Base URL of the Generative Language API
    pub base_url: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum output tokens per generation
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: default_secret(),
            model: "gemini-2.0-flash-exp".to_string(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            max_output_tokens: 2048,
            timeout_secs: 60,
        }
    }
}

impl GeminiConfig {
    /// Default settings with an explicit API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        GeminiConfig {
            api_key: SecretString::from(api_key.into()),
            ..Default::default()
        }
    }
}

/// Exa (web search) configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExaConfig {
    /// API key
    #[serde(skip_deserializing, default = "default_secret")]
    pub api_key: SecretString,
    /// Base URL of the Exa API
    pub base_url: String,
    /// Number of results requested per search
    pub num_results: usize,
    /// Let Exa rewrite the query
    pub use_autoprompt: bool,
    /// Maximum characters of page text requested from the provider
    pub max_characters: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ExaConfig {
    fn default() -> Self {
        ExaConfig {
            api_key: default_secret(),
            base_url: "https://api.exa.ai".to_string(),
            num_results: 5,
            use_autoprompt: true,
            max_characters: 1000,
            timeout_secs: 30,
        }
    }
}

impl ExaConfig {
    /// Default settings with an explicit API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        ExaConfig {
            api_key: SecretString::from(api_key.into()),
            ..Default::default()
        }
    }
}

/// Agent loop settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Language the assistant answers in
    pub language: String,
    /// Maximum number of search rounds per run
    pub max_tool_rounds: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            language: "Korean".to_string(),
            max_tool_rounds: 5,
        }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter
    pub level: String,
    /// Log format (pretty, json)
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: "info,jarvis=debug,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language model settings
    pub llm: GeminiConfig,
    /// Search provider settings
    pub search: ExaConfig,
    /// Agent loop settings
    pub agent: AgentConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Logging settings
    #[serde(skip)]
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_vars(env_source(), |name| std::env::var(name).ok())
    }

    /// Layer `source` over the defaults, then take credentials and logging
    /// settings from `var`.
    fn from_vars<F>(source: Environment, var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::from_source(source)?;

        config.llm.api_key = SecretString::from(var(GOOGLE_API_KEY_VAR).unwrap_or_default());
        config.search.api_key = SecretString::from(var(EXA_API_KEY_VAR).unwrap_or_default());

        let defaults = LogConfig::default();
        config.log = LogConfig {
            level: var("RUST_LOG").unwrap_or(defaults.level),
            format: var("LOG_FORMAT").unwrap_or(defaults.format),
        };

        Ok(config)
    }

    /// Build non-secret settings from an arbitrary `config` source.
    /// API keys are left empty.
    pub fn from_source<S>(source: S) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(source)
            .build()?
            .try_deserialize::<Config>()?;
        Ok(config)
    }

    /// Validate that all required configuration is present
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.expose_secret().is_empty() {
            return Err(Error::Config(format!("{} is required", GOOGLE_API_KEY_VAR)));
        }
        if self.search.api_key.expose_secret().is_empty() {
            return Err(Error::Config(format!("{} is required", EXA_API_KEY_VAR)));
        }
        validate_url("llm.base_url", &self.llm.base_url)?;
        validate_url("search.base_url", &self.search.base_url)?;
        if self.search.num_results == 0 {
            return Err(Error::Config(
                "search.num_results must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// `JARVIS_*` variables, nested with `__` (`JARVIS_AGENT__MAX_TOOL_ROUNDS`)
pub fn env_source() -> Environment {
    Environment::with_prefix("JARVIS")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| Error::Config(format!("Invalid {} '{}': {}", field, value, e)))
}
