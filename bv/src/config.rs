//! brandvoice configuration types and loading

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::provider::PostLimits;

/// Main brandvoice configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Company-data provider configuration
    pub provider: ProviderConfig,

    /// Completion gateway configuration
    pub llm: LlmConfig,

    /// Static operator credentials
    pub auth: AuthConfig,

    /// Directory with prompt template overrides (`analyze.pmt`, `example.pmt`, `digest.pmt`)
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,

    /// Default log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that both API key environment variables are set so the first
    /// trigger does not fail on a missing secret.
    pub fn validate(&self) -> Result<()> {
        for env in [&self.provider.api_key_env, &self.llm.api_key_env] {
            if std::env::var(env).is_err() {
                return Err(eyre::eyre!("API key not found. Set the {} environment variable.", env));
            }
        }
        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .brandvoice.yml
        let local_config = PathBuf::from(".brandvoice.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/brandvoice/brandvoice.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("brandvoice").join("brandvoice.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed: the full load reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// HTTP method used against the provider endpoints
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderMethod {
    /// JSON request body
    #[default]
    Post,
    /// Query-string parameters
    Get,
}

/// Company-data provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Value sent in the provider-host header
    pub host: String,

    /// Company profile endpoint path
    #[serde(rename = "profile-path")]
    pub profile_path: String,

    /// Company updates (posts) endpoint path
    #[serde(rename = "posts-path")]
    pub posts_path: String,

    /// Request style
    pub method: ProviderMethod,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Default post/comment/repost counts for the posts endpoint
    pub limits: PostLimits,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://linkedin-data-scraper.p.rapidapi.com".to_string(),
            host: "linkedin-data-scraper.p.rapidapi.com".to_string(),
            profile_path: "/company_pro".to_string(),
            posts_path: "/company_updates".to_string(),
            method: ProviderMethod::Post,
            api_key_env: "RAPIDAPI_KEY".to_string(),
            timeout_ms: 30_000,
            limits: PostLimits::default(),
        }
    }
}

/// Completion gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL (the chat-completions path is appended)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Role description used for the system message
    pub role: String,
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            max_tokens: crate::llm::DEFAULT_MAX_TOKENS,
            timeout_ms: 30_000,
            role: crate::llm::DEFAULT_ROLE.to_string(),
        }
    }
}

/// Static operator credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// username -> password
    pub users: BTreeMap<String, String>,
}

/// API keys resolved from the environment
///
/// Read once at start-up and only handed to client constructors.
#[derive(Clone)]
pub struct Credentials {
    pub provider_key: String,
    pub gateway_key: String,
}

impl Credentials {
    /// Resolve both API keys from the environment variables named in the config
    pub fn from_config(config: &Config) -> Result<Self> {
        let provider_key = std::env::var(&config.provider.api_key_env)
            .context(format!("Provider API key not set ({})", config.provider.api_key_env))?;
        let gateway_key = std::env::var(&config.llm.api_key_env)
            .context(format!("Gateway API key not set ({})", config.llm.api_key_env))?;
        Ok(Self {
            provider_key,
            gateway_key,
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("provider_key", &"<redacted>")
            .field("gateway_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.provider.method, ProviderMethod::Post);
        assert_eq!(config.provider.timeout_ms, 30_000);
        assert_eq!(config.llm.timeout_ms, 30_000);
        assert_eq!(config.llm.role, "expert analyst");
        assert!(config.auth.users.is_empty());
        assert!(config.prompts_dir.is_none());
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
provider:
  base-url: http://localhost:9000
  host: provider.local
  method: get
  api-key-env: MY_PROVIDER_KEY
  limits:
    posts: 12
    comments: 0
    reposts: 3

llm:
  model: anthropic/claude-3.5-haiku
  api-key-env: MY_GATEWAY_KEY
  timeout-ms: 15000

auth:
  users:
    alice: secret

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.provider.base_url, "http://localhost:9000");
        assert_eq!(config.provider.method, ProviderMethod::Get);
        assert_eq!(config.provider.limits.posts, 12);
        assert_eq!(config.provider.limits.comments, 0);
        assert_eq!(config.llm.model, "anthropic/claude-3.5-haiku");
        assert_eq!(config.llm.timeout(), Duration::from_secs(15));
        assert_eq!(config.auth.users.get("alice").map(String::as_str), Some("secret"));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: mistralai/mistral-small
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "mistralai/mistral-small");
        assert_eq!(config.llm.api_key_env, "OPENROUTER_API_KEY");
        assert_eq!(config.provider.profile_path, "/company_pro");
        assert_eq!(config.provider.limits, PostLimits::default());
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bv.yml");
        fs::write(&path, "llm:\n  max-tokens: 512\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.max_tokens, 512);
    }

    #[test]
    fn test_load_explicit_path_missing_is_error() {
        let path = PathBuf::from("/definitely/not/here/bv.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    #[serial]
    fn test_credentials_from_env() {
        let mut config = Config::default();
        config.provider.api_key_env = "BV_TEST_PROVIDER_KEY".to_string();
        config.llm.api_key_env = "BV_TEST_GATEWAY_KEY".to_string();

        unsafe {
            std::env::set_var("BV_TEST_PROVIDER_KEY", "pk");
            std::env::remove_var("BV_TEST_GATEWAY_KEY");
        }
        assert!(Credentials::from_config(&config).is_err());
        assert!(config.validate().is_err());

        unsafe {
            std::env::set_var("BV_TEST_GATEWAY_KEY", "gk");
        }
        let creds = Credentials::from_config(&config).unwrap();
        assert_eq!(creds.provider_key, "pk");
        assert_eq!(creds.gateway_key, "gk");
        assert!(config.validate().is_ok());
        assert!(!format!("{:?}", creds).contains("pk"));

        unsafe {
            std::env::remove_var("BV_TEST_PROVIDER_KEY");
            std::env::remove_var("BV_TEST_GATEWAY_KEY");
        }
    }
}
