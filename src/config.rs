use crate::error::ConfigError;
use crate::renderers::scroll::ScrollPolicy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Configuration for the browser renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Whether to ask the browser to run without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Upper bound for the initial navigation
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Pause after each scroll so lazy content can load
    #[serde(default = "default_scroll_interval_ms")]
    pub scroll_interval_ms: u64,

    /// Maximum number of scrolls before giving up on convergence
    #[serde(default = "default_max_scroll_attempts")]
    pub max_scroll_attempts: u32,

    /// Upper bound for any other single WebDriver command
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_secs: u64,
}

/// Configuration for the identity service client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity service (e.g. https://project.supabase.co)
    #[serde(default)]
    pub base_url: String,

    /// Public API key sent alongside the caller's credential
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_identity_timeout_secs")]
    pub timeout_secs: u64,
}

/// Configuration for the link store client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the REST store
    #[serde(default)]
    pub base_url: String,

    /// Key used for store writes and reads
    #[serde(default)]
    pub api_key: String,

    /// Table holding the persisted links
    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_store_timeout_secs")]
    pub timeout_secs: u64,

    /// Page size for history queries that don't specify one
    #[serde(default = "default_query_limit")]
    pub default_query_limit: usize,
}

/// Configuration for the HTTP boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind, e.g. 127.0.0.1:8080
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Whole-request timeout; must cover navigation plus scrolling
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Allowed CORS origins (none means CORS is not enabled)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Full service configuration, resolved once at start-up
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl ServiceConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Override settings from the process environment
    pub fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override settings from an arbitrary lookup; empty values are ignored
    pub fn apply_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("WEBDRIVER_URL") {
            self.render.webdriver_url = v;
        }
        if let Some(v) = get("YIELD_LINKS_IDENTITY_URL") {
            self.identity.base_url = v;
        }
        if let Some(v) = get("YIELD_LINKS_STORE_URL") {
            self.store.base_url = v;
        }
        if let Some(v) = get("YIELD_LINKS_API_KEY") {
            self.identity.api_key = v.clone();
            self.store.api_key = v;
        }
        if let Some(v) = get("YIELD_LINKS_BIND") {
            self.server.bind = v;
        }
        self
    }

    /// Check the configuration before any client is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_service_url("identity.base_url", &self.identity.base_url)?;
        check_service_url("store.base_url", &self.store.base_url)?;
        self.validate_render()?;

        if self.store.table.trim().is_empty() {
            return Err(ConfigError::Invalid("store.table must not be empty".into()));
        }
        if self.identity.timeout_secs == 0
            || self.store.timeout_secs == 0
            || self.server.request_timeout_secs == 0
        {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    /// Render-only checks, used when running without remote services
    pub fn validate_render(&self) -> Result<(), ConfigError> {
        check_service_url("render.webdriver_url", &self.render.webdriver_url)?;
        if self.render.max_scroll_attempts == 0 {
            return Err(ConfigError::Invalid(
                "render.max_scroll_attempts must be at least 1".into(),
            ));
        }
        if self.render.navigation_timeout_secs == 0 || self.render.command_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        Ok(())
    }
}

impl RenderConfig {
    /// Scroll-convergence parameters derived from this config
    pub fn scroll_policy(&self) -> ScrollPolicy {
        ScrollPolicy {
            interval: Duration::from_millis(self.scroll_interval_ms),
            max_attempts: self.max_scroll_attempts,
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            headless: default_headless(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            scroll_interval_ms: default_scroll_interval_ms(),
            max_scroll_attempts: default_max_scroll_attempts(),
            command_timeout_secs: default_command_timeout_secs(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_identity_timeout_secs(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            table: default_table(),
            timeout_secs: default_store_timeout_secs(),
            default_query_limit: default_query_limit(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            cors_origins: Vec::new(),
        }
    }
}

fn check_service_url(field: &str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        Ok(_) => Err(ConfigError::Invalid(format!(
            "{field} must be an http(s) URL"
        ))),
        Err(e) => Err(ConfigError::Invalid(format!("{field}: {e}"))),
    }
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_headless() -> bool {
    true
}

fn default_navigation_timeout_secs() -> u64 {
    90
}

fn default_scroll_interval_ms() -> u64 {
    3000
}

fn default_max_scroll_attempts() -> u32 {
    30
}

fn default_command_timeout_secs() -> u64 {
    30
}

fn default_identity_timeout_secs() -> u64 {
    10
}

fn default_table() -> String {
    "scraped_links".to_string()
}

fn default_store_timeout_secs() -> u64 {
    15
}

fn default_query_limit() -> usize {
    50
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

/// Navigation (90s) plus a full scroll run (30 x 3s) with headroom
fn default_request_timeout_secs() -> u64 {
    240
}

fn default_max_body_bytes() -> usize {
    65_536
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn complete_config() -> ServiceConfig {
        ServiceConfig::from_json(
            r#"{
                "identity": { "base_url": "https://id.example.com", "api_key": "anon" },
                "store": { "base_url": "https://db.example.com", "api_key": "service" }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = complete_config();
        assert_eq!(config.render.webdriver_url, "http://localhost:4444");
        assert_eq!(config.render.navigation_timeout_secs, 90);
        assert_eq!(config.render.scroll_interval_ms, 3000);
        assert_eq!(config.render.max_scroll_attempts, 30);
        assert_eq!(config.store.table, "scraped_links");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scroll_policy() {
        let policy = RenderConfig::default().scroll_policy();
        assert_eq!(policy.interval, Duration::from_secs(3));
        assert_eq!(policy.max_attempts, 30);
    }

    #[test]
    fn test_env_overrides_ignore_empty_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WEBDRIVER_URL", "http://chrome:9515"),
            ("YIELD_LINKS_API_KEY", "shared-key"),
            ("YIELD_LINKS_BIND", "   "),
        ]);
        let config = complete_config().apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.render.webdriver_url, "http://chrome:9515");
        assert_eq!(config.identity.api_key, "shared-key");
        assert_eq!(config.store.api_key, "shared-key");
        assert_eq!(config.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_validate_rejects_missing_service_urls() {
        let config = ServiceConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_zero_scroll_attempts() {
        let mut config = complete_config();
        config.render.max_scroll_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            ServiceConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
