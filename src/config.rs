use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub browser: BrowserConfig,
    pub render_api: RenderApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds, applied to every HTTP call.
    pub request_timeout: u64,
    /// Forwarded to the managed render service as its retry hint.
    /// The pipeline itself never retries beyond the primary->fallback
    /// escalation.
    pub retry_attempts: u32,
    pub user_agent: String,
    /// Cap on manual Location-following hops during deep-link resolution.
    pub max_redirect_hops: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    pub enabled: bool,
    pub chrome_path: Option<String>,
    /// Element to wait for before reading rendered content.
    pub wait_selector: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderApiConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: String,
    /// Proxy country passed through to the service.
    pub country: String,
    pub render_js: bool,
    pub anti_bot_bypass: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables, e.g. COUPANG_SCRAPER__HTTP__USER_AGENT
            .add_source(
                Environment::with_prefix("COUPANG_SCRAPER")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;

        // Chrome path and API key fall back to their conventional env vars
        if config.browser.chrome_path.is_none() {
            config.browser.chrome_path = env::var("CHROME_PATH").ok();
        }
        if config.render_api.api_key.is_empty() {
            if let Ok(key) = env::var("RENDER_API_KEY") {
                config.render_api.api_key = key;
            }
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.request_timeout == 0 {
            return Err(ConfigError::Message(
                "http.request_timeout must be greater than 0".into(),
            ));
        }

        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("http.user_agent must not be empty".into()));
        }

        if self.http.max_redirect_hops == 0 {
            return Err(ConfigError::Message(
                "http.max_redirect_hops must be greater than 0".into(),
            ));
        }

        if self.render_api.enabled {
            if Url::parse(&self.render_api.base_url).is_err() {
                return Err(ConfigError::Message(
                    "render_api.base_url must be a valid URL when render_api is enabled".into(),
                ));
            }

            if self.render_api.api_key.trim().is_empty() {
                return Err(ConfigError::Message(
                    "render_api.api_key must be set when render_api is enabled".into(),
                ));
            }
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig {
                request_timeout: 15,
                retry_attempts: 1,
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
                max_redirect_hops: 5,
            },
            browser: BrowserConfig {
                enabled: false,
                chrome_path: None,
                wait_selector: None,
            },
            render_api: RenderApiConfig {
                enabled: false,
                base_url: String::new(),
                api_key: String::new(),
                country: "kr".to_string(),
                render_js: true,
                anti_bot_bypass: true,
            },
        }
    }
}
