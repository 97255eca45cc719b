use reqwest::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::config::{HttpConfig, RenderApiConfig};
use crate::utils::error::{Result, ScrapeError};

#[derive(Debug, Deserialize)]
struct RenderResponse {
    result: RenderResult,
}

#[derive(Debug, Deserialize)]
struct RenderResult {
    content: String,
}

/// Client for a managed scraping service that renders pages through
/// proxies with fingerprint evasion. The service assigns cookies and
/// anti-bot state to a named session; reusing the same session name
/// across calls preserves that state.
pub struct RenderApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    country: String,
    render_js: bool,
    anti_bot_bypass: bool,
    retry_hint: u32,
    session: Mutex<String>,
}

impl RenderApiClient {
    pub fn new(config: &RenderApiConfig, http: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.request_timeout))
            .user_agent(http.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            country: config.country.clone(),
            render_js: config.render_js,
            anti_bot_bypass: config.anti_bot_bypass,
            retry_hint: http.retry_attempts,
            session: Mutex::new(new_session_name()),
        })
    }

    /// Fully rendered HTML for `url` via the service's scrape endpoint.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let session = self.session_name();
        let endpoint = format!("{}/scrape", self.base_url);
        debug!(url, session = %session, "requesting rendered content");

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("url", url),
                ("country", self.country.as_str()),
                ("render_js", bool_param(self.render_js)),
                ("asp", bool_param(self.anti_bot_bypass)),
                ("retry", bool_param(self.retry_hint > 0)),
                ("session", session.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ScrapeError::RenderApi {
                status: status.as_u16(),
                message,
            });
        }

        let body: RenderResponse = response.json().await?;
        Ok(body.result.content)
    }

    pub fn session_name(&self) -> String {
        self.lock_session().clone()
    }

    /// Mints a fresh session identifier; the next call starts with no
    /// server-side cookie state.
    pub fn reset_session(&self) {
        let mut session = self.lock_session();
        *session = new_session_name();
        debug!(session = %*session, "render session reset");
    }

    fn lock_session(&self) -> std::sync::MutexGuard<'_, String> {
        // A poisoned lock only means another caller panicked mid-String
        // clone; the value itself is still a valid session name.
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn new_session_name() -> String {
    format!("coupang-{}", Uuid::new_v4().simple())
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
