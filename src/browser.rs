use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::time::Duration;
use tracing::debug;

use crate::config::{BrowserConfig, HttpConfig};
use crate::utils::error::{Result, ScrapeError};

/// Headless-browser render tier: navigates a tab and hands back the
/// fully rendered markup for re-extraction. Used when the static fetch
/// came back incomplete and no managed render service is configured.
pub struct BrowserRenderer {
    browser: Browser,
    user_agent: String,
    wait_selector: Option<String>,
    timeout: Duration,
}

impl BrowserRenderer {
    pub fn new(config: &BrowserConfig, http: &HttpConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--disable-background-timer-throttling"),
            ])
            .build()
            .map_err(|e| ScrapeError::Browser(format!("failed to build launch options: {e}")))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| ScrapeError::Browser(format!("failed to launch browser: {e}")))?;

        Ok(Self {
            browser,
            user_agent: http.user_agent.clone(),
            wait_selector: config.wait_selector.clone(),
            timeout: Duration::from_secs(http.request_timeout),
        })
    }

    /// Rendered HTML of `url` after client-side scripts have run.
    pub async fn render(&self, url: &str) -> Result<String> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| ScrapeError::Browser(format!("failed to create tab: {e}")))?;

        tab.set_user_agent(&self.user_agent, None, None)
            .map_err(|e| ScrapeError::Browser(format!("failed to set user agent: {e}")))?;

        tab.navigate_to(url)
            .map_err(|e| ScrapeError::Browser(format!("navigation failed: {e}")))?;
        tab.wait_until_navigated()
            .map_err(|e| ScrapeError::Browser(format!("page load failed: {e}")))?;

        if let Some(selector) = &self.wait_selector {
            // The page may still be extractable without this element
            // (sold-out layouts drop it), so a miss is not fatal.
            if let Err(e) = tab.wait_for_element_with_custom_timeout(selector, self.timeout) {
                debug!(selector, error = %e, "wait selector never appeared, reading content anyway");
            }
        }

        let html = tab
            .get_content()
            .map_err(|e| ScrapeError::Browser(format!("failed to get page content: {e}")))?;

        // Close tab to free resources
        let _ = tab.close(true);

        Ok(html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_renderer_creation_reports_browser_errors() {
        let mut config = AppConfig::default();
        config.browser.chrome_path = Some("/nonexistent/chrome-binary".to_string());

        // Launching a browser needs Chrome on the machine; with a bogus
        // path the constructor must fail with a Browser error rather
        // than panic.
        match BrowserRenderer::new(&config.browser, &config.http) {
            Ok(_) => {} // some environments resolve a system Chrome anyway
            Err(e) => assert!(matches!(e, ScrapeError::Browser(_))),
        }
    }
}
