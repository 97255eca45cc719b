use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::browser::BrowserRenderer;
use crate::config::AppConfig;
use crate::extractor::PageExtractor;
use crate::models::{ProductInfo, ScrapeReport};
use crate::render_api::RenderApiClient;
use crate::resolver::{LinkResolver, ResolvedProduct};
use crate::utils::error::{Result, ScrapeError};

/// What the static tier produced, including why it came up empty.
enum StaticTier {
    Extracted(ProductInfo),
    Incomplete,
    FetchFailed(ScrapeError),
}

/// The whole pipeline behind one call: resolve the deep link, try the
/// cheap static fetch, escalate to a rendered fallback tier when the
/// static markup is incomplete. Explicitly constructed and
/// configuration-injected; build one and share it across calls.
pub struct ProductScraper {
    client: Client,
    resolver: LinkResolver,
    extractor: PageExtractor,
    browser: Option<BrowserRenderer>,
    render_api: Option<RenderApiClient>,
}

impl ProductScraper {
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http.request_timeout))
            .user_agent(config.http.user_agent.clone())
            .build()?;

        let render_api = if config.render_api.enabled {
            Some(RenderApiClient::new(&config.render_api, &config.http)?)
        } else {
            None
        };

        // The managed service subsumes JS rendering, so Chrome is only
        // launched when it is the sole fallback tier.
        let browser = if config.browser.enabled && render_api.is_none() {
            Some(BrowserRenderer::new(&config.browser, &config.http)?)
        } else {
            None
        };

        Ok(Self {
            client,
            resolver: LinkResolver::new(&config.http)?,
            extractor: PageExtractor::new(),
            browser,
            render_api,
        })
    }

    /// Runs the full pipeline for one URL. Never returns an error and
    /// never panics on bad input: every failure is folded into an
    /// error-status report, with end-to-end wall time on both paths.
    pub async fn scrape(&self, url: &str) -> ScrapeReport {
        let start = Instant::now();

        match self.scrape_inner(url).await {
            Ok(data) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!(url, product_id = %data.product_id, duration_ms, "scrape succeeded");
                ScrapeReport::success(data, duration_ms)
            }
            Err(e) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                warn!(url, duration_ms, error = %e, "scrape failed");
                ScrapeReport::error(e.to_string(), duration_ms)
            }
        }
    }

    /// Discard the managed service's cookie/anti-bot session, if that
    /// tier is configured. The next call starts a fresh session.
    pub fn reset_render_session(&self) {
        if let Some(api) = &self.render_api {
            api.reset_session();
        }
    }

    async fn scrape_inner(&self, url: &str) -> Result<ProductInfo> {
        let resolved = self.resolver.resolve(url).await?;
        debug!(product_id = %resolved.product_id, canonical = %resolved.canonical_url, "resolved");

        let static_tier = match self.try_static(&resolved).await {
            StaticTier::Extracted(info) => return Ok(info),
            other => other,
        };

        let html = match self.render_fallback(&resolved).await? {
            Some(html) => html,
            None => {
                // No tier left; report what actually stopped the static one
                let cause = match static_tier {
                    StaticTier::FetchFailed(e) => format!("static fetch failed ({e})"),
                    _ => "static markup is incomplete".to_string(),
                };
                return Err(ScrapeError::Extraction(format!(
                    "{cause} for product {} and no fallback tier is enabled",
                    resolved.product_id
                )));
            }
        };

        self.extractor
            .extract(&html, &resolved.product_id)
            .ok_or_else(|| {
                ScrapeError::Extraction(format!(
                    "rendered page for product {} is missing critical fields",
                    resolved.product_id
                ))
            })
    }

    /// Static tier. A blocked or failed fetch escalates exactly like
    /// incomplete markup does; only the fallback's verdict is final.
    /// The failure cause is kept so it can be reported when no
    /// fallback tier exists to escalate to.
    async fn try_static(&self, resolved: &ResolvedProduct) -> StaticTier {
        match self.fetch_static(&resolved.canonical_url).await {
            Ok(html) => match self.extractor.extract(&html, &resolved.product_id) {
                Some(info) => StaticTier::Extracted(info),
                None => {
                    debug!(product_id = %resolved.product_id, "static markup incomplete, escalating");
                    StaticTier::Incomplete
                }
            },
            Err(e) => {
                warn!(product_id = %resolved.product_id, error = %e, "static fetch failed, escalating");
                StaticTier::FetchFailed(e)
            }
        }
    }

    async fn fetch_static(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }

    async fn render_fallback(&self, resolved: &ResolvedProduct) -> Result<Option<String>> {
        if let Some(api) = &self.render_api {
            debug!(product_id = %resolved.product_id, "escalating to managed render service");
            return api.fetch(&resolved.canonical_url).await.map(Some);
        }

        if let Some(browser) = &self.browser {
            debug!(product_id = %resolved.product_id, "escalating to headless browser");
            return browser.render(&resolved.canonical_url).await.map(Some);
        }

        Ok(None)
    }
}
