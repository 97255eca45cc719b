use regex::Regex;
use reqwest::{redirect, Client};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;
use crate::utils::error::{Result, ScrapeError};

/// Canonical product path carries the numeric product id, e.g.
/// `https://www.coupang.com/vp/products/7582946`.
const PRODUCT_PATH_PATTERN: &str = r"/vp/products/(\d+)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProduct {
    pub canonical_url: String,
    pub product_id: String,
}

/// Resolves affiliate deep links (`link.coupang.com/...`) to the
/// canonical product URL by manually walking `Location` headers, and
/// pulls the numeric product id out of the canonical path.
pub struct LinkResolver {
    client: Client,
    max_hops: u32,
    id_regex: Regex,
}

impl LinkResolver {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        // Redirects are followed by hand so each Location can be
        // inspected for the product id.
        let client = Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(Duration::from_secs(config.request_timeout))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_hops: config.max_redirect_hops,
            id_regex: Regex::new(PRODUCT_PATH_PATTERN).expect("valid product path pattern"),
        })
    }

    /// Canonical URL + product id for `url`. A URL that already carries
    /// the numeric product path resolves without any network traffic.
    pub async fn resolve(&self, url: &str) -> Result<ResolvedProduct> {
        if let Some(resolved) = self.match_product_url(url) {
            debug!(product_id = %resolved.product_id, "url already canonical");
            return Ok(resolved);
        }

        let mut current = Url::parse(url)?;

        for hop in 0..self.max_hops {
            let response = self.client.get(current.clone()).send().await?;
            let status = response.status();

            if !status.is_redirection() {
                return Err(ScrapeError::Resolution(format!(
                    "expected a redirect from {current} but got {status}, and the URL carries no product id"
                )));
            }

            let location = response
                .headers()
                .get(reqwest::header::LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| {
                    ScrapeError::Resolution(format!(
                        "redirect response from {current} had no Location header"
                    ))
                })?;

            // Location may be relative; resolve against the current URL
            let next = current.join(location)?;
            debug!(hop, from = %current, to = %next, "following redirect");

            if let Some(resolved) = self.match_product_url(next.as_str()) {
                return Ok(resolved);
            }

            if next == current {
                break; // redirect loop
            }
            current = next;
        }

        Err(ScrapeError::Resolution(format!(
            "no numeric product id found within {} redirect hops of {url}",
            self.max_hops
        )))
    }

    // Only a PATH segment counts as canonical: affiliate links often
    // mention the product path in their query string, and those still
    // have to go through the redirect probe.
    fn match_product_url(&self, url: &str) -> Option<ResolvedProduct> {
        let parsed = Url::parse(url).ok()?;
        let captures = self.id_regex.captures(parsed.path())?;
        Some(ResolvedProduct {
            canonical_url: url.to_string(),
            product_id: captures[1].to_string(),
        })
    }
}
