use scraper::{Html, Selector};
use tracing::debug;

use crate::models::ProductInfo;
use crate::parse::FieldParser;

/// A candidate source for one field: a CSS selector plus an optional
/// attribute to read (text content when `None`).
type Candidate = (&'static str, Option<&'static str>);

// Candidate lists are ordered by reliability: Open Graph meta tags
// first, the marketplace's semantic classes second, generic tags last.

const TITLE_CANDIDATES: &[Candidate] = &[
    (r#"meta[property="og:title"]"#, Some("content")),
    (".prod-buy-header__title", None),
    ("h1", None),
    ("title", None),
];

const IMAGE_CANDIDATES: &[Candidate] = &[
    (r#"meta[property="og:image"]"#, Some("content")),
    (".prod-image__detail", Some("src")),
    ("img.prod-image__detail", Some("src")),
    (".prod-image img", Some("src")),
];

const PRICE_CANDIDATES: &[Candidate] = &[
    (".total-price > strong", None),
    (".prod-sale-price .total-price", None),
    (".prod-coupon-price .total-price", None),
    ("span.total-price", None),
];

const RATING_CANDIDATES: &[Candidate] = &[
    (".rating-star-num", Some("style")),
    (".prod-buy-header .rating", None),
    (".rating", None),
];

const REVIEW_COUNT_CANDIDATES: &[Candidate] = &[
    (".prod-buy-header__review-count", None),
    ("span.count", None),
    (".count", None),
];

const DESCRIPTION_CANDIDATES: &[Candidate] = &[
    (r#"meta[property="og:description"]"#, Some("content")),
    (".prod-description", None),
    ("#itemBrief", None),
];

const CATEGORY_CANDIDATES: &[&str] = &["#breadcrumb li a", ".breadcrumb a"];

// Any of these present means the listing is sold out or delisted.
const UNAVAILABLE_SELECTORS: &[&str] = &[".oos-label", ".out-of-stock", ".sold-out", ".prod-not-find-known"];

/// Pulls the product field set out of already-fetched HTML. Shared by
/// the static tier and both rendered fallback tiers, so escalation is
/// purely a question of which HTML it gets fed.
pub struct PageExtractor {
    parser: FieldParser,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageExtractor {
    pub fn new() -> Self {
        Self {
            parser: FieldParser::new(),
        }
    }

    /// `None` when any of {title, image, price} is missing or the price
    /// parses to zero. That signals "escalate to the fallback tier",
    /// not a hard failure.
    pub fn extract(&self, html: &str, product_id: &str) -> Option<ProductInfo> {
        let document = Html::parse_document(html);

        let title = self.select_first(&document, TITLE_CANDIDATES);
        let image = self
            .select_first(&document, IMAGE_CANDIDATES)
            .map(normalize_image_url);
        let price = self
            .select_first(&document, PRICE_CANDIDATES)
            .map(|text| self.parser.parse_price(&text))
            .unwrap_or(0);

        let (title, image) = match (title, image) {
            (Some(title), Some(image)) if price > 0 => (title, image),
            _ => {
                debug!(product_id, price, "critical fields incomplete, extraction yields nothing");
                return None;
            }
        };

        let rating = self
            .select_first(&document, RATING_CANDIDATES)
            .map(|text| self.parser.parse_rating(&text))
            .unwrap_or(0.0);
        let review_count = self
            .select_first(&document, REVIEW_COUNT_CANDIDATES)
            .map(|text| self.parser.parse_count(&text))
            .unwrap_or(0);
        let description = self
            .select_first(&document, DESCRIPTION_CANDIDATES)
            .unwrap_or_default();

        Some(ProductInfo {
            product_id: product_id.to_string(),
            title,
            image_url: image,
            price,
            review_count,
            rating,
            category: self.extract_breadcrumb(&document),
            description,
            is_available: self.is_available(&document),
        })
    }

    /// First non-empty value across the ordered candidate list.
    fn select_first(&self, document: &Html, candidates: &[Candidate]) -> Option<String> {
        for (selector_str, attribute) in candidates {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };

            for element in document.select(&selector) {
                let value = match attribute {
                    Some(attr) => element.value().attr(attr).map(str::to_string),
                    None => Some(element.text().collect::<Vec<_>>().join(" ")),
                };

                if let Some(value) = value {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        return Some(trimmed.to_string());
                    }
                }
            }
        }

        None
    }

    fn extract_breadcrumb(&self, document: &Html) -> Vec<String> {
        for selector_str in CATEGORY_CANDIDATES {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };

            let labels: Vec<String> = document
                .select(&selector)
                .map(|element| element.text().collect::<Vec<_>>().join(" ").trim().to_string())
                .filter(|label| !label.is_empty())
                .collect();

            if !labels.is_empty() {
                return labels;
            }
        }

        Vec::new()
    }

    fn is_available(&self, document: &Html) -> bool {
        !UNAVAILABLE_SELECTORS.iter().any(|selector_str| {
            Selector::parse(selector_str)
                .map(|selector| document.select(&selector).next().is_some())
                .unwrap_or(false)
        })
    }
}

/// CDN image URLs are often protocol-relative in server markup.
fn normalize_image_url(url: String) -> String {
    if let Some(rest) = url.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        url
    }
}
