use serde::{Deserialize, Serialize};

/// Everything the pipeline knows about a product page once a scrape
/// succeeds. Produced per request, never persisted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub product_id: String,
    pub title: String,
    pub image_url: String,
    /// Smallest currency unit (KRW has no subunit).
    pub price: u64,
    pub review_count: u32,
    /// 0.0 to 5.0.
    pub rating: f32,
    /// Breadcrumb labels, top category first.
    pub category: Vec<String>,
    pub description: String,
    pub is_available: bool,
}

/// Tagged outcome of a scrape call. A call either yields a complete
/// `ProductInfo` or an error message, never a partial record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ScrapeOutcome {
    Success { data: ProductInfo },
    Error { error: String },
}

impl ScrapeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScrapeOutcome::Success { .. })
    }
}

/// Outcome plus end-to-end wall time, the public result of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeReport {
    #[serde(flatten)]
    pub outcome: ScrapeOutcome,
    pub duration_ms: u64,
}

impl ScrapeReport {
    pub fn success(data: ProductInfo, duration_ms: u64) -> Self {
        Self {
            outcome: ScrapeOutcome::Success { data },
            duration_ms,
        }
    }

    pub fn error(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            outcome: ScrapeOutcome::Error {
                error: error.into(),
            },
            duration_ms,
        }
    }
}
