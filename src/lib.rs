pub mod browser;
pub mod config;
pub mod extractor;
pub mod models;
pub mod parse;
pub mod render_api;
pub mod resolver;
pub mod scraper;
pub mod utils;

// Re-export commonly used types
pub use config::AppConfig;
pub use models::{ProductInfo, ScrapeOutcome, ScrapeReport};
pub use scraper::ProductScraper;
pub use utils::error::ScrapeError;

pub type Result<T> = std::result::Result<T, ScrapeError>;
