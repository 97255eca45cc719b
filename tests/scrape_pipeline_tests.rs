// End-to-end pipeline tests against a mocked marketplace.
//
// Every scenario drives the public `ProductScraper::scrape` entry point;
// the mock server stands in for the product pages, the affiliate
// redirector, and the managed render service.

use coupang_scraper::{AppConfig, ProductScraper, ScrapeOutcome};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FULL_PRODUCT_HTML: &str = r#"
    <html>
      <head>
        <meta property="og:title" content="Mechanical Keyboard K3" />
        <meta property="og:image" content="//thumbnail10.coupangcdn.com/thumbnails/k3.jpg" />
        <meta property="og:description" content="Low-profile hot-swappable keyboard." />
      </head>
      <body>
        <ul id="breadcrumb">
          <li><a>Home</a></li>
          <li><a>Computers</a></li>
          <li><a>Keyboards</a></li>
        </ul>
        <span class="rating-star-num" style="background-position: 80%"></span>
        <span class="count">(2,345)</span>
        <div class="prod-sale-price">
          <span class="total-price"><strong>89,000원</strong></span>
        </div>
      </body>
    </html>
"#;

// Server-rendered shell without a price: what a client-side-rendered
// page looks like to the static tier.
const SHELL_HTML: &str = r#"
    <html>
      <head>
        <meta property="og:title" content="Mechanical Keyboard K3" />
        <meta property="og:image" content="https://thumbnail10.coupangcdn.com/thumbnails/k3.jpg" />
      </head>
      <body><div id="app"></div></body>
    </html>
"#;

fn static_only_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.http.request_timeout = 5;
    config.browser.enabled = false;
    config.render_api.enabled = false;
    config
}

#[tokio::test]
async fn scrape_succeeds_from_static_markup() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vp/products/7582946"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_PRODUCT_HTML))
        .mount(&server)
        .await;

    let scraper = ProductScraper::new(&static_only_config()).unwrap();
    let report = scraper
        .scrape(&format!("{}/vp/products/7582946", server.uri()))
        .await;

    let data = match report.outcome {
        ScrapeOutcome::Success { data } => data,
        ScrapeOutcome::Error { error } => panic!("expected success, got: {error}"),
    };

    assert_eq!(data.product_id, "7582946");
    assert_eq!(data.title, "Mechanical Keyboard K3");
    assert_eq!(
        data.image_url,
        "https://thumbnail10.coupangcdn.com/thumbnails/k3.jpg"
    );
    assert_eq!(data.price, 89000);
    assert_eq!(data.review_count, 2345);
    assert!((data.rating - 4.0).abs() < f32::EPSILON);
    assert_eq!(data.category, vec!["Home", "Computers", "Keyboards"]);
    assert_eq!(data.description, "Low-profile hot-swappable keyboard.");
    assert!(data.is_available);
    // u64 is non-negative by construction; the field just has to exist
    // with a sane magnitude
    assert!(report.duration_ms < 60_000);
}

#[tokio::test]
async fn deep_link_follows_redirect_to_product_id() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/re/AFF123"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/vp/products/777", server.uri()).as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vp/products/777"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_PRODUCT_HTML))
        .mount(&server)
        .await;

    let scraper = ProductScraper::new(&static_only_config()).unwrap();
    let report = scraper.scrape(&format!("{}/re/AFF123", server.uri())).await;

    match report.outcome {
        ScrapeOutcome::Success { data } => assert_eq!(data.product_id, "777"),
        ScrapeOutcome::Error { error } => panic!("expected success, got: {error}"),
    }
}

#[tokio::test]
async fn deep_link_with_product_path_in_query_still_probes_redirect() {
    let server = MockServer::start().await;

    // The query string names a product path; only the redirect target
    // is authoritative.
    Mock::given(method("GET"))
        .and(path("/re/AFF456"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", format!("{}/vp/products/888", server.uri()).as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vp/products/888"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FULL_PRODUCT_HTML))
        .mount(&server)
        .await;

    let scraper = ProductScraper::new(&static_only_config()).unwrap();
    let report = scraper
        .scrape(&format!(
            "{}/re/AFF456?target=/vp/products/999",
            server.uri()
        ))
        .await;

    match report.outcome {
        ScrapeOutcome::Success { data } => assert_eq!(data.product_id, "888"),
        ScrapeOutcome::Error { error } => panic!("expected success, got: {error}"),
    }
}

#[tokio::test]
async fn redirect_without_location_reports_resolution_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/re/BROKEN"))
        .respond_with(ResponseTemplate::new(302))
        .mount(&server)
        .await;

    let scraper = ProductScraper::new(&static_only_config()).unwrap();
    let report = scraper.scrape(&format!("{}/re/BROKEN", server.uri())).await;

    match report.outcome {
        ScrapeOutcome::Error { error } => {
            assert!(
                error.contains("Location"),
                "error should name the missing Location header: {error}"
            );
            assert!(error.starts_with("Resolution error"));
        }
        ScrapeOutcome::Success { .. } => panic!("expected resolution failure"),
    }
}

#[tokio::test]
async fn incomplete_static_markup_escalates_to_render_service() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vp/products/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHELL_HTML))
        .mount(&server)
        .await;

    let rendered = serde_json::json!({ "result": { "content": FULL_PRODUCT_HTML } });
    Mock::given(method("GET"))
        .and(path("/scrape"))
        .and(query_param("key", "test-key"))
        .and(query_param("render_js", "true"))
        .and(query_param("asp", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rendered))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = static_only_config();
    config.render_api.enabled = true;
    config.render_api.base_url = server.uri();
    config.render_api.api_key = "test-key".to_string();

    let scraper = ProductScraper::new(&config).unwrap();
    let report = scraper
        .scrape(&format!("{}/vp/products/42", server.uri()))
        .await;

    match report.outcome {
        ScrapeOutcome::Success { data } => {
            assert_eq!(data.product_id, "42");
            assert_eq!(data.price, 89000);
        }
        ScrapeOutcome::Error { error } => panic!("expected fallback success, got: {error}"),
    }
}

#[tokio::test]
async fn render_service_failure_surfaces_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vp/products/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHELL_HTML))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(429).set_body_string("throttled"))
        .mount(&server)
        .await;

    let mut config = static_only_config();
    config.render_api.enabled = true;
    config.render_api.base_url = server.uri();
    config.render_api.api_key = "test-key".to_string();

    let scraper = ProductScraper::new(&config).unwrap();
    let report = scraper
        .scrape(&format!("{}/vp/products/42", server.uri()))
        .await;

    match report.outcome {
        ScrapeOutcome::Error { error } => {
            assert!(error.contains("429"), "unexpected message: {error}");
            assert!(error.contains("throttled"), "unexpected message: {error}");
        }
        ScrapeOutcome::Success { .. } => panic!("expected render API failure"),
    }
}

#[tokio::test]
async fn incomplete_markup_without_fallback_reports_extraction_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vp/products/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHELL_HTML))
        .mount(&server)
        .await;

    let scraper = ProductScraper::new(&static_only_config()).unwrap();
    let report = scraper
        .scrape(&format!("{}/vp/products/42", server.uri()))
        .await;

    match report.outcome {
        ScrapeOutcome::Error { error } => {
            assert!(error.starts_with("Extraction error"), "unexpected: {error}")
        }
        ScrapeOutcome::Success { .. } => panic!("expected extraction failure"),
    }
}

#[tokio::test]
async fn failed_static_fetch_without_fallback_reports_the_fetch_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vp/products/42"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let scraper = ProductScraper::new(&static_only_config()).unwrap();
    let report = scraper
        .scrape(&format!("{}/vp/products/42", server.uri()))
        .await;

    match report.outcome {
        ScrapeOutcome::Error { error } => {
            assert!(
                error.contains("static fetch failed"),
                "message should name the fetch failure: {error}"
            );
            assert!(error.contains("500"), "message should carry the cause: {error}");
            assert!(error.contains("no fallback tier"), "unexpected: {error}");
        }
        ScrapeOutcome::Success { .. } => panic!("expected fetch failure"),
    }
}

#[tokio::test]
async fn render_session_persists_across_calls_until_reset() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vp/products/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SHELL_HTML))
        .mount(&server)
        .await;

    let rendered = serde_json::json!({ "result": { "content": FULL_PRODUCT_HTML } });
    Mock::given(method("GET"))
        .and(path("/scrape"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rendered))
        .mount(&server)
        .await;

    let mut config = static_only_config();
    config.render_api.enabled = true;
    config.render_api.base_url = server.uri();
    config.render_api.api_key = "test-key".to_string();

    let scraper = ProductScraper::new(&config).unwrap();
    let url = format!("{}/vp/products/42", server.uri());

    scraper.scrape(&url).await;
    scraper.scrape(&url).await;
    scraper.reset_render_session();
    scraper.scrape(&url).await;

    let requests = server.received_requests().await.unwrap();
    let sessions: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path() == "/scrape")
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "session")
                .map(|(_, v)| v.to_string())
        })
        .collect();

    assert_eq!(sessions.len(), 3);
    assert_eq!(sessions[0], sessions[1]);
    assert_ne!(sessions[1], sessions[2]);
}
