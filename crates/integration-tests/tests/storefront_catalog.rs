//! End-to-end tests for the catalog pages: home, product listing, product
//! detail, content pages and the health probes.
//!
//! Run with: `cargo test -p makrama-integration-tests`

#![allow(clippy::unwrap_used)]

use makrama_integration_tests::{TestContext, product_json};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

// ============================================================================
// Home Page Tests
// ============================================================================

#[tokio::test]
async fn test_home_renders_featured_products_and_categories() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("orderby", "date"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    product_json(42, "Lniana torba", "lniana-torba", "5499"),
                    product_json(7, "Kwietnik Luna", "kwietnik-luna", "8900"),
                ]))
                .insert_header("x-wp-total", "2")
                .insert_header("x-wp-totalpages", "1"),
        )
        .mount(&ctx.woo)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products/categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 3, "name": "Torby", "slug": "torby", "count": 12},
            {"id": 5, "name": "Kwietniki", "slug": "kwietniki", "count": 8}
        ])))
        .mount(&ctx.woo)
        .await;

    let body = ctx.get_ok("/").await;

    assert!(body.contains("New arrivals"));
    assert!(body.contains("Lniana torba"));
    assert!(body.contains("54.99 PLN"));
    assert!(body.contains(r#"href="/products/kwietnik-luna""#));
    assert!(body.contains("Browse by category"));
    assert!(body.contains(r#"href="/categories/torby""#));
}

#[tokio::test]
async fn test_home_degrades_to_empty_sections_when_catalog_is_down() {
    // No Store API mocks at all; every catalog call fails
    let ctx = TestContext::start().await;

    let body = ctx.get_ok("/").await;

    assert!(body.contains("Hand-knotted macrame"));
    assert!(!body.contains("New arrivals"));
    assert!(!body.contains("Browse by category"));
}

// ============================================================================
// Product Listing Tests
// ============================================================================

#[tokio::test]
async fn test_product_listing_paginates_from_wp_headers() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    product_json(42, "Lniana torba", "lniana-torba", "5499"),
                    product_json(7, "Kwietnik Luna", "kwietnik-luna", "8900"),
                ]))
                .insert_header("x-wp-total", "30")
                .insert_header("x-wp-totalpages", "3"),
        )
        .mount(&ctx.woo)
        .await;

    let body = ctx.get_ok("/products").await;

    assert!(body.contains("30 products"));
    assert!(body.contains("Page 1 of 3"));
    assert!(body.contains(r#"href="/products?page=2""#));
    assert!(!body.contains(r#"rel="prev""#));
}

#[tokio::test]
async fn test_product_listing_passes_search_to_store_api() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("search", "torba"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([product_json(
                    42,
                    "Lniana torba",
                    "lniana-torba",
                    "5499"
                )]))
                .insert_header("x-wp-total", "1")
                .insert_header("x-wp-totalpages", "1"),
        )
        .expect(1)
        .mount(&ctx.woo)
        .await;

    let body = ctx.get_ok("/products?search=torba").await;

    assert!(body.contains("Lniana torba"));
    assert!(body.contains(r#"value="torba""#));
}

// ============================================================================
// Product Detail Tests
// ============================================================================

#[tokio::test]
async fn test_product_detail_by_slug_with_related_strip() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("slug", "lniana-torba"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(
            42,
            "Lniana torba",
            "lniana-torba",
            "5499"
        )])))
        .mount(&ctx.woo)
        .await;
    // Related products come from the same category; the product itself is
    // filtered out of the strip
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("category", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            product_json(42, "Lniana torba", "lniana-torba", "5499"),
            product_json(43, "Torba sieciowa", "torba-sieciowa", "3900"),
        ])))
        .mount(&ctx.woo)
        .await;

    let body = ctx.get_ok("/products/lniana-torba").await;

    assert!(body.contains("<h1>Lniana torba</h1>"));
    // Meta description is the short description with its markup stripped
    assert!(body.contains(r#"<meta name="description" content="Lniana torba.">"#));
    assert!(body.contains("SKU: MK-42"));
    assert!(body.contains("Add to cart"));
    assert!(body.contains("Add to wishlist"));
    assert!(body.contains("You may also like"));
    assert!(body.contains("Torba sieciowa"));
    // The related strip never repeats the product being viewed
    assert_eq!(body.matches("<h1>Lniana torba</h1>").count(), 1);
}

#[tokio::test]
async fn test_unknown_product_slug_renders_not_found() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("slug", "zaginiony-produkt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.woo)
        .await;

    let response = ctx.get("/products/zaginiony-produkt").await;

    assert_eq!(response.status(), 404);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Page not found"));
}

#[tokio::test]
async fn test_sold_out_product_shows_no_add_to_cart_form() {
    let ctx = TestContext::start().await;

    let mut product = product_json(42, "Lniana torba", "lniana-torba", "5499");
    product["is_in_stock"] = json!(false);
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("slug", "lniana-torba"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product])))
        .mount(&ctx.woo)
        .await;
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("category", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.woo)
        .await;

    let body = ctx.get_ok("/products/lniana-torba").await;

    assert!(body.contains("Sold out"));
    assert!(!body.contains("Add to cart"));
}

// ============================================================================
// Content Page Tests
// ============================================================================

#[tokio::test]
async fn test_content_page_renders_wordpress_body() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/pages"))
        .and(query_param("slug", "terms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 12,
            "slug": "terms",
            "title": {"rendered": "Terms of service"},
            "content": {"rendered": "<p>Returns are accepted within 14 days.</p>"}
        }])))
        .mount(&ctx.woo)
        .await;

    let body = ctx.get_ok("/pages/terms").await;

    assert!(body.contains("<h1>Terms of service</h1>"));
    assert!(body.contains("Returns are accepted within 14 days."));
}

#[tokio::test]
async fn test_unknown_content_page_renders_not_found() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wp/v2/pages"))
        .and(query_param("slug", "nie-ma"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.woo)
        .await;

    let response = ctx.get("/pages/nie-ma").await;
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Middleware Tests
// ============================================================================

#[tokio::test]
async fn test_responses_carry_security_headers_and_request_id() {
    let ctx = TestContext::start().await;

    let response = ctx.get("/").await;
    let headers = response.headers();

    assert_eq!(headers.get("x-frame-options").unwrap(), "DENY");
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(headers.get("referrer-policy").unwrap(), "no-referrer");
    assert_eq!(headers.get("cache-control").unwrap(), "no-store, max-age=0");
    assert_eq!(
        headers.get("cross-origin-embedder-policy").unwrap(),
        "credentialless"
    );

    let csp = headers
        .get("content-security-policy")
        .and_then(|v| v.to_str().ok())
        .expect("CSP header missing");
    assert!(csp.contains("default-src 'none'"));
    // No script allowance anywhere; the storefront ships no JavaScript
    assert!(!csp.contains("script-src"));

    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_request_id_echoes_proxy_value() {
    let ctx = TestContext::start().await;

    let response = ctx
        .client
        .get(ctx.url("/health"))
        .header("x-request-id", "req-from-proxy-1")
        .send()
        .await
        .expect("GET failed");

    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "req-from-proxy-1"
    );
}

// ============================================================================
// Health Probe Tests
// ============================================================================

#[tokio::test]
async fn test_liveness_always_answers() {
    let ctx = TestContext::start().await;

    let response = ctx.get("/health").await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("Failed to read body"), "ok");
}

#[tokio::test]
async fn test_readiness_probes_the_store_api() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.woo)
        .await;

    let response = ctx.get("/health/ready").await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_readiness_fails_while_shop_is_unreachable() {
    // No Store API mock; the probe's product read 404s
    let ctx = TestContext::start().await;

    let response = ctx.get("/health/ready").await;
    assert_eq!(response.status(), 503);
}
