//! End-to-end tests for the session wishlist.
//!
//! Run with: `cargo test -p makrama-integration-tests`

use makrama_integration_tests::{TestContext, location, product_json};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_wishlist_starts_empty() {
    let ctx = TestContext::start().await;

    let body = ctx.get_ok("/wishlist").await;

    assert!(body.contains("Your wishlist is empty."));
}

#[tokio::test]
async fn test_toggle_adds_then_removes_a_product() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("include", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product_json(
            42,
            "Lniana torba",
            "lniana-torba",
            "5499"
        )])))
        .mount(&ctx.woo)
        .await;

    let response = ctx
        .post_form("/wishlist/toggle", &[("product_id", "42")])
        .await;
    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/wishlist");

    let body = ctx.get_ok("/wishlist").await;
    assert!(body.contains("Lniana torba"));
    assert!(body.contains("54.99 PLN"));
    assert!(body.contains("Remove"));

    // A second toggle takes it off again; the empty wishlist makes no
    // catalog call at all
    let response = ctx
        .post_form("/wishlist/toggle", &[("product_id", "42")])
        .await;
    assert_eq!(response.status(), 303);

    let body = ctx.get_ok("/wishlist").await;
    assert!(body.contains("Your wishlist is empty."));
}

#[tokio::test]
async fn test_wishlist_drops_products_gone_upstream() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("include", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.woo)
        .await;

    let response = ctx
        .post_form("/wishlist/toggle", &[("product_id", "42")])
        .await;
    assert_eq!(response.status(), 303);

    let body = ctx.get_ok("/wishlist").await;
    assert!(body.contains("Your wishlist is empty."));
}
