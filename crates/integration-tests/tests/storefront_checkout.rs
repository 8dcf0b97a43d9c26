//! End-to-end tests for checkout: the form page, order placement against
//! all three upstreams, the locker picker and the confirmation page.
//!
//! Run with: `cargo test -p makrama-integration-tests`

#![allow(clippy::unwrap_used)]

use makrama_integration_tests::{
    TestContext, gateways_json, location, offers_json, order_json, product_json,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

/// Put two units of the 54.99 PLN test product in the session cart.
async fn seed_cart(ctx: &TestContext) {
    let product = product_json(42, "Lniana torba", "lniana-torba", "5499");
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/store/v1/products"))
        .and(query_param("include", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([product])))
        .mount(&ctx.woo)
        .await;
    ctx.add_to_cart(&product, 2).await;
}

async fn mount_offers(ctx: &TestContext) {
    Mock::given(method("POST"))
        .and(path("/v1/couriers/find"))
        .respond_with(ResponseTemplate::new(200).set_body_json(offers_json()))
        .mount(&ctx.blpaczka)
        .await;
}

async fn mount_gateways(ctx: &TestContext) {
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/payment_gateways"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gateways_json()))
        .mount(&ctx.woo)
        .await;
}

async fn mount_valuation(ctx: &TestContext, courier_code: &str, price_gross: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/valuation"))
        .and(body_partial_json(json!({"courier_code": courier_code})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "courier_code": courier_code,
            "price_gross": price_gross,
            "currency": "PLN"
        })))
        .mount(&ctx.blpaczka)
        .await;
}

async fn mount_shipment(ctx: &TestContext) {
    Mock::given(method("POST"))
        .and(path("/v1/shipments"))
        .and(body_partial_json(json!({"reference": "1042"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "shipment_id": "BLP-7",
            "tracking_number": "TRK123"
        })))
        .expect(1)
        .mount(&ctx.blpaczka)
        .await;
}

/// A complete, valid checkout form paying through Planet Pay with BLIK.
fn valid_form<'a>() -> Vec<(&'a str, &'a str)> {
    vec![
        ("email", "jan@example.com"),
        ("first_name", "Jan"),
        ("last_name", "Kowalski"),
        ("street", "Prosta 1"),
        ("city", "Warszawa"),
        ("postcode", "00-850"),
        ("courier_code", "dpd_standard"),
        ("payment_method", "planetpay"),
        ("payment_channel", "BLIK"),
    ]
}

// ============================================================================
// Checkout Form Page Tests
// ============================================================================

#[tokio::test]
async fn test_checkout_form_lists_offers_and_gateways() {
    let ctx = TestContext::start().await;
    seed_cart(&ctx).await;
    mount_offers(&ctx).await;
    mount_gateways(&ctx).await;

    let body = ctx.get_ok("/checkout?postcode=00-850").await;

    // Order summary from the session cart
    assert!(body.contains("Lniana torba"));
    assert!(body.contains("109.98 PLN"));

    // Courier offers at broker prices, with a locker link for the pickup
    // point network
    assert!(body.contains("DPD Classic - 15.99 PLN"));
    assert!(body.contains("InPost Paczkomaty - 13.49 PLN"));
    assert!(body.contains("/checkout/lockers?postcode=00-850&provider=inpost_locker"));

    // Only the gateways the storefront can drive; "bacs" is enabled
    // upstream but never offered
    assert!(body.contains("Planet Pay"));
    assert!(body.contains("Cash on delivery"));
    assert!(!body.contains("Direct bank transfer"));
    assert!(body.contains(r#"name="payment_channel" value="BLIK""#));
    assert!(body.contains(r#"name="payment_channel" value="CARD""#));
    assert!(body.contains(r#"name="payment_channel" value="TRANSFER""#));
}

#[tokio::test]
async fn test_checkout_degrades_when_broker_is_down() {
    let ctx = TestContext::start().await;
    seed_cart(&ctx).await;
    mount_gateways(&ctx).await;
    // No courier mock; the offer lookup 404s

    let body = ctx.get_ok("/checkout?postcode=00-850").await;

    assert!(body.contains("Delivery options are temporarily unavailable."));
    assert!(body.contains("Planet Pay"));
}

#[tokio::test]
async fn test_checkout_with_empty_cart_redirects_to_cart() {
    let ctx = TestContext::start().await;

    let response = ctx.get("/checkout").await;

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "/cart");
}

// ============================================================================
// Order Placement Tests
// ============================================================================

#[tokio::test]
async fn test_place_order_with_planetpay_redirects_to_hosted_page() {
    let ctx = TestContext::start().await;
    seed_cart(&ctx).await;
    mount_offers(&ctx).await;
    mount_gateways(&ctx).await;
    mount_valuation(&ctx, "dpd_standard", "15.99").await;
    mount_shipment(&ctx).await;

    // 2 x 54.99 + 15.99 shipping
    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/orders"))
        .and(body_partial_json(json!({
            "payment_method": "planetpay",
            "set_paid": false,
            "line_items": [{"product_id": 42, "quantity": 2}],
            "shipping_lines": [{"method_id": "dpd_standard", "total": "15.99"}],
            "meta_data": [{"key": "_blpaczka_courier", "value": "dpd_standard"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(order_json(1042, "pending", "125.97")))
        .expect(1)
        .mount(&ctx.woo)
        .await;

    // Amount is the order total in grosze, taken from the created order
    Mock::given(method("POST"))
        .and(path("/v1/payments"))
        .and(header("authorization", "Bearer test-bearer-token"))
        .and(body_partial_json(json!({
            "merchantId": "merchant-1",
            "amount": 12597,
            "currency": "PLN",
            "externalId": "1042",
            "channel": "BLIK"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "paymentId": "PAY-77",
            "status": "NEW",
            "redirectUrl": "https://pay.planetpay.example/p/PAY-77"
        })))
        .expect(1)
        .mount(&ctx.planetpay)
        .await;

    // Shipment and payment references land in the order meta afterwards
    Mock::given(method("PUT"))
        .and(path("/wp-json/wc/v3/orders/1042"))
        .and(body_partial_json(json!({
            "status": "pending",
            "meta_data": [
                {"key": "_blpaczka_shipment_id", "value": "BLP-7"},
                {"key": "_blpaczka_tracking_number", "value": "TRK123"},
                {"key": "_planetpay_payment_id", "value": "PAY-77"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json(1042, "pending", "125.97")))
        .expect(1)
        .mount(&ctx.woo)
        .await;

    let response = ctx.post_form("/checkout", &valid_form()).await;

    assert_eq!(response.status(), 303);
    assert_eq!(location(&response), "https://pay.planetpay.example/p/PAY-77");

    // Placement clears the cart
    let body = ctx.get_ok("/cart").await;
    assert!(body.contains("Your cart is empty."));
}

#[tokio::test]
async fn test_place_order_cash_on_delivery_confirms_immediately() {
    let ctx = TestContext::start().await;
    seed_cart(&ctx).await;
    mount_offers(&ctx).await;
    mount_gateways(&ctx).await;
    // The broker re-prices the offer; the order must carry the valuation
    // price, not the one the form page showed
    mount_valuation(&ctx, "dpd_standard", "18.50").await;
    mount_shipment(&ctx).await;

    Mock::given(method("POST"))
        .and(path("/wp-json/wc/v3/orders"))
        .and(body_partial_json(json!({
            "payment_method": "cod",
            "shipping_lines": [{"method_id": "dpd_standard", "total": "18.50"}]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(order_json(1042, "pending", "128.48")))
        .expect(1)
        .mount(&ctx.woo)
        .await;

    Mock::given(method("PUT"))
        .and(path("/wp-json/wc/v3/orders/1042"))
        .and(body_partial_json(json!({"status": "processing"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(order_json(1042, "processing", "128.48")),
        )
        .expect(1)
        .mount(&ctx.woo)
        .await;

    let mut form = valid_form();
    form.retain(|(k, _)| *k != "payment_method" && *k != "payment_channel");
    form.push(("payment_method", "cod"));

    let response = ctx.post_form("/checkout", &form).await;

    assert_eq!(response.status(), 303);
    assert_eq!(
        location(&response),
        "/checkout/confirmation?order=1042&key=wc_order_testkey"
    );

    // Cash on delivery never touches the payment gateway
    let requests = ctx
        .planetpay
        .received_requests()
        .await
        .expect("request recording enabled");
    assert!(requests.iter().all(|r| r.url.path() != "/v1/payments"));
}

#[tokio::test]
async fn test_place_order_validation_errors_rerender_the_form() {
    let ctx = TestContext::start().await;
    seed_cart(&ctx).await;
    mount_offers(&ctx).await;
    mount_gateways(&ctx).await;

    let mut form = valid_form();
    form.retain(|(k, _)| *k != "email" && *k != "city");
    form.push(("email", "not-an-email"));
    form.push(("city", ""));

    let response = ctx.post_form("/checkout", &form).await;

    assert_eq!(response.status(), 422);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Please correct the following:"));
    assert!(body.contains("Enter a valid e-mail address"));
    assert!(body.contains("Enter your city"));
    // Acceptable values are preserved in the re-rendered form
    assert!(body.contains(r#"value="Jan""#));
    assert!(body.contains(r#"value="Prosta 1""#));
}

#[tokio::test]
async fn test_place_order_requires_pickup_point_for_locker_couriers() {
    let ctx = TestContext::start().await;
    seed_cart(&ctx).await;
    mount_offers(&ctx).await;
    mount_gateways(&ctx).await;

    let mut form = valid_form();
    form.retain(|(k, _)| *k != "courier_code");
    form.push(("courier_code", "inpost_locker"));

    let response = ctx.post_form("/checkout", &form).await;

    assert_eq!(response.status(), 422);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Choose a pickup point for locker delivery"));
}

#[tokio::test]
async fn test_place_order_rejects_gateways_the_shop_does_not_offer() {
    let ctx = TestContext::start().await;
    seed_cart(&ctx).await;
    mount_offers(&ctx).await;
    mount_gateways(&ctx).await;

    // Enabled upstream, but not a gateway the storefront drives
    let mut form = valid_form();
    form.retain(|(k, _)| *k != "payment_method");
    form.push(("payment_method", "bacs"));

    let response = ctx.post_form("/checkout", &form).await;

    assert_eq!(response.status(), 422);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("Choose a payment method offered by the shop"));
}

// ============================================================================
// Locker Picker Tests
// ============================================================================

#[tokio::test]
async fn test_lockers_page_lists_pickup_points() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/pickup-points"))
        .and(query_param("provider", "inpost_locker"))
        .and(query_param("postcode", "00-850"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "code": "WAW04A",
            "provider": "inpost",
            "name": "Paczkomat WAW04A",
            "street": "Prosta 12",
            "city": "Warszawa",
            "postcode": "00-850"
        }])))
        .mount(&ctx.blpaczka)
        .await;

    let body = ctx
        .get_ok("/checkout/lockers?postcode=00-850&provider=inpost_locker")
        .await;

    assert!(body.contains("Pickup points near 00-850"));
    assert!(body.contains("WAW04A"));
    assert!(body.contains("Prosta 12"));
    // The pick link routes the choice back into the checkout form
    assert!(body.contains("pickup_point=WAW04A"));
    assert!(body.contains("Deliver here"));
}

#[tokio::test]
async fn test_lockers_page_shows_empty_state() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/pickup-points"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&ctx.blpaczka)
        .await;

    let body = ctx
        .get_ok("/checkout/lockers?postcode=99-999&provider=inpost_locker")
        .await;

    assert!(body.contains("No pickup points found near this postcode."));
}

// ============================================================================
// Confirmation Page Tests
// ============================================================================

#[tokio::test]
async fn test_gateway_return_forwards_to_confirmation() {
    let ctx = TestContext::start().await;

    let response = ctx
        .get("/checkout/return?order=1042&key=wc_order_testkey")
        .await;

    assert_eq!(response.status(), 303);
    assert_eq!(
        location(&response),
        "/checkout/confirmation?order=1042&key=wc_order_testkey"
    );
}

#[tokio::test]
async fn test_confirmation_rejects_wrong_order_key() {
    let ctx = TestContext::start().await;

    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/orders/1042"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json(1042, "pending", "125.97")))
        .mount(&ctx.woo)
        .await;

    let response = ctx
        .get("/checkout/confirmation?order=1042&key=wc_order_wrong")
        .await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_confirmation_polls_payment_and_advances_the_order() {
    let ctx = TestContext::start().await;

    let mut order = order_json(1042, "pending", "125.97");
    order["meta_data"] = json!([{"id": 9, "key": "_planetpay_payment_id", "value": "PAY-77"}]);
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/orders/1042"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order))
        .mount(&ctx.woo)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/PAY-77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paymentId": "PAY-77",
            "status": "COMPLETED",
            "amount": 12597,
            "currency": "PLN",
            "externalId": "1042"
        })))
        .mount(&ctx.planetpay)
        .await;
    Mock::given(method("PUT"))
        .and(path("/wp-json/wc/v3/orders/1042"))
        .and(body_partial_json(json!({"status": "processing"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(order_json(1042, "processing", "125.97")),
        )
        .expect(1)
        .mount(&ctx.woo)
        .await;

    let body = ctx
        .get_ok("/checkout/confirmation?order=1042&key=wc_order_testkey")
        .await;

    assert!(body.contains("Order 1042"));
    assert!(body.contains("Paid, being prepared"));
    assert!(body.contains("125.97 PLN"));
    // A settled payment stops the self-refresh
    assert!(!body.contains(r#"http-equiv="refresh""#));
}

#[tokio::test]
async fn test_confirmation_keeps_refreshing_while_payment_is_in_flight() {
    let ctx = TestContext::start().await;

    let mut order = order_json(1042, "pending", "125.97");
    order["meta_data"] = json!([{"id": 9, "key": "_planetpay_payment_id", "value": "PAY-77"}]);
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/orders/1042"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order))
        .mount(&ctx.woo)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/PAY-77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paymentId": "PAY-77",
            "status": "PENDING",
            "externalId": "1042"
        })))
        .mount(&ctx.planetpay)
        .await;

    let body = ctx
        .get_ok("/checkout/confirmation?order=1042&key=wc_order_testkey")
        .await;

    assert!(body.contains("Awaiting payment"));
    assert!(body.contains("We are waiting for your payment to be confirmed."));
    assert!(body.contains(r#"http-equiv="refresh""#));
}

#[tokio::test]
async fn test_confirmation_marks_order_failed_on_rejected_payment() {
    let ctx = TestContext::start().await;

    let mut order = order_json(1042, "pending", "125.97");
    order["meta_data"] = json!([{"id": 9, "key": "_planetpay_payment_id", "value": "PAY-77"}]);
    Mock::given(method("GET"))
        .and(path("/wp-json/wc/v3/orders/1042"))
        .respond_with(ResponseTemplate::new(200).set_body_json(order))
        .mount(&ctx.woo)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/payments/PAY-77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "paymentId": "PAY-77",
            "status": "REJECTED",
            "externalId": "1042"
        })))
        .mount(&ctx.planetpay)
        .await;
    Mock::given(method("PUT"))
        .and(path("/wp-json/wc/v3/orders/1042"))
        .and(body_partial_json(json!({"status": "failed"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(order_json(1042, "failed", "125.97")))
        .expect(1)
        .mount(&ctx.woo)
        .await;

    let body = ctx
        .get_ok("/checkout/confirmation?order=1042&key=wc_order_testkey")
        .await;

    assert!(body.contains("Payment failed"));
    assert!(!body.contains(r#"http-equiv="refresh""#));
}
