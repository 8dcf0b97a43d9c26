//! End-to-end tests for the Makrama storefront.
//!
//! Each test boots the complete axum application on an ephemeral port with
//! all three upstreams replaced by local wiremock servers. Requests travel
//! through the real middleware stack (sessions, security headers, rate
//! limits), so the tests exercise what production actually serves.
//!
//! Run with: `cargo test -p makrama-integration-tests`

use std::net::{IpAddr, Ipv4Addr};

use hmac::{Hmac, Mac};
use makrama_storefront::config::{
    AnalyticsConfig, BlPaczkaConfig, PlanetPayConfig, ShipFromAddress, StorefrontConfig, WooConfig,
};
use makrama_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use sha2::Sha256;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// HMAC key the test gateway signs notifications with.
pub const NOTIFICATION_SECRET: &str = "k2J9mQ4xR7nW3pZ8vB5tY6uF1cD0aE2s";

/// A running storefront wired to three mock upstreams.
pub struct TestContext {
    pub woo: MockServer,
    pub planetpay: MockServer,
    pub blpaczka: MockServer,
    /// Base URL of the storefront under test.
    pub base_url: String,
    /// Cookie-holding client. It never follows redirects, so tests can
    /// assert on `Location` headers instead of visiting gateway URLs.
    pub client: reqwest::Client,
}

impl TestContext {
    /// Boot the full application against fresh mock upstreams.
    ///
    /// # Panics
    ///
    /// Panics when the app or a mock server fails to start; no test can
    /// proceed without either.
    pub async fn start() -> Self {
        let woo = MockServer::start().await;
        let planetpay = MockServer::start().await;
        let blpaczka = MockServer::start().await;

        // Every Planet Pay call first fetches a bearer token lazily.
        Mock::given(method("POST"))
            .and(path("/v1/auth/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessToken": "test-bearer-token",
                "expiresIn": 3600
            })))
            .mount(&planetpay)
            .await;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no local addr");
        let base_url = format!("http://{addr}");

        let config = test_config(&base_url, &woo, &planetpay, &blpaczka);
        let state = AppState::new(config).expect("Failed to build app state");
        let app = makrama_storefront::app(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server failed");
        });

        // The forwarded header stands in for the proxy the rate limiter
        // keys on.
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            reqwest::header::HeaderValue::from_static("203.0.113.10"),
        );
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            woo,
            planetpay,
            blpaczka,
            base_url,
            client,
        }
    }

    /// Absolute URL for a storefront path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a path.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    /// GET a path, assert 200, and return the body.
    pub async fn get_ok(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), 200, "GET {path}");
        response.text().await.expect("Failed to read body")
    }

    /// POST a form to a path.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Put a product in the session cart through the public endpoint.
    ///
    /// Mounts its own Store API mock for the product-by-id confirmation the
    /// add handler performs.
    pub async fn add_to_cart(&self, product: &Value, quantity: u32) {
        let id = product.get("id").and_then(Value::as_i64).expect("product id");
        Mock::given(method("GET"))
            .and(path(format!("/wp-json/wc/store/v1/products/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(product))
            .mount(&self.woo)
            .await;

        let response = self
            .post_form(
                "/cart/add",
                &[
                    ("product_id", &id.to_string()),
                    ("quantity", &quantity.to_string()),
                ],
            )
            .await;
        assert_eq!(response.status(), 303, "POST /cart/add");
    }
}

/// The `Location` header of a redirect response.
#[must_use]
pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("Response has no Location header")
        .to_string()
}

/// Sign a notification body the way the gateway does: HMAC-SHA256 over
/// `{timestamp}.{body}`, hex-encoded.
#[must_use]
pub fn sign_notification(timestamp: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(NOTIFICATION_SECRET.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}.{body}").as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

// =============================================================================
// Mock response bodies
// =============================================================================

/// A Store API product. Prices are minor-unit strings.
#[must_use]
pub fn product_json(id: i64, name: &str, slug: &str, price_minor: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "slug": slug,
        "description": format!("<p>{name}.</p>"),
        "short_description": format!("<p>{name}.</p>"),
        "sku": format!("MK-{id}"),
        "on_sale": false,
        "prices": {
            "price": price_minor,
            "regular_price": price_minor,
            "currency_code": "PLN",
            "currency_minor_unit": 2
        },
        "images": [],
        "categories": [{"id": 3, "name": "Torby", "slug": "torby"}],
        "is_in_stock": true,
        "is_purchasable": true
    })
}

/// A v3 order.
#[must_use]
pub fn order_json(id: i64, status: &str, total: &str) -> Value {
    json!({
        "id": id,
        "number": id.to_string(),
        "order_key": "wc_order_testkey",
        "status": status,
        "currency": "PLN",
        "total": total,
        "shipping_total": "15.99",
        "billing": {
            "first_name": "Jan",
            "last_name": "Kowalski",
            "address_1": "Prosta 1",
            "city": "Warszawa",
            "postcode": "00-850",
            "country": "PL",
            "email": "jan@example.com"
        },
        "line_items": [
            {"id": 1, "name": "Lniana torba", "product_id": 42, "quantity": 2, "total": "109.98"}
        ],
        "meta_data": []
    })
}

/// The gateway list: the two the storefront drives plus one it must ignore.
#[must_use]
pub fn gateways_json() -> Value {
    json!([
        {"id": "planetpay", "title": "Planet Pay", "description": "BLIK, card or bank transfer", "enabled": true},
        {"id": "cod", "title": "Cash on delivery", "description": "", "enabled": true},
        {"id": "bacs", "title": "Direct bank transfer", "description": "", "enabled": true}
    ])
}

/// Courier offers: one to-the-door, one locker network.
#[must_use]
pub fn offers_json() -> Value {
    json!([
        {
            "courier_code": "dpd_standard",
            "courier_name": "DPD Classic",
            "price_gross": "15.99",
            "currency": "PLN",
            "delivery_days": 2,
            "pickup_point_delivery": false
        },
        {
            "courier_code": "inpost_locker",
            "courier_name": "InPost Paczkomaty",
            "price_gross": "13.49",
            "currency": "PLN",
            "delivery_days": 2,
            "pickup_point_delivery": true
        }
    ])
}

fn test_config(
    base_url: &str,
    woo: &MockServer,
    planetpay: &MockServer,
    blpaczka: &MockServer,
) -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: base_url.to_string(),
        session_secret: SecretString::from("wX4bN8qT2mK7jP3vR9zC5hL1gD6fS0aY"),
        woo: WooConfig {
            base_url: woo.uri(),
            consumer_key: "ck_test".to_string(),
            consumer_secret: SecretString::from("cs_test"),
        },
        planetpay: PlanetPayConfig {
            base_url: planetpay.uri(),
            client_id: "client-1".to_string(),
            client_secret: SecretString::from("pp-oauth-client"),
            merchant_id: "merchant-1".to_string(),
            notification_secret: SecretString::from(NOTIFICATION_SECRET),
        },
        blpaczka: BlPaczkaConfig {
            base_url: blpaczka.uri(),
            api_key: SecretString::from("blp-test-key"),
        },
        ship_from: ShipFromAddress {
            name: "Makrama".to_string(),
            street: "Warsztatowa 1".to_string(),
            city: "Poznan".to_string(),
            postcode: "61-001".to_string(),
            country: "PL".to_string(),
            email: "sklep@makrama.pl".to_string(),
            phone: "+48500100200".to_string(),
        },
        analytics: AnalyticsConfig::default(),
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.1,
    }
}
