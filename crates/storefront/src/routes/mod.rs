//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                        - Home page
//! GET  /health                  - Liveness check
//! GET  /health/ready            - Readiness check (probes the Store API)
//!
//! # Catalog
//! GET  /products                - Product listing (?page=, ?search=, ?category=, ?sort=)
//! GET  /products/{slug}         - Product detail
//! GET  /categories              - Category listing
//! GET  /categories/{slug}       - Category detail with products
//! GET  /pages/{slug}            - WordPress content page (terms, privacy, ...)
//!
//! # Cart (form posts, 303 redirects)
//! GET  /cart                    - Cart page
//! POST /cart/add                - Add product
//! POST /cart/update             - Change line quantity
//! POST /cart/remove             - Remove product
//!
//! # Wishlist
//! GET  /wishlist                - Wishlist page
//! POST /wishlist/toggle         - Toggle product on the wishlist
//!
//! # Checkout
//! GET  /checkout                - Checkout form (?postcode= loads courier offers)
//! GET  /checkout/lockers        - Pickup point picker (?postcode=, ?provider=)
//! POST /checkout                - Place the order
//! GET  /checkout/confirmation   - Order status page (?order=, ?key=)
//! GET  /checkout/return         - Gateway return URL, forwards to confirmation
//! POST /checkout/notify         - Planet Pay server-to-server notification
//! ```
//!
//! `/health` and `/health/ready` are registered in the crate root's `app`
//! next to the middleware stack.

pub mod cart;
pub mod categories;
pub mod checkout;
pub mod home;
pub mod pages;
pub mod products;
pub mod wishlist;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AnalyticsConfig;
use crate::filters;
use crate::middleware::{cart_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Not-found page, shared by the catalog routes.
#[derive(Template, WebTemplate)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub analytics: AnalyticsConfig,
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::index))
        .route("/{slug}", get(categories::show))
}

/// Create the cart routes router.
///
/// Mutations share one relaxed rate limiter; the cart page itself is not
/// limited.
pub fn cart_routes() -> Router<AppState> {
    let limiter = cart_rate_limiter();
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add).layer(limiter.clone()))
        .route("/update", post(cart::update).layer(limiter.clone()))
        .route("/remove", post(cart::remove).layer(limiter))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/toggle", post(wishlist::toggle))
}

/// Create the checkout routes router.
///
/// Order placement gets the strict rate limiter; every placement fans out
/// into several upstream calls.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/", post(checkout::place).layer(checkout_rate_limiter()))
        .route("/lockers", get(checkout::lockers))
        .route("/confirmation", get(checkout::confirmation))
        .route("/return", get(checkout::return_from_gateway))
        .route("/notify", post(checkout::notify))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/categories", category_routes())
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/checkout", checkout_routes())
        .route("/pages/{slug}", get(pages::show))
}
