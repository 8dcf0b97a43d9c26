//! Cart route handlers.
//!
//! The cart is a session-held list of product ids and quantities; prices are
//! resolved fresh from the Store API on every render. Mutations are plain
//! form posts answered with 303 redirects back to the cart page.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::Redirect};
use makrama_core::{Money, ProductId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::config::AnalyticsConfig;
use crate::error::{Result, add_breadcrumb};
use crate::filters;
use crate::models::Cart;
use crate::state::AppState;
use crate::woo::Product;

pub use super::products::ProductView;

/// One rendered cart line.
#[derive(Clone)]
pub struct CartLineView {
    pub product: ProductView,
    pub quantity: u32,
    pub line_total: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartPageView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub count: u32,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: i64,
    pub quantity: Option<u32>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub product_id: i64,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: i64,
}

/// Resolve the session cart against the catalog.
///
/// Lines whose product no longer resolves upstream are left out of the
/// render; checkout applies the same filter when it builds the order.
pub(super) async fn cart_view(state: &AppState, cart: &Cart) -> Result<CartPageView> {
    if cart.is_empty() {
        return Ok(CartPageView {
            lines: Vec::new(),
            subtotal: Money::zero("PLN").to_string(),
            count: 0,
        });
    }

    let products = state
        .catalog()
        .list_products_by_ids(&cart.product_ids())
        .await?;
    let by_id: HashMap<ProductId, &Product> = products.iter().map(|p| (p.id, p)).collect();

    let mut subtotal = Decimal::ZERO;
    let mut currency = "PLN".to_string();
    let mut lines = Vec::new();
    for line in cart.lines() {
        let Some(product) = by_id.get(&line.product_id) else {
            continue;
        };
        let price = product.price();
        let line_total = Money::new(
            price.amount * Decimal::from(line.quantity),
            price.currency.clone(),
        );
        subtotal += line_total.amount;
        if !price.currency.is_empty() {
            currency = price.currency;
        }
        lines.push(CartLineView {
            product: ProductView::from(*product),
            quantity: line.quantity,
            line_total: line_total.to_string(),
        });
    }

    Ok(CartPageView {
        count: lines.iter().map(|l| l.quantity).sum(),
        subtotal: Money::new(subtotal, currency).to_string(),
        lines,
    })
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartPageView,
    pub analytics: AnalyticsConfig,
}

/// Display the cart page.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<CartShowTemplate> {
    let cart = Cart::load(&session).await?;
    let view = cart_view(&state, &cart).await?;

    Ok(CartShowTemplate {
        cart: view,
        analytics: state.config().analytics.clone(),
    })
}

/// Add a product to the cart.
///
/// The product is confirmed against the catalog first so a stale form can't
/// put a vanished or sold-out product in the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddForm>,
) -> Result<Redirect> {
    let product_id = ProductId::new(form.product_id);
    let product = state.catalog().get_product(product_id).await?;
    if !product.is_purchasable || !product.is_in_stock {
        return Ok(Redirect::to(&format!("/products/{}", product.slug)));
    }

    let mut cart = Cart::load(&session).await?;
    cart.add(product_id, form.quantity.unwrap_or(1));
    cart.save(&session).await?;

    add_breadcrumb(
        "cart",
        "Added product",
        Some(&[("product_id", &product_id.to_string())]),
    );
    Ok(Redirect::to("/cart"))
}

/// Change a cart line's quantity. Quantity zero removes the line.
#[instrument(skip(session))]
pub async fn update(session: Session, Form(form): Form<UpdateForm>) -> Result<Redirect> {
    let mut cart = Cart::load(&session).await?;
    cart.set_quantity(ProductId::new(form.product_id), form.quantity);
    cart.save(&session).await?;

    Ok(Redirect::to("/cart"))
}

/// Remove a product from the cart.
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveForm>) -> Result<Redirect> {
    let mut cart = Cart::load(&session).await?;
    cart.remove(ProductId::new(form.product_id));
    cart.save(&session).await?;

    add_breadcrumb(
        "cart",
        "Removed product",
        Some(&[("product_id", &form.product_id.to_string())]),
    );
    Ok(Redirect::to("/cart"))
}
