//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Form, extract::State, response::Redirect};
use makrama_core::ProductId;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::filters;
use crate::models::Wishlist;
use crate::state::AppState;

pub use super::products::ProductView;

/// Toggle form data.
#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub product_id: i64,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistShowTemplate {
    pub products: Vec<ProductView>,
    pub analytics: AnalyticsConfig,
}

/// Display the wishlist page.
///
/// Ids that no longer resolve upstream are simply not rendered; the include
/// filter drops them.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<WishlistShowTemplate> {
    let wishlist = Wishlist::load(&session).await?;
    let products = if wishlist.is_empty() {
        Vec::new()
    } else {
        state
            .catalog()
            .list_products_by_ids(wishlist.product_ids())
            .await?
            .iter()
            .map(ProductView::from)
            .collect()
    };

    Ok(WishlistShowTemplate {
        products,
        analytics: state.config().analytics.clone(),
    })
}

/// Toggle a product on the wishlist.
#[instrument(skip(session))]
pub async fn toggle(session: Session, Form(form): Form<ToggleForm>) -> Result<Redirect> {
    let mut wishlist = Wishlist::load(&session).await?;
    wishlist.toggle(ProductId::new(form.product_id));
    wishlist.save(&session).await?;

    Ok(Redirect::to("/wishlist"))
}
