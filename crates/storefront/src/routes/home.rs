//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tracing::instrument;

use crate::config::AnalyticsConfig;
use crate::filters;
use crate::state::AppState;
use crate::woo::ProductQuery;

pub use super::categories::CategoryView;
pub use super::products::ProductView;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    /// Newest products for the front grid.
    pub featured: Vec<ProductView>,
    /// Category tiles.
    pub categories: Vec<CategoryView>,
    pub analytics: AnalyticsConfig,
}

/// Number of products on the front grid.
const FEATURED_COUNT: u32 = 8;

/// Display the home page.
///
/// Upstream failures degrade to empty sections rather than an error page.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> impl IntoResponse {
    let query = ProductQuery {
        per_page: FEATURED_COUNT,
        orderby: Some("date".to_string()),
        order: Some("desc".to_string()),
        ..ProductQuery::default()
    };
    let featured = state.catalog().list_products(&query).await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch featured products: {e}");
            Vec::new()
        },
        |listing| listing.products.iter().map(ProductView::from).collect(),
    );

    let categories = state.catalog().list_categories().await.map_or_else(
        |e| {
            tracing::error!("Failed to fetch categories: {e}");
            Vec::new()
        },
        |categories| categories.iter().map(CategoryView::from).collect(),
    );

    HomeTemplate {
        featured,
        categories,
        analytics: state.config().analytics.clone(),
    }
}
