//! Category route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use makrama_core::CategoryId;
use serde::Deserialize;
use tracing::instrument;

use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::filters;
use crate::routes::NotFoundTemplate;
use crate::state::AppState;
use crate::woo::{Category, ProductQuery, WooError};

pub use super::products::{ImageView, ProductView};

/// Category display data for templates.
#[derive(Clone)]
pub struct CategoryView {
    pub id: CategoryId,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub count: u32,
    pub image: Option<ImageView>,
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

impl From<&Category> for CategoryView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            slug: category.slug.clone(),
            name: category.name.clone(),
            description: if category.description.is_empty() {
                None
            } else {
                Some(category.description.clone())
            },
            count: category.count,
            image: category.image.as_ref().map(|img| ImageView {
                url: img.src.clone(),
                alt: img.alt.clone(),
            }),
        }
    }
}

/// Category listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/index.html")]
pub struct CategoriesIndexTemplate {
    pub categories: Vec<CategoryView>,
    pub analytics: AnalyticsConfig,
}

/// Category detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories/show.html")]
pub struct CategoryShowTemplate {
    pub category: CategoryView,
    pub products: Vec<ProductView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub analytics: AnalyticsConfig,
}

/// Products per page on a category page.
const PRODUCTS_PER_PAGE: u32 = 12;

/// Display the category listing page.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<CategoriesIndexTemplate> {
    let categories = state.catalog().list_categories().await?;

    Ok(CategoriesIndexTemplate {
        categories: categories.iter().map(CategoryView::from).collect(),
        analytics: state.config().analytics.clone(),
    })
}

/// Display a category with its products.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let category = match state.catalog().get_category_by_slug(&slug).await {
        Ok(category) => category,
        Err(WooError::NotFound(_)) => {
            return Ok((
                StatusCode::NOT_FOUND,
                NotFoundTemplate {
                    analytics: state.config().analytics.clone(),
                },
            )
                .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let page = query.page.unwrap_or(1).max(1);
    let product_query = ProductQuery {
        page,
        per_page: PRODUCTS_PER_PAGE,
        category: Some(category.id),
        ..ProductQuery::default()
    };
    let listing = state.catalog().list_products(&product_query).await?;

    Ok(CategoryShowTemplate {
        category: CategoryView::from(&category),
        products: listing.products.iter().map(ProductView::from).collect(),
        current_page: page,
        total_pages: listing.total_pages.max(1),
        analytics: state.config().analytics.clone(),
    }
    .into_response())
}
