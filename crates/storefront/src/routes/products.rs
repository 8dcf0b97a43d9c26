//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use makrama_core::{CategoryId, ProductId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::config::AnalyticsConfig;
use crate::error::Result;
use crate::filters;
use crate::models::Wishlist;
use crate::routes::NotFoundTemplate;
use crate::state::AppState;
use crate::woo::{Product, ProductImage, ProductQuery, WooError};

/// Product tile data for listing grids.
#[derive(Clone)]
pub struct ProductView {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub price: String,
    /// Pre-sale price, present while the product is on sale.
    pub regular_price: Option<String>,
    pub image: Option<ImageView>,
    pub in_stock: bool,
}

/// Image display data for templates.
#[derive(Clone)]
pub struct ImageView {
    pub url: String,
    pub alt: String,
}

/// Full product data for the detail page.
#[derive(Clone)]
pub struct ProductDetailView {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub price: String,
    pub regular_price: Option<String>,
    /// HTML from WooCommerce, rendered as-is.
    pub description: String,
    /// HTML from WooCommerce, rendered as-is.
    pub short_description: String,
    pub sku: String,
    pub images: Vec<ImageView>,
    pub in_stock: bool,
    pub purchasable: bool,
    pub low_stock_remaining: Option<u32>,
    pub category: Option<CategoryRefView>,
}

/// Category breadcrumb data.
#[derive(Clone)]
pub struct CategoryRefView {
    pub name: String,
    pub slug: String,
}

/// Listing query parameters, mapped onto the Store API.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub search: Option<String>,
    pub category: Option<i64>,
    pub sort: Option<String>,
}

// =============================================================================
// Type Conversions
// =============================================================================

impl From<&ProductImage> for ImageView {
    fn from(image: &ProductImage) -> Self {
        Self {
            url: image.src.clone(),
            alt: image.alt.clone(),
        }
    }
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            price: product.price().to_string(),
            regular_price: product
                .on_sale
                .then(|| product.prices.regular().to_string()),
            image: product.featured_image().map(ImageView::from),
            in_stock: product.is_in_stock,
        }
    }
}

impl From<&Product> for ProductDetailView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            slug: product.slug.clone(),
            name: product.name.clone(),
            price: product.price().to_string(),
            regular_price: product
                .on_sale
                .then(|| product.prices.regular().to_string()),
            description: product.description.clone(),
            short_description: product.short_description.clone(),
            sku: product.sku.clone(),
            images: product.images.iter().map(ImageView::from).collect(),
            in_stock: product.is_in_stock,
            purchasable: product.is_purchasable,
            low_stock_remaining: product.low_stock_remaining,
            category: product.primary_category().map(|c| CategoryRefView {
                name: c.name.clone(),
                slug: c.slug.clone(),
            }),
        }
    }
}

/// Map the `?sort=` parameter onto Store API orderby/order.
fn sort_params(sort: Option<&str>) -> (Option<String>, Option<String>) {
    match sort {
        Some("price-asc") => (Some("price".to_string()), Some("asc".to_string())),
        Some("price-desc") => (Some("price".to_string()), Some("desc".to_string())),
        Some("name") => (Some("title".to_string()), Some("asc".to_string())),
        // Newest first is the default
        _ => (Some("date".to_string()), Some("desc".to_string())),
    }
}

/// Product listing page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub products: Vec<ProductView>,
    pub current_page: u32,
    pub total_pages: u32,
    pub total: u32,
    pub search: String,
    pub sort: String,
    pub category: Option<i64>,
    pub analytics: AnalyticsConfig,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductDetailView,
    pub related: Vec<ProductView>,
    pub in_wishlist: bool,
    pub analytics: AnalyticsConfig,
}

/// Products per listing page.
const PRODUCTS_PER_PAGE: u32 = 12;

/// Related products shown under the detail page.
const RELATED_COUNT: usize = 4;

/// Display the product listing page.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ProductsIndexTemplate> {
    let page = query.page.unwrap_or(1).max(1);
    let (orderby, order) = sort_params(query.sort.as_deref());

    let product_query = ProductQuery {
        page,
        per_page: PRODUCTS_PER_PAGE,
        search: query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        category: query.category.map(CategoryId::new),
        orderby,
        order,
    };
    let listing = state.catalog().list_products(&product_query).await?;

    Ok(ProductsIndexTemplate {
        products: listing.products.iter().map(ProductView::from).collect(),
        current_page: page,
        total_pages: listing.total_pages.max(1),
        total: listing.total,
        search: query.search.unwrap_or_default(),
        sort: query.sort.unwrap_or_default(),
        category: query.category,
        analytics: state.config().analytics.clone(),
    })
}

/// Display the product detail page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<String>,
) -> Result<Response> {
    let product = match state.catalog().get_product_by_slug(&slug).await {
        Ok(product) => product,
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

    // Related products from the same primary category; a failure here only
    // costs the related strip.
    let related = match product.primary_category() {
        Some(category) => {
            let related_query = ProductQuery {
                per_page: u32::try_from(RELATED_COUNT).unwrap_or(4) + 1,
                category: Some(category.id),
                ..ProductQuery::default()
            };
            state.catalog().list_products(&related_query).await.map_or_else(
                |e| {
                    tracing::warn!("Failed to fetch related products: {e}");
                    Vec::new()
                },
                |listing| {
                    listing
                        .products
                        .iter()
                        .filter(|p| p.id != product.id)
                        .take(RELATED_COUNT)
                        .map(ProductView::from)
                        .collect()
                },
            )
        }
        None => Vec::new(),
    };

    let wishlist = Wishlist::load(&session).await?;

    Ok(ProductShowTemplate {
        in_wishlist: wishlist.contains(product.id),
        product: ProductDetailView::from(&product),
        related,
        analytics: state.config().analytics.clone(),
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_params_mapping() {
        assert_eq!(
            sort_params(Some("price-asc")),
            (Some("price".to_string()), Some("asc".to_string()))
        );
        assert_eq!(
            sort_params(Some("name")),
            (Some("title".to_string()), Some("asc".to_string()))
        );
        assert_eq!(
            sort_params(None),
            (Some("date".to_string()), Some("desc".to_string()))
        );
        assert_eq!(
            sort_params(Some("garbage")),
            (Some("date".to_string()), Some("desc".to_string()))
        );
    }

    #[test]
    fn test_product_view_carries_sale_price() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 42,
            "name": "Lniana torba",
            "slug": "lniana-torba",
            "on_sale": true,
            "prices": {
                "price": "10999",
                "regular_price": "12999",
                "sale_price": "10999",
                "currency_code": "PLN",
                "currency_minor_unit": 2
            }
        }))
        .unwrap();

        let view = ProductView::from(&product);
        assert_eq!(view.price, "109.99 PLN");
        assert_eq!(view.regular_price.as_deref(), Some("129.99 PLN"));

        let mut full_price = product;
        full_price.on_sale = false;
        let view = ProductView::from(&full_price);
        assert!(view.regular_price.is_none());
    }
}
