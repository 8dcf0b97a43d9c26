//! WooCommerce Store API catalog client.
//!
//! Read-only, unauthenticated access to products and categories, plus the
//! WordPress pages API for static content. Responses are cached with `moka`
//! (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use makrama_core::{CategoryId, ProductId};
use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::WooConfig;
use crate::woo::WooError;
use crate::woo::types::{Category, Product, ProductPage, WpPage};

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    ProductPage(Box<ProductPage>),
    Products(Vec<Product>),
    Category(Box<Category>),
    Categories(Vec<Category>),
    Page(Box<WpPage>),
}

/// Query parameters for product listings, mapped onto the Store API's
/// `page` / `per_page` / `search` / `category` / `orderby` / `order`.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    pub page: u32,
    pub per_page: u32,
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub orderby: Option<String>,
    pub order: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 12,
            search: None,
            category: None,
            orderby: None,
            order: None,
        }
    }
}

impl ProductQuery {
    fn cache_key(&self) -> String {
        format!(
            "products:page={}:per={}:search={}:cat={}:orderby={}:order={}",
            self.page,
            self.per_page,
            self.search.as_deref().unwrap_or(""),
            self.category.map(|c| c.to_string()).unwrap_or_default(),
            self.orderby.as_deref().unwrap_or(""),
            self.order.as_deref().unwrap_or(""),
        )
    }
}

/// Client for the WooCommerce Store API.
///
/// Provides read access to products, categories, and WordPress content
/// pages. Catalog reads are cached for 5 minutes.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a new Store API client.
    #[must_use]
    pub fn new(config: &WooConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                cache,
            }),
        }
    }

    fn store_url(&self, path: &str) -> String {
        format!("{}/wp-json/wc/store/v1{path}", self.inner.base_url)
    }

    /// Execute a GET request and parse the JSON body.
    ///
    /// Returns the parsed body together with the response headers so callers
    /// can read the `X-WP-Total*` pagination headers.
    async fn request<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<(T, reqwest::header::HeaderMap), WooError> {
        let response = self.inner.client.get(url).query(query).send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(WooError::RateLimited(retry_after));
        }

        let headers = response.headers().clone();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Store API returned non-success status"
            );
            return Err(WooError::Api {
                status: status.as_u16(),
                message: super::api_error_message(&response_text),
            });
        }

        match serde_json::from_str(&response_text) {
            Ok(value) => Ok((value, headers)),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Store API response"
                );
                Err(WooError::Parse(e))
            }
        }
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products with pagination and filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, WooError> {
        let cache_key = query.cache_key();

        // Check cache
        if let Some(CacheValue::ProductPage(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product listing");
            return Ok(*page);
        }

        let mut params = vec![
            ("page", query.page.to_string()),
            ("per_page", query.per_page.to_string()),
        ];
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }
        if let Some(category) = query.category {
            params.push(("category", category.to_string()));
        }
        if let Some(orderby) = &query.orderby {
            params.push(("orderby", orderby.clone()));
        }
        if let Some(order) = &query.order {
            params.push(("order", order.clone()));
        }

        let url = self.store_url("/products");
        let (products, headers): (Vec<Product>, _) = self.request(&url, &params).await?;

        let total = header_u32(&headers, "x-wp-total")
            .unwrap_or_else(|| u32::try_from(products.len()).unwrap_or(u32::MAX));
        let total_pages = header_u32(&headers, "x-wp-totalpages").unwrap_or(1);

        let page = ProductPage {
            products,
            total,
            total_pages,
        };

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::ProductPage(Box::new(page.clone())))
            .await;

        Ok(page)
    }

    /// Get a product by its numeric id.
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotFound` if no such product exists.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, WooError> {
        let cache_key = format!("product:id:{id}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.store_url(&format!("/products/{id}"));
        let (product, _): (Product, _) = match self.request(&url, &[]).await {
            Err(WooError::Api { status: 404, .. }) => {
                return Err(WooError::NotFound(format!("Product not found: {id}")));
            }
            other => other?,
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a product by its slug.
    ///
    /// The Store API has no slug path segment; filtering by `?slug=` returns
    /// an array with zero or one element.
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotFound` if no product has the slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Product, WooError> {
        let cache_key = format!("product:slug:{slug}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.store_url("/products");
        let (mut products, _): (Vec<Product>, _) = self
            .request(&url, &[("slug", slug.to_string())])
            .await?;

        if products.is_empty() {
            return Err(WooError::NotFound(format!("Product not found: {slug}")));
        }
        let product = products.remove(0);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Fetch a specific set of products by id (used by the wishlist page).
    ///
    /// Ids that no longer resolve upstream are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn list_products_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, WooError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let include = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let cache_key = format!("products:include:{include}");

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product set");
            return Ok(products);
        }

        let url = self.store_url("/products");
        let (products, _): (Vec<Product>, _) = self
            .request(
                &url,
                &[("include", include), ("per_page", ids.len().to_string())],
            )
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// List all product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, WooError> {
        let cache_key = "categories:all".to_string();

        if let Some(CacheValue::Categories(categories)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let url = self.store_url("/products/categories");
        let (categories, _): (Vec<Category>, _) = self
            .request(&url, &[("per_page", "100".to_string())])
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Categories(categories.clone()))
            .await;

        Ok(categories)
    }

    /// Get a category by its slug.
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotFound` if no category has the slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, WooError> {
        let cache_key = format!("category:slug:{slug}");

        if let Some(CacheValue::Category(category)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(*category);
        }

        let url = self.store_url("/products/categories");
        let (mut categories, _): (Vec<Category>, _) = self
            .request(&url, &[("slug", slug.to_string())])
            .await?;

        if categories.is_empty() {
            return Err(WooError::NotFound(format!("Category not found: {slug}")));
        }
        let category = categories.remove(0);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Category(Box::new(category.clone())))
            .await;

        Ok(category)
    }

    // =========================================================================
    // Content Pages
    // =========================================================================

    /// Get a WordPress content page by slug (terms, privacy, about).
    ///
    /// # Errors
    ///
    /// Returns `WooError::NotFound` if no published page has the slug.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_page_by_slug(&self, slug: &str) -> Result<WpPage, WooError> {
        let cache_key = format!("page:slug:{slug}");

        if let Some(CacheValue::Page(page)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for content page");
            return Ok(*page);
        }

        let url = format!("{}/wp-json/wp/v2/pages", self.inner.base_url);
        let (mut pages, _): (Vec<WpPage>, _) = self
            .request(&url, &[("slug", slug.to_string())])
            .await?;

        if pages.is_empty() {
            return Err(WooError::NotFound(format!("Page not found: {slug}")));
        }
        let page = pages.remove(0);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Page(Box::new(page.clone())))
            .await;

        Ok(page)
    }

    /// Probe the Store API (used by the readiness endpoint and `mk-cli check`).
    ///
    /// # Errors
    ///
    /// Returns an error if the Store API is not reachable.
    pub async fn ping(&self) -> Result<(), WooError> {
        let url = self.store_url("/products");
        let (_, _): (Vec<Product>, _) = self.request(&url, &[("per_page", "1".to_string())]).await?;
        Ok(())
    }
}

fn header_u32(headers: &reqwest::header::HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_query_cache_key_distinguishes_filters() {
        let base = ProductQuery::default();
        let searched = ProductQuery {
            search: Some("torba".to_string()),
            ..ProductQuery::default()
        };
        let filtered = ProductQuery {
            category: Some(CategoryId::new(3)),
            ..ProductQuery::default()
        };

        assert_ne!(base.cache_key(), searched.cache_key());
        assert_ne!(base.cache_key(), filtered.cache_key());
        assert_ne!(searched.cache_key(), filtered.cache_key());
    }
}
