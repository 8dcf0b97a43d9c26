//! WooCommerce wire types.
//!
//! Pass-through representations of the Store API and v3 REST schemas. Fields
//! the storefront does not render are omitted; optional upstream fields get
//! serde defaults so sparse responses still parse.

use makrama_core::{CategoryId, Money, MoneyError, OrderId, OrderStatus, ProductId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Store API (catalog)
// =============================================================================

/// A product as returned by the Store API.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub permalink: String,
    /// HTML description, rendered as-is.
    #[serde(default)]
    pub description: String,
    /// HTML short description, rendered as-is.
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub prices: Prices,
    #[serde(default)]
    pub images: Vec<ProductImage>,
    #[serde(default)]
    pub categories: Vec<ProductCategoryRef>,
    #[serde(default = "default_true")]
    pub is_in_stock: bool,
    #[serde(default = "default_true")]
    pub is_purchasable: bool,
    #[serde(default)]
    pub low_stock_remaining: Option<u32>,
}

impl Product {
    /// Current price as [`Money`].
    #[must_use]
    pub fn price(&self) -> Money {
        self.prices.current()
    }

    /// First image, used as the tile/hero image.
    #[must_use]
    pub fn featured_image(&self) -> Option<&ProductImage> {
        self.images.first()
    }

    /// First category, used for related-product lookups.
    #[must_use]
    pub fn primary_category(&self) -> Option<&ProductCategoryRef> {
        self.categories.first()
    }
}

/// The Store API price block. All amounts are minor-unit strings
/// (`"12999"` = 129.99 PLN when `currency_minor_unit` is 2).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Prices {
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub regular_price: String,
    #[serde(default)]
    pub sale_price: Option<String>,
    #[serde(default)]
    pub currency_code: String,
    #[serde(default = "default_minor_unit")]
    pub currency_minor_unit: u32,
}

impl Prices {
    fn money_from(&self, minor: &str) -> Option<Money> {
        minor
            .parse::<i64>()
            .ok()
            .map(|m| Money::from_minor_units(m, self.currency_minor_unit, &self.currency_code))
    }

    /// The price currently charged (sale price while on sale).
    #[must_use]
    pub fn current(&self) -> Money {
        self.money_from(&self.price)
            .unwrap_or_else(|| Money::zero(&self.currency_code))
    }

    /// The regular (pre-sale) price.
    #[must_use]
    pub fn regular(&self) -> Money {
        self.money_from(&self.regular_price)
            .unwrap_or_else(|| Money::zero(&self.currency_code))
    }

    /// The sale price, if one is set upstream.
    #[must_use]
    pub fn sale(&self) -> Option<Money> {
        self.sale_price
            .as_deref()
            .filter(|s| !s.is_empty())
            .and_then(|s| self.money_from(s))
    }
}

/// A product image.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductImage {
    #[serde(default)]
    pub id: i64,
    pub src: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub alt: String,
}

/// A category reference embedded in a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product category as returned by `/products/categories`.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parent: i64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub image: Option<CategoryImage>,
}

/// A category image.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryImage {
    #[serde(default)]
    pub src: String,
    #[serde(default)]
    pub alt: String,
}

/// One page of a paginated product listing, with totals taken from the
/// `X-WP-Total` / `X-WP-TotalPages` response headers.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: u32,
    pub total_pages: u32,
}

/// A WordPress content page (`/wp-json/wp/v2/pages`), used for static
/// content like terms and privacy.
#[derive(Debug, Clone, Deserialize)]
pub struct WpPage {
    pub id: i64,
    pub slug: String,
    pub title: Rendered,
    pub content: Rendered,
}

/// WordPress rendered-field wrapper.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

// =============================================================================
// v3 REST API (orders)
// =============================================================================

/// Payload for creating an order via `POST /wc/v3/orders`.
///
/// Totals are never set here: WooCommerce computes them from the line items
/// and shipping lines.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDraft {
    pub payment_method: String,
    pub payment_method_title: String,
    pub set_paid: bool,
    pub billing: OrderAddress,
    pub shipping: OrderAddress,
    pub line_items: Vec<LineItemDraft>,
    pub shipping_lines: Vec<ShippingLineDraft>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_note: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub meta_data: Vec<MetaData>,
}

/// A draft order line: product id and quantity, nothing else. WooCommerce
/// prices the line itself.
#[derive(Debug, Clone, Serialize)]
pub struct LineItemDraft {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A draft shipping line carrying the re-priced courier offer.
#[derive(Debug, Clone, Serialize)]
pub struct ShippingLineDraft {
    pub method_id: String,
    pub method_title: String,
    /// Decimal string, e.g. `"15.99"`.
    pub total: String,
}

/// A billing or shipping address.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OrderAddress {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub address_2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postcode: String,
    #[serde(default)]
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// An order as returned by the v3 API.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub number: String,
    /// Anonymous-access key; callers must check it before exposing the order.
    pub order_key: String,
    pub status: OrderStatus,
    pub currency: String,
    /// Decimal string as computed by WooCommerce.
    pub total: String,
    #[serde(default)]
    pub shipping_total: String,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub billing: OrderAddress,
    #[serde(default)]
    pub shipping: OrderAddress,
    #[serde(default)]
    pub line_items: Vec<OrderLineItem>,
    #[serde(default)]
    pub meta_data: Vec<MetaData>,
}

impl Order {
    /// The order total as [`Money`].
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream total is not a valid decimal.
    pub fn total_money(&self) -> Result<Money, MoneyError> {
        Money::parse(&self.total, &self.currency)
    }

    /// Look up a string meta value by key.
    #[must_use]
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta_data
            .iter()
            .find(|m| m.key == key)
            .and_then(|m| m.value.as_str())
    }
}

/// An order line item as returned by the v3 API.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineItem {
    pub id: i64,
    pub name: String,
    pub product_id: ProductId,
    pub quantity: u32,
    pub total: String,
    #[serde(default)]
    pub subtotal: String,
}

/// An order meta entry. Carries the parcel locker code, the Planet Pay
/// payment id, and shipment details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub key: String,
    pub value: serde_json::Value,
}

impl MetaData {
    /// Create a meta entry for order create/update payloads.
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            id: None,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A payment gateway as returned by `GET /wc/v3/payment_gateways`.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentGateway {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub enabled: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_minor_unit() -> u32 {
    2
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store_api_product() {
        let json = serde_json::json!({
            "id": 42,
            "name": "Lniana torba",
            "slug": "lniana-torba",
            "permalink": "https://shop.makrama.pl/produkt/lniana-torba/",
            "description": "<p>Ręcznie pleciona torba.</p>",
            "short_description": "<p>Ręcznie pleciona.</p>",
            "on_sale": true,
            "prices": {
                "price": "10999",
                "regular_price": "12999",
                "sale_price": "10999",
                "currency_code": "PLN",
                "currency_minor_unit": 2
            },
            "images": [
                {"id": 7, "src": "https://shop.makrama.pl/img/torba.jpg", "alt": "Torba"}
            ],
            "categories": [
                {"id": 3, "name": "Torby", "slug": "torby"}
            ],
            "is_in_stock": true,
            "is_purchasable": true
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.id, ProductId::new(42));
        assert_eq!(product.slug, "lniana-torba");
        assert!(product.on_sale);
        assert_eq!(product.price().to_string(), "109.99 PLN");
        assert_eq!(product.prices.regular().to_string(), "129.99 PLN");
        assert_eq!(product.featured_image().unwrap().alt, "Torba");
        assert_eq!(product.primary_category().unwrap().slug, "torby");
    }

    #[test]
    fn test_parse_sparse_product_uses_defaults() {
        let json = serde_json::json!({
            "id": 7,
            "name": "Makrama na ścianę",
            "slug": "makrama-na-sciane"
        });

        let product: Product = serde_json::from_value(json).unwrap();
        assert!(product.is_in_stock);
        assert!(product.is_purchasable);
        assert!(product.images.is_empty());
        assert_eq!(product.price().to_string(), "0.00 ");
    }

    #[test]
    fn test_prices_sale_empty_string_is_none() {
        let prices = Prices {
            price: "9900".to_string(),
            regular_price: "9900".to_string(),
            sale_price: Some(String::new()),
            currency_code: "PLN".to_string(),
            currency_minor_unit: 2,
        };
        assert!(prices.sale().is_none());
    }

    #[test]
    fn test_parse_v3_order() {
        let json = serde_json::json!({
            "id": 1042,
            "number": "1042",
            "order_key": "wc_order_abc123",
            "status": "pending",
            "currency": "PLN",
            "total": "125.98",
            "shipping_total": "15.99",
            "billing": {
                "first_name": "Anna",
                "last_name": "Nowak",
                "address_1": "Polna 5",
                "city": "Poznan",
                "postcode": "61-001",
                "country": "PL",
                "email": "anna@example.com"
            },
            "line_items": [
                {"id": 1, "name": "Lniana torba", "product_id": 42, "quantity": 2, "total": "109.99"}
            ],
            "meta_data": [
                {"id": 9, "key": "_planetpay_payment_id", "value": "PAY-77"}
            ]
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.id, OrderId::new(1042));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total_money().unwrap().to_string(), "125.98 PLN");
        assert_eq!(order.meta_str("_planetpay_payment_id"), Some("PAY-77"));
        assert_eq!(order.meta_str("_missing"), None);
    }

    #[test]
    fn test_order_draft_serialization_skips_empty() {
        let draft = OrderDraft {
            payment_method: "planetpay".to_string(),
            payment_method_title: "Planet Pay".to_string(),
            set_paid: false,
            billing: OrderAddress::default(),
            shipping: OrderAddress::default(),
            line_items: vec![LineItemDraft {
                product_id: ProductId::new(42),
                quantity: 1,
            }],
            shipping_lines: vec![],
            customer_note: None,
            meta_data: vec![],
        };

        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("customer_note").is_none());
        assert!(json.get("meta_data").is_none());
        assert_eq!(json["line_items"][0]["product_id"], 42);
        assert!(json["billing"].get("email").is_none());
    }
}
