//! BLPaczka API types.

use makrama_core::{Money, ShipmentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Parcel dimensions and weight.
#[derive(Debug, Clone, Serialize)]
pub struct Parcel {
    /// Weight in kilograms.
    pub weight: Decimal,
    /// Width in centimetres.
    pub width: u32,
    /// Height in centimetres.
    pub height: u32,
    /// Length in centimetres.
    pub length: u32,
}

impl Parcel {
    /// The shop's standard box. Every order ships as one of these.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            weight: Decimal::TWO,
            width: 30,
            height: 20,
            length: 40,
        }
    }
}

/// Query for courier offers.
#[derive(Debug, Clone, Serialize)]
pub struct CourierQuery {
    pub sender_postcode: String,
    pub receiver_postcode: String,
    pub parcel: Parcel,
}

/// A courier offer for a parcel.
#[derive(Debug, Clone, Deserialize)]
pub struct CourierOffer {
    /// Broker-scoped courier code, e.g. `"inpost_locker"`.
    pub courier_code: String,
    pub courier_name: String,
    /// Gross price as a decimal string, e.g. `"15.99"`.
    pub price_gross: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Estimated delivery time in working days.
    #[serde(default)]
    pub delivery_days: Option<u32>,
    /// Whether this offer delivers to a pickup point rather than an address.
    #[serde(default)]
    pub pickup_point_delivery: bool,
}

impl CourierOffer {
    #[must_use]
    pub fn price(&self) -> Money {
        Money::new(self.price_gross, self.currency.as_str())
    }
}

/// Authoritative price for a selected courier.
#[derive(Debug, Clone, Deserialize)]
pub struct Valuation {
    pub courier_code: String,
    pub price_gross: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Valuation {
    #[must_use]
    pub fn price(&self) -> Money {
        Money::new(self.price_gross, self.currency.as_str())
    }
}

/// A pickup point (parcel locker or service point).
#[derive(Debug, Clone, Deserialize)]
pub struct PickupPoint {
    /// Provider-scoped point code, e.g. `"WAW04A"`.
    pub code: String,
    /// Point network, e.g. `"inpost"`.
    pub provider: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postcode: String,
}

/// Sender or receiver of a shipment.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentAddress {
    pub name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    /// ISO 3166-1 alpha-2, e.g. `"PL"`.
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Request to book a shipment.
#[derive(Debug, Clone, Serialize)]
pub struct ShipmentRequest {
    pub courier_code: String,
    pub sender: ShipmentAddress,
    pub receiver: ShipmentAddress,
    pub parcel: Parcel,
    /// Target pickup point code for locker delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_point: Option<String>,
    /// Merchant-side reference, the WooCommerce order number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// A booked shipment.
#[derive(Debug, Clone, Deserialize)]
pub struct Shipment {
    pub shipment_id: ShipmentId,
    #[serde(default)]
    pub tracking_number: String,
    #[serde(default)]
    pub label_url: Option<String>,
}

fn default_currency() -> String {
    "PLN".to_string()
}
