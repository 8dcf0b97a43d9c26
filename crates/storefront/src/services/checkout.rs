//! Checkout orchestration.
//!
//! Order placement is a fixed, sequential workflow across the three
//! upstreams:
//!
//! 1. validate the form and re-read the session cart,
//! 2. re-price the selected courier via BLPaczka (never trust form prices),
//! 3. create the WooCommerce order (`pending`),
//! 4. book the BLPaczka shipment, best-effort,
//! 5. create the Planet Pay payment and send the buyer to the gateway, or
//!    advance the order to `processing` for cash on delivery.
//!
//! There are no retries and no persisted workflow state. Failures after the
//! order exists are logged and the flow continues where the order still
//! stands on its own.

use std::collections::HashMap;

use makrama_core::{Email, MoneyError, OrderStatus, PaymentChannel, PaymentStatus};
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::blpaczka::{BlPaczkaError, CourierOffer, CourierQuery, Parcel, Shipment, ShipmentAddress, ShipmentRequest};
use crate::config::ShipFromAddress;
use crate::error::AppError;
use crate::models::{Cart, CheckoutReference};
use crate::planetpay::{Buyer, PaymentRequest, PlanetPayError};
use crate::state::AppState;
use crate::woo::{
    LineItemDraft, MetaData, Order, OrderAddress, OrderDraft, PaymentGateway, ShippingLineDraft,
    WooError,
};

/// Order meta keys written by the storefront.
pub mod meta_keys {
    /// Planet Pay payment id attached after payment creation.
    pub const PAYMENT_ID: &str = "_planetpay_payment_id";

    /// Courier code the buyer selected.
    pub const COURIER_CODE: &str = "_blpaczka_courier";

    /// Pickup point code for locker delivery.
    pub const PICKUP_POINT: &str = "_blpaczka_pickup_point";

    /// BLPaczka shipment id attached after booking.
    pub const SHIPMENT_ID: &str = "_blpaczka_shipment_id";

    /// Courier tracking number attached after booking.
    pub const TRACKING_NUMBER: &str = "_blpaczka_tracking_number";
}

/// WooCommerce gateway ids the storefront knows how to drive.
pub mod gateway_ids {
    /// The Planet Pay plugin's gateway id.
    pub const PLANET_PAY: &str = "planetpay";

    /// WooCommerce's built-in cash on delivery gateway.
    pub const CASH_ON_DELIVERY: &str = "cod";
}

/// Checkout form fields.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub courier_code: String,
    #[serde(default)]
    pub pickup_point: Option<String>,
    pub payment_method: String,
    #[serde(default)]
    pub payment_channel: Option<String>,
    #[serde(default)]
    pub customer_note: Option<String>,
}

impl CheckoutForm {
    /// Field-level validation. Returns human-readable problems, empty when
    /// the form is acceptable. Cross-field rules (locker required, payment
    /// channel required) are checked in [`place_order`] where the courier
    /// offer and gateway are known.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if Email::parse(self.email.trim()).is_err() {
            errors.push("Enter a valid e-mail address".to_string());
        }
        for (value, label) in [
            (&self.first_name, "first name"),
            (&self.last_name, "last name"),
            (&self.street, "street address"),
            (&self.city, "city"),
            (&self.postcode, "postcode"),
        ] {
            if value.trim().is_empty() {
                errors.push(format!("Enter your {label}"));
            }
        }
        if self.courier_code.trim().is_empty() {
            errors.push("Choose a delivery method".to_string());
        }
        if self.payment_method.trim().is_empty() {
            errors.push("Choose a payment method".to_string());
        }

        errors
    }
}

/// How the order gets paid, settled during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PaymentPlan {
    PlanetPay(PaymentChannel),
    CashOnDelivery,
}

/// A successfully placed checkout.
#[derive(Debug)]
pub struct PlacedCheckout {
    pub reference: CheckoutReference,
    /// Hosted payment page to send the buyer to; `None` goes straight to
    /// the confirmation page.
    pub redirect_url: Option<String>,
}

/// Errors from the checkout sequence.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The session cart is empty (or nothing in it still exists upstream).
    #[error("cart is empty")]
    EmptyCart,

    /// The form did not validate; messages are for the visitor.
    #[error("invalid checkout form")]
    Validation(Vec<String>),

    /// An upstream call failed.
    #[error(transparent)]
    App(#[from] AppError),
}

impl From<WooError> for CheckoutError {
    fn from(e: WooError) -> Self {
        Self::App(AppError::from(e))
    }
}

impl From<PlanetPayError> for CheckoutError {
    fn from(e: PlanetPayError) -> Self {
        Self::App(AppError::from(e))
    }
}

impl From<BlPaczkaError> for CheckoutError {
    fn from(e: BlPaczkaError) -> Self {
        Self::App(AppError::from(e))
    }
}

impl From<MoneyError> for CheckoutError {
    fn from(e: MoneyError) -> Self {
        Self::App(AppError::from(e))
    }
}

/// Build the courier offer query for a receiver postcode.
///
/// Every order ships as one standard parcel from the shop's dispatch
/// address.
#[must_use]
pub fn courier_query(ship_from: &ShipFromAddress, receiver_postcode: &str) -> CourierQuery {
    CourierQuery {
        sender_postcode: ship_from.postcode.clone(),
        receiver_postcode: receiver_postcode.trim().to_string(),
        parcel: Parcel::standard(),
    }
}

/// Run the checkout sequence for a validated-enough form and the session
/// cart.
///
/// # Errors
///
/// `EmptyCart` when nothing in the cart resolves upstream, `Validation` for
/// form problems, `App` when an upstream call fails before the order exists
/// (or when payment creation fails after it).
#[instrument(skip(state, form, cart), fields(lines = cart.lines().len(), courier = %form.courier_code, gateway = %form.payment_method))]
pub async fn place_order(
    state: &AppState,
    form: &CheckoutForm,
    cart: &Cart,
) -> Result<PlacedCheckout, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut errors = form.validate();

    // Resolve the selected courier against a fresh offer list, then let the
    // broker re-price it. The form's price never reaches the order.
    let query = courier_query(&state.config().ship_from, &form.postcode);
    let offer = find_offer(state, &query, &form.courier_code).await?;
    let Some(offer) = offer else {
        errors.push("The selected delivery method is no longer available".to_string());
        return Err(CheckoutError::Validation(errors));
    };
    if offer.pickup_point_delivery && not_blank(form.pickup_point.as_ref()).is_none() {
        errors.push("Choose a pickup point for locker delivery".to_string());
    }

    // The storefront only drives gateways it understands, and only ones the
    // shop has enabled.
    let gateways = state.orders().list_payment_gateways().await?;
    let gateway = gateways.iter().find(|g| {
        g.id == form.payment_method
            && (g.id == gateway_ids::PLANET_PAY || g.id == gateway_ids::CASH_ON_DELIVERY)
    });
    let Some(gateway) = gateway else {
        errors.push("Choose a payment method offered by the shop".to_string());
        return Err(CheckoutError::Validation(errors));
    };

    let plan = if gateway.id == gateway_ids::PLANET_PAY {
        match parse_channel(form.payment_channel.as_deref()) {
            Some(channel) => PaymentPlan::PlanetPay(channel),
            None => {
                errors.push("Choose a payment channel (card, BLIK or transfer)".to_string());
                return Err(CheckoutError::Validation(errors));
            }
        }
    } else {
        PaymentPlan::CashOnDelivery
    };

    if !errors.is_empty() {
        return Err(CheckoutError::Validation(errors));
    }

    let valuation = state
        .blpaczka()
        .valuate(&offer.courier_code, &query)
        .await?;

    // Cart lines priced by WooCommerce itself; products that vanished or
    // went unpurchasable upstream are dropped.
    let line_items = resolve_line_items(state, cart).await?;
    if line_items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let draft = build_draft(form, &offer, &valuation.price_gross.to_string(), gateway, line_items);
    let order = state.orders().create_order(&draft).await?;
    info!(order_id = %order.id, number = %order.number, "Order created");

    // Best-effort from here on; the order stands even if booking fails.
    let mut post_meta = Vec::new();
    match book_shipment(state, form, &offer, &order).await {
        Ok(shipment) => {
            info!(order_id = %order.id, shipment_id = %shipment.shipment_id, "Shipment booked");
            post_meta.push(MetaData::new(
                meta_keys::SHIPMENT_ID,
                shipment.shipment_id.as_str(),
            ));
            if !shipment.tracking_number.is_empty() {
                post_meta.push(MetaData::new(
                    meta_keys::TRACKING_NUMBER,
                    shipment.tracking_number.as_str(),
                ));
            }
        }
        Err(e) => {
            warn!(order_id = %order.id, error = %e, "Shipment booking failed, order continues");
        }
    }

    if let PaymentPlan::PlanetPay(channel) = plan {
        let request = payment_request(state, form, &order, channel)?;
        let payment = state.planetpay().create_payment(&request).await?;
        info!(order_id = %order.id, payment_id = %payment.payment_id, "Payment created");

        post_meta.push(MetaData::new(
            meta_keys::PAYMENT_ID,
            payment.payment_id.as_str(),
        ));
        if let Err(e) = state
            .orders()
            .update_order_status(order.id, order.status, post_meta)
            .await
        {
            warn!(order_id = %order.id, error = %e, "Failed to attach meta to order");
        }

        Ok(PlacedCheckout {
            reference: CheckoutReference {
                order_id: order.id,
                order_key: order.order_key,
                payment_id: Some(payment.payment_id),
            },
            redirect_url: payment.redirect_url,
        })
    } else {
        // Cash on delivery confirms immediately.
        if let Err(e) = state
            .orders()
            .update_order_status(order.id, OrderStatus::Processing, post_meta)
            .await
        {
            warn!(order_id = %order.id, error = %e, "Failed to advance COD order to processing");
        }

        Ok(PlacedCheckout {
            reference: CheckoutReference {
                order_id: order.id,
                order_key: order.order_key,
                payment_id: None,
            },
            redirect_url: None,
        })
    }
}

/// Apply a payment result to an order.
///
/// Transitions are only ever applied when the order is still `pending`, so
/// the confirmation poll and the notification webhook racing each other
/// settle on a single transition. Returns the order's status after the call.
///
/// # Errors
///
/// Returns an error if the status update fails upstream.
pub async fn apply_payment_status(
    state: &AppState,
    order: &Order,
    payment_status: PaymentStatus,
) -> Result<OrderStatus, AppError> {
    match next_order_status(order.status, payment_status) {
        Some(next) => {
            let updated = state
                .orders()
                .update_order_status(order.id, next, Vec::new())
                .await?;
            info!(
                order_id = %order.id,
                payment_status = ?payment_status,
                order_status = %updated.status,
                "Order status advanced from payment result"
            );
            Ok(updated.status)
        }
        None => Ok(order.status),
    }
}

/// The transition table for payment results.
fn next_order_status(current: OrderStatus, payment: PaymentStatus) -> Option<OrderStatus> {
    if current != OrderStatus::Pending {
        return None;
    }
    if payment.is_successful() {
        Some(OrderStatus::Processing)
    } else if payment.is_final() {
        Some(OrderStatus::Failed)
    } else {
        None
    }
}

async fn find_offer(
    state: &AppState,
    query: &CourierQuery,
    courier_code: &str,
) -> Result<Option<CourierOffer>, CheckoutError> {
    let offers = state.blpaczka().find_couriers(query).await?;
    Ok(offers.into_iter().find(|o| o.courier_code == courier_code))
}

async fn resolve_line_items(
    state: &AppState,
    cart: &Cart,
) -> Result<Vec<LineItemDraft>, CheckoutError> {
    let products = state
        .catalog()
        .list_products_by_ids(&cart.product_ids())
        .await?;
    let purchasable: HashMap<_, _> = products
        .iter()
        .filter(|p| p.is_purchasable && p.is_in_stock)
        .map(|p| (p.id, p))
        .collect();

    Ok(cart
        .lines()
        .iter()
        .filter(|line| purchasable.contains_key(&line.product_id))
        .map(|line| LineItemDraft {
            product_id: line.product_id,
            quantity: line.quantity,
        })
        .collect())
}

fn build_draft(
    form: &CheckoutForm,
    offer: &CourierOffer,
    shipping_total: &str,
    gateway: &crate::woo::PaymentGateway,
    line_items: Vec<LineItemDraft>,
) -> OrderDraft {
    let address = order_address(form);

    let mut meta_data = vec![MetaData::new(
        meta_keys::COURIER_CODE,
        offer.courier_code.as_str(),
    )];
    if let Some(point) = not_blank(form.pickup_point.as_ref()) {
        meta_data.push(MetaData::new(meta_keys::PICKUP_POINT, point));
    }

    OrderDraft {
        payment_method: gateway.id.clone(),
        payment_method_title: gateway.title.clone(),
        set_paid: false,
        billing: address.clone(),
        shipping: address,
        line_items,
        shipping_lines: vec![ShippingLineDraft {
            method_id: offer.courier_code.clone(),
            method_title: offer.courier_name.clone(),
            total: shipping_total.to_string(),
        }],
        customer_note: not_blank(form.customer_note.as_ref()),
        meta_data,
    }
}

fn order_address(form: &CheckoutForm) -> OrderAddress {
    OrderAddress {
        first_name: form.first_name.trim().to_string(),
        last_name: form.last_name.trim().to_string(),
        address_1: form.street.trim().to_string(),
        address_2: String::new(),
        city: form.city.trim().to_string(),
        state: String::new(),
        postcode: form.postcode.trim().to_string(),
        country: "PL".to_string(),
        email: Some(form.email.trim().to_string()),
        phone: not_blank(form.phone.as_ref()),
    }
}

async fn book_shipment(
    state: &AppState,
    form: &CheckoutForm,
    offer: &CourierOffer,
    order: &Order,
) -> Result<Shipment, BlPaczkaError> {
    let ship_from = &state.config().ship_from;
    let request = ShipmentRequest {
        courier_code: offer.courier_code.clone(),
        sender: ShipmentAddress {
            name: ship_from.name.clone(),
            street: ship_from.street.clone(),
            city: ship_from.city.clone(),
            postcode: ship_from.postcode.clone(),
            country: ship_from.country.clone(),
            email: Some(ship_from.email.clone()),
            phone: Some(ship_from.phone.clone()),
        },
        receiver: ShipmentAddress {
            name: format!("{} {}", form.first_name.trim(), form.last_name.trim()),
            street: form.street.trim().to_string(),
            city: form.city.trim().to_string(),
            postcode: form.postcode.trim().to_string(),
            country: "PL".to_string(),
            email: Some(form.email.trim().to_string()),
            phone: not_blank(form.phone.as_ref()),
        },
        parcel: Parcel::standard(),
        target_point: not_blank(form.pickup_point.as_ref()),
        reference: Some(order.number.clone()),
    };

    state.blpaczka().create_shipment(&request).await
}

fn payment_request(
    state: &AppState,
    form: &CheckoutForm,
    order: &Order,
    channel: PaymentChannel,
) -> Result<PaymentRequest, CheckoutError> {
    let config = state.config();
    let total = order.total_money()?;
    let amount = total.to_minor_units(2)?;

    Ok(PaymentRequest {
        merchant_id: config.planetpay.merchant_id.clone(),
        amount,
        currency: order.currency.clone(),
        external_id: order.id.to_string(),
        description: format!("Order {}", order.number),
        buyer: Buyer {
            email: form.email.trim().to_string(),
        },
        channel,
        return_url: format!(
            "{}/checkout/return?order={}&key={}",
            config.base_url, order.id, order.order_key
        ),
        notification_url: format!("{}/checkout/notify", config.base_url),
    })
}

fn parse_channel(value: Option<&str>) -> Option<PaymentChannel> {
    value.and_then(|v| v.parse::<PaymentChannel>().ok())
}

fn not_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
