//! Checkout route handlers.
//!
//! The checkout works without client-side script. The form page loads
//! courier offers for a `?postcode=` query, the locker picker is a separate
//! page that links back into the form, and the confirmation page re-polls
//! the payment by refreshing itself while the payment is in flight.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use makrama_core::{OrderId, OrderStatus, PaymentId};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument, warn};

use crate::blpaczka::{CourierOffer, PickupPoint};
use crate::config::AnalyticsConfig;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::models::{Cart, CheckoutReference, session_keys};
use crate::planetpay::PaymentNotification;
use crate::routes::cart::{CartPageView, cart_view};
use crate::services::checkout::{self as service, CheckoutError, CheckoutForm, gateway_ids, meta_keys};
use crate::state::AppState;
use crate::woo::{Order, PaymentGateway};

/// Notification signature headers sent by the gateway.
const NOTIFY_TIMESTAMP_HEADER: &str = "x-pp-timestamp";
const NOTIFY_SIGNATURE_HEADER: &str = "x-pp-signature";

/// Query parameters for the checkout form page.
///
/// `postcode` drives the courier offer lookup; `courier` and `pickup_point`
/// carry the buyer's selection back from the locker picker.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub postcode: Option<String>,
    pub courier: Option<String>,
    pub pickup_point: Option<String>,
}

/// Query parameters for the locker picker.
#[derive(Debug, Deserialize)]
pub struct LockersQuery {
    pub postcode: String,
    pub provider: String,
}

/// Query parameters for the confirmation and return pages.
#[derive(Debug, Deserialize)]
pub struct ConfirmationQuery {
    pub order: i64,
    pub key: String,
}

// =============================================================================
// View Types
// =============================================================================

/// Form field values for re-rendering the checkout form.
#[derive(Clone, Default)]
pub struct CheckoutFormView {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
    pub phone: String,
    pub courier_code: String,
    pub pickup_point: String,
    pub payment_method: String,
    pub payment_channel: String,
    pub customer_note: String,
}

impl From<&CheckoutForm> for CheckoutFormView {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            email: form.email.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            street: form.street.clone(),
            city: form.city.clone(),
            postcode: form.postcode.clone(),
            phone: form.phone.clone().unwrap_or_default(),
            courier_code: form.courier_code.clone(),
            pickup_point: form.pickup_point.clone().unwrap_or_default(),
            payment_method: form.payment_method.clone(),
            payment_channel: form.payment_channel.clone().unwrap_or_default(),
            customer_note: form.customer_note.clone().unwrap_or_default(),
        }
    }
}

/// A courier offer as shown in the delivery section.
#[derive(Clone)]
pub struct OfferView {
    pub courier_code: String,
    pub courier_name: String,
    pub price: String,
    pub delivery_days: Option<u32>,
    pub pickup_point_delivery: bool,
}

impl From<&CourierOffer> for OfferView {
    fn from(offer: &CourierOffer) -> Self {
        Self {
            courier_code: offer.courier_code.clone(),
            courier_name: offer.courier_name.clone(),
            price: offer.price().to_string(),
            delivery_days: offer.delivery_days,
            pickup_point_delivery: offer.pickup_point_delivery,
        }
    }
}

/// A payment method as shown in the payment section.
#[derive(Clone)]
pub struct GatewayView {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Planet Pay additionally asks for a channel (card, BLIK, transfer).
    pub is_planetpay: bool,
}

impl From<&PaymentGateway> for GatewayView {
    fn from(gateway: &PaymentGateway) -> Self {
        Self {
            id: gateway.id.clone(),
            title: gateway.title.clone(),
            description: gateway.description.clone(),
            is_planetpay: gateway.id == gateway_ids::PLANET_PAY,
        }
    }
}

/// A pickup point in the locker picker.
#[derive(Clone)]
pub struct PickupPointView {
    pub code: String,
    pub name: String,
    pub street: String,
    pub city: String,
    pub postcode: String,
}

impl From<&PickupPoint> for PickupPointView {
    fn from(point: &PickupPoint) -> Self {
        Self {
            code: point.code.clone(),
            name: point.name.clone(),
            street: point.street.clone(),
            city: point.city.clone(),
            postcode: point.postcode.clone(),
        }
    }
}

/// Order summary for the confirmation page.
#[derive(Clone)]
pub struct OrderSummaryView {
    pub number: String,
    pub status_label: String,
    pub awaiting_payment: bool,
    pub total: String,
    pub shipping_total: String,
    pub email: String,
    pub items: Vec<OrderItemView>,
}

/// One line on the confirmation page.
#[derive(Clone)]
pub struct OrderItemView {
    pub name: String,
    pub quantity: u32,
    pub total: String,
}

impl OrderSummaryView {
    /// Build the summary for a status that may have just been advanced.
    fn new(order: &Order, status: OrderStatus) -> Self {
        let total = order
            .total_money()
            .map_or_else(|_| format!("{} {}", order.total, order.currency), |m| m.to_string());
        Self {
            number: order.number.clone(),
            status_label: status_label(status).to_string(),
            awaiting_payment: status.is_awaiting_payment(),
            total,
            shipping_total: format!("{} {}", order.shipping_total, order.currency),
            email: order.billing.email.clone().unwrap_or_default(),
            items: order
                .line_items
                .iter()
                .map(|item| OrderItemView {
                    name: item.name.clone(),
                    quantity: item.quantity,
                    total: format!("{} {}", item.total, order.currency),
                })
                .collect(),
        }
    }
}

/// Visitor-facing label for an order status.
const fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Awaiting payment",
        OrderStatus::Processing => "Paid, being prepared",
        OrderStatus::OnHold => "On hold",
        OrderStatus::Completed => "Completed",
        OrderStatus::Cancelled => "Cancelled",
        OrderStatus::Refunded => "Refunded",
        OrderStatus::Failed => "Payment failed",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout form page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutShowTemplate {
    pub cart: CartPageView,
    pub form: CheckoutFormView,
    pub offers: Vec<OfferView>,
    pub offers_unavailable: bool,
    pub gateways: Vec<GatewayView>,
    pub errors: Vec<String>,
    pub analytics: AnalyticsConfig,
}

/// Locker picker page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/lockers.html")]
pub struct LockersTemplate {
    pub points: Vec<PickupPointView>,
    pub postcode: String,
    pub provider: String,
    pub analytics: AnalyticsConfig,
}

/// Confirmation page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/confirmation.html")]
pub struct ConfirmationTemplate {
    pub order: OrderSummaryView,
    /// When set the page refreshes itself to re-poll the payment.
    pub refresh: bool,
    pub analytics: AnalyticsConfig,
}

// =============================================================================
// Handlers
// =============================================================================

/// Build the checkout form page.
///
/// Courier offers degrade to a notice when the broker is unreachable; the
/// payment methods come from WooCommerce and are required, so that failure
/// propagates.
async fn checkout_page(
    state: &AppState,
    cart: &Cart,
    form: CheckoutFormView,
    errors: Vec<String>,
) -> Result<CheckoutShowTemplate> {
    let cart = cart_view(state, cart).await?;

    let postcode = form.postcode.trim();
    let (offers, offers_unavailable) = if postcode.is_empty() {
        (Vec::new(), false)
    } else {
        let query = service::courier_query(&state.config().ship_from, postcode);
        match state.blpaczka().find_couriers(&query).await {
            Ok(offers) => (offers.iter().map(OfferView::from).collect(), false),
            Err(e) => {
                warn!("Failed to fetch courier offers: {e}");
                (Vec::new(), true)
            }
        }
    };

    let gateways = state
        .orders()
        .list_payment_gateways()
        .await?
        .iter()
        .filter(|g| g.id == gateway_ids::PLANET_PAY || g.id == gateway_ids::CASH_ON_DELIVERY)
        .map(GatewayView::from)
        .collect();

    Ok(CheckoutShowTemplate {
        cart,
        form,
        offers,
        offers_unavailable,
        gateways,
        errors,
        analytics: state.config().analytics.clone(),
    })
}

/// Display the checkout form.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CheckoutQuery>,
) -> Result<Response> {
    let cart = Cart::load(&session).await?;
    if cart.is_empty() {
        return Ok(Redirect::to("/cart").into_response());
    }

    let form = CheckoutFormView {
        postcode: query.postcode.unwrap_or_default(),
        courier_code: query.courier.unwrap_or_default(),
        pickup_point: query.pickup_point.unwrap_or_default(),
        ..CheckoutFormView::default()
    };
    Ok(checkout_page(&state, &cart, form, Vec::new())
        .await?
        .into_response())
}

/// Display the locker picker for a provider near a postcode.
#[instrument(skip(state))]
pub async fn lockers(
    State(state): State<AppState>,
    Query(query): Query<LockersQuery>,
) -> Result<LockersTemplate> {
    if query.postcode.trim().is_empty() || query.provider.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Postcode and provider are required".to_string(),
        ));
    }

    let points = state
        .blpaczka()
        .list_pickup_points(query.provider.trim(), query.postcode.trim())
        .await?;

    Ok(LockersTemplate {
        points: points.iter().map(PickupPointView::from).collect(),
        postcode: query.postcode.trim().to_string(),
        provider: query.provider.trim().to_string(),
        analytics: state.config().analytics.clone(),
    })
}

/// Place the order.
///
/// On success the cart is cleared, the checkout reference saved in the
/// session, and the buyer redirected to the gateway (or straight to the
/// confirmation page for cash on delivery). Validation problems re-render
/// the form with a 422.
#[instrument(skip(state, session, form))]
pub async fn place(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let mut cart = Cart::load(&session).await?;

    add_breadcrumb(
        "checkout",
        "Placing order",
        Some(&[("courier", &form.courier_code), ("gateway", &form.payment_method)]),
    );

    match service::place_order(&state, &form, &cart).await {
        Ok(placed) => {
            session
                .insert(session_keys::CHECKOUT, &placed.reference)
                .await?;
            cart.clear();
            cart.save(&session).await?;

            let target = placed.redirect_url.unwrap_or_else(|| {
                confirmation_path(placed.reference.order_id, &placed.reference.order_key)
            });
            Ok(Redirect::to(&target).into_response())
        }
        Err(CheckoutError::EmptyCart) => Ok(Redirect::to("/cart").into_response()),
        Err(CheckoutError::Validation(errors)) => {
            let page =
                checkout_page(&state, &cart, CheckoutFormView::from(&form), errors).await?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response())
        }
        Err(CheckoutError::App(e)) => Err(e),
    }
}

/// Display the order confirmation, polling the payment while it is in
/// flight.
///
/// The Woo order key doubles as the visitor's proof of access; a mismatch
/// renders the same 404 as a missing order.
#[instrument(skip(state, session, query), fields(order = query.order))]
pub async fn confirmation(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ConfirmationQuery>,
) -> Result<Response> {
    let order = state.orders().get_order(OrderId::new(query.order)).await?;
    if order.order_key != query.key {
        return Err(AppError::NotFound(format!("Order {} not found", query.order)));
    }

    let reference: Option<CheckoutReference> = session.get(session_keys::CHECKOUT).await?;

    let mut current = order.status;
    let mut polling = false;
    if current.is_awaiting_payment()
        && let Some(payment_id) = payment_id_for(&order, reference.as_ref())
    {
        match state.planetpay().get_payment(&payment_id).await {
            Ok(payment) => {
                current = service::apply_payment_status(&state, &order, payment.status).await?;
                polling = !payment.status.is_final();
            }
            Err(e) => {
                // The page still renders; the next refresh retries the poll
                warn!(order_id = %order.id, error = %e, "Payment status poll failed");
                polling = true;
            }
        }
    }

    Ok(ConfirmationTemplate {
        order: OrderSummaryView::new(&order, current),
        refresh: polling && current.is_awaiting_payment(),
        analytics: state.config().analytics.clone(),
    }
    .into_response())
}

/// Where the gateway sends the buyer after the hosted payment page.
#[instrument]
pub async fn return_from_gateway(Query(query): Query<ConfirmationQuery>) -> Redirect {
    Redirect::to(&confirmation_path(OrderId::new(query.order), &query.key))
}

/// Planet Pay server-to-server payment notification.
///
/// The signature covers `{timestamp}.{body}`, so the body is taken raw and
/// only parsed after verification.
#[instrument(skip(state, headers, body))]
pub async fn notify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<StatusCode> {
    let timestamp = headers
        .get(NOTIFY_TIMESTAMP_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing timestamp header".to_string()))?;
    let signature = headers
        .get(NOTIFY_SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing signature header".to_string()))?;

    state
        .planetpay()
        .verify_notification(timestamp, &body, signature)?;

    let notification: PaymentNotification = serde_json::from_str(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid notification payload: {e}")))?;

    let order_id = notification
        .external_id
        .parse::<i64>()
        .map(OrderId::new)
        .map_err(|_| {
            AppError::BadRequest(format!("Invalid external id: {}", notification.external_id))
        })?;

    let order = state.orders().get_order(order_id).await?;
    service::apply_payment_status(&state, &order, notification.status).await?;

    info!(
        order_id = %order.id,
        payment_id = %notification.payment_id,
        status = ?notification.status,
        "Payment notification applied"
    );
    Ok(StatusCode::OK)
}

/// The confirmation page path for an order.
fn confirmation_path(order_id: OrderId, order_key: &str) -> String {
    format!("/checkout/confirmation?order={order_id}&key={order_key}")
}

/// The payment to poll for an order.
///
/// The order meta is authoritative; the session reference covers the window
/// where attaching the meta failed.
fn payment_id_for(order: &Order, reference: Option<&CheckoutReference>) -> Option<PaymentId> {
    if let Some(id) = order.meta_str(meta_keys::PAYMENT_ID) {
        return Some(PaymentId::new(id));
    }
    reference
        .filter(|r| r.order_id == order.id)
        .and_then(|r| r.payment_id.clone())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn order_with_meta(meta: serde_json::Value) -> Order {
        serde_json::from_value(serde_json::json!({
            "id": 1042,
            "number": "1042",
            "order_key": "wc_order_abc123",
            "status": "pending",
            "currency": "PLN",
            "total": "125.98",
            "meta_data": meta
        }))
        .unwrap()
    }

    #[test]
    fn test_payment_id_prefers_order_meta() {
        let order = order_with_meta(serde_json::json!([
            {"id": 1, "key": "_planetpay_payment_id", "value": "PAY-META"}
        ]));
        let reference = CheckoutReference {
            order_id: OrderId::new(1042),
            order_key: "wc_order_abc123".to_string(),
            payment_id: Some(PaymentId::new("PAY-SESSION")),
        };

        let id = payment_id_for(&order, Some(&reference)).unwrap();
        assert_eq!(id.as_str(), "PAY-META");
    }

    #[test]
    fn test_payment_id_falls_back_to_session_reference() {
        let order = order_with_meta(serde_json::json!([]));
        let reference = CheckoutReference {
            order_id: OrderId::new(1042),
            order_key: "wc_order_abc123".to_string(),
            payment_id: Some(PaymentId::new("PAY-SESSION")),
        };

        let id = payment_id_for(&order, Some(&reference)).unwrap();
        assert_eq!(id.as_str(), "PAY-SESSION");
    }

    #[test]
    fn test_payment_id_ignores_reference_for_other_order() {
        let order = order_with_meta(serde_json::json!([]));
        let reference = CheckoutReference {
            order_id: OrderId::new(9999),
            order_key: "wc_order_other".to_string(),
            payment_id: Some(PaymentId::new("PAY-SESSION")),
        };

        assert!(payment_id_for(&order, Some(&reference)).is_none());
        assert!(payment_id_for(&order, None).is_none());
    }

    #[test]
    fn test_order_summary_formats_totals() {
        let order = order_with_meta(serde_json::json!([]));
        let view = OrderSummaryView::new(&order, OrderStatus::Processing);

        assert_eq!(view.total, "125.98 PLN");
        assert_eq!(view.status_label, "Paid, being prepared");
        assert!(!view.awaiting_payment);
    }
}
