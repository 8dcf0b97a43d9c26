//! Session-related types.
//!
//! Types stored in the session for checkout state.

use makrama_core::{OrderId, PaymentId};
use serde::{Deserialize, Serialize};

/// Session-stored reference to an in-flight checkout.
///
/// Written when checkout creates the order, read by the confirmation page to
/// poll the payment. The order key doubles as the visitor's proof of access
/// to the order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutReference {
    pub order_id: OrderId,
    pub order_key: String,
    /// Assigned only when Planet Pay is the chosen gateway.
    pub payment_id: Option<PaymentId>,
}

/// Session keys for storefront data.
pub mod keys {
    /// Key for the session cart.
    pub const CART: &str = "cart";

    /// Key for the session wishlist.
    pub const WISHLIST: &str = "wishlist";

    /// Key for the in-flight checkout reference.
    pub const CHECKOUT: &str = "checkout";
}
