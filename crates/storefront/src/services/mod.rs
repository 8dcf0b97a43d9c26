//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `checkout` - The order placement sequence across WooCommerce, BLPaczka
//!   and Planet Pay, plus the payment-to-order status transition shared by
//!   the confirmation poll and the notification webhook

pub mod checkout;
