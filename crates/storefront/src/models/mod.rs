//! Domain models for the storefront.
//!
//! The only state this system owns lives in the visitor's session: the cart,
//! the wishlist, and a reference to an in-flight checkout. Everything else
//! (products, orders, payments, shipments) belongs to the upstream services.

pub mod cart;
pub mod session;
pub mod wishlist;

pub use cart::{Cart, CartLine};
pub use session::CheckoutReference;
pub use session::keys as session_keys;
pub use wishlist::Wishlist;
