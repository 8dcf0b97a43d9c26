//! Session wishlist model.
//!
//! A session-held set of product ids with toggle semantics. Like the cart,
//! the wishlist stores no product data; the page resolves ids upstream and
//! silently drops ones that no longer exist.

use makrama_core::ProductId;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// The session wishlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Wishlist {
    product_ids: Vec<ProductId>,
}

impl Wishlist {
    /// Load the wishlist from the session, empty if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<Self>(session_keys::WISHLIST)
            .await?
            .unwrap_or_default())
    }

    /// Write the wishlist back to the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store fails.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::WISHLIST, self).await
    }

    /// Toggle a product. Returns `true` if the product is now on the list.
    pub fn toggle(&mut self, product_id: ProductId) -> bool {
        if self.contains(product_id) {
            self.product_ids.retain(|id| *id != product_id);
            false
        } else {
            self.product_ids.push(product_id);
            true
        }
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    #[must_use]
    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut wishlist = Wishlist::default();

        assert!(wishlist.toggle(ProductId::new(7)));
        assert!(wishlist.contains(ProductId::new(7)));

        assert!(!wishlist.toggle(ProductId::new(7)));
        assert!(!wishlist.contains(ProductId::new(7)));
        assert!(wishlist.is_empty());
    }

    #[test]
    fn test_toggle_keeps_other_entries() {
        let mut wishlist = Wishlist::default();
        wishlist.toggle(ProductId::new(7));
        wishlist.toggle(ProductId::new(9));

        wishlist.toggle(ProductId::new(7));
        assert_eq!(wishlist.product_ids(), &[ProductId::new(9)]);
    }
}
