//! Cart entry records.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// A product candidate for the cart, before it has a quantity.
///
/// This is what the catalog hands to `add_to_cart`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    /// Product this entry refers to.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Display image.
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    /// Unit price.
    pub price: Price,
}

impl NewCartItem {
    /// Create a new cart candidate.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: Price,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }

    /// Turn the candidate into a cart entry with the given quantity.
    #[must_use]
    pub fn with_quantity(self, quantity: u32) -> CartItem {
        CartItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity,
        }
    }
}

/// One distinct product in the cart.
///
/// This is also the persisted record: a stored cart is a JSON array of these,
/// with the field names below (`image_url` is also read as `imageUrl`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product this entry refers to. Unique within a cart.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Display image.
    #[serde(alias = "imageUrl")]
    pub image_url: String,
    /// Unit price.
    pub price: Price,
    /// Number of units. At least 1 while the entry is in a cart.
    pub quantity: u32,
}
