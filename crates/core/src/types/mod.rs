//! Core types for GoMarketplace.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod cart_item;
pub mod id;
pub mod price;

pub use cart_item::{CartItem, NewCartItem};
pub use id::ProductId;
pub use price::{Price, PriceError};
