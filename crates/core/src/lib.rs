//! GoMarketplace Core - Shared cart types.
//!
//! This crate provides the types used across all GoMarketplace components:
//! - `cart` - Cart state machine and persistence
//! - `cli` - Command-line cart tool
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no async
//! runtime. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product IDs, prices, and cart item records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
