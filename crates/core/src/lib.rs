//! Makrama Core - Shared types library.
//!
//! This crate provides common types used across all Makrama components:
//! - `storefront` - Public-facing shop (catalog, cart, checkout)
//! - `cli` - Command-line diagnostics against the upstream services
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Everything
//! the shop displays is fetched live from WooCommerce, Planet Pay or
//! BLPaczka, so these types mirror the upstream vocabularies rather than
//! defining a data model of their own.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money amounts, emails,
//!   and upstream status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
