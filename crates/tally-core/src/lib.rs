//! # tally-core: Pure Business Logic for the Tally register
//!
//! This crate holds the rules that do not need any state: money arithmetic,
//! the pricing engine, domain types, and input validation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation layer (out of tree)                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ commands / queries                     │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 tally-engine (Register)                         │   │
//! │  │   Catalog · Ledger · Cash Drawer · Order · Session              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │   types · money · pricing · validation · error                  │   │
//! │  │   NO I/O • NO LOCKS • PURE FUNCTIONS                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Receipt, Employee, etc.)
//! - [`money`] - Exact decimal `Money` and `Rate`
//! - [`pricing`] - Subtotal → discount → tax → gratuity → total
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::{Money, Rate};
//! use tally_core::pricing::{calculate, PricingConfig};
//!
//! let config = PricingConfig {
//!     tax_enabled: true,
//!     tax_rate: Rate::from_percentage_points(10),
//!     ..PricingConfig::default()
//! };
//! let breakdown = calculate(&[], &config).unwrap();
//! assert_eq!(breakdown.total, Money::zero());
//! ```

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// These allow users to do `use tally_core::Money` instead of
// `use tally_core::money::Money`
pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::{Money, Rate};
pub use pricing::{Discount, DiscountType, PricingBreakdown, PricingConfig};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted in one stock reservation or adjustment.
///
/// Prevents fat-finger entries (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum number of lines on one order.
pub const MAX_ORDER_LINES: usize = 100;

/// Largest single price, custom amount, or charge, in cents ($1,000,000.00).
///
/// With [`MAX_ORDER_LINES`] and [`MAX_ITEM_QUANTITY`] this keeps every
/// order total far inside `Decimal`'s range.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000;
