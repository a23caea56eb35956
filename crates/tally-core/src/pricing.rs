//! # Pricing Engine
//!
//! Derives an order's money breakdown from its lines and a configuration
//! snapshot. Pure: same lines + same snapshot = same breakdown.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. subtotal            = Σ unit price × quantity                       │
//! │  2. base discount       = subtotal × value/100     (percentage)         │
//! │                         = min(value, subtotal)     (fixed amount)       │
//! │  3. discounted subtotal = subtotal − base discount                      │
//! │       employee order + to-go enabled:                                   │
//! │                         × (1 − to-go percentage/100)                    │
//! │  4. tax                 = discounted subtotal × tax rate (if enabled)   │
//! │  5. gratuity            = discounted subtotal × gratuity rate (if on)   │
//! │  6. total               = discounted subtotal + tax + gratuity + extras │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step keeps full decimal precision. The to-go reduction is reported
//! separately but also folded into `discount_amount`, so a receipt built from
//! the breakdown always satisfies
//! `total = subtotal − discount_amount + tax + gratuity + extra_charges`.
//!
//! Nothing here is incremental; callers recompute after every mutation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::types::{ClientSettings, OrderLine};

// =============================================================================
// Discount
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// `value` is percentage points of the subtotal.
    #[default]
    Percentage,
    /// `value` is a money amount, capped at the subtotal.
    FixedAmount,
}

/// An order-level discount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub kind: DiscountType,
    #[ts(type = "string")]
    pub value: Decimal,
}

impl Discount {
    pub fn percentage(points: Decimal) -> Self {
        Discount {
            kind: DiscountType::Percentage,
            value: points,
        }
    }

    pub fn fixed(amount: Money) -> Self {
        Discount {
            kind: DiscountType::FixedAmount,
            value: amount.amount(),
        }
    }

    /// Discount taken off `subtotal`, never more than the subtotal itself.
    /// `None` if the percentage overflows.
    pub fn amount_off(&self, subtotal: Money) -> Option<Money> {
        let raw = match self.kind {
            DiscountType::Percentage => subtotal.checked_percent(self.value)?,
            DiscountType::FixedAmount => Money::from_decimal(self.value),
        };
        Some(raw.min(subtotal).non_negative())
    }
}

// =============================================================================
// Configuration Snapshot
// =============================================================================

/// Everything besides the lines that affects an order's price.
///
/// Captured by value at checkout so later edits cannot change a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    pub discount: Discount,
    pub tax_enabled: bool,
    pub tax_rate: Rate,
    pub gratuity_enabled: bool,
    pub gratuity_rate: Rate,
    pub extra_charges: Money,
    pub employee_order: bool,
    pub client: ClientSettings,
}

impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            discount: Discount::default(),
            tax_enabled: true,
            tax_rate: Rate::from_percentage_points(10),
            gratuity_enabled: false,
            gratuity_rate: Rate::from_percentage_points(15),
            extra_charges: Money::zero(),
            employee_order: false,
            client: ClientSettings::default(),
        }
    }
}

// =============================================================================
// Breakdown
// =============================================================================

/// Result of pricing an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingBreakdown {
    pub subtotal: Money,
    /// Order discount from [`Discount`] alone.
    pub base_discount: Money,
    /// Employee to-go reduction applied after the base discount.
    pub to_go_discount: Money,
    /// `base_discount + to_go_discount`; what a receipt records.
    pub discount_amount: Money,
    pub discounted_subtotal: Money,
    pub tax: Money,
    pub gratuity: Money,
    pub extra_charges: Money,
    pub total: Money,
}

/// Prices `lines` under `config`.
///
/// Fails with `InvalidAmount` rather than overflowing when the amounts are
/// too large to add up.
///
/// ## Example
/// ```rust
/// use tally_core::pricing::{calculate, PricingConfig};
///
/// // Nothing on the order, nothing to pay
/// let config = PricingConfig::default();
/// let breakdown = calculate(&[], &config).unwrap();
/// assert!(breakdown.total.is_zero());
/// ```
pub fn calculate(lines: &[OrderLine], config: &PricingConfig) -> CoreResult<PricingBreakdown> {
    let subtotal = lines.iter().try_fold(Money::zero(), |acc, line| {
        line.product
            .price
            .checked_multiply_quantity(line.quantity)
            .and_then(|total| acc.checked_add(total))
    });
    let subtotal = subtotal.ok_or_else(too_large)?;

    let base_discount = config.discount.amount_off(subtotal).ok_or_else(too_large)?;
    let after_base = subtotal - base_discount;

    let discounted_subtotal = if config.employee_order && config.client.discounted_to_go_enabled
    {
        let keep = Decimal::ONE_HUNDRED - config.client.discounted_to_go_percentage;
        after_base
            .checked_percent(keep)
            .ok_or_else(too_large)?
            .non_negative()
    } else {
        after_base
    };
    let to_go_discount = after_base - discounted_subtotal;

    let tax = if config.tax_enabled {
        discounted_subtotal
            .checked_apply_rate(config.tax_rate)
            .ok_or_else(too_large)?
    } else {
        Money::zero()
    };

    let gratuity = if config.gratuity_enabled {
        discounted_subtotal
            .checked_apply_rate(config.gratuity_rate)
            .ok_or_else(too_large)?
    } else {
        Money::zero()
    };

    let extra_charges = config.extra_charges;
    let total = discounted_subtotal
        .checked_add(tax)
        .and_then(|t| t.checked_add(gratuity))
        .and_then(|t| t.checked_add(extra_charges))
        .ok_or_else(too_large)?;

    Ok(PricingBreakdown {
        subtotal,
        base_discount,
        to_go_discount,
        discount_amount: base_discount + to_go_discount,
        discounted_subtotal,
        tax,
        gratuity,
        extra_charges,
        total,
    })
}

fn too_large() -> CoreError {
    CoreError::invalid_amount("order total is too large")
}

// =============================================================================
// Unit Tests
// =============================================================================
