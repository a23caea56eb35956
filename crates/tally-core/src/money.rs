//! # Money Module
//!
//! Provides the `Money` and `Rate` types for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Rounding every pricing step to cents compounds error:                  │
//! │    discount → to-go discount → tax → gratuity, each rounded             │
//! │                                                                         │
//! │  OUR SOLUTION: exact base-10 decimals                                   │
//! │    Every step keeps full precision. Only the receipt printer and        │
//! │    the UI round to two places.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::money::{Money, Rate};
//!
//! let price = Money::from_cents(50); // $0.50
//! let tax = price.apply_rate(Rate::from_percentage_points(10));
//! assert_eq!(tax, Money::from_cents(5));
//! assert_eq!((price + tax).to_string(), "$0.55");
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// Decimal places used when presenting money.
pub const DISPLAY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in major units (dollars), held at full precision.
///
/// ## Design Decisions
/// - **Decimal (signed)**: intermediate values such as `subtotal - discount`
///   may be computed before clamping
/// - **Single field tuple struct**: zero-cost wrapper, no mixing with raw numbers
/// - **Serialized as a string**: no precision loss crossing the JSON boundary
///
/// ## Where Money is Used
/// ```text
/// Product.price ──► OrderLine.line_total ──► PricingBreakdown.subtotal
///                                                    │
///              discount ─ tax ─ gratuity ─ extras ◄──┘
///                                                    │
///                        Receipt.total ──► CashDrawer.balance
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // $10.99
    /// assert_eq!(price.to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Wraps an exact decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the exact, unrounded amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is strictly less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Rounds to two decimal places with Bankers Rounding.
    ///
    /// Only presentation code should call this; arithmetic stays exact.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let exact = Money::from_decimal(Decimal::new(12345, 3)); // 12.345
    /// assert_eq!(exact.rounded(), Money::from_cents(1234));   // half to even
    /// ```
    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Returns the rounded value in cents.
    pub fn cents(&self) -> i64 {
        (self.rounded().0 * Decimal::ONE_HUNDRED)
            .to_i64()
            .unwrap_or_default()
    }

    /// Multiplies money by a quantity.
    ///
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(299);
    /// assert_eq!(unit_price.multiply_quantity(3), Money::from_cents(897));
    /// ```
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }

    /// Returns `value` percent of this amount (`self × value / 100`).
    pub fn percent(&self, value: Decimal) -> Money {
        Money(self.0 * value / Decimal::ONE_HUNDRED)
    }

    /// Applies a fractional rate (`self × rate`), e.g. tax or gratuity.
    pub fn apply_rate(&self, rate: Rate) -> Money {
        Money(self.0 * rate.fraction())
    }

    /// Adds, returning `None` instead of overflowing.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtracts, returning `None` instead of overflowing.
    #[inline]
    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// [`Money::multiply_quantity`] without the overflow panic.
    #[inline]
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// [`Money::percent`] without the overflow panic.
    pub fn checked_percent(&self, value: Decimal) -> Option<Money> {
        self.0
            .checked_mul(value)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .map(Money)
    }

    /// [`Money::apply_rate`] without the overflow panic.
    pub fn checked_apply_rate(&self, rate: Rate) -> Option<Money> {
        self.0.checked_mul(rate.fraction()).map(Money)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        std::cmp::min(self, other)
    }

    /// Clamps negative values to zero.
    #[inline]
    pub fn non_negative(self) -> Money {
        std::cmp::max(self, Money::zero())
    }
}

/// Shows money rounded to cents, e.g. `$10.99` or `-$5.50`.
///
/// This is for logs and reports; localized UI formatting belongs to
/// `EngineConfig::format_currency` in the engine crate.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.rounded().0;
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        rounded = rounded.abs();
        rounded.rescale(DISPLAY_DECIMALS);
        write!(f, "{}${}", sign, rounded)
    }
}

/// Parses a plain decimal string such as `"12.50"`.
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money)
            .map_err(|_| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: "must be a decimal number".to_string(),
            })
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A rate expressed as a fraction: `0.10` means 10%.
///
/// Tax and gratuity are configured this way. Discounts are entered as
/// percentage points and go through [`Money::percent`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(#[ts(type = "string")] Decimal);

impl Rate {
    /// Creates a rate from a fraction (`0.15` = 15%).
    #[inline]
    pub const fn from_fraction(fraction: Decimal) -> Self {
        Rate(fraction)
    }

    /// Creates a rate from whole percentage points (`10` = 10%).
    pub fn from_percentage_points(points: u32) -> Self {
        Rate(Decimal::from(points) / Decimal::ONE_HUNDRED)
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    pub fn percentage(&self) -> Decimal {
        self.0 * Decimal::ONE_HUNDRED
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "$10.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-$5.50");
        assert_eq!(Money::zero().to_string(), "$0.00");
    }

    #[test]
    fn test_display_rounds_only_at_presentation() {
        // 0.50 × 10% = 0.05 exactly, 0.55 × 15% = 0.0825
        let tip = Money::from_cents(55).apply_rate(Rate::from_percentage_points(15));
        assert_eq!(tip.amount(), Decimal::new(825, 4));
        assert_eq!(tip.to_string(), "$0.08");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a + b, Money::from_cents(1500));
        assert_eq!(a - b, Money::from_cents(500));
        assert_eq!(a * 3, Money::from_cents(3000));
    }

    #[test]
    fn test_percent_keeps_precision() {
        // $10.00 / 3 style splits stay exact until rounded
        let subtotal = Money::from_cents(1000);
        let third = subtotal.percent(Decimal::new(3333, 2));
        assert_eq!(third.amount(), Decimal::new(333300, 5));
        assert_eq!(third.cents(), 333);
    }

    #[test]
    fn test_bankers_rounding() {
        assert_eq!(Money::from_decimal(Decimal::new(125, 3)).cents(), 12);
        assert_eq!(Money::from_decimal(Decimal::new(135, 3)).cents(), 14);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.non_negative(), Money::zero());
    }

    #[test]
    fn test_parse() {
        assert_eq!("12.50".parse::<Money>().unwrap(), Money::from_cents(1250));
        assert!("twelve".parse::<Money>().is_err());
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let huge = Money::from_decimal(Decimal::MAX);
        assert_eq!(huge.checked_add(Money::from_cents(1)), None);
        assert_eq!(huge.checked_multiply_quantity(2), None);
        assert_eq!(huge.checked_percent(Decimal::from(200)), None);
        assert_eq!(
            Money::from_cents(100).checked_add(Money::from_cents(50)),
            Some(Money::from_cents(150))
        );
        assert_eq!(
            Money::from_cents(1000).checked_apply_rate(Rate::from_percentage_points(10)),
            Some(Money::from_cents(100))
        );
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(150), Money::from_cents(250)]
            .iter()
            .sum();
        assert_eq!(total, Money::from_cents(400));
    }

    #[test]
    fn test_rate_from_percentage_points() {
        let rate = Rate::from_percentage_points(15);
        assert_eq!(rate.fraction(), Decimal::new(15, 2));
        assert_eq!(rate.percentage(), Decimal::from(15));
    }
}
