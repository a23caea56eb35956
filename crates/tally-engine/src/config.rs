//! # Engine Configuration
//!
//! Settings loaded once when a register opens.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TALLY_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Read-only after startup. The store-wide client settings it seeds are the
//! only part that changes later, and those live in `SettingsState`.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::warn;

use tally_core::validation::{validate_non_negative, validate_rate};
use tally_core::{ClientSettings, Money, PricingConfig, Rate};

use crate::order::OrderSettings;

/// Register configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Store name (printed on reports)
    pub store_name: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,

    /// Number of decimal places shown for currency
    pub currency_decimals: u32,

    /// Cash in the drawer when the register opens
    pub starting_float: Money,

    /// Whether new orders are taxed
    pub tax_enabled: bool,

    /// Default tax rate as a fraction, e.g. 0.10 = 10%
    pub tax_rate: Rate,

    /// Whether new orders carry a gratuity
    pub gratuity_enabled: bool,

    /// Default gratuity rate as a fraction
    pub gratuity_rate: Rate,

    /// Store-wide settings the register starts with
    pub client_settings: ClientSettings,
}

impl Default for EngineConfig {
    /// ## Default Values
    /// - Store: "Tally Register"
    /// - Currency: $ with 2 decimals
    /// - Float: $1000.00
    /// - Tax: on, 10%
    /// - Gratuity: off, 15%
    /// - Client settings: free lunch on, to-go discount on at 20%
    fn default() -> Self {
        let pricing = PricingConfig::default();
        EngineConfig {
            store_name: "Tally Register".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            starting_float: Money::from_cents(100_000),
            tax_enabled: pricing.tax_enabled,
            tax_rate: pricing.tax_rate,
            gratuity_enabled: pricing.gratuity_enabled,
            gratuity_rate: pricing.gratuity_rate,
            client_settings: ClientSettings::default(),
        }
    }
}

impl EngineConfig {
    /// Creates a config from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `TALLY_STORE_NAME`: Override store name
    /// - `TALLY_STARTING_FLOAT`: Opening drawer cash (e.g., "500.00")
    /// - `TALLY_TAX_RATE`: Tax percentage (e.g., "8.25")
    /// - `TALLY_GRATUITY_RATE`: Gratuity percentage (e.g., "18")
    ///
    /// Unparseable or out-of-range values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();

        if let Some(store_name) = lookup("TALLY_STORE_NAME") {
            config.store_name = store_name;
        }

        if let Some(raw) = lookup("TALLY_STARTING_FLOAT") {
            match Money::from_str(&raw) {
                Ok(float) if validate_non_negative("starting float", float).is_ok() => {
                    config.starting_float = float;
                }
                _ => warn!(value = %raw, "Ignoring invalid TALLY_STARTING_FLOAT"),
            }
        }

        if let Some(raw) = lookup("TALLY_TAX_RATE") {
            match parse_percentage_rate(&raw) {
                Some(rate) => config.tax_rate = rate,
                None => warn!(value = %raw, "Ignoring invalid TALLY_TAX_RATE"),
            }
        }

        if let Some(raw) = lookup("TALLY_GRATUITY_RATE") {
            match parse_percentage_rate(&raw) {
                Some(rate) => config.gratuity_rate = rate,
                None => warn!(value = %raw, "Ignoring invalid TALLY_GRATUITY_RATE"),
            }
        }

        config
    }

    /// Order settings every new (or cleared) order starts from.
    pub fn order_defaults(&self) -> OrderSettings {
        OrderSettings {
            tax_enabled: self.tax_enabled,
            tax_rate: self.tax_rate,
            gratuity_enabled: self.gratuity_enabled,
            gratuity_rate: self.gratuity_rate,
            ..OrderSettings::default()
        }
    }

    /// Formats money for display, rounding half to even.
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::Money;
    /// use tally_engine::EngineConfig;
    ///
    /// let config = EngineConfig::default();
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        let mut value = amount
            .amount()
            .round_dp_with_strategy(self.currency_decimals, RoundingStrategy::MidpointNearestEven);
        let negative = value.is_sign_negative() && !value.is_zero();
        value = value.abs();
        value.rescale(self.currency_decimals);

        format!(
            "{}{}{}",
            if negative { "-" } else { "" },
            self.currency_symbol,
            value
        )
    }
}

/// Parses "8.25" (percent) into the fraction 0.0825.
fn parse_percentage_rate(raw: &str) -> Option<Rate> {
    let points = Decimal::from_str(raw.trim()).ok()?;
    let rate = Rate::from_fraction(points / Decimal::ONE_HUNDRED);
    validate_rate("rate", rate).ok()?;
    Some(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.starting_float, Money::from_cents(100_000));
        assert!(config.tax_enabled);
        assert_eq!(config.tax_rate, Rate::from_percentage_points(10));
        assert!(!config.gratuity_enabled);
        assert_eq!(config.gratuity_rate, Rate::from_percentage_points(15));
    }

    #[test]
    fn test_env_overrides() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("TALLY_STORE_NAME", "Corner Deli"),
            ("TALLY_STARTING_FLOAT", "250.00"),
            ("TALLY_TAX_RATE", "8.25"),
            ("TALLY_GRATUITY_RATE", "18"),
        ]));
        assert_eq!(config.store_name, "Corner Deli");
        assert_eq!(config.starting_float, Money::from_cents(25_000));
        assert_eq!(config.tax_rate.fraction(), Decimal::new(825, 4));
        assert_eq!(config.gratuity_rate, Rate::from_percentage_points(18));
    }

    #[test]
    fn test_invalid_env_values_ignored() {
        let config = EngineConfig::from_lookup(lookup(&[
            ("TALLY_STARTING_FLOAT", "-5"),
            ("TALLY_TAX_RATE", "abc"),
            ("TALLY_GRATUITY_RATE", "150"),
        ]));
        let defaults = EngineConfig::default();
        assert_eq!(config.starting_float, defaults.starting_float);
        assert_eq!(config.tax_rate, defaults.tax_rate);
        assert_eq!(config.gratuity_rate, defaults.gratuity_rate);
    }

    #[test]
    fn test_format_currency() {
        let config = EngineConfig::default();
        assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
        assert_eq!(config.format_currency(Money::zero()), "$0.00");
        assert_eq!(config.format_currency(Money::from_cents(-550)), "-$5.50");
        // 0.125 rounds half to even
        assert_eq!(
            config.format_currency(Money::from_decimal(Decimal::new(125, 3))),
            "$0.12"
        );
    }

    #[test]
    fn test_order_defaults_follow_config() {
        let config = EngineConfig {
            tax_enabled: false,
            gratuity_enabled: true,
            ..EngineConfig::default()
        };
        let settings = config.order_defaults();
        assert!(!settings.tax_enabled);
        assert!(settings.gratuity_enabled);
        assert!(settings.extra_charges.is_zero());
    }
}
