//! # Order Aggregate
//!
//! The in-progress transaction on a register.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Order Lifecycle                                      │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ Building │────►│Tendering │────►│ Receipt  │       │
//! │  │  Order   │     │          │     │          │     │ (ledger) │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │                        │                 │                              │
//! │                   add_item          begin_checkout                     │
//! │                   remove_item       checkout (register)                │
//! │                   set_discount ...       │                              │
//! │                        │                 ▼                              │
//! │                        ▼            reset_after_sale                   │
//! │                   clear ─────────► stock released, back to empty       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every line holds catalog stock from the moment it is rung up. `clear` is
//! the one way an unfinished order gives its stock back; a completed sale
//! keeps it and only resets the order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;
use uuid::Uuid;

use tally_core::pricing::calculate;
use tally_core::validation::{
    validate_amount, validate_contact_info, validate_order_size, validate_percentage,
    validate_positive, validate_rate,
};
use tally_core::{
    Category, ClientSettings, CoreError, CoreResult, Discount, DiscountType, Money, OrderLine,
    PaymentMethod, PricingBreakdown, PricingConfig, Product, Rate, ReceiptMethod,
    MAX_ITEM_QUANTITY,
};

use crate::state::Catalog;

/// Display name of open-amount lines.
pub const CUSTOM_ITEM_NAME: &str = "Custom Item";

/// Where the order is in checkout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    /// Items are being rung up.
    #[default]
    Building,
    /// Payment, signature and receipt delivery are being collected.
    Tendering,
}

/// Per-order pricing knobs, set by the cashier before checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderSettings {
    pub discount: Discount,
    pub tax_enabled: bool,
    pub tax_rate: Rate,
    pub gratuity_enabled: bool,
    pub gratuity_rate: Rate,
    pub extra_charges: Money,
    pub employee_order: bool,
}

impl Default for OrderSettings {
    fn default() -> Self {
        let pricing = PricingConfig::default();
        OrderSettings {
            discount: pricing.discount,
            tax_enabled: pricing.tax_enabled,
            tax_rate: pricing.tax_rate,
            gratuity_enabled: pricing.gratuity_enabled,
            gratuity_rate: pricing.gratuity_rate,
            extra_charges: pricing.extra_charges,
            employee_order: pricing.employee_order,
        }
    }
}

/// Read-only view of an order for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub lines: Vec<OrderLine>,
    pub settings: OrderSettings,
    pub stage: CheckoutStage,
    pub payment_method: PaymentMethod,
    pub receipt_method: ReceiptMethod,
    pub contact_info: Option<String>,
    pub signature: Option<String>,
}

/// The in-progress order.
#[derive(Debug, Clone)]
pub struct Order {
    lines: Vec<OrderLine>,
    settings: OrderSettings,
    stage: CheckoutStage,
    payment_method: PaymentMethod,
    receipt_method: ReceiptMethod,
    contact_info: Option<String>,
    signature: Option<String>,
}

impl Order {
    /// An empty order priced with `settings` until changed.
    pub fn new(settings: OrderSettings) -> Self {
        Order {
            lines: Vec::new(),
            settings,
            stage: CheckoutStage::Building,
            payment_method: PaymentMethod::default(),
            receipt_method: ReceiptMethod::default(),
            contact_info: None,
            signature: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `product_id` on the order, 0 if absent.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.lines
            .iter()
            .find(|l| l.product.id == product_id)
            .map_or(0, |l| l.quantity)
    }

    pub fn settings(&self) -> &OrderSettings {
        &self.settings
    }

    pub fn stage(&self) -> CheckoutStage {
        self.stage
    }

    pub fn view(&self) -> OrderView {
        OrderView {
            lines: self.lines.clone(),
            settings: self.settings.clone(),
            stage: self.stage,
            payment_method: self.payment_method,
            receipt_method: self.receipt_method,
            contact_info: self.contact_info.clone(),
            signature: self.signature.clone(),
        }
    }

    // =========================================================================
    // Lines
    // =========================================================================

    /// Rings up one unit of a catalog product and reserves its stock.
    pub fn add_item(
        &mut self,
        catalog: &mut Catalog,
        product_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<OrderLine> {
        let product = catalog.get(product_id)?;
        if product.stock <= 0 {
            return Err(CoreError::OutOfStock(product.name.clone()));
        }
        if self.quantity_of(product_id) >= MAX_ITEM_QUANTITY {
            return Err(CoreError::invalid_amount(format!(
                "at most {} of one product per order",
                MAX_ITEM_QUANTITY
            )));
        }
        if self.quantity_of(product_id) == 0 {
            validate_order_size(self.lines.len())?;
        }
        let snapshot = product.clone();

        catalog.reserve(product_id, 1, now)?;

        let line = match self.lines.iter_mut().find(|l| l.product.id == product_id) {
            Some(line) => {
                line.quantity += 1;
                line.clone()
            }
            None => {
                let line = OrderLine {
                    product: snapshot,
                    quantity: 1,
                };
                self.lines.push(line.clone());
                line
            }
        };

        debug!(product_id, quantity = line.quantity, "Item added to order");
        Ok(line)
    }

    /// Drops a whole line and gives its stock back.
    pub fn remove_item(
        &mut self,
        catalog: &mut Catalog,
        product_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<OrderLine> {
        let index = self
            .lines
            .iter()
            .position(|l| l.product.id == product_id)
            .ok_or_else(|| CoreError::LineNotFound(product_id.to_string()))?;

        catalog.release_lines(std::slice::from_ref(&self.lines[index]), now)?;
        let line = self.lines.remove(index);

        debug!(product_id, quantity = line.quantity, "Item removed from order");
        Ok(line)
    }

    /// Adds a one-off open-amount line. It never touches the catalog.
    pub fn add_custom_amount(&mut self, value: Money, now: DateTime<Utc>) -> CoreResult<OrderLine> {
        if validate_positive("custom amount", value).is_err() {
            return Err(CoreError::invalid_amount("custom amount must be more than $0.00"));
        }
        validate_amount("custom amount", value)?;
        validate_order_size(self.lines.len())?;

        let line = OrderLine {
            product: Product {
                id: Uuid::new_v4().to_string(),
                name: CUSTOM_ITEM_NAME.to_string(),
                price: value,
                category: Category::Grocery,
                stock: 1,
                bundle_items: Vec::new(),
                custom: true,
                created_at: now,
                updated_at: now,
            },
            quantity: 1,
        };
        self.lines.push(line.clone());

        debug!(product_id = %line.product.id, amount = %value, "Custom amount added");
        Ok(line)
    }

    /// Abandons the order: releases every line's stock, then resets.
    pub fn clear(&mut self, catalog: &mut Catalog, now: DateTime<Utc>) -> CoreResult<()> {
        catalog.release_lines(&self.lines, now)?;
        debug!(lines = self.lines.len(), "Order cleared");
        self.reset();
        Ok(())
    }

    /// Resets after a completed sale. The sold stock stays sold.
    pub fn reset_after_sale(&mut self) {
        self.reset();
    }

    /// Tax and gratuity choices carry over to the next order; the rest
    /// goes back to defaults.
    fn reset(&mut self) {
        self.lines.clear();
        self.settings.discount = Discount::default();
        self.settings.extra_charges = Money::zero();
        self.settings.employee_order = false;
        self.stage = CheckoutStage::Building;
        self.payment_method = PaymentMethod::default();
        self.receipt_method = ReceiptMethod::default();
        self.contact_info = None;
        self.signature = None;
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    pub fn set_discount(&mut self, kind: DiscountType, value: Decimal) -> CoreResult<()> {
        match kind {
            DiscountType::Percentage => validate_percentage("discount", value)?,
            DiscountType::FixedAmount => {
                validate_amount("discount", Money::from_decimal(value))?
            }
        }
        self.settings.discount = Discount { kind, value };
        Ok(())
    }

    pub fn set_tax_enabled(&mut self, enabled: bool) {
        self.settings.tax_enabled = enabled;
    }

    pub fn set_tax_rate(&mut self, rate: Rate) -> CoreResult<()> {
        validate_rate("tax rate", rate)?;
        self.settings.tax_rate = rate;
        Ok(())
    }

    pub fn set_gratuity_enabled(&mut self, enabled: bool) {
        self.settings.gratuity_enabled = enabled;
    }

    pub fn set_gratuity_rate(&mut self, rate: Rate) -> CoreResult<()> {
        validate_rate("gratuity rate", rate)?;
        self.settings.gratuity_rate = rate;
        Ok(())
    }

    pub fn set_extra_charges(&mut self, amount: Money) -> CoreResult<()> {
        validate_amount("extra charges", amount)?;
        self.settings.extra_charges = amount;
        Ok(())
    }

    pub fn set_employee_order(&mut self, employee_order: bool) {
        self.settings.employee_order = employee_order;
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Moves a non-empty order to tendering.
    pub fn begin_checkout(&mut self) -> CoreResult<()> {
        if self.is_empty() {
            return Err(CoreError::EmptyOrder);
        }
        self.stage = CheckoutStage::Tendering;
        Ok(())
    }

    /// Records how the customer pays and wants their receipt.
    ///
    /// Email and phone delivery need contact info. Blank strings count as
    /// absent.
    pub fn set_tender(
        &mut self,
        payment_method: PaymentMethod,
        signature: Option<String>,
        receipt_method: ReceiptMethod,
        contact_info: Option<String>,
    ) -> CoreResult<()> {
        let contact_info = non_blank(contact_info);
        if receipt_method.needs_contact() {
            validate_contact_info(contact_info.as_deref().unwrap_or_default())?;
        }

        self.payment_method = payment_method;
        self.signature = non_blank(signature);
        self.receipt_method = receipt_method;
        self.contact_info = if receipt_method.needs_contact() {
            contact_info
        } else {
            None
        };
        Ok(())
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn receipt_method(&self) -> ReceiptMethod {
        self.receipt_method
    }

    pub fn contact_info(&self) -> Option<&str> {
        self.contact_info.as_deref()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// The configuration snapshot this order would be priced with now.
    pub fn pricing_config(&self, client: &ClientSettings) -> PricingConfig {
        PricingConfig {
            discount: self.settings.discount,
            tax_enabled: self.settings.tax_enabled,
            tax_rate: self.settings.tax_rate,
            gratuity_enabled: self.settings.gratuity_enabled,
            gratuity_rate: self.settings.gratuity_rate,
            extra_charges: self.settings.extra_charges,
            employee_order: self.settings.employee_order,
            client: client.clone(),
        }
    }

    /// Recomputed from scratch on every call.
    pub fn breakdown(&self, client: &ClientSettings) -> CoreResult<PricingBreakdown> {
        calculate(&self.lines, &self.pricing_config(client))
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::new(OrderSettings::default())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
