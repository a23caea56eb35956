//! # Catalog & Inventory Reservation
//!
//! Product definitions and live stock levels.
//!
//! ## Reservation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  reserve("Burger Meal", 2)                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  expand: Burger Meal ×2, Burger ×2, Fries ×2, Soda ×2                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check EVERY entry against stock ── any short? ──► InsufficientStock    │
//! │       │                                            (nothing changed)    │
//! │       ▼                                                                 │
//! │  decrement every entry                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `release` runs the same expansion with the opposite sign. Remove-from-order,
//! clear, void and refund all go through it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use tally_core::validation::{validate_price, validate_product_name, validate_quantity, validate_stock};
use tally_core::{BundleComponent, Category, CoreError, CoreResult, Money, OrderLine, Product};

/// Input for a new non-bundle product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub category: Category,
    pub stock: i64,
}

/// Stock movements for one logical operation, one entry per product.
type StockPlan = Vec<(String, i64)>;

/// The product catalog. Products are never deleted, only stock-adjusted.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    /// All products in the order they were added.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, product_id: &str) -> CoreResult<&Product> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))
    }

    fn get_mut(&mut self, product_id: &str) -> CoreResult<&mut Product> {
        self.products
            .iter_mut()
            .find(|p| p.id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))
    }

    /// Registers a non-bundle product.
    pub fn add_product(&mut self, new: NewProduct, now: DateTime<Utc>) -> CoreResult<Product> {
        validate_product_name(&new.name)?;
        validate_price(new.price)?;
        validate_stock(new.stock)?;

        if new.category == Category::Bundle {
            return Err(CoreError::invalid_bundle(
                "bundles must be created from their components",
            ));
        }

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            price: new.price,
            category: new.category,
            stock: new.stock,
            bundle_items: Vec::new(),
            custom: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, stock = product.stock, "Adding product");
        self.products.push(product.clone());
        Ok(product)
    }

    /// Registers a bundle of existing non-bundle products.
    ///
    /// Initial stock is how many complete bundles the components can make:
    /// `min(floor(component stock / component quantity))`.
    pub fn add_bundle(
        &mut self,
        name: &str,
        price: Money,
        items: Vec<BundleComponent>,
        now: DateTime<Utc>,
    ) -> CoreResult<Product> {
        validate_product_name(name)?;
        validate_price(price)?;

        if items.is_empty() {
            return Err(CoreError::invalid_bundle("a bundle needs at least one component"));
        }

        let mut stock = i64::MAX;
        for item in &items {
            if validate_quantity(item.quantity).is_err() {
                return Err(CoreError::invalid_bundle(format!(
                    "component {} has quantity {}",
                    item.product_id, item.quantity
                )));
            }
            let component = self.get(&item.product_id)?;
            if component.is_bundle() {
                return Err(CoreError::invalid_bundle(format!(
                    "{} is itself a bundle",
                    component.name
                )));
            }
            stock = stock.min(component.stock / item.quantity);
        }

        let bundle = Product {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            price,
            category: Category::Bundle,
            stock,
            bundle_items: items,
            custom: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %bundle.id, name = %bundle.name, stock, "Adding bundle");
        self.products.push(bundle.clone());
        Ok(bundle)
    }

    /// Takes `quantity` units of a product, and of each bundle component
    /// scaled by `quantity`. All or nothing.
    pub fn reserve(&mut self, product_id: &str, quantity: i64, now: DateTime<Utc>) -> CoreResult<()> {
        validate_quantity(quantity)?;
        let mut plan = StockPlan::new();
        expand(&mut plan, self.get(product_id)?, quantity);

        self.check_available(&plan)?;
        self.apply(&plan, -1, now);

        debug!(product_id, quantity, entries = plan.len(), "Reserved stock");
        Ok(())
    }

    /// Exact inverse of [`Catalog::reserve`] using the live product.
    pub fn release(&mut self, product_id: &str, quantity: i64, now: DateTime<Utc>) -> CoreResult<()> {
        validate_quantity(quantity)?;
        let product = self.get(product_id)?.clone();
        self.release_lines(
            &[OrderLine {
                product,
                quantity,
            }],
            now,
        )
    }

    /// Returns the stock held by order or receipt lines, using each line's
    /// frozen bundle composition. Custom lines hold no stock and are skipped.
    pub fn release_lines(&mut self, lines: &[OrderLine], now: DateTime<Utc>) -> CoreResult<()> {
        let mut plan = StockPlan::new();
        for line in lines.iter().filter(|l| !l.product.custom) {
            expand(&mut plan, &line.product, line.quantity);
        }

        for (id, _) in &plan {
            self.get(id)?;
        }
        self.apply(&plan, 1, now);

        debug!(lines = lines.len(), entries = plan.len(), "Released stock");
        Ok(())
    }

    /// Supply in (`delta > 0`) or out (`delta < 0`) for one product.
    ///
    /// Bundles are adjusted on their own counter only.
    pub fn adjust_stock(
        &mut self,
        product_id: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> CoreResult<Product> {
        if delta == 0 {
            return Err(CoreError::invalid_amount("stock adjustment must not be zero"));
        }
        validate_quantity(delta.abs())?;

        let product = self.get_mut(product_id)?;
        if product.stock + delta < 0 {
            return Err(CoreError::InsufficientStock {
                product: product.name.clone(),
                available: product.stock,
                requested: -delta,
            });
        }

        product.stock += delta;
        product.updated_at = now;
        Ok(product.clone())
    }

    /// Puts a previously captured product back (snapshot restore).
    pub(crate) fn insert(&mut self, product: Product) {
        self.products.push(product);
    }

    fn check_available(&self, plan: &StockPlan) -> CoreResult<()> {
        for (id, requested) in plan {
            let product = self.get(id)?;
            if !product.can_sell(*requested) {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: *requested,
                });
            }
        }
        Ok(())
    }

    /// Callers check the plan first; every id is known to exist.
    fn apply(&mut self, plan: &StockPlan, sign: i64, now: DateTime<Utc>) {
        for (id, quantity) in plan {
            if let Some(product) = self.products.iter_mut().find(|p| &p.id == id) {
                product.stock += sign * quantity;
                product.updated_at = now;
            }
        }
    }
}

/// Adds a product and (for bundles) its scaled components to the plan,
/// merging repeated ids so availability is checked against the combined need.
fn expand(plan: &mut StockPlan, product: &Product, quantity: i64) {
    add_to_plan(plan, &product.id, quantity);
    if product.is_bundle() {
        for item in &product.bundle_items {
            add_to_plan(plan, &item.product_id, item.quantity * quantity);
        }
    }
}

fn add_to_plan(plan: &mut StockPlan, product_id: &str, quantity: i64) {
    match plan.iter_mut().find(|(id, _)| id == product_id) {
        Some((_, existing)) => *existing += quantity,
        None => plan.push((product_id.to_string(), quantity)),
    }
}
