//! # Transaction Ledger
//!
//! Receipts in the order they were created, voided ones included, refunded
//! ones gone.
//!
//! ## Receipt Lifecycle
//! ```text
//!   complete ──► Active ──void──► Voided ──refund──► (removed)
//!                  │
//!                  └──────refund─────────────────► (removed)
//!
//!   duplicate(Active | Voided) ──► new Active record, no stock/cash movement
//! ```
//!
//! Void and refund hold the ledger, catalog and drawer locks together, check
//! the drawer can pay out first, and only then release stock, debit cash and
//! annotate (or remove). A failure anywhere leaves all three untouched.

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use tally_core::{
    CoreError, CoreResult, OrderLine, PaymentMethod, PricingBreakdown, Receipt, ReceiptMethod,
    VoidAnnotation,
};

use super::{Catalog, CashDrawer, CatalogState, DrawerState, LedgerState};

/// Append-mostly receipt store.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    receipts: Vec<Receipt>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    pub fn get(&self, receipt_id: &str) -> CoreResult<&Receipt> {
        self.receipts
            .iter()
            .find(|r| r.id == receipt_id)
            .ok_or_else(|| CoreError::ReceiptNotFound(receipt_id.to_string()))
    }

    fn position(&self, receipt_id: &str) -> CoreResult<usize> {
        self.receipts
            .iter()
            .position(|r| r.id == receipt_id)
            .ok_or_else(|| CoreError::ReceiptNotFound(receipt_id.to_string()))
    }

    pub(crate) fn insert(&mut self, receipt: Receipt) {
        self.receipts.push(receipt);
    }
}

/// A priced, tendered order ready to become a receipt.
#[derive(Debug, Clone)]
pub struct CompletedSale {
    pub lines: Vec<OrderLine>,
    pub breakdown: PricingBreakdown,
    pub employee_id: String,
    pub payment_method: PaymentMethod,
    pub signature: Option<String>,
    pub receipt_method: ReceiptMethod,
    pub contact_info: Option<String>,
}

impl LedgerState {
    /// Appends a receipt for `sale` and credits the drawer for cash sales.
    ///
    /// The stock was already reserved while the order was built.
    pub fn complete(
        &self,
        sale: CompletedSale,
        drawer: &DrawerState,
        now: DateTime<Utc>,
    ) -> CoreResult<Receipt> {
        if sale.lines.is_empty() {
            return Err(CoreError::EmptyOrder);
        }

        let mut ledger = self.lock();
        let mut drawer = drawer.lock();

        let breakdown = sale.breakdown;
        let receipt = Receipt {
            id: Uuid::new_v4().to_string(),
            lines: sale.lines,
            subtotal: breakdown.subtotal,
            discount_amount: breakdown.discount_amount,
            tax: breakdown.tax,
            gratuity: breakdown.gratuity,
            extra_charges: breakdown.extra_charges,
            total: breakdown.total,
            created_at: now,
            employee_id: sale.employee_id,
            payment_method: sale.payment_method,
            signature: sale.signature,
            receipt_method: sale.receipt_method,
            contact_info: sale.contact_info,
            void_info: None,
        };

        if receipt.is_cash() {
            drawer.credit(receipt.total)?;
        }
        ledger.receipts.push(receipt.clone());

        info!(
            receipt_id = %receipt.id,
            employee_id = %receipt.employee_id,
            total = %receipt.total,
            payment = ?receipt.payment_method,
            "Sale completed"
        );
        Ok(receipt)
    }

    /// Reverses a receipt's stock and cash effects and marks it voided.
    pub fn void(
        &self,
        receipt_id: &str,
        employee_id: &str,
        reason: &str,
        catalog: &CatalogState,
        drawer: &DrawerState,
        now: DateTime<Utc>,
    ) -> CoreResult<Receipt> {
        let mut ledger = self.lock();
        let mut catalog = catalog.lock();
        let mut drawer = drawer.lock();

        let index = ledger.position(receipt_id)?;
        if ledger.receipts[index].is_voided() {
            return Err(CoreError::AlreadyVoided(receipt_id.to_string()));
        }

        reverse(&ledger.receipts[index], &mut catalog, &mut drawer, now)?;

        let receipt = &mut ledger.receipts[index];
        receipt.void_info = Some(VoidAnnotation {
            voided_by: employee_id.to_string(),
            reason: reason.trim().to_string(),
            voided_at: now,
        });

        info!(receipt_id, employee_id, total = %receipt.total, "Receipt voided");
        Ok(receipt.clone())
    }

    /// Removes a receipt from the ledger.
    ///
    /// An active receipt is reversed first. A voided one was already
    /// reversed by its void and is only removed.
    pub fn refund(
        &self,
        receipt_id: &str,
        catalog: &CatalogState,
        drawer: &DrawerState,
        now: DateTime<Utc>,
    ) -> CoreResult<Receipt> {
        let mut ledger = self.lock();
        let mut catalog = catalog.lock();
        let mut drawer = drawer.lock();

        let index = ledger.position(receipt_id)?;
        let reversed = !ledger.receipts[index].is_voided();
        if reversed {
            reverse(&ledger.receipts[index], &mut catalog, &mut drawer, now)?;
        }

        let receipt = ledger.receipts.remove(index);
        info!(receipt_id, total = %receipt.total, reversed, "Receipt refunded");
        Ok(receipt)
    }

    /// Records a copy of a receipt under a new id and timestamp.
    ///
    /// The copy is a record only; stock and cash are not touched.
    pub fn duplicate(&self, receipt_id: &str, now: DateTime<Utc>) -> CoreResult<Receipt> {
        let mut ledger = self.lock();
        let mut copy = ledger.get(receipt_id)?.clone();

        copy.id = Uuid::new_v4().to_string();
        copy.created_at = now;
        copy.void_info = None;

        ledger.receipts.push(copy.clone());
        debug!(source = receipt_id, receipt_id = %copy.id, "Receipt duplicated");
        Ok(copy)
    }
}

/// Undoes a receipt's stock and cash effects as one unit.
fn reverse(
    receipt: &Receipt,
    catalog: &mut Catalog,
    drawer: &mut CashDrawer,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if receipt.is_cash() {
        drawer.ensure_can_debit(receipt.total)?;
    }
    catalog.release_lines(&receipt.lines, now)?;
    if receipt.is_cash() {
        drawer.debit(receipt.total)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::NewProduct;
    use tally_core::pricing::{calculate, PricingConfig};
    use tally_core::{Category, Money};

    struct Fixture {
        ledger: LedgerState,
        catalog: CatalogState,
        drawer: DrawerState,
        apple_id: String,
    }

    fn fixture() -> Fixture {
        let catalog = CatalogState::default();
        let apple = catalog
            .write(|c| {
                c.add_product(
                    NewProduct {
                        name: "Apple".to_string(),
                        price: Money::from_cents(50),
                        category: Category::Grocery,
                        stock: 10,
                    },
                    Utc::now(),
                )
            })
            .unwrap();
        Fixture {
            ledger: LedgerState::default(),
            catalog,
            drawer: DrawerState::new(CashDrawer::new(Money::from_cents(100_000))),
            apple_id: apple.id,
        }
    }

    /// Reserves one apple and completes the sale.
    fn sell_apple(f: &Fixture, payment_method: PaymentMethod) -> Receipt {
        let now = Utc::now();
        f.catalog.write(|c| c.reserve(&f.apple_id, 1, now)).unwrap();
        let product = f.catalog.read(|c| c.get(&f.apple_id).cloned()).unwrap();
        let lines = vec![OrderLine {
            product,
            quantity: 1,
        }];
        let breakdown = calculate(&lines, &PricingConfig::default()).unwrap();
        f.ledger
            .complete(
                CompletedSale {
                    lines,
                    breakdown,
                    employee_id: "e1".to_string(),
                    payment_method,
                    signature: None,
                    receipt_method: ReceiptMethod::None,
                    contact_info: None,
                },
                &f.drawer,
                now,
            )
            .unwrap()
    }

    fn apple_stock(f: &Fixture) -> i64 {
        f.catalog.read(|c| c.get(&f.apple_id).map(|p| p.stock)).unwrap()
    }

    fn balance(f: &Fixture) -> Money {
        f.drawer.read(CashDrawer::balance)
    }

    #[test]
    fn test_cash_sale_credits_drawer() {
        let f = fixture();
        let receipt = sell_apple(&f, PaymentMethod::Cash);

        assert_eq!(receipt.total, Money::from_cents(55));
        assert!(receipt.balances());
        assert_eq!(balance(&f), Money::from_cents(100_055));
        assert_eq!(apple_stock(&f), 9);
    }

    #[test]
    fn test_credit_sale_leaves_drawer_alone() {
        let f = fixture();
        sell_apple(&f, PaymentMethod::Credit);
        assert_eq!(balance(&f), Money::from_cents(100_000));
    }

    #[test]
    fn test_void_once_restores_then_guards() {
        let f = fixture();
        let receipt = sell_apple(&f, PaymentMethod::Cash);

        let voided = f
            .ledger
            .void(&receipt.id, "e2", "wrong item", &f.catalog, &f.drawer, Utc::now())
            .unwrap();
        assert_eq!(voided.void_info.as_ref().map(|v| v.voided_by.as_str()), Some("e2"));
        assert_eq!(apple_stock(&f), 10);
        assert_eq!(balance(&f), Money::from_cents(100_000));

        let err = f
            .ledger
            .void(&receipt.id, "e2", "again", &f.catalog, &f.drawer, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::AlreadyVoided(_)));
        assert_eq!(apple_stock(&f), 10);
        assert_eq!(balance(&f), Money::from_cents(100_000));
    }

    #[test]
    fn test_void_unknown_receipt() {
        let f = fixture();
        let err = f
            .ledger
            .void("missing", "e1", "typo", &f.catalog, &f.drawer, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::ReceiptNotFound(_)));
    }

    #[test]
    fn test_void_rejected_when_drawer_short() {
        let f = fixture();
        let receipt = sell_apple(&f, PaymentMethod::Cash);
        f.drawer
            .write(|d| d.debit(Money::from_cents(100_050)))
            .unwrap();

        let err = f
            .ledger
            .void(&receipt.id, "e1", "no cash", &f.catalog, &f.drawer, Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientDrawerBalance { .. }));
        assert_eq!(apple_stock(&f), 9);
        assert!(!f.ledger.read(|l| l.receipts()[0].is_voided()));
    }

    #[test]
    fn test_refund_active_reverses_and_removes() {
        let f = fixture();
        let receipt = sell_apple(&f, PaymentMethod::Cash);

        f.ledger
            .refund(&receipt.id, &f.catalog, &f.drawer, Utc::now())
            .unwrap();
        assert!(f.ledger.read(|l| l.receipts().is_empty()));
        assert_eq!(apple_stock(&f), 10);
        assert_eq!(balance(&f), Money::from_cents(100_000));
    }

    #[test]
    fn test_refund_voided_only_removes() {
        let f = fixture();
        let receipt = sell_apple(&f, PaymentMethod::Cash);
        f.ledger
            .void(&receipt.id, "e1", "wrong", &f.catalog, &f.drawer, Utc::now())
            .unwrap();

        f.ledger
            .refund(&receipt.id, &f.catalog, &f.drawer, Utc::now())
            .unwrap();
        assert!(f.ledger.read(|l| l.receipts().is_empty()));
        assert_eq!(apple_stock(&f), 10);
        assert_eq!(balance(&f), Money::from_cents(100_000));
    }

    #[test]
    fn test_duplicate_has_no_side_effects() {
        let f = fixture();
        let receipt = sell_apple(&f, PaymentMethod::Cash);
        f.ledger
            .void(&receipt.id, "e1", "wrong", &f.catalog, &f.drawer, Utc::now())
            .unwrap();

        let copy = f.ledger.duplicate(&receipt.id, Utc::now()).unwrap();
        assert_ne!(copy.id, receipt.id);
        assert!(copy.void_info.is_none());
        assert_eq!(copy.total, receipt.total);
        assert_eq!(copy.employee_id, receipt.employee_id);
        assert_eq!(f.ledger.read(|l| l.receipts().len()), 2);
        assert_eq!(apple_stock(&f), 10);
        assert_eq!(balance(&f), Money::from_cents(100_000));
    }
}
