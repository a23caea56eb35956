//! # Snapshot
//!
//! The durable state of a store: catalog, ledger, drawer and roster, each as
//! an independent record set keyed by id.
//!
//! ```json
//! {
//!   "products":  { "<id>": { "name": "Apple", "stock": 9, ... } },
//!   "receipts":  { "<id>": { "total": "0.55", ... } },
//!   "employees": { "<id>": { "username": "johndoe", ... } },
//!   "rosterOrder": ["<id>", ...],
//!   "drawer":    { "balance": "1000.55", "startingFloat": "1000" },
//!   "clientSettings": { ... }
//! }
//! ```
//!
//! Open orders and sessions belong to a register and are not captured.
//! Restore puts products and receipts back in creation order and employees
//! back in roster order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use tally_core::validation::{validate_percentage, validate_price};
use tally_core::{ClientSettings, Employee, Money, Product, Receipt};

use crate::state::{
    CashDrawer, Catalog, CatalogState, DrawerState, Ledger, LedgerState, Roster, RosterState,
    SettingsState, SharedStores,
};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot is inconsistent: {0}")]
    Corrupt(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawerRecord {
    pub balance: Money,
    pub starting_float: Money,
}

/// Everything needed to reopen a store where it left off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSnapshot {
    pub products: BTreeMap<String, Product>,
    pub receipts: BTreeMap<String, Receipt>,
    pub employees: BTreeMap<String, Employee>,
    /// Employee ids in the order they were hired.
    #[serde(default)]
    pub roster_order: Vec<String>,
    pub drawer: DrawerRecord,
    pub client_settings: ClientSettings,
}

impl RegisterSnapshot {
    /// Copies the shared stores, taking locks in the global order.
    pub fn capture(stores: &SharedStores) -> Self {
        let ledger = stores.ledger.lock();
        let catalog = stores.catalog.lock();
        let drawer = stores.drawer.lock();
        let roster = stores.roster.lock();
        let settings = stores.settings.lock();

        RegisterSnapshot {
            products: keyed(catalog.products(), |p| &p.id),
            receipts: keyed(ledger.receipts(), |r| &r.id),
            employees: keyed(roster.employees(), |e| &e.id),
            roster_order: roster.employees().iter().map(|e| e.id.clone()).collect(),
            drawer: DrawerRecord {
                balance: drawer.balance(),
                starting_float: drawer.starting_float(),
            },
            client_settings: settings.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the records against the invariants the engine relies on and
    /// builds fresh stores from them.
    pub fn into_stores(self) -> Result<SharedStores, SnapshotError> {
        self.validate()?;

        let mut products: Vec<Product> = self.products.into_values().collect();
        products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        let mut catalog = Catalog::new();
        for product in products {
            catalog.insert(product);
        }

        let mut receipts: Vec<Receipt> = self.receipts.into_values().collect();
        receipts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        let mut ledger = Ledger::new();
        for receipt in receipts {
            ledger.insert(receipt);
        }

        let mut employees = self.employees;
        let mut roster = Roster::new();
        for id in &self.roster_order {
            if let Some(employee) = employees.remove(id) {
                roster.insert(employee);
            }
        }
        // ids missing from an older snapshot's order go last, by key
        for employee in employees.into_values() {
            roster.insert(employee);
        }

        info!(
            products = catalog.products().len(),
            receipts = ledger.receipts().len(),
            employees = roster.employees().len(),
            "Restored snapshot"
        );

        Ok(SharedStores {
            catalog: CatalogState::new(catalog),
            ledger: LedgerState::new(ledger),
            drawer: DrawerState::new(CashDrawer::with_balance(
                self.drawer.starting_float,
                self.drawer.balance,
            )),
            roster: RosterState::new(roster),
            settings: SettingsState::new(self.client_settings),
        })
    }

    fn validate(&self) -> Result<(), SnapshotError> {
        for (id, product) in &self.products {
            if id != &product.id {
                return Err(corrupt(format!("product keyed {} has id {}", id, product.id)));
            }
            if product.stock < 0 {
                return Err(corrupt(format!("product {} has negative stock", id)));
            }
            if let Err(e) = validate_price(product.price) {
                return Err(corrupt(format!("product {}: {}", id, e)));
            }
            for item in &product.bundle_items {
                match self.products.get(&item.product_id) {
                    Some(component) if !component.is_bundle() && item.quantity >= 1 => {}
                    _ => return Err(corrupt(format!("bundle {} has a bad component", id))),
                }
            }
        }

        for (id, receipt) in &self.receipts {
            if id != &receipt.id {
                return Err(corrupt(format!("receipt keyed {} has id {}", id, receipt.id)));
            }
            if !receipt.balances() {
                return Err(corrupt(format!("receipt {} does not balance", id)));
            }
        }

        let mut usernames = std::collections::BTreeSet::new();
        for (id, employee) in &self.employees {
            if id != &employee.id {
                return Err(corrupt(format!("employee keyed {} has id {}", id, employee.id)));
            }
            if !usernames.insert(employee.username.as_str()) {
                return Err(corrupt(format!("username {} appears twice", employee.username)));
            }
        }

        let mut ordered = std::collections::BTreeSet::new();
        for id in &self.roster_order {
            if !self.employees.contains_key(id) || !ordered.insert(id.as_str()) {
                return Err(corrupt(format!("roster order lists {} wrongly", id)));
            }
        }

        if self.drawer.balance.is_negative() {
            return Err(corrupt("drawer balance is negative".to_string()));
        }
        if let Err(e) = validate_percentage(
            "to-go discount",
            self.client_settings.discounted_to_go_percentage,
        ) {
            return Err(corrupt(format!("client settings: {}", e)));
        }
        Ok(())
    }
}

fn keyed<T: Clone>(items: &[T], id: impl Fn(&T) -> &String) -> BTreeMap<String, T> {
    items
        .iter()
        .map(|item| (id(item).clone(), item.clone()))
        .collect()
}

fn corrupt(reason: String) -> SnapshotError {
    SnapshotError::Corrupt(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::state::NewProduct;
    use chrono::{Duration, Utc};
    use tally_core::{Category, Role};

    fn stores() -> SharedStores {
        let stores = SharedStores::new(&EngineConfig::default());
        let start = Utc::now();
        stores.catalog.write(|c| {
            for (i, name) in ["Milk", "Apple", "Bread"].iter().enumerate() {
                c.add_product(
                    NewProduct {
                        name: name.to_string(),
                        price: Money::from_cents(100),
                        category: Category::Grocery,
                        stock: 5,
                    },
                    start + Duration::seconds(i as i64),
                )
                .unwrap();
            }
        });
        stores.roster.write(|r| {
            // ids sort the opposite way to hiring order
            for (id, username) in [("e3", "johndoe"), ("e2", "janesmith"), ("e1", "bobwilliams")] {
                r.add(Employee::new(id.into(), username.into(), "hash".into(), Role::Cashier))
                    .unwrap();
            }
        });
        stores
    }

    fn usernames(stores: &SharedStores) -> Vec<String> {
        stores
            .roster
            .read(|r| r.employees().iter().map(|e| e.username.clone()).collect())
    }

    #[test]
    fn test_json_round_trip_keeps_catalog_order() {
        let original = stores();
        let snapshot = RegisterSnapshot::capture(&original);
        let json = snapshot.to_json().unwrap();

        let restored = RegisterSnapshot::from_json(&json)
            .unwrap()
            .into_stores()
            .unwrap();

        let names: Vec<String> = restored
            .catalog
            .read(|c| c.products().iter().map(|p| p.name.clone()).collect());
        assert_eq!(names, ["Milk", "Apple", "Bread"]);
        assert_eq!(RegisterSnapshot::capture(&restored), snapshot);
        assert_eq!(
            restored.drawer.read(CashDrawer::balance),
            Money::from_cents(100_000)
        );
    }

    #[test]
    fn test_mismatched_key_rejected() {
        let mut snapshot = RegisterSnapshot::capture(&stores());
        let (_, product) = snapshot.products.pop_first().unwrap();
        snapshot.products.insert("wrong".into(), product);

        assert!(matches!(
            snapshot.into_stores(),
            Err(SnapshotError::Corrupt(_))
        ));
    }

    #[test]
    fn test_roster_order_survives_restore() {
        let original = stores();
        let json = RegisterSnapshot::capture(&original).to_json().unwrap();

        let restored = RegisterSnapshot::from_json(&json)
            .unwrap()
            .into_stores()
            .unwrap();
        assert_eq!(usernames(&restored), ["johndoe", "janesmith", "bobwilliams"]);
    }

    #[test]
    fn test_missing_roster_order_falls_back_to_ids() {
        let mut snapshot = RegisterSnapshot::capture(&stores());
        snapshot.roster_order.clear();

        let restored = snapshot.into_stores().unwrap();
        assert_eq!(usernames(&restored), ["bobwilliams", "janesmith", "johndoe"]);
    }

    #[test]
    fn test_unknown_id_in_roster_order_rejected() {
        let mut snapshot = RegisterSnapshot::capture(&stores());
        snapshot.roster_order.push("ghost".into());

        assert!(matches!(snapshot.into_stores(), Err(SnapshotError::Corrupt(_))));
    }

    #[test]
    fn test_out_of_range_to_go_percentage_rejected() {
        let mut snapshot = RegisterSnapshot::capture(&stores());
        snapshot.client_settings.discounted_to_go_percentage = rust_decimal::Decimal::from(250);

        assert!(matches!(snapshot.into_stores(), Err(SnapshotError::Corrupt(_))));
    }

    #[test]
    fn test_price_over_ceiling_rejected() {
        let mut snapshot = RegisterSnapshot::capture(&stores());
        let product = snapshot.products.values_mut().next().unwrap();
        product.price = Money::from_decimal(rust_decimal::Decimal::MAX);

        assert!(matches!(snapshot.into_stores(), Err(SnapshotError::Corrupt(_))));
    }

    #[test]
    fn test_garbage_json_rejected() {
        assert!(matches!(
            RegisterSnapshot::from_json("{ not json"),
            Err(SnapshotError::Json(_))
        ));
    }
}
