//! # Register
//!
//! The command/query surface a presentation layer talks to. One `Register`
//! is one till: its own order and session over stores it may share with
//! other registers.
//!
//! ## Command Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  UI action               Register method          State change          │
//! │  ─────────               ───────────────          ────────────          │
//! │                                                                         │
//! │  Tap product ──────────► add_item() ────────────► catalog.reserve      │
//! │                                                                         │
//! │  Tap remove ───────────► remove_item() ─────────► catalog.release      │
//! │                                                                         │
//! │  Pay ──────────────────► checkout() ────────────► ledger.complete      │
//! │                                                    drawer.credit (cash) │
//! │                                                                         │
//! │  Void receipt ─────────► void_receipt() ────────► release + debit      │
//! │                                                    + annotate           │
//! │                                                                         │
//! │  EVERY handler authorizes first; nothing is mutated when it fails.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use tally_core::validation::{validate_password, validate_percentage, validate_username};
use tally_core::{
    BundleComponent, ClientSettings, CoreError, CoreResult, DiscountType, Employee,
    EmployeeProfile, EmployeeStatus, Money, OrderLine, PaymentMethod, Permission,
    PricingBreakdown, Product, Rate, Receipt, ReceiptMethod, Role, ValidationError,
};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::credentials::{Argon2Credentials, CredentialVerifier};
use crate::order::{Order, OrderView};
use crate::report::{self, InventoryReport, SalesSummary};
use crate::session::{close_shift, Session};
use crate::snapshot::{RegisterSnapshot, SnapshotError};
use crate::state::{CompletedSale, NewProduct, SharedStores};

// =============================================================================
// Request Types
// =============================================================================

/// How the customer is paying and where the receipt goes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub signature: Option<String>,
    pub receipt_method: ReceiptMethod,
    pub contact_info: Option<String>,
}

impl CheckoutRequest {
    pub fn cash() -> Self {
        CheckoutRequest {
            payment_method: PaymentMethod::Cash,
            ..CheckoutRequest::default()
        }
    }

    pub fn credit() -> Self {
        CheckoutRequest {
            payment_method: PaymentMethod::Credit,
            ..CheckoutRequest::default()
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_receipt(mut self, method: ReceiptMethod, contact_info: impl Into<String>) -> Self {
        self.receipt_method = method;
        self.contact_info = Some(contact_info.into());
        self
    }
}

/// Changes to an employee record. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeUpdate {
    pub username: Option<String>,
    pub role: Option<Role>,
    /// New password; stored hashed.
    pub password: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    /// Owner only; stored hashed.
    pub social_security_number: Option<String>,
}

// =============================================================================
// Register
// =============================================================================

pub struct Register {
    stores: SharedStores,
    order: Order,
    session: Session,
    credentials: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
}

impl std::fmt::Debug for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Register")
            .field("order", &self.order)
            .field("session", &self.session)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Register {
    /// A standalone register with fresh stores, Argon2 credentials and the
    /// system clock.
    pub fn new(config: EngineConfig) -> Self {
        let stores = SharedStores::new(&config);
        Register::open(
            stores,
            config,
            Arc::new(Argon2Credentials::new()),
            Arc::new(SystemClock),
        )
    }

    /// A register over existing (possibly shared) stores.
    pub fn open(
        stores: SharedStores,
        config: EngineConfig,
        credentials: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Register {
            order: Order::new(config.order_defaults()),
            session: Session::new(),
            stores,
            credentials,
            clock,
            config,
        }
    }

    /// Reopens a store from a snapshot.
    pub fn restore(
        snapshot: RegisterSnapshot,
        config: EngineConfig,
        credentials: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SnapshotError> {
        let stores = snapshot.into_stores()?;
        Ok(Register::open(stores, config, credentials, clock))
    }

    /// Captures the durable state of the stores this register uses.
    pub fn snapshot(&self) -> RegisterSnapshot {
        RegisterSnapshot::capture(&self.stores)
    }

    /// The stores, for opening another register over them.
    pub fn stores(&self) -> &SharedStores {
        &self.stores
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates the first employee, an owner, on an empty roster.
    ///
    /// Once anyone exists this is `Forbidden`; employees are then added
    /// through [`Register::add_employee`].
    pub fn bootstrap_owner(&self, username: &str, password: &str) -> CoreResult<EmployeeProfile> {
        validate_username(username)?;
        validate_password(password)?;
        let hash = self.credentials.hash(password)?;

        self.stores.roster.write(|roster| -> CoreResult<EmployeeProfile> {
            if !roster.is_empty() {
                warn!("Rejected: owner bootstrap on a staffed roster");
                return Err(CoreError::forbidden(
                    "bootstrap an owner once the roster has staff",
                    Role::Owner,
                ));
            }
            let employee = Employee::new(
                Uuid::new_v4().to_string(),
                username.trim().to_string(),
                hash,
                Role::Owner,
            );
            let profile = employee.profile();
            roster.add(employee)?;
            info!(employee_id = %profile.id, "Owner account created");
            Ok(profile)
        })
    }

    fn authorize(&self, permission: Permission) -> CoreResult<Employee> {
        self.stores
            .roster
            .read(|roster| self.session.authorize(roster, permission))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Every product, bundles included. Needs no login.
    pub fn get_catalog(&self) -> Vec<Product> {
        self.stores.catalog.read(|c| c.products().to_vec())
    }

    pub fn get_order(&self) -> CoreResult<OrderView> {
        self.authorize(Permission::TakeOrders)?;
        Ok(self.order.view())
    }

    pub fn get_pricing_breakdown(&self) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.breakdown()
    }

    pub fn get_receipts(&self) -> CoreResult<Vec<Receipt>> {
        self.authorize(Permission::TakeOrders)?;
        Ok(self.stores.ledger.read(|l| l.receipts().to_vec()))
    }

    pub fn get_cash_balance(&self) -> CoreResult<Money> {
        self.authorize(Permission::TakeOrders)?;
        Ok(self.stores.drawer.read(|d| d.balance()))
    }

    /// The logged-in employee, if any.
    pub fn get_current_employee(&self) -> Option<EmployeeProfile> {
        self.stores.roster.read(|roster| {
            self.session
                .current(roster)
                .ok()
                .map(Employee::profile)
        })
    }

    pub fn get_employees(&self) -> CoreResult<Vec<EmployeeProfile>> {
        self.authorize(Permission::ManageEmployees)?;
        Ok(self
            .stores
            .roster
            .read(|r| r.employees().iter().map(Employee::profile).collect()))
    }

    pub fn get_client_settings(&self) -> ClientSettings {
        self.stores.settings.read(|s| s.clone())
    }

    pub fn get_sales_summary(&self) -> CoreResult<SalesSummary> {
        self.authorize(Permission::ViewSalesSummary)?;
        let receipts = self.stores.ledger.read(|l| l.receipts().to_vec());
        let cash = self.stores.drawer.read(|d| d.balance());
        let employees = self.stores.roster.read(|r| r.employees().to_vec());
        Ok(report::summarize(&receipts, &employees, cash))
    }

    pub fn get_inventory_report(&self) -> CoreResult<InventoryReport> {
        self.authorize(Permission::ManageInventory)?;
        Ok(self.stores.catalog.read(|c| report::inventory(c.products())))
    }

    fn breakdown(&self) -> CoreResult<PricingBreakdown> {
        let client = self.get_client_settings();
        self.order.breakdown(&client)
    }

    // =========================================================================
    // Order Commands
    // =========================================================================

    pub fn add_item(&mut self, product_id: &str) -> CoreResult<OrderLine> {
        self.authorize(Permission::TakeOrders)?;
        let now = self.clock.now();
        let mut catalog = self.stores.catalog.lock();
        self.order.add_item(&mut catalog, product_id, now)
    }

    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<OrderLine> {
        self.authorize(Permission::TakeOrders)?;
        let now = self.clock.now();
        let mut catalog = self.stores.catalog.lock();
        self.order.remove_item(&mut catalog, product_id, now)
    }

    pub fn add_custom_amount(&mut self, value: Money) -> CoreResult<OrderLine> {
        self.authorize(Permission::TakeOrders)?;
        let now = self.clock.now();
        self.order.add_custom_amount(value, now)
    }

    /// Abandons the current order and gives its stock back.
    pub fn clear_order(&mut self) -> CoreResult<()> {
        self.authorize(Permission::TakeOrders)?;
        let now = self.clock.now();
        let mut catalog = self.stores.catalog.lock();
        self.order.clear(&mut catalog, now)
    }

    pub fn set_discount(&mut self, kind: DiscountType, value: Decimal) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.order.set_discount(kind, value)?;
        self.breakdown()
    }

    pub fn set_tax_enabled(&mut self, enabled: bool) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.order.set_tax_enabled(enabled);
        self.breakdown()
    }

    pub fn set_tax_rate(&mut self, rate: Rate) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.order.set_tax_rate(rate)?;
        self.breakdown()
    }

    pub fn set_gratuity_enabled(&mut self, enabled: bool) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.order.set_gratuity_enabled(enabled);
        self.breakdown()
    }

    pub fn set_gratuity_rate(&mut self, rate: Rate) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.order.set_gratuity_rate(rate)?;
        self.breakdown()
    }

    pub fn set_extra_charges(&mut self, amount: Money) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.order.set_extra_charges(amount)?;
        self.breakdown()
    }

    pub fn set_employee_order(&mut self, employee_order: bool) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.order.set_employee_order(employee_order);
        self.breakdown()
    }

    /// Moves to tendering and returns the amount due.
    pub fn begin_checkout(&mut self) -> CoreResult<PricingBreakdown> {
        self.authorize(Permission::TakeOrders)?;
        self.order.begin_checkout()?;
        self.breakdown()
    }

    /// Completes the sale: one new receipt, drawer credited for cash, order
    /// reset. The reserved stock stays sold.
    pub fn checkout(&mut self, request: CheckoutRequest) -> CoreResult<Receipt> {
        let employee = self.authorize(Permission::TakeOrders)?;
        if self.order.is_empty() {
            return Err(CoreError::EmptyOrder);
        }
        self.order.set_tender(
            request.payment_method,
            request.signature,
            request.receipt_method,
            request.contact_info,
        )?;

        let sale = CompletedSale {
            lines: self.order.lines().to_vec(),
            breakdown: self.breakdown()?,
            employee_id: employee.id,
            payment_method: self.order.payment_method(),
            signature: self.order.signature().map(str::to_string),
            receipt_method: self.order.receipt_method(),
            contact_info: self.order.contact_info().map(str::to_string),
        };
        let receipt = self
            .stores
            .ledger
            .complete(sale, &self.stores.drawer, self.clock.now())?;

        self.order.reset_after_sale();
        Ok(receipt)
    }

    // =========================================================================
    // Ledger Commands
    // =========================================================================

    /// Records a copy of a receipt. Stock and cash are untouched.
    pub fn duplicate_receipt(&self, receipt_id: &str) -> CoreResult<Receipt> {
        self.authorize(Permission::TakeOrders)?;
        self.stores.ledger.duplicate(receipt_id, self.clock.now())
    }

    /// Voids a receipt, giving its stock and cash back.
    ///
    /// A reason is required; blank reasons fail validation before anything
    /// is touched.
    pub fn void_receipt(&self, receipt_id: &str, reason: &str) -> CoreResult<Receipt> {
        let employee = self.authorize(Permission::TakeOrders)?;
        if reason.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "reason".to_string(),
            }
            .into());
        }
        self.stores.ledger.void(
            receipt_id,
            &employee.id,
            reason,
            &self.stores.catalog,
            &self.stores.drawer,
            self.clock.now(),
        )
    }

    pub fn refund_receipt(&self, receipt_id: &str) -> CoreResult<Receipt> {
        let employee = self.authorize(Permission::RefundReceipts)?;
        debug!(receipt_id, employee_id = %employee.id, "Refund requested");
        self.stores.ledger.refund(
            receipt_id,
            &self.stores.catalog,
            &self.stores.drawer,
            self.clock.now(),
        )
    }

    /// Takes cash out of the drawer; returns the new balance.
    pub fn remove_cash(&self, amount: Money) -> CoreResult<Money> {
        let employee = self.authorize(Permission::TakeOrders)?;
        self.stores
            .drawer
            .write(|drawer| drawer.manual_removal(amount, employee.role))
    }

    // =========================================================================
    // Session Commands
    // =========================================================================

    /// Logs an employee in. A different employee already logged in is
    /// logged out first, abandoning their open order.
    pub fn login(&mut self, username: &str, password: &str) -> CoreResult<EmployeeProfile> {
        let mut next = Session::new();
        let employee = self.stores.roster.read(|roster| {
            next.login(roster, self.credentials.as_ref(), username, password)
        })?;

        if self.session.is_authenticated() && self.session.employee_id() != Some(employee.id.as_str()) {
            self.logout()?;
        }
        self.session = next;
        Ok(employee.profile())
    }

    /// Abandons any open order, clocks out and ends the session.
    pub fn logout(&mut self) -> CoreResult<Option<EmployeeProfile>> {
        let now = self.clock.now();
        if !self.order.is_empty() {
            let mut catalog = self.stores.catalog.lock();
            self.order.clear(&mut catalog, now)?;
        }
        let employee = self
            .stores
            .roster
            .write(|roster| self.session.logout(roster, now));
        Ok(employee.as_ref().map(Employee::profile))
    }

    pub fn clock_in(&self) -> CoreResult<EmployeeProfile> {
        let now = self.clock.now();
        self.stores
            .roster
            .write(|roster| self.session.clock_in(roster, now))
            .map(|e| e.profile())
    }

    pub fn clock_out(&self) -> CoreResult<EmployeeProfile> {
        let now = self.clock.now();
        self.stores
            .roster
            .write(|roster| self.session.clock_out(roster, now))
            .map(|e| e.profile())
    }

    // =========================================================================
    // Inventory Commands
    // =========================================================================

    pub fn add_product(&self, new: NewProduct) -> CoreResult<Product> {
        let employee = self.authorize(Permission::ManageInventory)?;
        let now = self.clock.now();
        let product = self.stores.catalog.write(|c| c.add_product(new, now))?;
        info!(product_id = %product.id, employee_id = %employee.id, "Product added");
        Ok(product)
    }

    pub fn add_bundle(
        &self,
        name: &str,
        price: Money,
        items: Vec<BundleComponent>,
    ) -> CoreResult<Product> {
        let employee = self.authorize(Permission::ManageInventory)?;
        let now = self.clock.now();
        let bundle = self
            .stores
            .catalog
            .write(|c| c.add_bundle(name, price, items, now))?;
        info!(product_id = %bundle.id, stock = bundle.stock, employee_id = %employee.id, "Bundle added");
        Ok(bundle)
    }

    /// Supply in (positive) or out (negative).
    pub fn adjust_stock(&self, product_id: &str, delta: i64) -> CoreResult<Product> {
        let employee = self.authorize(Permission::ManageInventory)?;
        let now = self.clock.now();
        let product = self
            .stores
            .catalog
            .write(|c| c.adjust_stock(product_id, delta, now))?;
        info!(
            product_id,
            delta,
            stock = product.stock,
            employee_id = %employee.id,
            "Stock adjusted"
        );
        Ok(product)
    }

    // =========================================================================
    // Administration Commands
    // =========================================================================

    /// Adds an active, clocked-out employee with zero hours.
    ///
    /// Nobody can hand out a role above their own.
    pub fn add_employee(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> CoreResult<EmployeeProfile> {
        let admin = self.authorize(Permission::ManageEmployees)?;
        ensure_can_grant(&admin, role)?;
        validate_username(username)?;
        validate_password(password)?;
        let hash = self.credentials.hash(password)?;

        let employee = Employee::new(
            Uuid::new_v4().to_string(),
            username.trim().to_string(),
            hash,
            role,
        );
        let profile = employee.profile();
        self.stores.roster.write(|r| r.add(employee))?;

        info!(employee_id = %profile.id, role = ?role, by = %admin.id, "Employee added");
        Ok(profile)
    }

    /// Edits an employee. Validates and hashes everything before writing.
    pub fn update_employee(
        &self,
        employee_id: &str,
        update: EmployeeUpdate,
    ) -> CoreResult<EmployeeProfile> {
        let admin = self.authorize(Permission::ManageEmployees)?;
        if update.social_security_number.is_some() {
            self.authorize(Permission::EditSensitiveEmployeeData)?;
        }
        if let Some(role) = update.role {
            ensure_can_grant(&admin, role)?;
        }
        let username = match update.username.as_deref() {
            Some(name) => {
                validate_username(name)?;
                Some(name.trim().to_string())
            }
            None => None,
        };
        let credential_hash = match update.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(self.credentials.hash(password)?)
            }
            None => None,
        };
        let ssn_hash = match update.social_security_number.as_deref() {
            Some(ssn) if !ssn.trim().is_empty() => Some(self.credentials.hash(ssn.trim())?),
            _ => None,
        };

        let profile = self.stores.roster.write(|roster| -> CoreResult<EmployeeProfile> {
            if roster.get(employee_id)?.role > admin.role {
                return Err(CoreError::forbidden("edit a more senior employee", admin.role));
            }
            if let Some(name) = &username {
                if roster.username_taken(name, Some(employee_id)) {
                    return Err(ValidationError::Duplicate {
                        field: "username".to_string(),
                        value: name.clone(),
                    }
                    .into());
                }
            }

            let employee = roster.get_mut(employee_id)?;
            if let Some(name) = username {
                employee.username = name;
            }
            if let Some(role) = update.role {
                employee.role = role;
            }
            if let Some(hash) = credential_hash {
                employee.credential_hash = hash;
            }
            if let Some(phone) = update.phone_number {
                employee.phone_number = phone.trim().to_string();
            }
            if let Some(email) = update.email {
                employee.email = email.trim().to_string();
            }
            if let Some(address) = update.address {
                employee.address = address.trim().to_string();
            }
            if update.social_security_number.is_some() {
                employee.social_security_hash = ssn_hash;
            }
            Ok(employee.profile())
        })?;

        info!(employee_id, by = %admin.id, "Employee updated");
        Ok(profile)
    }

    /// Changes employment status. Leaving `active` ends any open shift.
    pub fn update_employee_status(
        &self,
        employee_id: &str,
        status: EmployeeStatus,
    ) -> CoreResult<EmployeeProfile> {
        let admin = self.authorize(Permission::ManageEmployees)?;
        let now = self.clock.now();

        let profile = self.stores.roster.write(|roster| -> CoreResult<EmployeeProfile> {
            let employee = roster.get_mut(employee_id)?;
            if employee.role > admin.role {
                return Err(CoreError::forbidden("edit a more senior employee", admin.role));
            }
            if status != EmployeeStatus::Active {
                close_shift(employee, now);
            }
            employee.status = status;
            Ok(employee.profile())
        })?;

        info!(employee_id, status = ?status, by = %admin.id, "Employee status changed");
        Ok(profile)
    }

    pub fn update_client_settings(&self, settings: ClientSettings) -> CoreResult<ClientSettings> {
        let admin = self.authorize(Permission::ManageSettings)?;
        validate_percentage("to-go discount", settings.discounted_to_go_percentage)?;

        self.stores.settings.write(|current| *current = settings.clone());
        info!(
            free_lunch = settings.free_lunch_enabled,
            to_go = settings.discounted_to_go_enabled,
            to_go_percentage = %settings.discounted_to_go_percentage,
            by = %admin.id,
            "Client settings updated"
        );
        Ok(settings)
    }
}

fn ensure_can_grant(admin: &Employee, role: Role) -> CoreResult<()> {
    if role > admin.role {
        return Err(CoreError::forbidden(
            format!("grant the {:?} role", role),
            admin.role,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, Utc};
    use tally_core::{Category, ErrorKind};

    /// Stores the secret itself; keeps tests fast.
    struct PlainText;

    impl CredentialVerifier for PlainText {
        fn hash(&self, secret: &str) -> CoreResult<String> {
            Ok(format!("plain:{}", secret))
        }

        fn verify(&self, secret: &str, hash: &str) -> bool {
            hash.strip_prefix("plain:") == Some(secret)
        }
    }

    struct Fixture {
        register: Register,
        clock: Arc<ManualClock>,
        apple: String,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mut register = Register::open(
            SharedStores::new(&EngineConfig::default()),
            EngineConfig::default(),
            Arc::new(PlainText),
            clock.clone(),
        );
        register.bootstrap_owner("bobwilliams", "password000").unwrap();
        register.login("bobwilliams", "password000").unwrap();
        register
            .add_employee("johndoe", "password123", Role::Cashier)
            .unwrap();
        register
            .add_employee("janesmith", "password456", Role::Manager)
            .unwrap();
        register
            .add_employee("alicejohnson", "password789", Role::Admin)
            .unwrap();
        let apple = register
            .add_product(NewProduct {
                name: "Apple".into(),
                price: Money::from_cents(50),
                category: Category::Grocery,
                stock: 10,
            })
            .unwrap()
            .id;
        register.logout().unwrap();

        Fixture {
            register,
            clock,
            apple,
        }
    }

    fn stock(register: &Register, id: &str) -> i64 {
        register
            .get_catalog()
            .into_iter()
            .find(|p| p.id == id)
            .map(|p| p.stock)
            .unwrap()
    }

    #[test]
    fn test_order_commands_need_login() {
        let mut f = fixture();
        assert!(matches!(
            f.register.add_item(&f.apple),
            Err(CoreError::NotAuthenticated)
        ));
        assert!(matches!(
            f.register.checkout(CheckoutRequest::cash()),
            Err(CoreError::NotAuthenticated)
        ));
        assert_eq!(stock(&f.register, &f.apple), 10);
        assert!(f.register.get_current_employee().is_none());
    }

    #[test]
    fn test_bootstrap_only_on_empty_roster() {
        let f = fixture();
        let err = f.register.bootstrap_owner("mallory", "pw").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert_eq!(f.register.stores().roster.read(|r| r.employees().len()), 4);
    }

    #[test]
    fn test_checkout_on_empty_order() {
        let mut f = fixture();
        f.register.login("johndoe", "password123").unwrap();
        assert!(matches!(
            f.register.checkout(CheckoutRequest::cash()),
            Err(CoreError::EmptyOrder)
        ));
    }

    #[test]
    fn test_cashier_cannot_refund_or_remove_cash() {
        let mut f = fixture();
        f.register.login("johndoe", "password123").unwrap();
        f.register.add_item(&f.apple).unwrap();
        let receipt = f.register.checkout(CheckoutRequest::cash()).unwrap();
        let balance = f.register.get_cash_balance().unwrap();

        assert!(matches!(
            f.register.refund_receipt(&receipt.id),
            Err(CoreError::Forbidden { .. })
        ));
        assert!(matches!(
            f.register.remove_cash(Money::from_cents(100)),
            Err(CoreError::Forbidden { .. })
        ));
        assert_eq!(f.register.get_receipts().unwrap().len(), 1);
        assert_eq!(f.register.get_cash_balance().unwrap(), balance);
        assert_eq!(stock(&f.register, &f.apple), 9);
    }

    #[test]
    fn test_logout_abandons_open_order() {
        let mut f = fixture();
        f.register.login("johndoe", "password123").unwrap();
        f.register.add_item(&f.apple).unwrap();
        f.register.add_item(&f.apple).unwrap();
        assert_eq!(stock(&f.register, &f.apple), 8);

        f.register.logout().unwrap();
        assert_eq!(stock(&f.register, &f.apple), 10);
    }

    #[test]
    fn test_switching_employee_clocks_out_previous() {
        let mut f = fixture();
        f.register.login("johndoe", "password123").unwrap();
        f.register.clock_in().unwrap();
        f.clock.advance(Duration::hours(3));

        let manager = f.register.login("janesmith", "password456").unwrap();
        assert_eq!(manager.username, "janesmith");

        f.register.logout().unwrap();
        f.register.login("alicejohnson", "password789").unwrap();
        let john = f
            .register
            .get_employees()
            .unwrap()
            .into_iter()
            .find(|e| e.username == "johndoe")
            .unwrap();
        assert!(!john.clocked_in);
        assert!((john.total_hours - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_failed_login_keeps_current_session() {
        let mut f = fixture();
        f.register.login("johndoe", "password123").unwrap();
        f.register.add_item(&f.apple).unwrap();

        assert!(f.register.login("janesmith", "wrong").is_err());
        assert_eq!(
            f.register.get_current_employee().map(|e| e.username),
            Some("johndoe".to_string())
        );
        assert_eq!(f.register.get_order().unwrap().lines.len(), 1);
    }

    #[test]
    fn test_employee_management_rules() {
        let mut f = fixture();
        f.register.login("alicejohnson", "password789").unwrap();

        assert!(matches!(
            f.register.add_employee("eve", "pw", Role::Owner),
            Err(CoreError::Forbidden { .. })
        ));
        assert!(matches!(
            f.register.add_employee("johndoe", "pw", Role::Cashier),
            Err(CoreError::Validation(ValidationError::Duplicate { .. }))
        ));

        let john_id = f
            .register
            .get_employees()
            .unwrap()
            .into_iter()
            .find(|e| e.username == "johndoe")
            .map(|e| e.id)
            .unwrap();

        let sensitive = EmployeeUpdate {
            social_security_number: Some("123-45-6789".into()),
            ..EmployeeUpdate::default()
        };
        assert!(matches!(
            f.register.update_employee(&john_id, sensitive.clone()),
            Err(CoreError::Forbidden { .. })
        ));

        let updated = f
            .register
            .update_employee(
                &john_id,
                EmployeeUpdate {
                    role: Some(Role::Manager),
                    email: Some("john@example.com".into()),
                    ..EmployeeUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.role, Role::Manager);
        assert_eq!(updated.email, "john@example.com");

        f.register
            .update_employee_status(&john_id, EmployeeStatus::Fired)
            .unwrap();
        f.register.logout().unwrap();
        assert!(matches!(
            f.register.login("johndoe", "password123"),
            Err(CoreError::InvalidCredentials)
        ));

        f.register.login("bobwilliams", "password000").unwrap();
        f.register.update_employee(&john_id, sensitive).unwrap();
        let hash = f
            .register
            .stores()
            .roster
            .read(|r| r.get(&john_id).map(|e| e.social_security_hash.clone()))
            .unwrap();
        assert_eq!(hash.as_deref(), Some("plain:123-45-6789"));
    }

    #[test]
    fn test_client_settings_admin_only() {
        let mut f = fixture();
        let settings = ClientSettings {
            discounted_to_go_percentage: Decimal::from(25),
            ..ClientSettings::default()
        };

        f.register.login("janesmith", "password456").unwrap();
        assert!(f.register.update_client_settings(settings.clone()).is_err());

        f.register.login("alicejohnson", "password789").unwrap();
        assert!(f
            .register
            .update_client_settings(ClientSettings {
                discounted_to_go_percentage: Decimal::from(120),
                ..ClientSettings::default()
            })
            .is_err());
        f.register.update_client_settings(settings.clone()).unwrap();
        assert_eq!(f.register.get_client_settings(), settings);
    }

    #[test]
    fn test_employee_to_go_discount_in_receipt() {
        let mut f = fixture();
        f.register.login("johndoe", "password123").unwrap();
        for _ in 0..10 {
            f.register.add_item(&f.apple).unwrap();
        }
        f.register.set_employee_order(true).unwrap();
        let breakdown = f.register.set_tax_enabled(false).unwrap();
        assert_eq!(breakdown.total, Money::from_cents(400));

        let receipt = f.register.checkout(CheckoutRequest::credit()).unwrap();
        assert_eq!(receipt.discount_amount, Money::from_cents(100));
        assert!(receipt.balances());
        // tax choice carries to the next order, the employee flag does not
        let order = f.register.get_order().unwrap();
        assert!(!order.settings.tax_enabled);
        assert!(!order.settings.employee_order);
    }

    #[test]
    fn test_inventory_commands() {
        let mut f = fixture();
        f.register.login("johndoe", "password123").unwrap();

        let product = f.register.adjust_stock(&f.apple, 5).unwrap();
        assert_eq!(product.stock, 15);
        assert!(matches!(
            f.register.adjust_stock(&f.apple, -16),
            Err(CoreError::InsufficientStock { .. })
        ));

        let report = f.register.get_inventory_report().unwrap();
        assert_eq!(report.to_string(), "End of Day Inventory Report:\n\nApple: 15 in stock\n");
        assert!(matches!(
            f.register.get_sales_summary(),
            Err(CoreError::Forbidden { .. })
        ));
    }
}
