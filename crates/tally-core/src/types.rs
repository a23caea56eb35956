//! # Domain Types
//!
//! Core domain types used throughout the register engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Receipt     │   │    Employee     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  category       │   │  lines (frozen) │   │  role           │       │
//! │  │  price, stock   │   │  amounts        │   │  status         │       │
//! │  │  bundle_items   │   │  void_info      │   │  clock state    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │ PaymentMethod   │   │      Role       │       │
//! │  │  Grocery        │   │  Cash           │   │  Cashier        │       │
//! │  │  Fastfood       │   │  Credit         │   │  Manager        │       │
//! │  │  Bundle         │   └─────────────────┘   │  Admin, Owner   │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order lines and receipts hold *copies* of products taken when the item was
//! rung up. Later catalog edits never rewrite a sale.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// Product category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Grocery,
    Fastfood,
    /// Composed of fixed quantities of non-bundle products.
    Bundle,
}

/// One component of a bundle: `quantity` units of `product_id` per bundle sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct BundleComponent {
    pub product_id: String,
    pub quantity: i64,
}

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price, never negative.
    pub price: Money,

    pub category: Category,

    /// Units on hand, never negative.
    pub stock: i64,

    /// Bundle composition in display order. Empty for non-bundles.
    #[serde(default)]
    pub bundle_items: Vec<BundleComponent>,

    /// One-off open-amount line that never lives in the catalog.
    #[serde(default)]
    pub custom: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether this product expands into components on reservation.
    #[inline]
    pub fn is_bundle(&self) -> bool {
        self.category == Category::Bundle
    }

    /// Checks if `quantity` units can be taken from this product's own stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Order Line
// =============================================================================

/// A line on an order or receipt: a frozen product copy and a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product: Product,
    pub quantity: i64,
}

impl OrderLine {
    /// Calculates the line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.product.price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Payment & Receipt Delivery
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment; moves the drawer.
    #[default]
    Cash,
    /// Card payment; never touches the drawer.
    Credit,
}

/// How the customer wants their receipt delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptMethod {
    Email,
    Phone,
    #[default]
    None,
}

impl ReceiptMethod {
    /// Email and phone delivery need somewhere to send the receipt.
    #[inline]
    pub fn needs_contact(&self) -> bool {
        matches!(self, ReceiptMethod::Email | ReceiptMethod::Phone)
    }
}

// =============================================================================
// Receipt
// =============================================================================

/// Lifecycle state of a receipt still present in the ledger.
///
/// Refunded receipts are deleted, so they have no state here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    Active,
    Voided,
}

/// Who voided a receipt, why, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VoidAnnotation {
    pub voided_by: String,
    pub reason: String,
    #[ts(as = "String")]
    pub voided_at: DateTime<Utc>,
}

/// An immutable record of a completed sale.
///
/// ## Invariant
/// `total = subtotal - discount_amount + tax + gratuity + extra_charges`,
/// with `discount_amount <= subtotal` and every other amount `>= 0`.
/// The only mutation after creation is attaching `void_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax: Money,
    pub gratuity: Money,
    pub extra_charges: Money,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub employee_id: String,
    pub payment_method: PaymentMethod,
    pub signature: Option<String>,
    pub receipt_method: ReceiptMethod,
    pub contact_info: Option<String>,
    pub void_info: Option<VoidAnnotation>,
}

impl Receipt {
    #[inline]
    pub fn status(&self) -> ReceiptStatus {
        if self.void_info.is_some() {
            ReceiptStatus::Voided
        } else {
            ReceiptStatus::Active
        }
    }

    #[inline]
    pub fn is_voided(&self) -> bool {
        self.void_info.is_some()
    }

    #[inline]
    pub fn is_cash(&self) -> bool {
        self.payment_method == PaymentMethod::Cash
    }

    /// Checks the receipt's money invariant.
    pub fn balances(&self) -> bool {
        let recomputed =
            self.subtotal - self.discount_amount + self.tax + self.gratuity + self.extra_charges;
        recomputed == self.total
            && self.discount_amount <= self.subtotal
            && !self.subtotal.is_negative()
            && !self.discount_amount.is_negative()
            && !self.tax.is_negative()
            && !self.gratuity.is_negative()
            && !self.extra_charges.is_negative()
    }
}

// =============================================================================
// Employees & Roles
// =============================================================================

/// Employee role, ordered by capability: `Owner ⊇ Admin ⊇ Manager ⊇ Cashier`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Cashier,
    Manager,
    Admin,
    Owner,
}

impl Role {
    /// Checks whether this role is granted `permission`.
    #[inline]
    pub fn can(&self, permission: Permission) -> bool {
        *self >= permission.minimum_role()
    }
}

/// Operations gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Ring up, view, check out, void and duplicate orders.
    TakeOrders,
    /// Stock supply in/out, products and bundles.
    ManageInventory,
    /// End-of-day sales summary.
    ViewSalesSummary,
    RefundReceipts,
    RemoveCash,
    ManageEmployees,
    ManageSettings,
    /// Social-security numbers on employee records.
    EditSensitiveEmployeeData,
}

impl Permission {
    /// The least-capable role allowed to perform this operation.
    pub fn minimum_role(&self) -> Role {
        match self {
            Permission::TakeOrders | Permission::ManageInventory => Role::Cashier,
            Permission::ViewSalesSummary
            | Permission::RefundReceipts
            | Permission::RemoveCash => Role::Manager,
            Permission::ManageEmployees | Permission::ManageSettings => Role::Admin,
            Permission::EditSensitiveEmployeeData => Role::Owner,
        }
    }

    /// Human-readable action for error messages and logs.
    pub fn action(&self) -> &'static str {
        match self {
            Permission::TakeOrders => "take orders",
            Permission::ManageInventory => "manage inventory",
            Permission::ViewSalesSummary => "view the sales summary",
            Permission::RefundReceipts => "refund receipts",
            Permission::RemoveCash => "remove cash from the drawer",
            Permission::ManageEmployees => "manage employees",
            Permission::ManageSettings => "change client settings",
            Permission::EditSensitiveEmployeeData => "edit sensitive employee data",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    /// The only status allowed to log in.
    #[default]
    Active,
    Fired,
    Terminated,
    EligibleForRehire,
}

/// An employee record, including secrets. Never hand this to the UI;
/// use [`EmployeeProfile`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub username: String,
    pub credential_hash: String,
    pub role: Role,
    pub status: EmployeeStatus,
    pub clocked_in: bool,
    pub last_clock_in: Option<DateTime<Utc>>,
    pub last_clock_out: Option<DateTime<Utc>>,
    /// Accumulated hours; only grows, and only on clock-out.
    pub total_hours: f64,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub social_security_hash: Option<String>,
}

impl Employee {
    /// Creates an active, clocked-out employee with zero hours.
    pub fn new(id: String, username: String, credential_hash: String, role: Role) -> Self {
        Employee {
            id,
            username,
            credential_hash,
            role,
            status: EmployeeStatus::Active,
            clocked_in: false,
            last_clock_in: None,
            last_clock_out: None,
            total_hours: 0.0,
            phone_number: String::new(),
            email: String::new(),
            address: String::new(),
            social_security_hash: None,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    /// Returns the public view of this employee.
    pub fn profile(&self) -> EmployeeProfile {
        EmployeeProfile {
            id: self.id.clone(),
            username: self.username.clone(),
            role: self.role,
            status: self.status,
            clocked_in: self.clocked_in,
            last_clock_in: self.last_clock_in,
            last_clock_out: self.last_clock_out,
            total_hours: self.total_hours,
            phone_number: self.phone_number.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
        }
    }
}

/// Employee data safe to show in the UI (no hashes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeProfile {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub status: EmployeeStatus,
    pub clocked_in: bool,
    #[ts(as = "Option<String>")]
    pub last_clock_in: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub last_clock_out: Option<DateTime<Utc>>,
    pub total_hours: f64,
    pub phone_number: String,
    pub email: String,
    pub address: String,
}

// =============================================================================
// Client Settings
// =============================================================================

/// Store-wide settings editable by admins and owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientSettings {
    pub free_lunch_enabled: bool,
    pub discounted_to_go_enabled: bool,
    /// Percentage points (0–100) taken off employee to-go orders.
    #[ts(type = "string")]
    pub discounted_to_go_percentage: Decimal,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            free_lunch_enabled: true,
            discounted_to_go_enabled: true,
            discounted_to_go_percentage: Decimal::from(20),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
