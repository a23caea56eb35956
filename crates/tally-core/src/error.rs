//! # Error Types
//!
//! Domain-specific error types for the register engine.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ValidationError  - Field-level input failures                          │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  CoreError        - Every engine operation returns CoreResult<T>        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ErrorKind        - Coarse code the presentation layer switches on      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, quantities, role)
//! 3. Errors are enum variants, never String
//! 4. No operation leaves partial state behind when it returns an error

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::types::Role;

// =============================================================================
// Core Error
// =============================================================================

/// Errors returned by every register operation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// No employee is logged in on this register.
    #[error("No employee is logged in")]
    NotAuthenticated,

    /// Username/password did not match an active employee.
    ///
    /// Deliberately does not say which half was wrong.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The logged-in employee's role cannot perform the action.
    #[error("Role {role:?} is not allowed to {action}")]
    Forbidden { action: String, role: Role },

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Receipt not found: {0}")]
    ReceiptNotFound(String),

    #[error("Employee not found: {0}")]
    EmployeeNotFound(String),

    /// The product is not on the current order.
    #[error("Product {0} is not on the order")]
    LineNotFound(String),

    /// Product has no stock at all.
    #[error("{0} is out of stock")]
    OutOfStock(String),

    /// Insufficient stock to complete a reservation or adjustment.
    ///
    /// ## User Workflow
    /// ```text
    /// Add "Burger Meal" to order
    ///      │
    ///      ▼
    /// Expand bundle: Burger ×1, Fries ×1, Soda ×1
    ///      │
    ///      ▼
    /// Check every component: Fries available=0
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Fries", available: 0, requested: 1 }
    ///      │
    ///      ▼
    /// Nothing was decremented
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    #[error("Cash drawer holds {balance}, cannot pay out {requested}")]
    InsufficientDrawerBalance { balance: Money, requested: Money },

    #[error("Receipt {0} has already been voided")]
    AlreadyVoided(String),

    #[error("Invalid bundle: {reason}")]
    InvalidBundle { reason: String },

    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    #[error("Order is empty")]
    EmptyOrder,

    /// The credential collaborator failed (not a mismatch).
    #[error("Credential processing failed: {0}")]
    Credential(String),
}

impl CoreError {
    /// Creates a Forbidden error for an action.
    pub fn forbidden(action: impl Into<String>, role: Role) -> Self {
        CoreError::Forbidden {
            action: action.into(),
            role,
        }
    }

    /// Creates an InvalidAmount error.
    pub fn invalid_amount(reason: impl Into<String>) -> Self {
        CoreError::InvalidAmount {
            reason: reason.into(),
        }
    }

    /// Creates an InvalidBundle error.
    pub fn invalid_bundle(reason: impl Into<String>) -> Self {
        CoreError::InvalidBundle {
            reason: reason.into(),
        }
    }

    /// Collapses the error into the coarse kind a caller reacts to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Validation(_)
            | CoreError::InvalidAmount { .. }
            | CoreError::EmptyOrder
            | CoreError::Credential(_) => ErrorKind::ValidationError,
            CoreError::NotAuthenticated | CoreError::InvalidCredentials => {
                ErrorKind::NotAuthenticated
            }
            CoreError::Forbidden { .. } => ErrorKind::Forbidden,
            CoreError::ProductNotFound(_)
            | CoreError::ReceiptNotFound(_)
            | CoreError::EmployeeNotFound(_)
            | CoreError::LineNotFound(_) => ErrorKind::NotFound,
            CoreError::OutOfStock(_) | CoreError::InsufficientStock { .. } => {
                ErrorKind::InsufficientStock
            }
            CoreError::InsufficientDrawerBalance { .. } => ErrorKind::InsufficientDrawerBalance,
            CoreError::AlreadyVoided(_) => ErrorKind::AlreadyVoided,
            CoreError::InvalidBundle { .. } => ErrorKind::InvalidBundle,
        }
    }
}

// =============================================================================
// Error Kind
// =============================================================================

/// Error codes for the presentation layer.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Fries: ..." }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    NotAuthenticated,
    Forbidden,
    NotFound,
    InsufficientStock,
    InsufficientDrawerBalance,
    AlreadyVoided,
    InvalidBundle,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any aggregate is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., non-numeric amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate username).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Fries".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Fries: available 3, requested 5"
        );

        let err = CoreError::InsufficientDrawerBalance {
            balance: Money::from_cents(1000),
            requested: Money::from_cents(2550),
        };
        assert_eq!(
            err.to_string(),
            "Cash drawer holds $10.00, cannot pay out $25.50"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "username".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::OutOfStock("A".into()).kind(), ErrorKind::InsufficientStock);
        assert_eq!(CoreError::InvalidCredentials.kind(), ErrorKind::NotAuthenticated);
        assert_eq!(CoreError::LineNotFound("A".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            CoreError::forbidden("refund receipts", Role::Cashier).kind(),
            ErrorKind::Forbidden
        );
    }

    #[test]
    fn test_kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::InsufficientDrawerBalance).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_DRAWER_BALANCE\"");
    }
}
