//! # Reports
//!
//! End-of-day sales summary and inventory report. Both are pure functions
//! over copies of the ledger, roster and catalog, so they never hold a lock
//! while formatting.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use tally_core::{Employee, Money, PaymentMethod, Product, Receipt};

// =============================================================================
// Sales Summary
// =============================================================================

/// Sales attributed to one employee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeSales {
    pub employee_id: String,
    pub username: String,
    pub receipt_count: usize,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct VoidedReceiptSummary {
    pub receipt_id: String,
    pub total: Money,
    pub voided_by: String,
    /// Username of `voided_by`, if they are still on the roster.
    pub voided_by_username: Option<String>,
    pub reason: String,
    #[ts(as = "String")]
    pub voided_at: DateTime<Utc>,
}

/// One valid sale in the detailed log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLogEntry {
    pub receipt_id: String,
    pub total: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub employee_id: String,
    pub employee_username: Option<String>,
    pub payment_method: PaymentMethod,
}

/// End-of-day totals. Voided receipts are listed but never counted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_sales: Money,
    pub cash_sales: Money,
    pub credit_sales: Money,
    pub cash_in_register: Money,
    /// Every roster member, in roster order, zero if they sold nothing.
    pub sales_by_employee: Vec<EmployeeSales>,
    pub voided_receipts: Vec<VoidedReceiptSummary>,
    pub sales_log: Vec<SaleLogEntry>,
}

fn username_of(employees: &[Employee], employee_id: &str) -> Option<String> {
    employees
        .iter()
        .find(|e| e.id == employee_id)
        .map(|e| e.username.clone())
}

/// Builds the end-of-day summary.
pub fn summarize(
    receipts: &[Receipt],
    employees: &[Employee],
    cash_in_register: Money,
) -> SalesSummary {
    let (voided, valid): (Vec<&Receipt>, Vec<&Receipt>) =
        receipts.iter().partition(|r| r.is_voided());

    let total_for = |method: PaymentMethod| -> Money {
        valid
            .iter()
            .filter(|r| r.payment_method == method)
            .map(|r| r.total)
            .sum()
    };

    let sales_by_employee = employees
        .iter()
        .map(|employee| {
            let sold: Vec<&&Receipt> = valid
                .iter()
                .filter(|r| r.employee_id == employee.id)
                .collect();
            EmployeeSales {
                employee_id: employee.id.clone(),
                username: employee.username.clone(),
                receipt_count: sold.len(),
                total: sold.iter().map(|r| r.total).sum(),
            }
        })
        .collect();

    let voided_receipts = voided
        .iter()
        .filter_map(|r| {
            let info = r.void_info.as_ref()?;
            Some(VoidedReceiptSummary {
                receipt_id: r.id.clone(),
                total: r.total,
                voided_by: info.voided_by.clone(),
                voided_by_username: username_of(employees, &info.voided_by),
                reason: info.reason.clone(),
                voided_at: info.voided_at,
            })
        })
        .collect();

    let sales_log = valid
        .iter()
        .map(|r| SaleLogEntry {
            receipt_id: r.id.clone(),
            total: r.total,
            created_at: r.created_at,
            employee_id: r.employee_id.clone(),
            employee_username: username_of(employees, &r.employee_id),
            payment_method: r.payment_method,
        })
        .collect();

    SalesSummary {
        total_sales: valid.iter().map(|r| r.total).sum(),
        cash_sales: total_for(PaymentMethod::Cash),
        credit_sales: total_for(PaymentMethod::Credit),
        cash_in_register,
        sales_by_employee,
        voided_receipts,
        sales_log,
    }
}

impl fmt::Display for SalesSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "End of Day Sales Summary")?;
        writeln!(f, "Total Sales: {}", self.total_sales)?;
        writeln!(f, "Cash Sales: {}", self.cash_sales)?;
        writeln!(f, "Credit Card Sales: {}", self.credit_sales)?;
        writeln!(f, "Cash in Register: {}", self.cash_in_register)?;

        writeln!(f, "\nSales by Employee")?;
        for employee in &self.sales_by_employee {
            writeln!(f, "{}: {}", employee.username, employee.total)?;
        }

        writeln!(f, "\nVoided Receipts")?;
        for receipt in &self.voided_receipts {
            writeln!(
                f,
                "Receipt #{} - {} - Voided by: {} - Reason: {}",
                receipt.receipt_id,
                receipt.total,
                receipt.voided_by_username.as_deref().unwrap_or(&receipt.voided_by),
                receipt.reason
            )?;
        }

        writeln!(f, "\nDetailed Sales Log")?;
        for entry in &self.sales_log {
            writeln!(
                f,
                "Receipt #{} - {} - {} - Employee: {} - Payment: {:?}",
                entry.receipt_id,
                entry.total,
                entry.created_at.format("%Y-%m-%d %H:%M:%S"),
                entry.employee_username.as_deref().unwrap_or(&entry.employee_id),
                entry.payment_method
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Inventory Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryLine {
    pub product_id: String,
    pub name: String,
    pub stock: i64,
}

/// Stock on hand per product, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub lines: Vec<InventoryLine>,
}

pub fn inventory(products: &[Product]) -> InventoryReport {
    InventoryReport {
        lines: products
            .iter()
            .map(|p| InventoryLine {
                product_id: p.id.clone(),
                name: p.name.clone(),
                stock: p.stock,
            })
            .collect(),
    }
}

impl fmt::Display for InventoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "End of Day Inventory Report:\n")?;
        for line in &self.lines {
            writeln!(f, "{}: {} in stock", line.name, line.stock)?;
        }
        Ok(())
    }
}
