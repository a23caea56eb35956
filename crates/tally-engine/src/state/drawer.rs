//! # Cash Drawer
//!
//! The single cash balance. Four operations move it and nothing else does:
//!
//! | Operation        | Trigger                          | Direction |
//! |------------------|----------------------------------|-----------|
//! | `credit`         | cash checkout                    | +         |
//! | `debit`          | void / refund of a cash receipt  | −         |
//! | `manual_removal` | manager pulls cash               | −         |
//! | `new`            | opening float                    | =         |

use serde::{Deserialize, Serialize};
use tracing::info;

use tally_core::validation::{validate_non_negative, validate_positive};
use tally_core::{CoreError, CoreResult, Money, Permission, Role};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashDrawer {
    balance: Money,
    starting_float: Money,
}

impl CashDrawer {
    pub fn new(starting_float: Money) -> Self {
        CashDrawer {
            balance: starting_float,
            starting_float,
        }
    }

    /// Rebuilds a drawer from a persisted balance.
    pub(crate) fn with_balance(starting_float: Money, balance: Money) -> Self {
        CashDrawer {
            balance,
            starting_float,
        }
    }

    #[inline]
    pub fn balance(&self) -> Money {
        self.balance
    }

    #[inline]
    pub fn starting_float(&self) -> Money {
        self.starting_float
    }

    pub fn credit(&mut self, amount: Money) -> CoreResult<()> {
        validate_non_negative("amount", amount)?;
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| CoreError::invalid_amount("drawer balance would overflow"))?;
        Ok(())
    }

    /// Fails without touching the balance if `amount` cannot be paid out.
    pub fn ensure_can_debit(&self, amount: Money) -> CoreResult<()> {
        validate_non_negative("amount", amount)?;
        if amount > self.balance {
            return Err(CoreError::InsufficientDrawerBalance {
                balance: self.balance,
                requested: amount,
            });
        }
        Ok(())
    }

    pub fn debit(&mut self, amount: Money) -> CoreResult<()> {
        self.ensure_can_debit(amount)?;
        self.balance -= amount;
        Ok(())
    }

    /// Cash taken out of the drawer by hand (bank drop, change run).
    pub fn manual_removal(&mut self, amount: Money, role: Role) -> CoreResult<Money> {
        if !role.can(Permission::RemoveCash) {
            return Err(CoreError::forbidden(Permission::RemoveCash.action(), role));
        }
        if validate_positive("amount", amount).is_err() || amount > self.balance {
            return Err(CoreError::invalid_amount(format!(
                "removal must be more than $0.00 and at most {}",
                self.balance.rounded()
            )));
        }

        self.balance -= amount;
        info!(amount = %amount, balance = %self.balance, "Cash removed from drawer");
        Ok(self.balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credit_and_debit() {
        let mut drawer = CashDrawer::new(Money::from_cents(100_000));
        drawer.credit(Money::from_cents(55)).unwrap();
        assert_eq!(drawer.balance(), Money::from_cents(100_055));

        drawer.debit(Money::from_cents(55)).unwrap();
        assert_eq!(drawer.balance(), Money::from_cents(100_000));
        assert_eq!(drawer.starting_float(), Money::from_cents(100_000));
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut drawer = CashDrawer::new(Money::from_cents(1000));
        assert!(drawer.credit(Money::from_cents(-1)).is_err());
        assert!(drawer.debit(Money::from_cents(-1)).is_err());
        assert_eq!(drawer.balance(), Money::from_cents(1000));
    }

    #[test]
    fn test_credit_overflow_is_rejected() {
        let full = Money::from_decimal(rust_decimal::Decimal::MAX);
        let mut drawer = CashDrawer::new(full);
        let err = drawer.credit(Money::from_cents(1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidAmount { .. }));
        assert_eq!(drawer.balance(), full);
    }

    #[test]
    fn test_debit_beyond_balance_fails() {
        let mut drawer = CashDrawer::new(Money::from_cents(1000));
        let err = drawer.debit(Money::from_cents(1001)).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientDrawerBalance { .. }));
        assert_eq!(drawer.balance(), Money::from_cents(1000));
    }

    #[test]
    fn test_manual_removal_rules() {
        let mut drawer = CashDrawer::new(Money::from_cents(1000));

        assert!(matches!(
            drawer.manual_removal(Money::from_cents(100), Role::Cashier),
            Err(CoreError::Forbidden { .. })
        ));
        assert!(matches!(
            drawer.manual_removal(Money::zero(), Role::Manager),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert!(matches!(
            drawer.manual_removal(Money::from_cents(1001), Role::Owner),
            Err(CoreError::InvalidAmount { .. })
        ));
        assert_eq!(drawer.balance(), Money::from_cents(1000));

        let left = drawer.manual_removal(Money::from_cents(1000), Role::Admin).unwrap();
        assert!(left.is_zero());
    }
}
