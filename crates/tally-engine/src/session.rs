//! # Employee Session & RBAC
//!
//! Who is logged in on this register, their clock, and what they may do.
//!
//! ## Authorization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  command handler                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session.authorize(roster, Permission::RefundReceipts)                  │
//! │       │                                                                 │
//! │       ├── nobody logged in ─────────────► NotAuthenticated              │
//! │       ├── employee no longer active ────► NotAuthenticated              │
//! │       ├── role < minimum_role() ────────► Forbidden                     │
//! │       ▼                                                                 │
//! │  Employee (copy) ──► handler proceeds                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Checks live here, next to the state, so the engine is safe to expose to
//! any client.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use tally_core::{CoreError, CoreResult, Employee, Permission};

use crate::credentials::CredentialVerifier;
use crate::state::Roster;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// The authenticated employee on one register, if any.
#[derive(Debug, Clone, Default)]
pub struct Session {
    employee_id: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn employee_id(&self) -> Option<&str> {
        self.employee_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.employee_id.is_some()
    }

    /// Authenticates an active employee.
    ///
    /// Unknown usernames and wrong passwords fail the same way.
    pub fn login(
        &mut self,
        roster: &Roster,
        credentials: &dyn CredentialVerifier,
        username: &str,
        password: &str,
    ) -> CoreResult<Employee> {
        let employee = roster
            .find_active_by_username(username.trim())
            .filter(|e| credentials.verify(password, &e.credential_hash))
            .ok_or_else(|| {
                warn!(username, "Login failed");
                CoreError::InvalidCredentials
            })?;

        self.employee_id = Some(employee.id.clone());
        info!(employee_id = %employee.id, role = ?employee.role, "Employee logged in");
        Ok(employee.clone())
    }

    /// Ends the session, clocking the employee out first if needed.
    pub fn logout(&mut self, roster: &mut Roster, now: DateTime<Utc>) -> Option<Employee> {
        let employee_id = self.employee_id.take()?;
        let employee = roster.get_mut(&employee_id).ok()?;
        close_shift(employee, now);
        info!(employee_id = %employee_id, "Employee logged out");
        Some(employee.clone())
    }

    /// The logged-in employee. Someone fired mid-shift is treated as logged out.
    pub fn current<'a>(&self, roster: &'a Roster) -> CoreResult<&'a Employee> {
        let employee_id = self.employee_id.as_deref().ok_or(CoreError::NotAuthenticated)?;
        roster
            .get(employee_id)
            .ok()
            .filter(|e| e.is_active())
            .ok_or(CoreError::NotAuthenticated)
    }

    /// Checks the logged-in employee may perform `permission`.
    pub fn authorize(&self, roster: &Roster, permission: Permission) -> CoreResult<Employee> {
        let employee = self.current(roster).map_err(|e| {
            warn!(action = permission.action(), "Rejected: not logged in");
            e
        })?;

        if !employee.role.can(permission) {
            warn!(
                employee_id = %employee.id,
                role = ?employee.role,
                action = permission.action(),
                "Rejected: role not allowed"
            );
            return Err(CoreError::forbidden(permission.action(), employee.role));
        }
        Ok(employee.clone())
    }

    /// Starts the logged-in employee's shift. Already clocked in is a no-op.
    pub fn clock_in(&self, roster: &mut Roster, now: DateTime<Utc>) -> CoreResult<Employee> {
        let employee_id = self.current(roster)?.id.clone();
        let employee = roster.get_mut(&employee_id)?;
        if !employee.clocked_in {
            employee.clocked_in = true;
            employee.last_clock_in = Some(now);
            info!(employee_id = %employee.id, "Clocked in");
        }
        Ok(employee.clone())
    }

    /// Ends the logged-in employee's shift. Not clocked in is a no-op.
    pub fn clock_out(&self, roster: &mut Roster, now: DateTime<Utc>) -> CoreResult<Employee> {
        let employee_id = self.current(roster)?.id.clone();
        let employee = roster.get_mut(&employee_id)?;
        close_shift(employee, now);
        Ok(employee.clone())
    }
}

/// Closes an open shift and adds its length to the employee's hours.
/// Does nothing for someone not clocked in.
pub(crate) fn close_shift(employee: &mut Employee, now: DateTime<Utc>) {
    if !employee.clocked_in {
        return;
    }
    let worked = employee
        .last_clock_in
        .map(|since| (now - since).num_milliseconds() as f64 / MILLIS_PER_HOUR)
        .unwrap_or_default()
        .max(0.0);

    employee.clocked_in = false;
    employee.last_clock_out = Some(now);
    employee.total_hours += worked;
    info!(employee_id = %employee.id, hours = worked, total_hours = employee.total_hours, "Clocked out");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tally_core::{EmployeeStatus, Role};

    /// Stores the password itself as the "hash".
    struct PlainText;

    impl CredentialVerifier for PlainText {
        fn hash(&self, secret: &str) -> CoreResult<String> {
            Ok(secret.to_string())
        }

        fn verify(&self, secret: &str, hash: &str) -> bool {
            secret == hash
        }
    }

    fn roster() -> Roster {
        let mut roster = Roster::new();
        roster
            .add(Employee::new(
                "e1".into(),
                "johndoe".into(),
                "password123".into(),
                Role::Cashier,
            ))
            .unwrap();
        roster
            .add(Employee::new(
                "e2".into(),
                "janesmith".into(),
                "password456".into(),
                Role::Manager,
            ))
            .unwrap();
        roster
    }

    #[test]
    fn test_login_does_not_reveal_which_part_failed() {
        let roster = roster();
        let mut session = Session::new();

        let unknown = session.login(&roster, &PlainText, "nobody", "password123");
        let wrong = session.login(&roster, &PlainText, "johndoe", "nope");
        assert!(matches!(unknown, Err(CoreError::InvalidCredentials)));
        assert!(matches!(wrong, Err(CoreError::InvalidCredentials)));
        assert!(!session.is_authenticated());

        session.login(&roster, &PlainText, "johndoe", "password123").unwrap();
        assert_eq!(session.employee_id(), Some("e1"));
    }

    #[test]
    fn test_inactive_employee_cannot_log_in() {
        let mut roster = roster();
        roster.get_mut("e1").unwrap().status = EmployeeStatus::Terminated;
        let mut session = Session::new();

        assert!(session.login(&roster, &PlainText, "johndoe", "password123").is_err());
    }

    #[test]
    fn test_authorize_by_role() {
        let roster = roster();
        let mut session = Session::new();
        assert!(matches!(
            session.authorize(&roster, Permission::TakeOrders),
            Err(CoreError::NotAuthenticated)
        ));

        session.login(&roster, &PlainText, "johndoe", "password123").unwrap();
        assert!(session.authorize(&roster, Permission::TakeOrders).is_ok());
        assert!(matches!(
            session.authorize(&roster, Permission::RefundReceipts),
            Err(CoreError::Forbidden { role: Role::Cashier, .. })
        ));

        session.login(&roster, &PlainText, "janesmith", "password456").unwrap();
        assert!(session.authorize(&roster, Permission::RefundReceipts).is_ok());
        assert!(session.authorize(&roster, Permission::ManageEmployees).is_err());
    }

    #[test]
    fn test_clock_out_accrues_hours() {
        let mut roster = roster();
        let mut session = Session::new();
        session.login(&roster, &PlainText, "johndoe", "password123").unwrap();
        let start = Utc::now();

        session.clock_in(&mut roster, start).unwrap();
        // second clock-in keeps the original start
        session.clock_in(&mut roster, start + Duration::hours(1)).unwrap();
        let employee = session
            .clock_out(&mut roster, start + Duration::minutes(90))
            .unwrap();

        assert!(!employee.clocked_in);
        assert!((employee.total_hours - 1.5).abs() < 1e-9);

        let again = session.clock_out(&mut roster, start + Duration::hours(5)).unwrap();
        assert!((again.total_hours - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_logout_forces_clock_out() {
        let mut roster = roster();
        let mut session = Session::new();
        session.login(&roster, &PlainText, "johndoe", "password123").unwrap();
        let start = Utc::now();
        session.clock_in(&mut roster, start).unwrap();

        let employee = session.logout(&mut roster, start + Duration::hours(2)).unwrap();
        assert!(!employee.clocked_in);
        assert!((employee.total_hours - 2.0).abs() < 1e-9);
        assert!(!session.is_authenticated());
        assert!(session.logout(&mut roster, start).is_none());
    }

    #[test]
    fn test_fired_mid_shift_is_logged_out() {
        let mut roster = roster();
        let mut session = Session::new();
        session.login(&roster, &PlainText, "johndoe", "password123").unwrap();

        roster.get_mut("e1").unwrap().status = EmployeeStatus::Fired;
        assert!(matches!(session.current(&roster), Err(CoreError::NotAuthenticated)));
    }
}
