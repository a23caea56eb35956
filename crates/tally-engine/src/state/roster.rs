//! Employee roster.

use tally_core::{CoreError, CoreResult, Employee, ValidationError};

#[derive(Debug, Clone, Default)]
pub struct Roster {
    employees: Vec<Employee>,
}

impl Roster {
    pub fn new() -> Self {
        Roster::default()
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }

    pub fn get(&self, employee_id: &str) -> CoreResult<&Employee> {
        self.employees
            .iter()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| CoreError::EmployeeNotFound(employee_id.to_string()))
    }

    pub fn get_mut(&mut self, employee_id: &str) -> CoreResult<&mut Employee> {
        self.employees
            .iter_mut()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| CoreError::EmployeeNotFound(employee_id.to_string()))
    }

    /// Only active employees can be found for login.
    pub fn find_active_by_username(&self, username: &str) -> Option<&Employee> {
        self.employees
            .iter()
            .find(|e| e.username == username && e.is_active())
    }

    /// Checks whether `username` belongs to someone other than `except_id`.
    pub fn username_taken(&self, username: &str, except_id: Option<&str>) -> bool {
        self.employees
            .iter()
            .any(|e| e.username == username && Some(e.id.as_str()) != except_id)
    }

    pub fn add(&mut self, employee: Employee) -> CoreResult<()> {
        if self.username_taken(&employee.username, None) {
            return Err(ValidationError::Duplicate {
                field: "username".to_string(),
                value: employee.username,
            }
            .into());
        }
        self.employees.push(employee);
        Ok(())
    }

    pub(crate) fn insert(&mut self, employee: Employee) {
        self.employees.push(employee);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{EmployeeStatus, Role};

    fn employee(id: &str, username: &str) -> Employee {
        Employee::new(id.to_string(), username.to_string(), String::new(), Role::Cashier)
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let mut roster = Roster::new();
        roster.add(employee("e1", "johndoe")).unwrap();

        let err = roster.add(employee("e2", "johndoe")).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::Duplicate { .. })
        ));
        assert_eq!(roster.employees().len(), 1);
        assert!(!roster.username_taken("johndoe", Some("e1")));
    }

    #[test]
    fn test_inactive_employees_not_found_for_login() {
        let mut roster = Roster::new();
        roster.add(employee("e1", "johndoe")).unwrap();
        assert!(roster.find_active_by_username("johndoe").is_some());

        roster.get_mut("e1").unwrap().status = EmployeeStatus::Fired;
        assert!(roster.find_active_by_username("johndoe").is_none());
        assert!(matches!(roster.get("e9"), Err(CoreError::EmployeeNotFound(_))));
    }
}
