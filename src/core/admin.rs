//! Bearer-token admin session: employee records and PINs.

use crate::api::AdminApi;
use crate::core::auth::validate_admin_pin;
use crate::errors::{AppError, AppResult};
use crate::models::{AdminEmployee, NewEmployee};
use crate::store::{KeyValueStore, keys};
use tracing::{info, warn};

pub struct AdminSession<A, S> {
    api: A,
    store: S,
}

impl<A: AdminApi, S: KeyValueStore> AdminSession<A, S> {
    pub fn new(api: A, store: S) -> Self {
        Self { api, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_logged_in(&self) -> AppResult<bool> {
        Ok(self.store.get(keys::ADMIN_TOKEN)?.is_some())
    }

    fn token(&self) -> AppResult<String> {
        self.store
            .get(keys::ADMIN_TOKEN)?
            .filter(|t| !t.is_empty())
            .ok_or(AppError::AdminLoggedOut)
    }

    /// 401/403 drop the stored credential; 503 means the server has no
    /// admin key configured.
    fn map_err(&self, err: AppError) -> AppError {
        match err {
            e if e.is_unauthorized() => {
                warn!("admin credential rejected");
                if let Err(clear) = self.store.remove(keys::ADMIN_TOKEN) {
                    warn!(error = %clear, "could not clear admin credential");
                }
                AppError::InvalidCredential
            }
            AppError::Api { status: 503, .. } => AppError::AdminUnavailable,
            e => e,
        }
    }

    /// Check `password` against the server and keep it on success.
    pub fn login(&self, password: &str) -> AppResult<Vec<AdminEmployee>> {
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".into()));
        }
        let employees = self
            .api
            .list_employees(password)
            .map_err(|e| self.map_err(e))?;
        self.store.set(keys::ADMIN_TOKEN, password)?;
        info!(count = employees.len(), "admin logged in");
        Ok(employees)
    }

    pub fn logout(&self) -> AppResult<()> {
        self.store.remove(keys::ADMIN_TOKEN)
    }

    pub fn list(&self) -> AppResult<Vec<AdminEmployee>> {
        let token = self.token()?;
        self.api.list_employees(&token).map_err(|e| self.map_err(e))
    }

    pub fn add(&self, employee: &NewEmployee) -> AppResult<AdminEmployee> {
        let token = self.token()?;
        let employee = normalize(employee)?;
        let created = self
            .api
            .add_employee(&token, &employee)
            .map_err(|e| self.map_err(e))?;
        info!(employee_id = created.id, "employee added");
        Ok(created)
    }

    pub fn set_pin(&self, employee_id: i64, pin: &str) -> AppResult<()> {
        let token = self.token()?;
        validate_admin_pin(pin)?;
        self.api
            .set_pin(&token, employee_id, pin)
            .map_err(|e| self.map_err(e))?;
        info!(employee_id, "employee PIN updated");
        Ok(())
    }

    pub fn delete(&self, employee_id: i64) -> AppResult<()> {
        let token = self.token()?;
        self.api
            .delete_employee(&token, employee_id)
            .map_err(|e| self.map_err(e))?;
        info!(employee_id, "employee deleted");
        Ok(())
    }
}

/// Trim fields, require both names, drop empty optionals, check the PIN.
fn normalize(e: &NewEmployee) -> AppResult<NewEmployee> {
    let first_name = e.first_name.trim().to_string();
    let last_name = e.last_name.trim().to_string();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::Validation(
            "First name and last name are required".into(),
        ));
    }

    let email = e
        .email
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    let pin = e
        .pin
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(p) = &pin {
        validate_admin_pin(p)?;
    }

    Ok(NewEmployee {
        first_name,
        last_name,
        email,
        pin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_drops_empty_optionals() {
        let e = normalize(&NewEmployee {
            first_name: " Ada ".into(),
            last_name: "Byron".into(),
            email: Some("  ".into()),
            pin: Some("123456".into()),
        })
        .unwrap();
        assert_eq!(e.first_name, "Ada");
        assert_eq!(e.email, None);
        assert_eq!(e.pin.as_deref(), Some("123456"));
    }

    #[test]
    fn normalize_rejects_missing_names_and_bad_pins() {
        let mut e = NewEmployee {
            first_name: "Ada".into(),
            last_name: " ".into(),
            ..Default::default()
        };
        assert!(normalize(&e).is_err());

        e.last_name = "Byron".into();
        e.pin = Some("12".into());
        assert!(normalize(&e).unwrap_err().to_string().contains("4-10 digits"));
    }
}
