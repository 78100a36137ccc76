//! Bearer-token admin endpoints (employee records and PINs).

use super::http::{expect_success, read_json};
use super::{AdminApi, HttpApi, ListResponse, SetPinRequest};
use crate::errors::AppResult;
use crate::models::{AdminEmployee, NewEmployee};
use tracing::debug;

pub struct HttpAdminApi {
    http: HttpApi,
}

impl HttpAdminApi {
    pub fn new(http: HttpApi) -> Self {
        Self { http }
    }
}

impl AdminApi for HttpAdminApi {
    fn list_employees(&self, token: &str) -> AppResult<Vec<AdminEmployee>> {
        let url = self.http.url("admin/employees/");
        debug!(%url, "GET (admin)");
        let resp = self.http.client().get(&url).bearer_auth(token).send()?;
        let list: ListResponse<AdminEmployee> = read_json(resp)?;
        Ok(list.into_vec())
    }

    fn add_employee(&self, token: &str, employee: &NewEmployee) -> AppResult<AdminEmployee> {
        let url = self.http.url("admin/employees/");
        debug!(%url, "POST (admin)");
        let resp = self
            .http
            .client()
            .post(&url)
            .bearer_auth(token)
            .json(employee)
            .send()?;
        read_json(resp)
    }

    fn set_pin(&self, token: &str, employee_id: i64, pin: &str) -> AppResult<()> {
        let url = self
            .http
            .url(&format!("admin/employees/{employee_id}/set-pin/"));
        debug!(%url, "POST (admin)");
        let resp = self
            .http
            .client()
            .post(&url)
            .bearer_auth(token)
            .json(&SetPinRequest {
                pin: pin.to_string(),
            })
            .send()?;
        expect_success(resp)
    }

    fn delete_employee(&self, token: &str, employee_id: i64) -> AppResult<()> {
        let url = self.http.url(&format!("admin/employees/{employee_id}/"));
        debug!(%url, "DELETE (admin)");
        let resp = self.http.client().delete(&url).bearer_auth(token).send()?;
        expect_success(resp)
    }
}
