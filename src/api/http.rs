//! Blocking HTTP client for the `/api/v1` backend.

use super::{
    ActiveSessionResponse, ClockApi, ClockStartRequest, CurrentEntryResponse, EmployeeRequest,
    EntryFilters, EntryUpdate, InsightsFilters, InterruptedStartRequest, InterruptedStopResponse,
    ListResponse, PhotoApi, ReportApi, SessionStartRequest, SessionStopRequest,
    SessionSwitchRequest, SessionSwitchResponse, TagUpdateRequest, VerifyPinRequest,
    VerifyPinResponse,
};
use crate::errors::{AppError, AppResult};
use crate::models::insights::{Patterns, RoleHoursReport, TagDistribution};
use crate::models::{ActivityTag, Employee, JobCategory, PhotoFile, TimeEntry, TimeEntryPhoto};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response, multipart};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

pub struct HttpApi {
    client: Client,
    base: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> AppResult<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        read_json(self.client.get(&url).query(query).send()?)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> AppResult<T> {
        let url = self.url(path);
        debug!(%url, "POST");
        read_json(self.client.post(&url).json(body).send()?)
    }

    fn delete(&self, path: &str) -> AppResult<()> {
        let url = self.url(path);
        debug!(%url, "DELETE");
        expect_success(self.client.delete(&url).send()?)
    }
}

/// Decode a successful body, or turn the status + body into `AppError::Api`.
pub(crate) fn read_json<T: DeserializeOwned>(resp: Response) -> AppResult<T> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json()?);
    }
    Err(api_error(status, &resp.text().unwrap_or_default()))
}

pub(crate) fn expect_success(resp: Response) -> AppResult<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    Err(api_error(status, &resp.text().unwrap_or_default()))
}

/// The backend reports failures as `{"error": ...}` or DRF's `{"detail": ...}`.
pub(crate) fn api_error(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("detail"))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });
    warn!(status = status.as_u16(), %message, "backend returned an error");
    AppError::Api {
        status: status.as_u16(),
        message,
    }
}

impl ClockApi for HttpApi {
    fn employees(&self) -> AppResult<Vec<Employee>> {
        let list: ListResponse<Employee> = self.get("employees/", &[])?;
        Ok(list.into_vec())
    }

    fn job_categories(&self) -> AppResult<Vec<JobCategory>> {
        let list: ListResponse<JobCategory> = self.get("jobs/categories/", &[])?;
        Ok(list.into_vec())
    }

    fn current_entry(&self, employee_id: i64) -> AppResult<Option<TimeEntry>> {
        let resp: CurrentEntryResponse =
            self.get(&format!("employees/{employee_id}/current_entry/"), &[])?;
        Ok(resp.current_entry)
    }

    fn clock_start(&self, req: &ClockStartRequest) -> AppResult<TimeEntry> {
        self.post("clock/start/", req)
    }

    fn clock_stop(&self, employee_id: i64) -> AppResult<TimeEntry> {
        self.post("clock/stop/", &EmployeeRequest { employee_id })
    }

    fn interrupted_start(&self, req: &InterruptedStartRequest) -> AppResult<TimeEntry> {
        self.post("clock/interrupted-start/", req)
    }

    fn interrupted_stop(&self, employee_id: i64) -> AppResult<InterruptedStopResponse> {
        self.post("clock/interrupted-stop/", &EmployeeRequest { employee_id })
    }

    fn active_session(&self) -> AppResult<Option<TimeEntry>> {
        let resp: ActiveSessionResponse = self.get("sessions/active/", &[])?;
        Ok(resp.active_session)
    }

    fn session_start(&self, req: &SessionStartRequest) -> AppResult<TimeEntry> {
        self.post("sessions/start/", req)
    }

    fn session_stop(&self, req: &SessionStopRequest) -> AppResult<TimeEntry> {
        self.post("sessions/stop/", req)
    }

    fn session_switch(&self, req: &SessionSwitchRequest) -> AppResult<SessionSwitchResponse> {
        self.post("sessions/switch/", req)
    }

    fn activity_tags(&self) -> AppResult<Vec<ActivityTag>> {
        let list: ListResponse<ActivityTag> = self.get("activity-tags/", &[])?;
        Ok(list.into_vec())
    }

    fn tags_for_role(&self, role_id: i64) -> AppResult<Vec<ActivityTag>> {
        let list: ListResponse<ActivityTag> = self.get(&format!("roles/{role_id}/tags/"), &[])?;
        Ok(list.into_vec())
    }

    fn update_session_tags(&self, session_id: i64, tag_ids: &[i64]) -> AppResult<TimeEntry> {
        self.post(
            &format!("sessions/{session_id}/tags/"),
            &TagUpdateRequest {
                tag_ids: tag_ids.to_vec(),
            },
        )
    }

    fn verify_pin(&self, employee_id: i64, pin: &str) -> AppResult<VerifyPinResponse> {
        let url = self.url("auth/verify-pin/");
        debug!(%url, employee_id, "POST");
        let resp = self
            .client
            .post(&url)
            .json(&VerifyPinRequest {
                employee_id,
                pin: pin.to_string(),
            })
            .send()?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json()?);
        }

        // A rejected PIN comes back as 4xx with `{"valid": false, "error": ...}`
        let body = resp.text().unwrap_or_default();
        if status.is_client_error() {
            if let Ok(parsed) = serde_json::from_str::<VerifyPinResponse>(&body) {
                return Ok(parsed);
            }
        }
        Err(api_error(status, &body))
    }
}

impl PhotoApi for HttpApi {
    fn upload_photo(
        &self,
        entry_id: i64,
        photo: &PhotoFile,
        caption: Option<&str>,
    ) -> AppResult<TimeEntryPhoto> {
        let mut part =
            multipart::Part::bytes(photo.bytes.clone()).file_name(photo.file_name.clone());
        if let Some(ct) = &photo.content_type {
            part = part.mime_str(ct)?;
        }

        let mut form = multipart::Form::new()
            .text("time_entry", entry_id.to_string())
            .part("image", part);
        if let Some(c) = caption.filter(|c| !c.trim().is_empty()) {
            form = form.text("caption", c.to_string());
        }

        let url = self.url("photos/");
        debug!(%url, entry_id, file = %photo.file_name, "POST multipart");
        read_json(self.client.post(&url).multipart(form).send()?)
    }

    fn delete_photo(&self, photo_id: i64) -> AppResult<()> {
        self.delete(&format!("photos/{photo_id}/"))
    }
}

impl ReportApi for HttpApi {
    fn time_entries(&self, filters: &EntryFilters) -> AppResult<Vec<TimeEntry>> {
        let list: ListResponse<TimeEntry> = self.get("time-entries/", &filters.query())?;
        Ok(list.into_vec())
    }

    fn time_entry(&self, id: i64) -> AppResult<TimeEntry> {
        self.get(&format!("time-entries/{id}/"), &[])
    }

    fn update_time_entry(&self, id: i64, update: &EntryUpdate) -> AppResult<TimeEntry> {
        let url = self.url(&format!("time-entries/{id}/"));
        debug!(%url, "PATCH");
        read_json(self.client.patch(&url).json(update).send()?)
    }

    fn delete_time_entry(&self, id: i64) -> AppResult<()> {
        self.delete(&format!("time-entries/{id}/"))
    }

    fn role_hours(&self, filters: &InsightsFilters) -> AppResult<RoleHoursReport> {
        self.get("insights/role-hours/", &filters.query())
    }

    fn tag_distribution(&self, filters: &InsightsFilters) -> AppResult<TagDistribution> {
        self.get("insights/tag-distribution/", &filters.query())
    }

    fn patterns(&self, filters: &InsightsFilters) -> AppResult<Patterns> {
        self.get("insights/patterns/", &filters.query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_prefers_error_field() {
        let err = api_error(StatusCode::BAD_REQUEST, r#"{"error":"No active time entry found"}"#);
        match err {
            AppError::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "No active time entry found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn api_error_reads_drf_detail_and_empty_bodies() {
        let err = api_error(StatusCode::FORBIDDEN, r#"{"detail":"Invalid token."}"#);
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "Server error (status 403): Invalid token.");

        let err = api_error(StatusCode::SERVICE_UNAVAILABLE, "");
        assert_eq!(
            err.to_string(),
            "Server error (status 503): Service Unavailable"
        );
    }

    #[test]
    fn url_joins_without_double_slashes() {
        let api = HttpApi::new("http://localhost:8000/api/v1/", Duration::from_secs(1)).unwrap();
        assert_eq!(api.url("/clock/start/"), "http://localhost:8000/api/v1/clock/start/");
    }
}
