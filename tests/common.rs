#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::Utc;
use rtimeclock::api::{
    AdminApi, ClockApi, ClockStartRequest, EntryFilters, EntryUpdate, InsightsFilters,
    InterruptedStartRequest, InterruptedStopResponse, PhotoApi, ReportApi, SessionStartRequest,
    SessionStopRequest, SessionSwitchRequest, SessionSwitchResponse, VerifyPinResponse,
};
use rtimeclock::errors::{AppError, AppResult};
use rtimeclock::models::insights::{Patterns, RoleHoursReport, TagDistribution};
use rtimeclock::models::{
    ActivityTag, AdminEmployee, Employee, EmployeeRef, JobCategory, JobCode, NewEmployee,
    PausedEntry, PhotoFile, TimeEntry, TimeEntryPhoto,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

pub fn rti() -> Command {
    cargo_bin_cmd!("rtimeclock")
}

/// Binary pointed at an isolated home and store; the API address is
/// unroutable so any accidental request fails fast.
pub fn rti_in(home: &Path) -> Command {
    let store = home.join("store.sqlite").to_string_lossy().to_string();
    let mut cmd = rti();
    cmd.env("HOME", home)
        .env_remove("RTIMECLOCK_API_URL")
        .args(["--store", &store, "--api", "http://127.0.0.1:9/api/v1"]);
    cmd
}

// ---------------------------
// Fixtures
// ---------------------------

pub fn employee(id: i64, first: &str, has_pin: bool) -> Employee {
    Employee {
        id,
        gusto_id: None,
        first_name: first.to_string(),
        last_name: "Tester".to_string(),
        full_name: format!("{first} Tester"),
        email: String::new(),
        is_active: true,
        has_pin,
    }
}

pub fn kitchen() -> JobCategory {
    JobCategory {
        id: 1,
        name: "Kitchen".into(),
        alias: String::new(),
        is_active: true,
        job_codes: vec![],
    }
}

pub fn wrp() -> JobCategory {
    JobCategory {
        id: 2,
        name: "WRP".into(),
        alias: String::new(),
        is_active: true,
        job_codes: vec![JobCode {
            id: 20,
            name: "Maple St".into(),
            alias: String::new(),
            is_active: true,
        }],
    }
}

pub fn tag(id: i64, name: &str) -> ActivityTag {
    ActivityTag {
        id,
        name: name.into(),
        description: String::new(),
        role: None,
        role_name: None,
        is_active: true,
        color: "#3B82F6".into(),
    }
}

pub fn photo(name: &str) -> PhotoFile {
    PhotoFile {
        file_name: name.into(),
        content_type: Some("image/jpeg".into()),
        bytes: vec![1, 2, 3],
    }
}

// ---------------------------
// In-memory backend
// ---------------------------

#[derive(Debug, Default)]
pub struct FakeState {
    pub employees: Vec<Employee>,
    pub categories: Vec<JobCategory>,
    pub tags: Vec<ActivityTag>,
    pub pins: HashMap<i64, String>,
    pub entries: Vec<TimeEntry>,
    pub photos: Vec<TimeEntryPhoto>,
    pub failing_photos: HashSet<String>,
    pub admin_key: Option<String>,
    pub last_performer: Option<String>,
    pub calls: Vec<String>,
    next_id: i64,
}

/// Shared-state fake of the backend. Clones see the same data, so a test
/// can keep one handle while the state machine owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    pub state: Rc<RefCell<FakeState>>,
}

fn bad_request(message: &str) -> AppError {
    AppError::Api {
        status: 400,
        message: message.to_string(),
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        let fake = Self::default();
        {
            let mut s = fake.state.borrow_mut();
            s.employees = vec![employee(1, "Pat", false), employee(2, "Sam", true)];
            s.pins.insert(2, "1234".into());
            s.categories = vec![kitchen(), wrp()];
            s.tags = vec![tag(1, "Prep"), tag(2, "Cleanup"), tag(3, "Training")];
            s.next_id = 100;
        }
        fake
    }

    pub fn calls(&self, name: &str) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == name).count()
    }

    pub fn call_log(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn entry(&self, id: i64) -> Option<TimeEntry> {
        self.state
            .borrow()
            .entries
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    /// Entries that are running and not paused.
    pub fn running(&self) -> Vec<TimeEntry> {
        self.state
            .borrow()
            .entries
            .iter()
            .filter(|e| e.end_time.is_none() && !e.is_paused)
            .cloned()
            .collect()
    }

    fn record(&self, call: &str) {
        self.state.borrow_mut().calls.push(call.to_string());
    }

    fn new_entry(
        s: &mut FakeState,
        employee: Option<i64>,
        category_id: Option<i64>,
        code_id: Option<i64>,
    ) -> AppResult<TimeEntry> {
        let (category, code) = match (category_id, code_id) {
            (_, Some(code)) => {
                let cat = s
                    .categories
                    .iter()
                    .find(|c| c.job_code(code).is_some())
                    .cloned()
                    .ok_or_else(|| bad_request("Job code not found"))?;
                let jc = cat.job_code(code).cloned();
                (Some(cat), jc)
            }
            (Some(id), None) => {
                let cat = s
                    .categories
                    .iter()
                    .find(|c| c.id == id)
                    .cloned()
                    .ok_or_else(|| bad_request("Job category not found"))?;
                (Some(cat), None)
            }
            (None, None) => (None, None),
        };

        s.next_id += 1;
        let display = match (&category, &code) {
            (Some(c), Some(jc)) => format!("{} - {}", c.name, jc.name),
            (Some(c), None) => c.name.clone(),
            _ => "No job".into(),
        };
        let entry = TimeEntry {
            id: s.next_id,
            employee: employee.map(EmployeeRef::Id),
            employee_name: s.last_performer.clone(),
            job_category: category.as_ref().map(|c| c.id),
            job_code: code.as_ref().map(|c| c.id),
            job_display_name: display,
            start_time: Utc::now(),
            end_time: None,
            duration_seconds: 0.0,
            is_active: true,
            description: String::new(),
            activity_tags: vec![],
            is_interruption: false,
            interrupted_entry: None,
            is_paused: false,
            interruption_reason: String::new(),
            job_category_detail: category,
            job_code_detail: code,
            paused_entry: None,
            photos: vec![],
        };
        s.entries.push(entry.clone());
        Ok(entry)
    }

    fn close(e: &mut TimeEntry) {
        let now = Utc::now();
        e.end_time = Some(now);
        e.is_active = false;
        e.duration_seconds = (now - e.start_time).num_milliseconds() as f64 / 1000.0;
    }

    fn find_running(s: &mut FakeState, employee: Option<i64>) -> Option<&mut TimeEntry> {
        s.entries.iter_mut().find(|e| {
            e.end_time.is_none() && !e.is_paused && e.employee.as_ref().map(|r| r.id()) == employee
        })
    }

    fn check_admin(&self, token: &str) -> AppResult<()> {
        match &self.state.borrow().admin_key {
            None => Err(AppError::Api {
                status: 503,
                message: "Admin API not configured".into(),
            }),
            Some(k) if k == token => Ok(()),
            Some(_) => Err(AppError::Api {
                status: 401,
                message: "Invalid token".into(),
            }),
        }
    }
}

impl ClockApi for FakeBackend {
    fn employees(&self) -> AppResult<Vec<Employee>> {
        self.record("employees");
        Ok(self.state.borrow().employees.clone())
    }

    fn job_categories(&self) -> AppResult<Vec<JobCategory>> {
        self.record("job_categories");
        Ok(self.state.borrow().categories.clone())
    }

    fn current_entry(&self, employee_id: i64) -> AppResult<Option<TimeEntry>> {
        self.record("current_entry");
        let mut s = self.state.borrow_mut();
        Ok(Self::find_running(&mut s, Some(employee_id)).map(|e| e.clone()))
    }

    fn clock_start(&self, req: &ClockStartRequest) -> AppResult<TimeEntry> {
        self.record("clock_start");
        let mut s = self.state.borrow_mut();
        if let Some(active) = Self::find_running(&mut s, Some(req.employee_id)) {
            Self::close(active);
        }
        let mut entry =
            Self::new_entry(&mut s, Some(req.employee_id), req.job_category_id, req.job_code_id)?;
        entry.description = req.description.clone().unwrap_or_default();
        if let Some(stored) = s.entries.iter_mut().find(|e| e.id == entry.id) {
            stored.description = entry.description.clone();
        }
        Ok(entry)
    }

    fn clock_stop(&self, employee_id: i64) -> AppResult<TimeEntry> {
        self.record("clock_stop");
        let mut s = self.state.borrow_mut();
        let active = Self::find_running(&mut s, Some(employee_id))
            .ok_or_else(|| bad_request("No active time entry found"))?;
        if active.is_interruption {
            return Err(bad_request("Use interrupted-stop to end an interruption"));
        }
        Self::close(active);
        Ok(active.clone())
    }

    fn interrupted_start(&self, req: &InterruptedStartRequest) -> AppResult<TimeEntry> {
        self.record("interrupted_start");
        let mut s = self.state.borrow_mut();
        let paused = {
            let active = Self::find_running(&mut s, Some(req.employee_id))
                .ok_or_else(|| bad_request("No active time entry to interrupt"))?;
            if active.is_interruption {
                return Err(bad_request("Cannot interrupt an interruption"));
            }
            active.is_paused = true;
            PausedEntry {
                id: active.id,
                job_display_name: active.job_display_name.clone(),
                start_time: active.start_time,
            }
        };

        let entry = Self::new_entry(
            &mut s,
            Some(req.employee_id),
            req.job_category_id,
            req.job_code_id,
        )?;
        let stored = s
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| bad_request("lost entry"))?;
        stored.is_interruption = true;
        stored.interrupted_entry = Some(paused.id);
        stored.interruption_reason = req.reason.clone();
        stored.paused_entry = Some(paused);
        Ok(stored.clone())
    }

    fn interrupted_stop(&self, employee_id: i64) -> AppResult<InterruptedStopResponse> {
        self.record("interrupted_stop");
        let mut s = self.state.borrow_mut();
        let interruption = Self::find_running(&mut s, Some(employee_id))
            .filter(|e| e.is_interruption)
            .ok_or_else(|| bad_request("No active interruption found"))?;
        Self::close(interruption);
        let closed = interruption.clone();

        let resumed = match closed.interrupted_entry {
            Some(pid) => s
                .entries
                .iter_mut()
                .find(|e| e.id == pid)
                .map(|e| {
                    e.is_paused = false;
                    e.clone()
                }),
            None => None,
        };
        Ok(InterruptedStopResponse {
            closed_interruption: closed,
            resumed_entry: resumed,
        })
    }

    fn active_session(&self) -> AppResult<Option<TimeEntry>> {
        self.record("active_session");
        let mut s = self.state.borrow_mut();
        Ok(Self::find_running(&mut s, None).map(|e| e.clone()))
    }

    fn session_start(&self, req: &SessionStartRequest) -> AppResult<TimeEntry> {
        self.record("session_start");
        let mut s = self.state.borrow_mut();
        if Self::find_running(&mut s, None).is_some() {
            return Err(bad_request("A session is already active"));
        }
        s.last_performer = req.performer_name.clone();
        let entry = Self::new_entry(&mut s, None, Some(req.role_id), req.job_code_id)?;
        let tags: Vec<ActivityTag> = s
            .tags
            .iter()
            .filter(|t| req.activity_tag_ids.contains(&t.id))
            .cloned()
            .collect();
        let stored = s
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| bad_request("lost entry"))?;
        stored.activity_tags = tags;
        Ok(stored.clone())
    }

    fn session_stop(&self, req: &SessionStopRequest) -> AppResult<TimeEntry> {
        self.record("session_stop");
        let mut s = self.state.borrow_mut();
        let active = s
            .entries
            .iter_mut()
            .find(|e| {
                e.end_time.is_none()
                    && e.employee.is_none()
                    && req.session_id.is_none_or(|id| id == e.id)
            })
            .ok_or_else(|| bad_request("No active session"))?;
        Self::close(active);
        Ok(active.clone())
    }

    fn session_switch(&self, req: &SessionSwitchRequest) -> AppResult<SessionSwitchResponse> {
        self.record("session_switch");
        let mut s = self.state.borrow_mut();
        let mut ended = Vec::new();
        for e in s
            .entries
            .iter_mut()
            .filter(|e| e.end_time.is_none() && e.employee.is_none())
        {
            Self::close(e);
            ended.push(e.clone());
        }
        s.last_performer = req.performer_name.clone();
        let new_session = Self::new_entry(&mut s, None, Some(req.role_id), req.job_code_id)?;
        Ok(SessionSwitchResponse {
            ended_sessions: ended,
            new_session,
        })
    }

    fn activity_tags(&self) -> AppResult<Vec<ActivityTag>> {
        self.record("activity_tags");
        Ok(self.state.borrow().tags.clone())
    }

    fn tags_for_role(&self, role_id: i64) -> AppResult<Vec<ActivityTag>> {
        self.record("tags_for_role");
        Ok(self
            .state
            .borrow()
            .tags
            .iter()
            .filter(|t| t.role.is_none_or(|r| r == role_id))
            .cloned()
            .collect())
    }

    fn update_session_tags(&self, session_id: i64, tag_ids: &[i64]) -> AppResult<TimeEntry> {
        self.record("update_session_tags");
        let mut s = self.state.borrow_mut();
        let tags: Vec<ActivityTag> = tag_ids
            .iter()
            .filter_map(|id| s.tags.iter().find(|t| t.id == *id).cloned())
            .collect();
        let entry = s
            .entries
            .iter_mut()
            .find(|e| e.id == session_id)
            .ok_or_else(|| bad_request("Session not found"))?;
        entry.activity_tags = tags;
        Ok(entry.clone())
    }

    fn verify_pin(&self, employee_id: i64, pin: &str) -> AppResult<VerifyPinResponse> {
        self.record("verify_pin");
        let s = self.state.borrow();
        let ok = s.pins.get(&employee_id).is_some_and(|p| p == pin);
        Ok(VerifyPinResponse {
            valid: ok,
            employee: if ok {
                s.employees.iter().find(|e| e.id == employee_id).cloned()
            } else {
                None
            },
            error: None,
        })
    }
}

impl PhotoApi for FakeBackend {
    fn upload_photo(
        &self,
        entry_id: i64,
        photo: &PhotoFile,
        caption: Option<&str>,
    ) -> AppResult<TimeEntryPhoto> {
        self.record("upload_photo");
        let mut s = self.state.borrow_mut();
        if s.failing_photos.contains(&photo.file_name) {
            return Err(AppError::Api {
                status: 500,
                message: "storage unavailable".into(),
            });
        }
        if !s.entries.iter().any(|e| e.id == entry_id) {
            return Err(bad_request("Time entry not found"));
        }
        s.next_id += 1;
        let p = TimeEntryPhoto {
            id: s.next_id,
            time_entry: entry_id,
            image_url: format!("/media/{}", photo.file_name),
            caption: caption.unwrap_or_default().to_string(),
            created_at: Utc::now(),
        };
        s.photos.push(p.clone());
        Ok(p)
    }

    fn delete_photo(&self, photo_id: i64) -> AppResult<()> {
        self.record("delete_photo");
        self.state.borrow_mut().photos.retain(|p| p.id != photo_id);
        Ok(())
    }
}

impl ReportApi for FakeBackend {
    fn time_entries(&self, filters: &EntryFilters) -> AppResult<Vec<TimeEntry>> {
        self.record("time_entries");
        Ok(self
            .state
            .borrow()
            .entries
            .iter()
            .filter(|e| filters.employee.is_none() || e.employee_id() == filters.employee)
            .cloned()
            .collect())
    }

    fn time_entry(&self, id: i64) -> AppResult<TimeEntry> {
        self.record("time_entry");
        self.entry(id).ok_or_else(|| AppError::Api {
            status: 404,
            message: "Not found.".into(),
        })
    }

    fn update_time_entry(&self, id: i64, update: &EntryUpdate) -> AppResult<TimeEntry> {
        self.record("update_time_entry");
        let mut s = self.state.borrow_mut();
        let e = s
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| bad_request("Not found"))?;
        if let Some(t) = update.start_time {
            e.start_time = t;
        }
        if let Some(t) = update.end_time {
            e.end_time = Some(t);
        }
        if let Some(d) = &update.description {
            e.description = d.clone();
        }
        Ok(e.clone())
    }

    fn delete_time_entry(&self, id: i64) -> AppResult<()> {
        self.record("delete_time_entry");
        self.state.borrow_mut().entries.retain(|e| e.id != id);
        Ok(())
    }

    fn role_hours(&self, filters: &InsightsFilters) -> AppResult<RoleHoursReport> {
        self.record(if filters.role_id.is_some() {
            "role_hours_filtered"
        } else {
            "role_hours"
        });
        Ok(RoleHoursReport { role_hours: vec![] })
    }

    fn tag_distribution(&self, _filters: &InsightsFilters) -> AppResult<TagDistribution> {
        self.record("tag_distribution");
        Ok(TagDistribution {
            tag_distribution: vec![],
            sessions_without_tags: 0,
            total_sessions: 0,
        })
    }

    fn patterns(&self, _filters: &InsightsFilters) -> AppResult<Patterns> {
        self.record("patterns");
        Ok(Patterns {
            hour_distribution: vec![],
            day_distribution: vec![],
        })
    }
}

impl AdminApi for FakeBackend {
    fn list_employees(&self, token: &str) -> AppResult<Vec<AdminEmployee>> {
        self.record("admin_list");
        self.check_admin(token)?;
        let s = self.state.borrow();
        Ok(s.employees
            .iter()
            .map(|e| AdminEmployee {
                id: e.id,
                first_name: e.first_name.clone(),
                last_name: e.last_name.clone(),
                full_name: e.full_name.clone(),
                email: e.email.clone(),
                is_active: e.is_active,
                has_pin: s.pins.contains_key(&e.id),
            })
            .collect())
    }

    fn add_employee(&self, token: &str, employee: &NewEmployee) -> AppResult<AdminEmployee> {
        self.record("admin_add");
        self.check_admin(token)?;
        let mut s = self.state.borrow_mut();
        s.next_id += 1;
        let id = s.next_id;
        let mut e = self::employee(id, &employee.first_name, employee.pin.is_some());
        e.last_name = employee.last_name.clone();
        e.full_name = format!("{} {}", employee.first_name, employee.last_name);
        e.email = employee.email.clone().unwrap_or_default();
        if let Some(pin) = &employee.pin {
            s.pins.insert(id, pin.clone());
        }
        s.employees.push(e.clone());
        Ok(AdminEmployee {
            id,
            first_name: e.first_name,
            last_name: e.last_name,
            full_name: e.full_name,
            email: e.email,
            is_active: true,
            has_pin: e.has_pin,
        })
    }

    fn set_pin(&self, token: &str, employee_id: i64, pin: &str) -> AppResult<()> {
        self.record("admin_set_pin");
        self.check_admin(token)?;
        let mut s = self.state.borrow_mut();
        s.pins.insert(employee_id, pin.to_string());
        if let Some(e) = s.employees.iter_mut().find(|e| e.id == employee_id) {
            e.has_pin = true;
        }
        Ok(())
    }

    fn delete_employee(&self, token: &str, employee_id: i64) -> AppResult<()> {
        self.record("admin_delete");
        self.check_admin(token)?;
        self.state
            .borrow_mut()
            .employees
            .retain(|e| e.id != employee_id);
        Ok(())
    }
}
