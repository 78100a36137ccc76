//! Clock state machine for the employee flow.
//!
//! The rendered state is derived from three inputs: the selected employee,
//! whether a valid auth record exists for them, and the active entry last
//! reported by the server. Every action checks the derived state first and
//! fails with `InvalidTransition` before any request when it is not allowed.

use crate::api::{
    ClockApi, ClockStartRequest, InterruptedStartRequest, InterruptedStopResponse, PhotoApi,
    VerifyPinResponse,
};
use crate::core::auth::{self, AuthRecord, PinPad};
use crate::core::pending::PendingGuard;
use crate::core::photos::{self, PhotoBatch, PhotoOutcome};
use crate::core::poll::{PollToken, PollTracker};
use crate::core::tags::{TagOverride, TagRequest};
use crate::errors::{AppError, AppResult};
use crate::models::{Employee, JobSelection, PausedEntry, TimeEntry};
use crate::store::{KeyValueStore, keys};
use crate::utils::time::TimeSource;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ClockState {
    NoEmployeeSelected,
    AwaitingAuthentication {
        employee: Employee,
    },
    AuthenticatedIdle {
        employee: Employee,
    },
    ActiveNormal {
        employee: Employee,
        entry: TimeEntry,
    },
    ActiveInterruption {
        employee: Employee,
        entry: TimeEntry,
        paused: Option<PausedEntry>,
    },
}

impl ClockState {
    pub fn employee(&self) -> Option<&Employee> {
        match self {
            ClockState::NoEmployeeSelected => None,
            ClockState::AwaitingAuthentication { employee }
            | ClockState::AuthenticatedIdle { employee }
            | ClockState::ActiveNormal { employee, .. }
            | ClockState::ActiveInterruption { employee, .. } => Some(employee),
        }
    }

    pub fn entry(&self) -> Option<&TimeEntry> {
        match self {
            ClockState::ActiveNormal { entry, .. } | ClockState::ActiveInterruption { entry, .. } => {
                Some(entry)
            }
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !matches!(
            self,
            ClockState::NoEmployeeSelected | ClockState::AwaitingAuthentication { .. }
        )
    }
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClockState::NoEmployeeSelected => "no employee is selected",
            ClockState::AwaitingAuthentication { .. } => "awaiting PIN entry",
            ClockState::AuthenticatedIdle { .. } => "clocked out",
            ClockState::ActiveNormal { .. } => "clocked in",
            ClockState::ActiveInterruption { .. } => "on an interruption",
        };
        f.write_str(s)
    }
}

/// Actions covered by the in-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockAction {
    SubmitPin,
    Start,
    Stop,
    Switch,
    Interrupt,
    Resume,
}

impl fmt::Display for ClockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClockAction::SubmitPin => "PIN",
            ClockAction::Start => "start",
            ClockAction::Stop => "stop",
            ClockAction::Switch => "switch",
            ClockAction::Interrupt => "interruption",
            ClockAction::Resume => "resume",
        };
        f.write_str(s)
    }
}

/// A created entry plus the per-file result of the photo uploads that
/// followed it.
#[derive(Debug)]
pub struct StartOutcome {
    pub entry: TimeEntry,
    pub photos: Vec<PhotoOutcome>,
}

type Listener = Box<dyn FnMut(&ClockState)>;

pub struct ClockMachine<A, S, T> {
    api: A,
    store: S,
    clock: T,
    employee: Option<Employee>,
    current: Option<TimeEntry>,
    pin: PinPad,
    polls: PollTracker,
    pending: PendingGuard<ClockAction>,
    tags: TagOverride,
    listeners: Vec<Listener>,
}

impl<A, S, T> ClockMachine<A, S, T>
where
    A: ClockApi + PhotoApi,
    S: KeyValueStore,
    T: TimeSource,
{
    pub fn new(api: A, store: S, clock: T) -> Self {
        Self {
            api,
            store,
            clock,
            employee: None,
            current: None,
            pin: PinPad::default(),
            polls: PollTracker::default(),
            pending: PendingGuard::default(),
            tags: TagOverride::default(),
            listeners: Vec::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Listeners are called with the derived state after every change.
    pub fn subscribe(&mut self, listener: impl FnMut(&ClockState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        let state = self.state();
        for l in self.listeners.iter_mut() {
            l(&state);
        }
    }

    // ---------------------------
    // Derived state
    // ---------------------------

    pub fn state(&self) -> ClockState {
        let Some(employee) = self.employee.clone() else {
            return ClockState::NoEmployeeSelected;
        };
        if !self.is_authenticated() {
            return ClockState::AwaitingAuthentication { employee };
        }
        match self.current.clone() {
            None => ClockState::AuthenticatedIdle { employee },
            Some(entry) if entry.is_interruption => {
                let paused = entry.paused_entry.clone();
                ClockState::ActiveInterruption {
                    employee,
                    entry,
                    paused,
                }
            }
            Some(entry) => ClockState::ActiveNormal { employee, entry },
        }
    }

    /// PIN-less employees are always authenticated; everyone else needs an
    /// unexpired record for their own id.
    pub fn is_authenticated(&self) -> bool {
        let Some(employee) = &self.employee else {
            return false;
        };
        if !employee.has_pin {
            return true;
        }
        match auth::is_authenticated_for(&self.store, employee.id, self.clock.now_millis()) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "could not read auth record");
                false
            }
        }
    }

    pub fn employee(&self) -> Option<&Employee> {
        self.employee.as_ref()
    }

    pub fn current_entry(&self) -> Option<&TimeEntry> {
        self.current.as_ref()
    }

    /// Seconds on the active entry's timer.
    pub fn elapsed_seconds(&self) -> Option<i64> {
        self.current
            .as_ref()
            .map(|e| e.elapsed_seconds(self.clock.now()))
    }

    pub fn displayed_tags(&self) -> &[i64] {
        self.tags.displayed()
    }

    pub fn pin_pad(&self) -> &PinPad {
        &self.pin
    }

    pub fn pin_pad_mut(&mut self) -> &mut PinPad {
        &mut self.pin
    }

    // ---------------------------
    // In-flight guard
    // ---------------------------
    //
    // Every guarded action comes as `prepare_*`, which validates, takes the
    // guard and returns the request to send, and `complete_*`, which
    // releases the guard and applies the response. The one-call methods
    // below chain the two around a blocking request.

    pub fn pending_action(&self) -> Option<ClockAction> {
        self.pending.current()
    }

    fn release(&mut self, action: ClockAction) -> AppResult<()> {
        match self.pending.current() {
            Some(a) if a == action => {
                self.pending.finish();
                Ok(())
            }
            _ => Err(AppError::transition(
                &format!("complete {action}"),
                "no such request is pending",
            )),
        }
    }

    /// Install the entry returned by a mutation; polls issued before it are
    /// stale from now on.
    fn apply_mutation(&mut self, entry: Option<TimeEntry>) {
        self.polls.supersede();
        self.current = entry;
        self.tags.observe(self.current.as_ref());
        self.notify();
    }

    // ---------------------------
    // Employee selection and authentication
    // ---------------------------

    /// Re-select the employee remembered in the store, if they still exist.
    pub fn restore(&mut self) -> AppResult<ClockState> {
        let Some(raw) = self.store.get(keys::SELECTED_EMPLOYEE)? else {
            return Ok(self.state());
        };
        let Ok(id) = raw.trim().parse::<i64>() else {
            warn!(value = %raw, "discarding unreadable employee selection");
            self.store.remove(keys::SELECTED_EMPLOYEE)?;
            return Ok(self.state());
        };

        match self.api.employees()?.into_iter().find(|e| e.id == id) {
            Some(employee) => {
                debug!(employee_id = id, "restored employee selection");
                self.employee = Some(employee);
                self.notify();
                self.refresh()
            }
            None => {
                warn!(employee_id = id, "remembered employee no longer exists");
                self.store.remove(keys::SELECTED_EMPLOYEE)?;
                auth::clear_auth(&self.store)?;
                Ok(self.state())
            }
        }
    }

    /// Select `employee`. Changing to a different employee drops the
    /// previous auth record; PIN-less employees are authenticated at once.
    pub fn select_employee(&mut self, employee: Employee) -> AppResult<ClockState> {
        let changed = self.employee.as_ref().is_none_or(|e| e.id != employee.id);
        if changed {
            auth::clear_auth(&self.store)?;
            self.current = None;
            self.tags.observe(None);
            self.pin.clear();
        }

        self.store
            .set(keys::SELECTED_EMPLOYEE, &employee.id.to_string())?;

        if !employee.has_pin {
            let record = AuthRecord::new(employee.id, self.clock.now_millis());
            auth::save_auth(&self.store, &record)?;
        }

        info!(employee_id = employee.id, has_pin = employee.has_pin, "employee selected");
        self.employee = Some(employee);
        self.notify();
        self.refresh()
    }

    pub fn select_employee_by_id(&mut self, employee_id: i64) -> AppResult<ClockState> {
        let employee = self
            .api
            .employees()?
            .into_iter()
            .find(|e| e.id == employee_id)
            .ok_or_else(|| AppError::Validation(format!("Unknown employee {employee_id}")))?;
        self.select_employee(employee)
    }

    /// Check the PIN format and take the guard. Returns the employee id to
    /// verify against.
    pub fn prepare_pin(&mut self, pin: &str) -> AppResult<i64> {
        let state = self.state();
        let ClockState::AwaitingAuthentication { employee } = &state else {
            return Err(AppError::transition("submit a PIN", &state));
        };
        let employee_id = employee.id;

        if let Err(e) = auth::validate_pin_format(pin) {
            self.pin.clear();
            return Err(e);
        }
        self.pending.begin(ClockAction::SubmitPin)?;
        Ok(employee_id)
    }

    /// A rejection leaves the state unchanged, clears the keypad and stores
    /// nothing.
    pub fn complete_pin(
        &mut self,
        employee_id: i64,
        result: AppResult<VerifyPinResponse>,
    ) -> AppResult<ClockState> {
        self.release(ClockAction::SubmitPin)?;
        self.pin.clear();
        let resp = result?;

        if self.employee.as_ref().is_none_or(|e| e.id != employee_id) {
            debug!(employee_id, "discarding PIN result for a previous selection");
            return Ok(self.state());
        }

        if !resp.valid {
            let message = resp
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Invalid PIN".to_string());
            info!(employee_id, "PIN rejected");
            return Err(AppError::InvalidPin(message));
        }

        let record = AuthRecord::new(employee_id, self.clock.now_millis());
        auth::save_auth(&self.store, &record)?;
        info!(employee_id, "PIN accepted");
        self.notify();
        self.refresh()
    }

    /// Verify a four-digit PIN.
    pub fn submit_pin(&mut self, pin: &str) -> AppResult<ClockState> {
        let employee_id = self.prepare_pin(pin)?;
        let result = self.api.verify_pin(employee_id, pin);
        self.complete_pin(employee_id, result)
    }

    /// Submit whatever is on the keypad.
    pub fn submit_pin_pad(&mut self) -> AppResult<ClockState> {
        let pin = self.pin.value().to_string();
        self.submit_pin(&pin)
    }

    /// Forget the selection and the auth record.
    pub fn logout(&mut self) -> AppResult<()> {
        auth::clear_auth(&self.store)?;
        self.store.remove(keys::SELECTED_EMPLOYEE)?;
        if let Some(e) = self.employee.take() {
            info!(employee_id = e.id, "logged out");
        }
        self.current = None;
        self.pin.clear();
        self.tags.observe(None);
        self.polls.supersede();
        self.notify();
        Ok(())
    }

    // ---------------------------
    // Polling
    // ---------------------------

    pub fn begin_poll(&mut self) -> PollToken {
        self.polls.begin()
    }

    /// Apply a fetched current entry unless a newer poll or a mutation got
    /// there first. Returns whether the result was applied.
    pub fn apply_poll(&mut self, token: PollToken, entry: Option<TimeEntry>) -> bool {
        if !self.polls.accept(token) {
            debug!(?token, "discarding stale poll result");
            return false;
        }
        if self.current != entry {
            debug!(entry_id = ?entry.as_ref().map(|e| e.id), "server state changed");
        }
        self.current = entry;
        self.tags.observe(self.current.as_ref());
        self.notify();
        true
    }

    /// Fetch the current entry for the authenticated employee.
    pub fn refresh(&mut self) -> AppResult<ClockState> {
        let Some(employee_id) = self.employee.as_ref().map(|e| e.id) else {
            return Ok(self.state());
        };
        if !self.is_authenticated() {
            if self.current.take().is_some() {
                self.notify();
            }
            return Ok(self.state());
        }

        let token = self.begin_poll();
        let entry = self.api.current_entry(employee_id)?;
        self.apply_poll(token, entry);
        Ok(self.state())
    }

    // ---------------------------
    // Entry actions
    // ---------------------------

    fn require_employee_in(&self, action: &str, allowed: fn(&ClockState) -> bool) -> AppResult<i64> {
        let state = self.state();
        match state.employee() {
            Some(e) if allowed(&state) => Ok(e.id),
            _ => Err(AppError::transition(action, &state)),
        }
    }

    pub fn prepare_start(
        &mut self,
        selection: &JobSelection,
        description: Option<&str>,
    ) -> AppResult<ClockStartRequest> {
        let employee_id = self.require_employee_in("start a job", |s| {
            matches!(s, ClockState::AuthenticatedIdle { .. })
        })?;
        selection.validate()?;

        let (job_category_id, job_code_id) = selection.clock_ids();
        let req = ClockStartRequest {
            employee_id,
            job_category_id,
            job_code_id,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        };
        self.pending.begin(ClockAction::Start)?;
        Ok(req)
    }

    pub fn complete_start(&mut self, result: AppResult<TimeEntry>) -> AppResult<TimeEntry> {
        self.release(ClockAction::Start)?;
        let entry = result?;
        info!(entry_id = entry.id, job = %entry.job_display_name, "clocked in");
        self.apply_mutation(Some(entry.clone()));
        Ok(entry)
    }

    /// Clock in on `selection`; photos are uploaded one by one once the entry
    /// exists, and their failures do not undo it.
    pub fn start_job(
        &mut self,
        selection: &JobSelection,
        description: Option<&str>,
        batch: &PhotoBatch,
        caption: Option<&str>,
    ) -> AppResult<StartOutcome> {
        let req = self.prepare_start(selection, description)?;
        let result = self.api.clock_start(&req);
        let entry = self.complete_start(result)?;

        let outcomes = photos::upload_all(&self.api, entry.id, batch, caption);
        Ok(StartOutcome {
            entry,
            photos: outcomes,
        })
    }

    /// Returns the employee id to clock out.
    pub fn prepare_stop(&mut self) -> AppResult<i64> {
        let employee_id = self.require_employee_in("stop", |s| {
            matches!(s, ClockState::ActiveNormal { .. })
        })?;
        self.pending.begin(ClockAction::Stop)?;
        Ok(employee_id)
    }

    pub fn complete_stop(&mut self, result: AppResult<TimeEntry>) -> AppResult<TimeEntry> {
        self.release(ClockAction::Stop)?;
        let closed = result?;
        info!(entry_id = closed.id, "clocked out");
        self.apply_mutation(None);
        Ok(closed)
    }

    pub fn stop(&mut self) -> AppResult<TimeEntry> {
        let employee_id = self.prepare_stop()?;
        let result = self.api.clock_stop(employee_id);
        self.complete_stop(result)
    }

    /// The backend closes the active entry and opens the new one in the
    /// same request.
    pub fn prepare_switch(&mut self, selection: &JobSelection) -> AppResult<ClockStartRequest> {
        let employee_id = self.require_employee_in("switch jobs", |s| {
            matches!(s, ClockState::ActiveNormal { .. })
        })?;
        selection.validate()?;

        let (job_category_id, job_code_id) = selection.clock_ids();
        let req = ClockStartRequest {
            employee_id,
            job_category_id,
            job_code_id,
            description: None,
        };
        self.pending.begin(ClockAction::Switch)?;
        Ok(req)
    }

    pub fn complete_switch(&mut self, result: AppResult<TimeEntry>) -> AppResult<TimeEntry> {
        self.release(ClockAction::Switch)?;
        let entry = result?;
        info!(entry_id = entry.id, job = %entry.job_display_name, "switched job");
        self.apply_mutation(Some(entry.clone()));
        Ok(entry)
    }

    /// Close the active entry and open one on `selection`.
    pub fn switch_job(&mut self, selection: &JobSelection) -> AppResult<TimeEntry> {
        let req = self.prepare_switch(selection)?;
        let result = self.api.clock_start(&req);
        self.complete_switch(result)
    }

    pub fn prepare_interruption(
        &mut self,
        selection: &JobSelection,
        reason: &str,
    ) -> AppResult<InterruptedStartRequest> {
        let employee_id = self.require_employee_in("start an interruption", |s| {
            matches!(s, ClockState::ActiveNormal { .. })
        })?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AppError::Validation(
                "Please provide a reason for the interruption".into(),
            ));
        }
        selection.validate()?;

        let (job_category_id, job_code_id) = selection.clock_ids();
        let req = InterruptedStartRequest {
            employee_id,
            job_category_id,
            job_code_id,
            reason: reason.to_string(),
        };
        self.pending.begin(ClockAction::Interrupt)?;
        Ok(req)
    }

    pub fn complete_interruption(&mut self, result: AppResult<TimeEntry>) -> AppResult<TimeEntry> {
        self.release(ClockAction::Interrupt)?;
        let mut entry = result?;

        // Some responses omit the paused entry; fall back to the one we had.
        if entry.paused_entry.is_none()
            && let Some(prev) = &self.current
        {
            entry.paused_entry = Some(PausedEntry {
                id: prev.id,
                job_display_name: prev.job_display_name.clone(),
                start_time: prev.start_time,
            });
        }

        info!(entry_id = entry.id, reason = %entry.interruption_reason, "interruption started");
        self.apply_mutation(Some(entry.clone()));
        Ok(entry)
    }

    /// Pause the active entry and start an interruption on `selection`.
    pub fn start_interruption(&mut self, selection: &JobSelection, reason: &str) -> AppResult<TimeEntry> {
        let req = self.prepare_interruption(selection, reason)?;
        let result = self.api.interrupted_start(&req);
        self.complete_interruption(result)
    }

    /// Returns the employee id whose interruption ends.
    pub fn prepare_resume(&mut self) -> AppResult<i64> {
        let employee_id = self.require_employee_in("resume", |s| {
            matches!(s, ClockState::ActiveInterruption { .. })
        })?;
        self.pending.begin(ClockAction::Resume)?;
        Ok(employee_id)
    }

    /// The backend hands back the paused entry even when it was closed in
    /// the meantime; only a still-open entry becomes active again.
    pub fn complete_resume(
        &mut self,
        result: AppResult<InterruptedStopResponse>,
    ) -> AppResult<InterruptedStopResponse> {
        self.release(ClockAction::Resume)?;
        let mut resp = result?;
        if let Some(e) = resp
            .resumed_entry
            .take_if(|e| e.end_time.is_some() || e.is_paused)
        {
            warn!(entry_id = e.id, "paused entry is no longer open, nothing resumed");
        }
        info!(
            closed = resp.closed_interruption.id,
            resumed = ?resp.resumed_entry.as_ref().map(|e| e.id),
            "interruption ended"
        );
        self.apply_mutation(resp.resumed_entry.clone());
        Ok(resp)
    }

    /// End the interruption; the paused entry (if any) becomes active again.
    pub fn stop_interruption(&mut self) -> AppResult<InterruptedStopResponse> {
        let employee_id = self.prepare_resume()?;
        let result = self.api.interrupted_stop(employee_id);
        self.complete_resume(result)
    }

    // ---------------------------
    // Tags
    // ---------------------------

    /// Flip a tag on the active entry; the new set shows immediately.
    pub fn toggle_tag(&mut self, tag_id: i64) -> AppResult<TagRequest> {
        let state = self.state();
        if state.entry().is_none() {
            return Err(AppError::transition("change tags", &state));
        }
        let req = self.tags.toggle(tag_id)?;
        self.notify();
        Ok(req)
    }

    /// Resolve a tag request with the server's answer.
    pub fn apply_tag_result(&mut self, req: &TagRequest, result: AppResult<TimeEntry>) -> AppResult<()> {
        match result {
            Ok(entry) => {
                if self.tags.confirm(req.session_id, req.seq, &entry.tag_ids())
                    && self.current.as_ref().is_some_and(|c| c.id == entry.id)
                {
                    self.current = Some(entry);
                }
                self.notify();
                Ok(())
            }
            Err(e) => {
                warn!(session_id = req.session_id, seq = req.seq, error = %e, "tag update failed");
                self.tags.fail(req.session_id, req.seq);
                self.notify();
                Err(e)
            }
        }
    }

    /// Toggle and send in one step.
    pub fn update_tag(&mut self, tag_id: i64) -> AppResult<Vec<i64>> {
        let req = self.toggle_tag(tag_id)?;
        let result = self.api.update_session_tags(req.session_id, &req.tag_ids);
        self.apply_tag_result(&req, result)?;
        Ok(self.tags.displayed().to_vec())
    }
}
