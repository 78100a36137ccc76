//! Role-based session tracker.
//!
//! No employee is involved: there is one global active session, started or
//! switched by picking a role (and optionally a job code). An optional
//! performer name is remembered locally and sent along.

use crate::api::{ClockApi, SessionStartRequest, SessionStopRequest, SessionSwitchRequest};
use crate::core::pending::PendingGuard;
use crate::core::poll::{PollToken, PollTracker};
use crate::core::tags::{TagOverride, TagRequest};
use crate::errors::{AppError, AppResult};
use crate::models::{JobSelection, Session};
use crate::store::{KeyValueStore, keys};
use crate::utils::time::TimeSource;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    Start,
    Switch,
    Stop,
}

impl fmt::Display for SessionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionAction::Start => "session start",
            SessionAction::Switch => "session switch",
            SessionAction::Stop => "session stop",
        })
    }
}

/// What picking a role did.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    Started(Session),
    Switched {
        ended: Vec<Session>,
        session: Session,
    },
}

impl SessionChange {
    pub fn session(&self) -> &Session {
        match self {
            SessionChange::Started(s) => s,
            SessionChange::Switched { session, .. } => session,
        }
    }
}

/// Request built by [`SessionTracker::prepare_role`].
#[derive(Debug, Clone, PartialEq)]
pub enum RoleRequest {
    Start(SessionStartRequest),
    Switch(SessionSwitchRequest),
}

impl RoleRequest {
    pub fn action(&self) -> SessionAction {
        match self {
            RoleRequest::Start(_) => SessionAction::Start,
            RoleRequest::Switch(_) => SessionAction::Switch,
        }
    }

    pub fn send<A: ClockApi>(&self, api: &A) -> AppResult<SessionChange> {
        match self {
            RoleRequest::Start(req) => api.session_start(req).map(SessionChange::Started),
            RoleRequest::Switch(req) => api.session_switch(req).map(|resp| SessionChange::Switched {
                ended: resp.ended_sessions,
                session: resp.new_session,
            }),
        }
    }
}

type Listener = Box<dyn FnMut(Option<&Session>)>;

pub struct SessionTracker<A, S, T> {
    api: A,
    store: S,
    clock: T,
    active: Option<Session>,
    polls: PollTracker,
    pending: PendingGuard<SessionAction>,
    tags: TagOverride,
    listeners: Vec<Listener>,
}

impl<A, S, T> SessionTracker<A, S, T>
where
    A: ClockApi,
    S: KeyValueStore,
    T: TimeSource,
{
    pub fn new(api: A, store: S, clock: T) -> Self {
        Self {
            api,
            store,
            clock,
            active: None,
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

    pub fn subscribe(&mut self, listener: impl FnMut(Option<&Session>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&mut self) {
        let active = self.active.as_ref();
        for l in self.listeners.iter_mut() {
            l(active);
        }
    }

    pub fn active(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    pub fn elapsed_seconds(&self) -> Option<i64> {
        self.active
            .as_ref()
            .map(|s| s.elapsed_seconds(self.clock.now()))
    }

    pub fn displayed_tags(&self) -> &[i64] {
        self.tags.displayed()
    }

    // ---------------------------
    // Performer name
    // ---------------------------

    pub fn performer_name(&self) -> AppResult<Option<String>> {
        Ok(self
            .store
            .get(keys::PERFORMER_NAME)?
            .filter(|n| !n.trim().is_empty()))
    }

    /// An empty name removes the stored one.
    pub fn set_performer_name(&self, name: &str) -> AppResult<()> {
        self.store.set_or_remove(keys::PERFORMER_NAME, name.trim())
    }

    // ---------------------------
    // Polling
    // ---------------------------

    pub fn begin_poll(&mut self) -> PollToken {
        self.polls.begin()
    }

    pub fn apply_poll(&mut self, token: PollToken, session: Option<Session>) -> bool {
        if !self.polls.accept(token) {
            debug!(?token, "discarding stale session poll");
            return false;
        }
        self.active = session;
        self.tags.observe(self.active.as_ref());
        self.notify();
        true
    }

    pub fn refresh(&mut self) -> AppResult<Option<&Session>> {
        let token = self.begin_poll();
        let session = self.api.active_session()?;
        self.apply_poll(token, session);
        Ok(self.active.as_ref())
    }

    fn apply_mutation(&mut self, session: Option<Session>) {
        self.polls.supersede();
        self.active = session;
        self.tags.observe(self.active.as_ref());
        self.notify();
    }

    pub fn pending_action(&self) -> Option<SessionAction> {
        self.pending.current()
    }

    fn release(&mut self, action: SessionAction) -> AppResult<()> {
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

    // ---------------------------
    // Actions
    // ---------------------------

    /// Validate `selection` and take the guard. Starts a session when none
    /// is active, otherwise switches; `initial_tags` only apply to a fresh
    /// start.
    pub fn prepare_role(&mut self, selection: &JobSelection, initial_tags: &[i64]) -> AppResult<RoleRequest> {
        selection.validate()?;
        let performer_name = self.performer_name()?;
        let role_id = selection.category.id;
        let job_code_id = selection.job_code.as_ref().map(|c| c.id);

        let req = if self.active.is_some() {
            RoleRequest::Switch(SessionSwitchRequest {
                role_id,
                job_code_id,
                performer_name,
            })
        } else {
            RoleRequest::Start(SessionStartRequest {
                role_id,
                job_code_id,
                performer_name,
                activity_tag_ids: initial_tags.to_vec(),
            })
        };
        self.pending.begin(req.action())?;
        Ok(req)
    }

    pub fn complete_role(&mut self, req: &RoleRequest, result: AppResult<SessionChange>) -> AppResult<SessionChange> {
        self.release(req.action())?;
        let change = result?;
        info!(session_id = change.session().id, role = %change.session().role_label(), "session active");
        self.apply_mutation(Some(change.session().clone()));
        Ok(change)
    }

    /// Start a session on `selection`, or switch to it when one is active.
    pub fn select_role(&mut self, selection: &JobSelection, initial_tags: &[i64]) -> AppResult<SessionChange> {
        let req = self.prepare_role(selection, initial_tags)?;
        let result = req.send(&self.api);
        self.complete_role(&req, result)
    }

    pub fn prepare_stop(&mut self) -> AppResult<SessionStopRequest> {
        let Some(active) = &self.active else {
            return Err(AppError::transition("stop", "no session is active"));
        };
        let req = SessionStopRequest {
            session_id: Some(active.id),
        };
        self.pending.begin(SessionAction::Stop)?;
        Ok(req)
    }

    pub fn complete_stop(&mut self, result: AppResult<Session>) -> AppResult<Session> {
        self.release(SessionAction::Stop)?;
        let closed = result?;
        info!(session_id = closed.id, "session stopped");
        self.apply_mutation(None);
        Ok(closed)
    }

    pub fn stop(&mut self) -> AppResult<Session> {
        let req = self.prepare_stop()?;
        let result = self.api.session_stop(&req);
        self.complete_stop(result)
    }

    // ---------------------------
    // Tags
    // ---------------------------

    pub fn toggle_tag(&mut self, tag_id: i64) -> AppResult<TagRequest> {
        let req = self.tags.toggle(tag_id)?;
        self.notify();
        Ok(req)
    }

    pub fn apply_tag_result(&mut self, req: &TagRequest, result: AppResult<Session>) -> AppResult<()> {
        match result {
            Ok(session) => {
                if self.tags.confirm(req.session_id, req.seq, &session.tag_ids())
                    && self.active.as_ref().is_some_and(|a| a.id == session.id)
                {
                    self.active = Some(session);
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

    pub fn update_tag(&mut self, tag_id: i64) -> AppResult<Vec<i64>> {
        let req = self.toggle_tag(tag_id)?;
        let result = self.api.update_session_tags(req.session_id, &req.tag_ids);
        self.apply_tag_result(&req, result)?;
        Ok(self.tags.displayed().to_vec())
    }
}
