//! Optimistic activity-tag edits.
//!
//! A toggle is shown immediately as a pending override on top of the last
//! known server set. The override is resolved by [`reconcile`]:
//! it is cleared when its own request is confirmed or fails, and discarded
//! when a fresher server set differs from the one it was built on.

use crate::errors::{AppError, AppResult};
use crate::models::TimeEntry;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTags {
    pub seq: u64,
    pub tag_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEvent<'a> {
    /// The request tagged `seq` succeeded.
    Confirmed { seq: u64 },
    /// A poll or mutation delivered this server set.
    Refreshed(&'a [i64]),
    /// The request tagged `seq` failed.
    Failed { seq: u64 },
}

/// Request to send after a toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRequest {
    pub session_id: i64,
    pub seq: u64,
    pub tag_ids: Vec<i64>,
}

/// Decide what remains of `pending` after `event`, given the server set the
/// override was last compared with.
pub fn reconcile(
    pending: Option<PendingTags>,
    known_server: &[i64],
    event: TagEvent<'_>,
) -> Option<PendingTags> {
    let p = pending?;
    match event {
        TagEvent::Confirmed { seq } | TagEvent::Failed { seq } if seq == p.seq => None,
        TagEvent::Refreshed(fresh) if !same_set(fresh, known_server) => None,
        _ => Some(p),
    }
}

fn same_set(a: &[i64], b: &[i64]) -> bool {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_unstable();
    a.dedup();
    b.sort_unstable();
    b.dedup();
    a == b
}

/// Override state for the one session being displayed.
#[derive(Debug, Default)]
pub struct TagOverride {
    session_id: Option<i64>,
    server: Vec<i64>,
    pending: Option<PendingTags>,
    next_seq: u64,
    last_confirmed: u64,
}

impl TagOverride {
    /// Feed the latest server view of the session. A different session
    /// resets the override.
    pub fn observe(&mut self, session: Option<&TimeEntry>) {
        let id = session.map(|s| s.id);
        if id != self.session_id {
            self.session_id = id;
            self.server = session.map(TimeEntry::tag_ids).unwrap_or_default();
            self.pending = None;
            self.last_confirmed = 0;
            return;
        }

        if let Some(s) = session {
            let fresh = s.tag_ids();
            self.pending = reconcile(
                self.pending.take(),
                &self.server,
                TagEvent::Refreshed(&fresh),
            );
            self.server = fresh;
        }
    }

    pub fn session_id(&self) -> Option<i64> {
        self.session_id
    }

    pub fn pending(&self) -> Option<&PendingTags> {
        self.pending.as_ref()
    }

    /// What the user should see: the pending set when there is one.
    pub fn displayed(&self) -> &[i64] {
        match &self.pending {
            Some(p) => &p.tag_ids,
            None => &self.server,
        }
    }

    /// Flip `tag_id` in the displayed set and return the request to send.
    pub fn toggle(&mut self, tag_id: i64) -> AppResult<TagRequest> {
        let session_id = self
            .session_id
            .ok_or_else(|| AppError::transition("change tags", "no session is active"))?;

        let mut ids = self.displayed().to_vec();
        match ids.iter().position(|&t| t == tag_id) {
            Some(i) => {
                ids.remove(i);
            }
            None => ids.push(tag_id),
        }

        self.next_seq += 1;
        let seq = self.next_seq;
        self.pending = Some(PendingTags {
            seq,
            tag_ids: ids.clone(),
        });
        debug!(session_id, seq, ?ids, "tag override");

        Ok(TagRequest {
            session_id,
            seq,
            tag_ids: ids,
        })
    }

    /// Apply a successful tag update. Returns false when the response was
    /// stale (older than one already applied, or for another session).
    pub fn confirm(&mut self, session_id: i64, seq: u64, server_tags: &[i64]) -> bool {
        if Some(session_id) != self.session_id || seq <= self.last_confirmed {
            debug!(session_id, seq, "ignoring stale tag confirmation");
            return false;
        }
        self.last_confirmed = seq;
        self.server = server_tags.to_vec();
        self.pending = reconcile(self.pending.take(), &self.server, TagEvent::Confirmed { seq });
        true
    }

    /// Drop the override when its own request failed.
    pub fn fail(&mut self, session_id: i64, seq: u64) {
        if Some(session_id) != self.session_id {
            return;
        }
        self.pending = reconcile(self.pending.take(), &self.server, TagEvent::Failed { seq });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActivityTag;
    use chrono::Utc;

    fn tag(id: i64) -> ActivityTag {
        ActivityTag {
            id,
            name: format!("tag{id}"),
            description: String::new(),
            role: None,
            role_name: None,
            is_active: true,
            color: "#3B82F6".into(),
        }
    }

    fn session(id: i64, tags: &[i64]) -> TimeEntry {
        let raw = format!(r#"{{"id": {id}, "start_time": "{}"}}"#, Utc::now().to_rfc3339());
        let mut s: TimeEntry = serde_json::from_str(&raw).unwrap();
        s.activity_tags = tags.iter().copied().map(tag).collect();
        s
    }

    #[test]
    fn reconcile_rules() {
        let p = || Some(PendingTags { seq: 2, tag_ids: vec![1, 2] });

        assert_eq!(reconcile(p(), &[1], TagEvent::Confirmed { seq: 2 }), None);
        assert_eq!(reconcile(p(), &[1], TagEvent::Failed { seq: 2 }), None);
        assert_eq!(reconcile(p(), &[1], TagEvent::Failed { seq: 1 }), p());
        assert_eq!(reconcile(p(), &[1], TagEvent::Refreshed(&[1])), p());
        assert_eq!(reconcile(p(), &[1], TagEvent::Refreshed(&[3])), None);
        assert_eq!(reconcile(None, &[1], TagEvent::Refreshed(&[3])), None);
    }

    #[test]
    fn toggle_shows_immediately_and_confirm_clears() {
        let mut o = TagOverride::default();
        o.observe(Some(&session(9, &[1])));

        let req = o.toggle(2).unwrap();
        assert_eq!(req.tag_ids, vec![1, 2]);
        assert_eq!(o.displayed(), &[1, 2]);

        assert!(o.confirm(9, req.seq, &[1, 2]));
        assert!(o.pending().is_none());
        assert_eq!(o.displayed(), &[1, 2]);
    }

    #[test]
    fn failure_reverts_to_server_set() {
        let mut o = TagOverride::default();
        o.observe(Some(&session(9, &[1])));
        let req = o.toggle(1).unwrap();
        assert!(o.displayed().is_empty());

        o.fail(9, req.seq);
        assert_eq!(o.displayed(), &[1]);
    }

    #[test]
    fn fresher_server_set_discards_override() {
        let mut o = TagOverride::default();
        o.observe(Some(&session(9, &[1])));
        o.toggle(2).unwrap();

        // unchanged poll keeps the override
        o.observe(Some(&session(9, &[1])));
        assert_eq!(o.displayed(), &[1, 2]);

        // someone else changed the tags
        o.observe(Some(&session(9, &[3])));
        assert_eq!(o.displayed(), &[3]);
    }

    #[test]
    fn double_toggle_is_idempotent_regardless_of_response_order() {
        for reversed in [false, true] {
            let mut o = TagOverride::default();
            o.observe(Some(&session(9, &[1])));

            let first = o.toggle(2).unwrap();
            let second = o.toggle(2).unwrap();
            assert_eq!(o.displayed(), &[1]);

            if reversed {
                o.confirm(9, second.seq, &[1]);
                assert!(!o.confirm(9, first.seq, &[1, 2]));
            } else {
                o.confirm(9, first.seq, &[1, 2]);
                assert_eq!(o.displayed(), &[1]);
                o.confirm(9, second.seq, &[1]);
            }
            assert_eq!(o.displayed(), &[1]);
            assert!(o.pending().is_none());
        }
    }

    #[test]
    fn new_session_resets_and_toggle_needs_a_session() {
        let mut o = TagOverride::default();
        assert!(o.toggle(1).is_err());

        o.observe(Some(&session(9, &[1])));
        o.toggle(2).unwrap();
        o.observe(Some(&session(10, &[])));
        assert!(o.displayed().is_empty());
        assert!(!o.confirm(9, 1, &[1, 2]));
    }
}
