//! Per-participant tracking state embedded in a form.
//!
//! A [`TrackingGroup`] is a value snapshot of a group's roster taken when
//! the group was attached. Later roster edits only reach it through the
//! group propagation service. Trackers are addressed by [`TrackerKey`]
//! (`group_id` + normalised e-mail), never by a stored array index.

use serde::{Deserialize, Serialize};
use shared::validation::{dedupe_emails, normalize_email, same_email};
use uuid::Uuid;

use crate::models::group::GroupRoster;

/// Delivery/fill state of one participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Tracker {
    pub email: String,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub filled: bool,
}

impl Tracker {
    pub fn new(email: &str) -> Self {
        Self {
            email: normalize_email(email),
            seen: false,
            filled: false,
        }
    }

    pub fn flag(&self, flag: TrackerFlag) -> bool {
        match flag {
            TrackerFlag::Seen => self.seen,
            TrackerFlag::Filled => self.filled,
        }
    }

    /// Flags only ever go from false to true.
    pub fn raise(&mut self, flag: TrackerFlag) {
        match flag {
            TrackerFlag::Seen => self.seen = true,
            TrackerFlag::Filled => self.filled = true,
        }
    }
}

/// Roster snapshot of one group inside a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TrackingGroup {
    pub group_id: Uuid,
    pub group_name: String,
    #[serde(default)]
    pub participants: Vec<Tracker>,
}

impl TrackingGroup {
    /// Fresh snapshot with one unseen, unfilled tracker per distinct e-mail.
    pub fn snapshot(roster: &GroupRoster) -> Self {
        Self {
            group_id: roster.id,
            group_name: roster.name.clone(),
            participants: dedupe_emails(&roster.participant_emails)
                .iter()
                .map(|e| Tracker::new(e))
                .collect(),
        }
    }

    pub fn contains(&self, email: &str) -> bool {
        self.participants.iter().any(|t| same_email(&t.email, email))
    }

    pub fn tracker(&self, email: &str) -> Option<&Tracker> {
        self.participants.iter().find(|t| same_email(&t.email, email))
    }

    /// Inserts trackers for e-mails not already present. Returns how many
    /// were inserted.
    pub fn add_participants(&mut self, emails: &[String]) -> usize {
        let mut added = 0;
        for email in dedupe_emails(emails) {
            if !self.contains(&email) {
                self.participants.push(Tracker::new(&email));
                added += 1;
            }
        }
        added
    }

    /// Drops trackers whose e-mail is in `emails`. Returns how many were
    /// dropped.
    pub fn remove_participants(&mut self, emails: &[String]) -> usize {
        let targets = dedupe_emails(emails);
        let before = self.participants.len();
        self.participants
            .retain(|t| !targets.iter().any(|e| same_email(&t.email, e)));
        before - self.participants.len()
    }

    /// Trackers that have not submitted yet.
    pub fn pending(&self) -> impl Iterator<Item = &Tracker> {
        self.participants.iter().filter(|t| !t.filled)
    }

    pub fn progress(&self) -> TrackingProgress {
        TrackingProgress {
            group_id: self.group_id,
            group_name: self.group_name.clone(),
            total: self.participants.len(),
            seen: self.participants.iter().filter(|t| t.seen).count(),
            filled: self.participants.iter().filter(|t| t.filled).count(),
        }
    }
}

/// Counts over a tracking group, shown in the creator's form list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingProgress {
    pub group_id: Uuid,
    pub group_name: String,
    pub total: usize,
    pub seen: usize,
    pub filled: usize,
}

/// Stable address of a tracker row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackerKey {
    pub group_id: Uuid,
    pub email: String,
}

impl TrackerKey {
    pub fn new(group_id: Uuid, email: &str) -> Self {
        Self {
            group_id,
            email: normalize_email(email),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerFlag {
    Seen,
    Filled,
}

impl TrackerFlag {
    /// Field name inside the stored tracker document.
    pub fn field(&self) -> &'static str {
        match self {
            TrackerFlag::Seen => "seen",
            TrackerFlag::Filled => "filled",
        }
    }
}

/// Outcome of a keyed tracker write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerUpdate {
    /// The flag went from false to true.
    Updated,
    /// The flag was already set.
    Unchanged,
    /// Nothing matched the key at write time.
    NoMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached,
    AlreadyAttached,
}

/// Rows touched by one roster reconciliation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RosterDelta {
    pub added: usize,
    pub removed: usize,
}
