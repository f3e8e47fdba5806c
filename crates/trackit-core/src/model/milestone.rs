//! Milestones: a fixed ticket set with a due date and a developer roster.
//!
//! The target ticket set is partitioned into `open` and `closed` at all
//! times. Only the mutators below move ids between the two halves, so
//! `open ∪ closed = target` and `open ∩ closed = ∅` hold after every call.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::score::round2;
use super::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MilestoneStatus {
    Active,
    Completed,
}

wire_enum!(MilestoneStatus, "milestone status", {
    Active => "ACTIVE",
    Completed => "COMPLETED",
});

/// Tickets a single developer holds within one milestone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repartition {
    pub developer: String,
    pub assigned_tickets: Vec<u32>,
}

/// Parameters of a `createMilestone` command.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneSpec {
    pub name: String,
    #[serde(default)]
    pub blocking_for: Vec<String>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub tickets: Vec<u32>,
    #[serde(default)]
    pub assigned_devs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub name: String,
    pub created_by: String,
    pub created_at: NaiveDate,
    pub due_date: NaiveDate,
    pub blocking_for: Vec<String>,
    targets: Vec<u32>,
    open: BTreeSet<u32>,
    closed: BTreeSet<u32>,
    assigned_devs: Vec<String>,
    repartition: Vec<Repartition>,
    blocked: bool,
    unlocked_at: Option<NaiveDate>,
    completed_at: Option<NaiveDate>,
    due_tomorrow_latched: bool,
}

impl Milestone {
    /// Create a milestone. `closed_ids` lists targets that are already
    /// `CLOSED` at creation time.
    #[must_use]
    pub fn new(
        spec: MilestoneSpec,
        created_by: &str,
        created_at: NaiveDate,
        blocked: bool,
        closed_ids: &BTreeSet<u32>,
    ) -> Self {
        let mut targets = Vec::with_capacity(spec.tickets.len());
        for id in spec.tickets {
            if !targets.contains(&id) {
                targets.push(id);
            }
        }
        let (closed, open): (BTreeSet<u32>, BTreeSet<u32>) =
            targets.iter().copied().partition(|id| closed_ids.contains(id));

        let mut assigned_devs = Vec::with_capacity(spec.assigned_devs.len());
        for dev in spec.assigned_devs {
            if !assigned_devs.contains(&dev) {
                assigned_devs.push(dev);
            }
        }
        let repartition = assigned_devs
            .iter()
            .map(|dev| Repartition {
                developer: dev.clone(),
                assigned_tickets: Vec::new(),
            })
            .collect();

        let completed_at = (!targets.is_empty() && open.is_empty()).then_some(created_at);

        Self {
            name: spec.name,
            created_by: created_by.to_string(),
            created_at,
            due_date: spec.due_date,
            blocking_for: spec.blocking_for,
            targets,
            open,
            closed,
            assigned_devs,
            repartition,
            blocked,
            unlocked_at: None,
            completed_at,
            due_tomorrow_latched: false,
        }
    }

    #[must_use]
    pub fn tickets(&self) -> &[u32] {
        &self.targets
    }

    #[must_use]
    pub fn contains(&self, ticket_id: u32) -> bool {
        self.targets.contains(&ticket_id)
    }

    #[must_use]
    pub const fn open_tickets(&self) -> &BTreeSet<u32> {
        &self.open
    }

    #[must_use]
    pub const fn closed_tickets(&self) -> &BTreeSet<u32> {
        &self.closed
    }

    /// Observers in registration order.
    #[must_use]
    pub fn assigned_devs(&self) -> &[String] {
        &self.assigned_devs
    }

    #[must_use]
    pub fn has_developer(&self, username: &str) -> bool {
        self.assigned_devs.iter().any(|dev| dev == username)
    }

    #[must_use]
    pub fn repartition(&self) -> &[Repartition] {
        &self.repartition
    }

    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        self.blocked
    }

    #[must_use]
    pub const fn unlocked_at(&self) -> Option<NaiveDate> {
        self.unlocked_at
    }

    #[must_use]
    pub const fn completed_at(&self) -> Option<NaiveDate> {
        self.completed_at
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    #[must_use]
    pub const fn status(&self) -> MilestoneStatus {
        if self.is_complete() {
            MilestoneStatus::Completed
        } else {
            MilestoneStatus::Active
        }
    }

    /// `|closed| / |target|` as a fraction in `0.0..=1.0`, two decimals.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion(&self) -> f64 {
        if self.targets.is_empty() {
            return 0.0;
        }
        round2(self.closed.len() as f64 / self.targets.len() as f64)
    }

    fn reference_date(&self, today: NaiveDate) -> NaiveDate {
        self.completed_at.unwrap_or(today)
    }

    /// Days left before the due date; `0` once due or completed late.
    #[must_use]
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - self.reference_date(today)).num_days().max(0)
    }

    /// Days past the due date; `0` while on time.
    #[must_use]
    pub fn overdue_by(&self, today: NaiveDate) -> i64 {
        (self.reference_date(today) - self.due_date).num_days().max(0)
    }

    pub fn block(&mut self) {
        self.blocked = true;
    }

    /// Clear the blocked flag and stamp the unlock date.
    ///
    /// A later unlock overwrites the stamp. Returns whether the milestone
    /// was blocked before the call.
    pub fn unblock(&mut self, at: NaiveDate) -> bool {
        let was_blocked = self.blocked;
        self.blocked = false;
        self.unlocked_at = Some(at);
        was_blocked
    }

    /// Arm the one-shot "due tomorrow" latch.
    ///
    /// Returns `true` at most once per milestone: the first time it is called
    /// on the day before the due date while still incomplete. Milestones first
    /// seen on or after their due date never fire.
    pub fn latch_due_tomorrow(&mut self, today: NaiveDate) -> bool {
        if self.due_tomorrow_latched || self.is_complete() {
            return false;
        }
        if (self.due_date - today).num_days() != 1 {
            return false;
        }
        self.due_tomorrow_latched = true;
        true
    }

    #[must_use]
    pub const fn due_tomorrow_fired(&self) -> bool {
        self.due_tomorrow_latched
    }

    pub fn record_assignment(&mut self, developer: &str, ticket_id: u32) {
        if let Some(entry) = self
            .repartition
            .iter_mut()
            .find(|entry| entry.developer == developer)
        {
            if !entry.assigned_tickets.contains(&ticket_id) {
                entry.assigned_tickets.push(ticket_id);
            }
        }
    }

    pub fn remove_assignment(&mut self, developer: &str, ticket_id: u32) {
        if let Some(entry) = self
            .repartition
            .iter_mut()
            .find(|entry| entry.developer == developer)
        {
            entry.assigned_tickets.retain(|id| *id != ticket_id);
        }
    }

    /// Move a target ticket into the closed half.
    ///
    /// Returns `true` when this call completed the milestone.
    pub fn mark_closed(&mut self, ticket_id: u32, at: NaiveDate) -> bool {
        if !self.open.remove(&ticket_id) {
            return false;
        }
        self.closed.insert(ticket_id);
        if self.open.is_empty() && self.completed_at.is_none() {
            self.completed_at = Some(at);
            return true;
        }
        false
    }

    /// Move a target ticket back into the open half.
    pub fn mark_reopened(&mut self, ticket_id: u32) {
        if self.closed.remove(&ticket_id) {
            self.open.insert(ticket_id);
            self.completed_at = None;
        }
    }

    /// Whether the open/closed halves exactly partition the target set.
    #[must_use]
    pub fn partition_holds(&self) -> bool {
        self.open.is_disjoint(&self.closed)
            && self.open.len() + self.closed.len() == self.targets.len()
            && self
                .targets
                .iter()
                .all(|id| self.open.contains(id) || self.closed.contains(id))
    }
}
