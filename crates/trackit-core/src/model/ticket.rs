//! Tickets and their lifecycle.
//!
//! A ticket is one of three closed variants ([`TicketKind`]) sharing a common
//! header. Status only moves one step at a time:
//!
//! - `OPEN -> IN_PROGRESS` via [`Ticket::assign`]
//! - `IN_PROGRESS -> OPEN` via [`Ticket::unassign`]
//! - `IN_PROGRESS -> RESOLVED -> CLOSED` via [`Ticket::advance_status`]
//! - `CLOSED -> RESOLVED -> IN_PROGRESS` via [`Ticket::revert_status`]

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::user::Expertise;
use super::wire_enum;
use crate::error::LoadError;

/// Business priority, totally ordered `LOW < MEDIUM < HIGH < CRITICAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

wire_enum!(Priority, "business priority", {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    Critical => "CRITICAL",
});

impl Priority {
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// One tier up; `CRITICAL` stays `CRITICAL`.
    #[must_use]
    pub const fn escalated(self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High | Self::Critical => Self::Critical,
        }
    }
}

/// The four lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Open,
    InProgress,
    Resolved,
    Closed,
}

wire_enum!(Status, "status", {
    Open => "OPEN",
    InProgress => "IN_PROGRESS",
    Resolved => "RESOLVED",
    Closed => "CLOSED",
});

impl Status {
    /// Next state reachable by an explicit status change.
    #[must_use]
    pub const fn next_by_change(self) -> Option<Self> {
        match self {
            Self::InProgress => Some(Self::Resolved),
            Self::Resolved => Some(Self::Closed),
            Self::Open | Self::Closed => None,
        }
    }

    /// Previous state reachable by undoing a status change.
    #[must_use]
    pub const fn previous_by_undo(self) -> Option<Self> {
        match self {
            Self::Closed => Some(Self::Resolved),
            Self::Resolved => Some(Self::InProgress),
            Self::Open | Self::InProgress => None,
        }
    }

    #[must_use]
    pub const fn is_unresolved(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketType {
    Bug,
    FeatureRequest,
    UiFeedback,
}

wire_enum!(TicketType, "ticket type", {
    Bug => "BUG",
    FeatureRequest => "FEATURE_REQUEST",
    UiFeedback => "UI_FEEDBACK",
});

impl TicketType {
    pub const ALL: [Self; 3] = [Self::Bug, Self::FeatureRequest, Self::UiFeedback];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Rare,
    Occasional,
    Frequent,
    Always,
}

wire_enum!(Frequency, "frequency", {
    Rare => "RARE",
    Occasional => "OCCASIONAL",
    Frequent => "FREQUENT",
    Always => "ALWAYS",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

wire_enum!(Severity, "severity", {
    Minor => "MINOR",
    Moderate => "MODERATE",
    Severe => "SEVERE",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessValue {
    S,
    M,
    L,
    #[serde(rename = "XL")]
    Xl,
}

wire_enum!(BusinessValue, "business value", {
    S => "S",
    M => "M",
    L => "L",
    Xl => "XL",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerDemand {
    Low,
    Medium,
    High,
    VeryHigh,
}

wire_enum!(CustomerDemand, "customer demand", {
    Low => "LOW",
    Medium => "MEDIUM",
    High => "HIGH",
    VeryHigh => "VERY_HIGH",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugDetails {
    pub frequency: Frequency,
    pub severity: Severity,
    pub expected_behavior: Option<String>,
    pub actual_behavior: Option<String>,
    pub environment: Option<String>,
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureDetails {
    pub business_value: BusinessValue,
    pub customer_demand: CustomerDemand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiFeedbackDetails {
    pub business_value: BusinessValue,
    pub usability_score: u8,
    pub ui_element_id: Option<String>,
    pub screenshot_url: Option<String>,
    pub suggested_fix: Option<String>,
}

/// Variant-specific ticket data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketKind {
    Bug(BugDetails),
    FeatureRequest(FeatureDetails),
    UiFeedback(UiFeedbackDetails),
}

impl TicketKind {
    #[must_use]
    pub const fn ticket_type(&self) -> TicketType {
        match self {
            Self::Bug(_) => TicketType::Bug,
            Self::FeatureRequest(_) => TicketType::FeatureRequest,
            Self::UiFeedback(_) => TicketType::UiFeedback,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: String,
    pub content: String,
    pub created_at: NaiveDate,
}

/// One entry of a ticket's action history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketAction {
    AddedToMilestone {
        milestone: String,
        by: String,
        timestamp: NaiveDate,
    },
    Assigned {
        by: String,
        timestamp: NaiveDate,
    },
    DeAssigned {
        by: String,
        timestamp: NaiveDate,
    },
    StatusChanged {
        from: Status,
        to: Status,
        by: String,
        timestamp: NaiveDate,
    },
}

impl TicketAction {
    #[must_use]
    pub fn actor(&self) -> &str {
        match self {
            Self::AddedToMilestone { by, .. }
            | Self::Assigned { by, .. }
            | Self::DeAssigned { by, .. }
            | Self::StatusChanged { by, .. } => by,
        }
    }
}

/// Error returned when a lifecycle transition is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Status,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid transition from {}: {}", self.from, self.reason)
    }
}

impl std::error::Error for InvalidTransition {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: u32,
    pub kind: TicketKind,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: Status,
    pub expertise_area: Expertise,
    pub reported_by: String,
    pub created_at: NaiveDate,
    pub assigned_to: Option<String>,
    pub assigned_at: Option<NaiveDate>,
    pub solved_at: Option<NaiveDate>,
    pub comments: Vec<Comment>,
    pub history: Vec<TicketAction>,
}

impl Ticket {
    /// Create a ticket from a validated draft.
    ///
    /// Anonymous bugs are always filed at `LOW` priority.
    #[must_use]
    pub fn new(id: u32, spec: TicketSpec, created_at: NaiveDate) -> Self {
        let priority = if spec.reported_by.is_empty() {
            Priority::Low
        } else {
            spec.priority
        };

        Self {
            id,
            kind: spec.kind,
            title: spec.title,
            description: spec.description,
            priority,
            status: Status::Open,
            expertise_area: spec.expertise_area,
            reported_by: spec.reported_by,
            created_at,
            assigned_to: None,
            assigned_at: None,
            solved_at: None,
            comments: Vec::new(),
            history: Vec::new(),
        }
    }

    #[must_use]
    pub const fn ticket_type(&self) -> TicketType {
        self.kind.ticket_type()
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.reported_by.is_empty()
    }

    #[must_use]
    pub fn is_assigned_to(&self, username: &str) -> bool {
        self.assigned_to.as_deref() == Some(username)
    }

    /// Whether `username` was ever assigned to this ticket.
    #[must_use]
    pub fn was_assigned_to(&self, username: &str) -> bool {
        self.history
            .iter()
            .any(|action| matches!(action, TicketAction::Assigned { by, .. } if by == username))
    }

    pub fn record_milestone(&mut self, milestone: &str, by: &str, at: NaiveDate) {
        self.history.push(TicketAction::AddedToMilestone {
            milestone: milestone.to_string(),
            by: by.to_string(),
            timestamp: at,
        });
    }

    /// `OPEN -> IN_PROGRESS`, recording the assignee.
    ///
    /// # Errors
    ///
    /// Fails unless the ticket is `OPEN`.
    pub fn assign(&mut self, developer: &str, at: NaiveDate) -> Result<(), InvalidTransition> {
        if self.status != Status::Open {
            return Err(InvalidTransition {
                from: self.status,
                reason: "only OPEN tickets can be assigned",
            });
        }
        self.assigned_to = Some(developer.to_string());
        self.assigned_at = Some(at);
        self.history.push(TicketAction::Assigned {
            by: developer.to_string(),
            timestamp: at,
        });
        self.set_status(Status::InProgress, developer, at);
        Ok(())
    }

    /// `IN_PROGRESS -> OPEN`, clearing the assignee.
    ///
    /// # Errors
    ///
    /// Fails unless the ticket is `IN_PROGRESS`.
    pub fn unassign(&mut self, developer: &str, at: NaiveDate) -> Result<(), InvalidTransition> {
        if self.status != Status::InProgress {
            return Err(InvalidTransition {
                from: self.status,
                reason: "only IN_PROGRESS tickets can be unassigned",
            });
        }
        self.assigned_to = None;
        self.assigned_at = None;
        self.history.push(TicketAction::DeAssigned {
            by: developer.to_string(),
            timestamp: at,
        });
        self.set_status(Status::Open, developer, at);
        Ok(())
    }

    /// One step forward along `IN_PROGRESS -> RESOLVED -> CLOSED`.
    ///
    /// # Errors
    ///
    /// Fails from `OPEN` (assignment is the only way out) and from `CLOSED`.
    pub fn advance_status(&mut self, by: &str, at: NaiveDate) -> Result<Status, InvalidTransition> {
        let next = self.status.next_by_change().ok_or(InvalidTransition {
            from: self.status,
            reason: "no status change available",
        })?;
        if next == Status::Resolved {
            self.solved_at = Some(at);
        }
        self.set_status(next, by, at);
        Ok(next)
    }

    /// One step back along `CLOSED -> RESOLVED -> IN_PROGRESS`.
    ///
    /// # Errors
    ///
    /// Fails from `OPEN` and `IN_PROGRESS`; assignment is undone separately.
    pub fn revert_status(&mut self, by: &str, at: NaiveDate) -> Result<Status, InvalidTransition> {
        let previous = self.status.previous_by_undo().ok_or(InvalidTransition {
            from: self.status,
            reason: "no status change to undo",
        })?;
        if previous == Status::InProgress {
            self.solved_at = None;
        }
        self.set_status(previous, by, at);
        Ok(previous)
    }

    /// Raise priority one tier. Returns `true` if it changed.
    pub fn escalate(&mut self) -> bool {
        let next = self.priority.escalated();
        let changed = next != self.priority;
        self.priority = next;
        changed
    }

    /// Raise priority straight to `CRITICAL`. Returns `true` if it changed.
    pub fn escalate_to_critical(&mut self) -> bool {
        let mut changed = false;
        while self.escalate() {
            changed = true;
        }
        changed
    }

    pub fn add_comment(&mut self, author: &str, content: &str, at: NaiveDate) {
        self.comments.push(Comment {
            author: author.to_string(),
            content: content.to_string(),
            created_at: at,
        });
    }

    /// Remove the most recent comment written by `author`.
    pub fn remove_last_comment_by(&mut self, author: &str) -> Option<Comment> {
        let index = self.comments.iter().rposition(|c| c.author == author)?;
        Some(self.comments.remove(index))
    }

    fn set_status(&mut self, to: Status, by: &str, at: NaiveDate) {
        let from = self.status;
        self.status = to;
        self.history.push(TicketAction::StatusChanged {
            from,
            to,
            by: by.to_string(),
            timestamp: at,
        });
    }
}

/// A validated ticket ready to be numbered and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketSpec {
    pub kind: TicketKind,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub expertise_area: Expertise,
    pub reported_by: String,
}

impl TicketSpec {
    #[must_use]
    pub const fn ticket_type(&self) -> TicketType {
        self.kind.ticket_type()
    }
}

/// Raw `reportTicket` parameters as they arrive from the loader.
///
/// Every recognized field is listed here; [`TicketDraft::validate`] decides
/// which ones each ticket type requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDraft {
    #[serde(rename = "type")]
    pub ticket_type: Option<TicketType>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub business_priority: Option<Priority>,
    pub expertise_area: Option<Expertise>,
    #[serde(default)]
    pub reported_by: String,
    #[serde(default)]
    pub expected_behavior: Option<String>,
    #[serde(default)]
    pub actual_behavior: Option<String>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub business_value: Option<BusinessValue>,
    #[serde(default)]
    pub customer_demand: Option<CustomerDemand>,
    #[serde(default)]
    pub usability_score: Option<u8>,
    #[serde(default)]
    pub ui_element_id: Option<String>,
    #[serde(default)]
    pub screenshot_url: Option<String>,
    #[serde(default)]
    pub suggested_fix: Option<String>,
}

impl TicketDraft {
    /// Check required fields for the declared type and build a [`TicketSpec`].
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingTicketField`] for the first missing field,
    /// or [`LoadError::UsabilityOutOfRange`] for a usability score outside 1..=10.
    pub fn validate(self) -> Result<TicketSpec, LoadError> {
        let ticket_type = self.ticket_type.ok_or(LoadError::MissingTicketField {
            ticket_type: "UNKNOWN",
            field: "type",
        })?;
        let missing = |field| LoadError::MissingTicketField {
            ticket_type: ticket_type.as_str(),
            field,
        };

        let priority = self.business_priority.ok_or_else(|| missing("businessPriority"))?;
        let expertise_area = self.expertise_area.ok_or_else(|| missing("expertiseArea"))?;

        let kind = match ticket_type {
            TicketType::Bug => TicketKind::Bug(BugDetails {
                frequency: self.frequency.ok_or_else(|| missing("frequency"))?,
                severity: self.severity.ok_or_else(|| missing("severity"))?,
                expected_behavior: self.expected_behavior,
                actual_behavior: self.actual_behavior,
                environment: self.environment,
                error_code: self.error_code,
            }),
            TicketType::FeatureRequest => TicketKind::FeatureRequest(FeatureDetails {
                business_value: self.business_value.ok_or_else(|| missing("businessValue"))?,
                customer_demand: self.customer_demand.ok_or_else(|| missing("customerDemand"))?,
            }),
            TicketType::UiFeedback => {
                let usability_score = self.usability_score.ok_or_else(|| missing("usabilityScore"))?;
                if !(1..=10).contains(&usability_score) {
                    return Err(LoadError::UsabilityOutOfRange(usability_score));
                }
                TicketKind::UiFeedback(UiFeedbackDetails {
                    business_value: self.business_value.ok_or_else(|| missing("businessValue"))?,
                    usability_score,
                    ui_element_id: self.ui_element_id,
                    screenshot_url: self.screenshot_url,
                    suggested_fix: self.suggested_fix,
                })
            }
        };

        Ok(TicketSpec {
            kind,
            title: self.title,
            description: self.description,
            priority,
            expertise_area,
            reported_by: self.reported_by,
        })
    }
}
