//! Per-command results handed to the output writer.

use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::command::SearchTarget;
use crate::error::Rejection;
use crate::model::milestone::{Milestone, MilestoneStatus, Repartition};
use crate::model::score::round2;
use crate::model::ticket::{Comment, Priority, Status, Ticket, TicketAction, TicketType};
use crate::model::user::{Expertise, Seniority, User};
use crate::report::Report;

/// Result of one processed command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutcome {
    pub command: String,
    pub username: String,
    pub timestamp: NaiveDate,
    pub result: Result<Payload, Rejection>,
}

impl CommandOutcome {
    #[must_use]
    pub const fn is_ack(&self) -> bool {
        matches!(self.result, Ok(Payload::Ack))
    }

    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        self.result.as_ref().err()
    }
}

/// Flattens to `{command, username, timestamp, ...}` followed by either
/// `error`/`message` or the payload's own field.
impl Serialize for CommandOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("command", &self.command)?;
        map.serialize_entry("username", &self.username)?;
        map.serialize_entry("timestamp", &self.timestamp)?;
        match &self.result {
            Err(rejection) => {
                map.serialize_entry("error", &rejection.code)?;
                map.serialize_entry("message", &rejection.message)?;
            }
            Ok(Payload::Ack) => {}
            Ok(Payload::Tickets(tickets)) => map.serialize_entry("tickets", tickets)?,
            Ok(Payload::Milestones(milestones)) => {
                map.serialize_entry("milestones", milestones)?;
            }
            Ok(Payload::History(history)) => map.serialize_entry("ticketHistory", history)?,
            Ok(Payload::Search(search)) => {
                map.serialize_entry("searchType", &search.target)?;
                map.serialize_entry("results", &search.hits)?;
            }
            Ok(Payload::Notifications(notifications)) => {
                map.serialize_entry("notifications", notifications)?;
            }
            Ok(Payload::Report(report)) => map.serialize_entry("report", report)?,
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The command mutated state and has nothing to show.
    Ack,
    Tickets(Vec<TicketView>),
    Milestones(Vec<MilestoneView>),
    History(Vec<HistoryView>),
    Search(SearchResult),
    Notifications(Vec<String>),
    Report(Report),
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: u32,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub title: String,
    pub business_priority: Priority,
    pub status: Status,
    pub created_at: NaiveDate,
    pub assigned_at: Option<NaiveDate>,
    pub solved_at: Option<NaiveDate>,
    pub assigned_to: Option<String>,
    pub reported_by: String,
    pub comments: Vec<Comment>,
    /// Present only on keyword search hits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matching_words: Option<Vec<String>>,
}

impl From<&Ticket> for TicketView {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            ticket_type: ticket.ticket_type(),
            title: ticket.title.clone(),
            business_priority: ticket.priority,
            status: ticket.status,
            created_at: ticket.created_at,
            assigned_at: ticket.assigned_at,
            solved_at: ticket.solved_at,
            assigned_to: ticket.assigned_to.clone(),
            reported_by: ticket.reported_by.clone(),
            comments: ticket.comments.clone(),
            matching_words: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneView {
    pub name: String,
    pub blocking_for: Vec<String>,
    pub due_date: NaiveDate,
    pub created_at: NaiveDate,
    pub created_by: String,
    pub tickets: Vec<u32>,
    pub assigned_devs: Vec<String>,
    pub status: MilestoneStatus,
    pub is_blocked: bool,
    pub days_until_due: i64,
    pub overdue_by: i64,
    pub open_tickets: Vec<u32>,
    pub closed_tickets: Vec<u32>,
    /// Percentage in `0.0..=100.0`, two decimals.
    pub completion_percentage: f64,
    pub repartition: Vec<Repartition>,
    pub completed_at: Option<NaiveDate>,
    pub unlocked_at: Option<NaiveDate>,
}

impl MilestoneView {
    #[must_use]
    pub fn new(milestone: &Milestone, today: NaiveDate) -> Self {
        Self {
            name: milestone.name.clone(),
            blocking_for: milestone.blocking_for.clone(),
            due_date: milestone.due_date,
            created_at: milestone.created_at,
            created_by: milestone.created_by.clone(),
            tickets: milestone.tickets().to_vec(),
            assigned_devs: milestone.assigned_devs().to_vec(),
            status: milestone.status(),
            is_blocked: milestone.is_blocked(),
            days_until_due: milestone.days_until_due(today),
            overdue_by: milestone.overdue_by(today),
            open_tickets: milestone.open_tickets().iter().copied().collect(),
            closed_tickets: milestone.closed_tickets().iter().copied().collect(),
            completion_percentage: round2(milestone.completion() * 100.0),
            repartition: milestone.repartition().to_vec(),
            completed_at: milestone.completed_at(),
            unlocked_at: milestone.unlocked_at(),
        }
    }
}

/// Actions and comments of one ticket.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    pub id: u32,
    pub title: String,
    pub status: Status,
    pub actions: Vec<TicketAction>,
    pub comments: Vec<Comment>,
}

impl From<&Ticket> for HistoryView {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id,
            title: ticket.title.clone(),
            status: ticket.status,
            actions: ticket.history.clone(),
            comments: ticket.comments.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeveloperView {
    pub username: String,
    pub expertise_area: Expertise,
    pub seniority: Seniority,
    pub performance_score: f64,
    pub hire_date: NaiveDate,
}

impl DeveloperView {
    /// `None` for non-developers.
    #[must_use]
    pub fn new(user: &User, performance_score: f64) -> Option<Self> {
        let profile = user.as_developer()?;
        Some(Self {
            username: user.username.clone(),
            expertise_area: profile.expertise,
            seniority: profile.seniority,
            performance_score,
            hire_date: profile.hire_date,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub target: SearchTarget,
    pub hits: SearchHits,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum SearchHits {
    Tickets(Vec<TicketView>),
    Developers(Vec<DeveloperView>),
}

impl SearchHits {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Tickets(tickets) => tickets.len(),
            Self::Developers(developers) => developers.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
