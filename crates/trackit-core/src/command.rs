//! Command records and their typed actions.
//!
//! A raw [`CommandRecord`] carries the command name, actor, timestamp, and a
//! flat payload object. [`Command::parse`] resolves the name against the
//! [`CommandKind`] catalogue and deserializes the payload for that kind.
//! Unrecognized names become [`Action::Unknown`] so the scheduler can log
//! and skip them. A recognized name with a bad payload is a startup failure.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::LoadError;
use crate::filter::{FilterValue, FilterValues, values_from_json};
use crate::model::milestone::MilestoneSpec;
use crate::model::ticket::{TicketDraft, TicketSpec};
use crate::model::user::Role;

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// Which phase a command is legal in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseRule {
    Testing,
    Development,
    Any,
}

/// The command catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKind {
    ReportTicket,
    ViewTickets,
    Search,
    CreateMilestone,
    ViewMilestones,
    AssignTicket,
    UndoAssignTicket,
    AddComment,
    UndoAddComment,
    ChangeStatus,
    UndoChangeStatus,
    ViewAssignedTickets,
    ViewTicketHistory,
    ViewNotifications,
    GenerateCustomerImpactReport,
    GenerateTicketRiskReport,
    GenerateResolutionEfficiencyReport,
    AppStabilityReport,
    GeneratePerformanceReport,
    StartTestingPhase,
}

/// Error returned when parsing an unknown command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand {
    pub raw: String,
}

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command '{}'", self.raw)
    }
}

impl std::error::Error for UnknownCommand {}

const ANY_ROLE: &[Role] = &[Role::Reporter, Role::Developer, Role::Manager];
const STAFF: &[Role] = &[Role::Developer, Role::Manager];
const DEVELOPER: &[Role] = &[Role::Developer];
const MANAGER: &[Role] = &[Role::Manager];
const REPORTER: &[Role] = &[Role::Reporter];

impl CommandKind {
    pub const ALL: [Self; 20] = [
        Self::ReportTicket,
        Self::ViewTickets,
        Self::Search,
        Self::CreateMilestone,
        Self::ViewMilestones,
        Self::AssignTicket,
        Self::UndoAssignTicket,
        Self::AddComment,
        Self::UndoAddComment,
        Self::ChangeStatus,
        Self::UndoChangeStatus,
        Self::ViewAssignedTickets,
        Self::ViewTicketHistory,
        Self::ViewNotifications,
        Self::GenerateCustomerImpactReport,
        Self::GenerateTicketRiskReport,
        Self::GenerateResolutionEfficiencyReport,
        Self::AppStabilityReport,
        Self::GeneratePerformanceReport,
        Self::StartTestingPhase,
    ];

    /// Command name as it appears in the input log.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReportTicket => "reportTicket",
            Self::ViewTickets => "viewTickets",
            Self::Search => "search",
            Self::CreateMilestone => "createMilestone",
            Self::ViewMilestones => "viewMilestones",
            Self::AssignTicket => "assignTicket",
            Self::UndoAssignTicket => "undoAssignTicket",
            Self::AddComment => "addComment",
            Self::UndoAddComment => "undoAddComment",
            Self::ChangeStatus => "changeStatus",
            Self::UndoChangeStatus => "undoChangeStatus",
            Self::ViewAssignedTickets => "viewAssignedTickets",
            Self::ViewTicketHistory => "viewTicketHistory",
            Self::ViewNotifications => "viewNotifications",
            Self::GenerateCustomerImpactReport => "generateCustomerImpactReport",
            Self::GenerateTicketRiskReport => "generateTicketRiskReport",
            Self::GenerateResolutionEfficiencyReport => "generateResolutionEfficiencyReport",
            Self::AppStabilityReport => "appStabilityReport",
            Self::GeneratePerformanceReport => "generatePerformanceReport",
            Self::StartTestingPhase => "startTestingPhase",
        }
    }

    #[must_use]
    pub const fn phase_rule(self) -> PhaseRule {
        match self {
            Self::ReportTicket => PhaseRule::Testing,
            Self::ViewTickets | Self::Search => PhaseRule::Any,
            _ => PhaseRule::Development,
        }
    }

    /// Roles allowed to issue this command.
    #[must_use]
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Self::ReportTicket => REPORTER,
            Self::ViewTickets | Self::AddComment | Self::UndoAddComment => ANY_ROLE,
            Self::Search | Self::ViewMilestones | Self::ViewTicketHistory => STAFF,
            Self::AssignTicket
            | Self::UndoAssignTicket
            | Self::ChangeStatus
            | Self::UndoChangeStatus
            | Self::ViewAssignedTickets
            | Self::ViewNotifications => DEVELOPER,
            Self::CreateMilestone
            | Self::GenerateCustomerImpactReport
            | Self::GenerateTicketRiskReport
            | Self::GenerateResolutionEfficiencyReport
            | Self::AppStabilityReport
            | Self::GeneratePerformanceReport
            | Self::StartTestingPhase => MANAGER,
        }
    }

    #[must_use]
    pub fn allows(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownCommand { raw: s.to_string() })
    }
}

impl Serialize for CommandKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ReportTicketData {
    params: TicketDraft,
}

#[derive(Debug, Deserialize)]
struct TicketRef {
    #[serde(rename = "ticketID", alias = "ticketId")]
    ticket_id: u32,
}

#[derive(Debug, Default, Deserialize)]
struct OptionalTicketRef {
    #[serde(default, rename = "ticketID", alias = "ticketId")]
    ticket_id: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    #[serde(rename = "ticketID", alias = "ticketId")]
    ticket_id: u32,
    #[serde(default)]
    comment: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchData {
    #[serde(default)]
    filters: BTreeMap<String, Value>,
}

/// What a `search` looks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchTarget {
    #[default]
    Ticket,
    Developer,
}

pub const SEARCH_TYPE: &str = "searchType";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchQuery {
    pub target: SearchTarget,
    pub filters: FilterValues,
}

impl SearchQuery {
    fn from_filters(filters: &BTreeMap<String, Value>) -> Self {
        let target = match filters.get(SEARCH_TYPE).and_then(FilterValue::from_json) {
            Some(FilterValue::Text(text)) if text.eq_ignore_ascii_case("developer") => {
                SearchTarget::Developer
            }
            _ => SearchTarget::Ticket,
        };
        Self {
            target,
            filters: values_from_json(filters, &[SEARCH_TYPE]),
        }
    }
}

/// The five manager reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    CustomerImpact,
    TicketRisk,
    ResolutionEfficiency,
    AppStability,
    Performance,
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Typed command payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ReportTicket(TicketSpec),
    ViewTickets,
    Search(SearchQuery),
    CreateMilestone(MilestoneSpec),
    ViewMilestones,
    AssignTicket { ticket_id: u32 },
    UndoAssignTicket { ticket_id: u32 },
    AddComment { ticket_id: u32, comment: String },
    UndoAddComment { ticket_id: u32 },
    ChangeStatus { ticket_id: u32 },
    UndoChangeStatus { ticket_id: u32 },
    ViewAssignedTickets,
    /// `None` shows every ticket the actor is involved with.
    ViewTicketHistory { ticket_id: Option<u32> },
    ViewNotifications,
    Report(ReportKind),
    StartTestingPhase,
    Unknown(String),
}

impl Action {
    /// Deserialize `payload` for a known command kind.
    ///
    /// # Errors
    ///
    /// Returns a description of the first schema violation, including
    /// missing fields of a ticket draft.
    pub fn deserialize_for(kind: CommandKind, payload: Value) -> Result<Self, String> {
        fn de<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, String> {
            serde_json::from_value(payload).map_err(|err| err.to_string())
        }

        let action = match kind {
            CommandKind::ReportTicket => {
                let data: ReportTicketData = de(payload)?;
                Self::ReportTicket(data.params.validate().map_err(|err| err.to_string())?)
            }
            CommandKind::ViewTickets => Self::ViewTickets,
            CommandKind::Search => {
                let data: SearchData = de(payload)?;
                Self::Search(SearchQuery::from_filters(&data.filters))
            }
            CommandKind::CreateMilestone => Self::CreateMilestone(de(payload)?),
            CommandKind::ViewMilestones => Self::ViewMilestones,
            CommandKind::AssignTicket => Self::AssignTicket {
                ticket_id: de::<TicketRef>(payload)?.ticket_id,
            },
            CommandKind::UndoAssignTicket => Self::UndoAssignTicket {
                ticket_id: de::<TicketRef>(payload)?.ticket_id,
            },
            CommandKind::AddComment => {
                let data: CommentData = de(payload)?;
                Self::AddComment {
                    ticket_id: data.ticket_id,
                    comment: data.comment,
                }
            }
            CommandKind::UndoAddComment => Self::UndoAddComment {
                ticket_id: de::<TicketRef>(payload)?.ticket_id,
            },
            CommandKind::ChangeStatus => Self::ChangeStatus {
                ticket_id: de::<TicketRef>(payload)?.ticket_id,
            },
            CommandKind::UndoChangeStatus => Self::UndoChangeStatus {
                ticket_id: de::<TicketRef>(payload)?.ticket_id,
            },
            CommandKind::ViewAssignedTickets => Self::ViewAssignedTickets,
            CommandKind::ViewTicketHistory => Self::ViewTicketHistory {
                ticket_id: de::<OptionalTicketRef>(payload)?.ticket_id,
            },
            CommandKind::ViewNotifications => Self::ViewNotifications,
            CommandKind::GenerateCustomerImpactReport => Self::Report(ReportKind::CustomerImpact),
            CommandKind::GenerateTicketRiskReport => Self::Report(ReportKind::TicketRisk),
            CommandKind::GenerateResolutionEfficiencyReport => {
                Self::Report(ReportKind::ResolutionEfficiency)
            }
            CommandKind::AppStabilityReport => Self::Report(ReportKind::AppStability),
            CommandKind::GeneratePerformanceReport => Self::Report(ReportKind::Performance),
            CommandKind::StartTestingPhase => Self::StartTestingPhase,
        };
        Ok(action)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One entry of the command log as supplied by the loader.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CommandRecord {
    pub command: String,
    #[serde(default)]
    pub username: String,
    pub timestamp: NaiveDate,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Command name exactly as supplied.
    pub name: String,
    /// `None` for unrecognized names.
    pub kind: Option<CommandKind>,
    pub actor: String,
    pub timestamp: NaiveDate,
    pub action: Action,
}

impl Command {
    /// Resolve a raw record. `index` is its position in the log.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MalformedPayload`] when a recognized command's
    /// payload does not match its schema.
    pub fn parse(index: usize, record: CommandRecord) -> Result<Self, LoadError> {
        let (kind, action) = match CommandKind::from_str(&record.command) {
            Ok(kind) => {
                let action = Action::deserialize_for(kind, Value::Object(record.payload))
                    .map_err(|reason| LoadError::MalformedPayload {
                        index,
                        command: record.command.clone(),
                        reason,
                    })?;
                (Some(kind), action)
            }
            Err(_) => (None, Action::Unknown(record.command.clone())),
        };

        Ok(Self {
            name: record.command,
            kind,
            actor: record.username,
            timestamp: record.timestamp,
            action,
        })
    }
}

/// Resolve every record in log order.
///
/// # Errors
///
/// Returns the first [`LoadError`] encountered.
pub fn parse_commands(records: Vec<CommandRecord>) -> Result<Vec<Command>, LoadError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| Command::parse(index, record))
        .collect()
}
