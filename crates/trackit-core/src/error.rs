use serde::{Serialize, Serializer};
use std::fmt;

/// Machine-readable rejection codes surfaced to the output writer.
///
/// Every rejected command carries exactly one of these. The tag strings are
/// part of the output contract and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionCode {
    WrongPhase,
    Anonymous,
    UnknownUser,
    Closed,
    MinLength,
    AssignmentDeveloper,
    AssignmentReporter,
    Expertise,
    Seniority,
    Assignment,
    Locked,
    Status,
    Role,
    NotFound,
    MilestoneConflict,
    NoUndo,
}

impl RejectionCode {
    pub const ALL: [Self; 16] = [
        Self::WrongPhase,
        Self::Anonymous,
        Self::UnknownUser,
        Self::Closed,
        Self::MinLength,
        Self::AssignmentDeveloper,
        Self::AssignmentReporter,
        Self::Expertise,
        Self::Seniority,
        Self::Assignment,
        Self::Locked,
        Self::Status,
        Self::Role,
        Self::NotFound,
        Self::MilestoneConflict,
        Self::NoUndo,
    ];

    /// Stable tag for machine parsing.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::WrongPhase => "WPER",
            Self::Anonymous => "ANON",
            Self::UnknownUser => "NUSR",
            Self::Closed => "CLOSED",
            Self::MinLength => "MIN_LENGTH",
            Self::AssignmentDeveloper => "ASSIGNMENT_DEVELOPER",
            Self::AssignmentReporter => "ASSIGNMENT_REPORTER",
            Self::Expertise => "EXPERTISE",
            Self::Seniority => "SENIORITY",
            Self::Assignment => "ASSIGNMENT",
            Self::Locked => "LOCKED",
            Self::Status => "STATUS",
            Self::Role => "ROLE",
            Self::NotFound => "NOT_FOUND",
            Self::MilestoneConflict => "MILESTONE_CONFLICT",
            Self::NoUndo => "NO_UNDO",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn summary(self) -> &'static str {
        match self {
            Self::WrongPhase => "Command not allowed in the current phase",
            Self::Anonymous => "Anonymous ticket not allowed here",
            Self::UnknownUser => "Unknown user or reporter mismatch",
            Self::Closed => "Ticket is closed",
            Self::MinLength => "Comment too short",
            Self::AssignmentDeveloper => "Developer is not the ticket assignee",
            Self::AssignmentReporter => "Reporter did not report this ticket",
            Self::Expertise => "Expertise area mismatch",
            Self::Seniority => "Seniority too low for ticket priority",
            Self::Assignment => "Developer not assigned to the milestone",
            Self::Locked => "Milestone is blocked",
            Self::Status => "Ticket status does not allow this action",
            Self::Role => "Role not permitted to run this command",
            Self::NotFound => "Referenced entity not found",
            Self::MilestoneConflict => "Ticket already belongs to another milestone",
            Self::NoUndo => "Nothing to undo",
        }
    }

    /// Optional remediation hint.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::WrongPhase => Some("Tickets are reported during testing; work happens in development."),
            Self::Seniority => Some("Junior handles up to MEDIUM, Mid up to HIGH, Senior everything."),
            Self::Status => Some("Follow OPEN -> IN_PROGRESS -> RESOLVED -> CLOSED one step at a time."),
            Self::Locked => Some("Close the tickets of the blocking milestone first."),
            _ => None,
        }
    }
}

impl fmt::Display for RejectionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl Serialize for RejectionCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

/// A rejected command: the code plus a rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub code: RejectionCode,
    pub message: String,
}

impl Rejection {
    #[must_use]
    pub fn new(code: RejectionCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for Rejection {}

/// Startup failure while turning raw input records into entities.
///
/// These abort the run before any command is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("duplicate username '{0}'")]
    DuplicateUser(String),

    #[error("developer '{username}' is missing required field '{field}'")]
    MissingDeveloperField {
        username: String,
        field: &'static str,
    },

    #[error("command #{index} ('{command}') has a malformed payload: {reason}")]
    MalformedPayload {
        index: usize,
        command: String,
        reason: String,
    },

    #[error("ticket draft is missing required field '{field}' for type {ticket_type}")]
    MissingTicketField {
        ticket_type: &'static str,
        field: &'static str,
    },

    #[error("usability score {0} out of range 1..=10")]
    UsabilityOutOfRange(u8),
}
