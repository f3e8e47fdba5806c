//! Unlock and deadline notices broadcast to a milestone's developers.

use std::fmt;

/// Why a milestone is being notified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A blocker completed on time; `ticket` is the last ticket closed.
    Unblocked { milestone: String, ticket: u32 },
    /// A blocker completed after its own due date.
    UnblockedAfterDue { milestone: String },
    /// The due date is one day away.
    DueTomorrow { milestone: String },
}

impl Notice {
    /// Build the unlock notice for `milestone` released by a blocker that
    /// completed by closing `ticket`.
    #[must_use]
    pub fn unlock(milestone: &str, ticket: u32, blocker_overdue: bool) -> Self {
        if blocker_overdue {
            Self::UnblockedAfterDue {
                milestone: milestone.to_string(),
            }
        } else {
            Self::Unblocked {
                milestone: milestone.to_string(),
                ticket,
            }
        }
    }

    #[must_use]
    pub fn milestone(&self) -> &str {
        match self {
            Self::Unblocked { milestone, .. }
            | Self::UnblockedAfterDue { milestone }
            | Self::DueTomorrow { milestone } => milestone,
        }
    }

    /// Whether delivering this notice also raises every unresolved ticket of
    /// the milestone to `CRITICAL`.
    #[must_use]
    pub const fn escalates(&self) -> bool {
        matches!(self, Self::UnblockedAfterDue { .. } | Self::DueTomorrow { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unblocked { milestone, ticket } => write!(
                f,
                "Milestone {milestone} is now unblocked as ticket {ticket} has been CLOSED."
            ),
            Self::UnblockedAfterDue { milestone } => write!(
                f,
                "Milestone {milestone} was unblocked after due date. All active tickets are now CRITICAL."
            ),
            Self::DueTomorrow { milestone } => write!(
                f,
                "Milestone {milestone} is due tomorrow. All unresolved tickets are now CRITICAL."
            ),
        }
    }
}
