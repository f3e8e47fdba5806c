//! Ticket assignment chain.
//!
//! Fixed order: status is `OPEN` → expertise covers the ticket's area →
//! seniority covers the ticket's priority → developer is on the milestone →
//! milestone is not blocked.

use crate::error::{Rejection, RejectionCode};
use crate::model::milestone::Milestone;
use crate::model::ticket::{Priority, Status, Ticket};
use crate::model::user::{DeveloperProfile, Expertise, Seniority};

use super::{Chain, Check};

/// Everything the assignment links look at.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentContext<'a> {
    pub developer: &'a str,
    pub profile: &'a DeveloperProfile,
    pub ticket: &'a Ticket,
    /// The milestone containing the ticket, if any.
    pub milestone: Option<&'a Milestone>,
}

/// Build the assignment chain in its fixed order.
#[must_use]
pub fn assignment_chain<'a>() -> Chain<AssignmentContext<'a>> {
    Chain::new()
        .with(TicketIsOpen)
        .with(ExpertiseCovers)
        .with(SeniorityCovers)
        .with(DeveloperOnMilestone)
        .with(MilestoneNotBlocked)
}

struct TicketIsOpen;

impl Check<AssignmentContext<'_>> for TicketIsOpen {
    fn name(&self) -> &'static str {
        "ticket-open"
    }

    fn check(&self, ctx: &AssignmentContext<'_>) -> Result<(), Rejection> {
        if ctx.ticket.status == Status::Open {
            return Ok(());
        }
        Err(Rejection::new(
            RejectionCode::Status,
            "Only OPEN tickets can be assigned.",
        ))
    }
}

struct ExpertiseCovers;

impl Check<AssignmentContext<'_>> for ExpertiseCovers {
    fn name(&self) -> &'static str {
        "expertise"
    }

    fn check(&self, ctx: &AssignmentContext<'_>) -> Result<(), Rejection> {
        let required = ctx.ticket.expertise_area;
        if ctx.profile.expertise.covers(required) {
            return Ok(());
        }
        let accepted = [
            Expertise::Frontend,
            Expertise::Backend,
            Expertise::Fullstack,
            Expertise::Devops,
            Expertise::Design,
            Expertise::Db,
        ]
        .into_iter()
        .filter(|area| area.covers(required))
        .map(Expertise::as_str)
        .collect::<Vec<_>>()
        .join(", ");

        Err(Rejection::new(
            RejectionCode::Expertise,
            format!(
                "Developer {} cannot assign ticket {} due to expertise area. Required: {}; Current: {}.",
                ctx.developer, ctx.ticket.id, accepted, ctx.profile.expertise
            ),
        ))
    }
}

struct SeniorityCovers;

impl Check<AssignmentContext<'_>> for SeniorityCovers {
    fn name(&self) -> &'static str {
        "seniority"
    }

    fn check(&self, ctx: &AssignmentContext<'_>) -> Result<(), Rejection> {
        let priority: Priority = ctx.ticket.priority;
        if ctx.profile.seniority.can_handle(priority) {
            return Ok(());
        }
        let accepted = [Seniority::Junior, Seniority::Mid, Seniority::Senior]
            .into_iter()
            .filter(|tier| tier.can_handle(priority))
            .map(Seniority::as_str)
            .collect::<Vec<_>>()
            .join(", ");

        Err(Rejection::new(
            RejectionCode::Seniority,
            format!(
                "Developer {} cannot assign ticket {} due to seniority level. Required: {}; Current: {}.",
                ctx.developer, ctx.ticket.id, accepted, ctx.profile.seniority
            ),
        ))
    }
}

struct DeveloperOnMilestone;

impl Check<AssignmentContext<'_>> for DeveloperOnMilestone {
    fn name(&self) -> &'static str {
        "milestone-member"
    }

    fn check(&self, ctx: &AssignmentContext<'_>) -> Result<(), Rejection> {
        match ctx.milestone {
            Some(milestone) if milestone.has_developer(ctx.developer) => Ok(()),
            Some(milestone) => Err(Rejection::new(
                RejectionCode::Assignment,
                format!(
                    "Developer {} is not assigned to milestone {}.",
                    ctx.developer, milestone.name
                ),
            )),
            None => Err(Rejection::new(
                RejectionCode::Assignment,
                format!("Ticket {} does not belong to any milestone.", ctx.ticket.id),
            )),
        }
    }
}

struct MilestoneNotBlocked;

impl Check<AssignmentContext<'_>> for MilestoneNotBlocked {
    fn name(&self) -> &'static str {
        "milestone-unblocked"
    }

    fn applies_to(&self, ctx: &AssignmentContext<'_>) -> bool {
        ctx.milestone.is_some()
    }

    fn check(&self, ctx: &AssignmentContext<'_>) -> Result<(), Rejection> {
        match ctx.milestone {
            Some(milestone) if milestone.is_blocked() => Err(Rejection::new(
                RejectionCode::Locked,
                format!(
                    "Cannot assign ticket {} from blocked milestone {}.",
                    ctx.ticket.id, milestone.name
                ),
            )),
            _ => Ok(()),
        }
    }
}
