//! Comment chains.
//!
//! `addComment` runs: ticket exists → ticket is not anonymous → (reporter)
//! ticket is not closed → text is long enough → (developer) actor is the
//! assignee → (reporter) actor is the original reporter.
//!
//! `undoAddComment` runs only the first two links.

use crate::error::{Rejection, RejectionCode};
use crate::model::ticket::{Status, Ticket};
use crate::model::user::{Role, User};

use super::{Chain, Check};

#[derive(Debug, Clone, Copy)]
pub struct CommentContext<'a> {
    pub author: &'a User,
    pub ticket_id: u32,
    /// `None` when no ticket has `ticket_id`.
    pub ticket: Option<&'a Ticket>,
    pub content: &'a str,
    pub min_length: usize,
}

impl CommentContext<'_> {
    const fn role(&self) -> Role {
        self.author.role()
    }
}

#[must_use]
pub fn comment_chain<'a>() -> Chain<CommentContext<'a>> {
    Chain::new()
        .with(TicketExists)
        .with(NotAnonymous)
        .with(ReporterTicketOpen)
        .with(MinLength)
        .with(DeveloperIsAssignee)
        .with(ReporterIsAuthor)
}

/// Links that gate `undoAddComment`.
#[must_use]
pub fn undo_comment_chain<'a>() -> Chain<CommentContext<'a>> {
    Chain::new().with(TicketExists).with(NotAnonymous)
}

struct TicketExists;

impl Check<CommentContext<'_>> for TicketExists {
    fn name(&self) -> &'static str {
        "ticket-exists"
    }

    fn check(&self, ctx: &CommentContext<'_>) -> Result<(), Rejection> {
        if ctx.ticket.is_some() {
            return Ok(());
        }
        Err(Rejection::new(
            RejectionCode::NotFound,
            format!("Ticket {} does not exist.", ctx.ticket_id),
        ))
    }
}

struct NotAnonymous;

impl Check<CommentContext<'_>> for NotAnonymous {
    fn name(&self) -> &'static str {
        "not-anonymous"
    }

    fn applies_to(&self, ctx: &CommentContext<'_>) -> bool {
        ctx.ticket.is_some()
    }

    fn check(&self, ctx: &CommentContext<'_>) -> Result<(), Rejection> {
        match ctx.ticket {
            Some(ticket) if ticket.is_anonymous() => Err(Rejection::new(
                RejectionCode::Anonymous,
                "Comments are not allowed on anonymous tickets.",
            )),
            _ => Ok(()),
        }
    }
}

struct ReporterTicketOpen;

impl Check<CommentContext<'_>> for ReporterTicketOpen {
    fn name(&self) -> &'static str {
        "reporter-not-closed"
    }

    fn applies_to(&self, ctx: &CommentContext<'_>) -> bool {
        ctx.role() == Role::Reporter
    }

    fn check(&self, ctx: &CommentContext<'_>) -> Result<(), Rejection> {
        match ctx.ticket {
            Some(ticket) if ticket.status == Status::Closed => Err(Rejection::new(
                RejectionCode::Closed,
                "Reporters cannot comment on CLOSED tickets.",
            )),
            _ => Ok(()),
        }
    }
}

struct MinLength;

impl Check<CommentContext<'_>> for MinLength {
    fn name(&self) -> &'static str {
        "min-length"
    }

    fn check(&self, ctx: &CommentContext<'_>) -> Result<(), Rejection> {
        if ctx.content.chars().count() >= ctx.min_length {
            return Ok(());
        }
        Err(Rejection::new(
            RejectionCode::MinLength,
            format!(
                "Comment must be at least {} characters long.",
                ctx.min_length
            ),
        ))
    }
}

struct DeveloperIsAssignee;

impl Check<CommentContext<'_>> for DeveloperIsAssignee {
    fn name(&self) -> &'static str {
        "developer-assignee"
    }

    fn applies_to(&self, ctx: &CommentContext<'_>) -> bool {
        ctx.role() == Role::Developer
    }

    fn check(&self, ctx: &CommentContext<'_>) -> Result<(), Rejection> {
        match ctx.ticket {
            Some(ticket) if !ticket.is_assigned_to(&ctx.author.username) => Err(Rejection::new(
                RejectionCode::AssignmentDeveloper,
                format!(
                    "Ticket {} is not assigned to the developer {}.",
                    ticket.id, ctx.author.username
                ),
            )),
            _ => Ok(()),
        }
    }
}

struct ReporterIsAuthor;

impl Check<CommentContext<'_>> for ReporterIsAuthor {
    fn name(&self) -> &'static str {
        "reporter-author"
    }

    fn applies_to(&self, ctx: &CommentContext<'_>) -> bool {
        ctx.role() == Role::Reporter
    }

    fn check(&self, ctx: &CommentContext<'_>) -> Result<(), Rejection> {
        match ctx.ticket {
            Some(ticket) if ticket.reported_by != ctx.author.username => Err(Rejection::new(
                RejectionCode::AssignmentReporter,
                format!(
                    "Reporter {} cannot comment on ticket {}.",
                    ctx.author.username, ticket.id
                ),
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ticket::{BugDetails, Frequency, Priority, Severity, TicketKind, TicketSpec};
    use crate::model::user::{DeveloperProfile, Expertise, ManagerProfile, Seniority, UserKind};
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, n).expect("valid date")
    }

    fn user(name: &str, kind: UserKind) -> User {
        User {
            username: name.into(),
            email: String::new(),
            kind,
        }
    }

    fn reporter(name: &str) -> User {
        user(name, UserKind::Reporter)
    }

    fn developer(name: &str) -> User {
        user(
            name,
            UserKind::Developer(DeveloperProfile::new(
                Expertise::Backend,
                Seniority::Senior,
                day(1),
            )),
        )
    }

    fn ticket(reported_by: &str) -> Ticket {
        Ticket::new(
            3,
            TicketSpec {
                kind: TicketKind::Bug(BugDetails {
                    frequency: Frequency::Rare,
                    severity: Severity::Minor,
                    expected_behavior: None,
                    actual_behavior: None,
                    environment: None,
                    error_code: None,
                }),
                title: "t".into(),
                description: None,
                priority: Priority::Low,
                expertise_area: Expertise::Backend,
                reported_by: reported_by.into(),
            },
            day(1),
        )
    }

    fn check(author: &User, ticket: Option<&Ticket>, content: &str) -> Result<(), Rejection> {
        comment_chain().validate(&CommentContext {
            author,
            ticket_id: 3,
            ticket,
            content,
            min_length: 10,
        })
    }

    fn code(result: Result<(), Rejection>) -> RejectionCode {
        result.expect_err("rejected").code
    }

    #[test]
    fn short_comment_fails_before_ownership() {
        let bob = reporter("bob");
        let t = ticket("bob");
        assert_eq!(code(check(&bob, Some(&t), "short")), RejectionCode::MinLength);

        let carol = reporter("carol");
        assert_eq!(code(check(&carol, Some(&t), "short")), RejectionCode::MinLength);
    }

    #[test]
    fn missing_ticket_is_first() {
        let bob = reporter("bob");
        assert_eq!(code(check(&bob, None, "x")), RejectionCode::NotFound);
    }

    #[test]
    fn anonymous_tickets_reject_everyone() {
        let t = ticket("");
        let boss = user("boss", UserKind::Manager(ManagerProfile::default()));
        assert_eq!(
            code(check(&boss, Some(&t), "a perfectly long comment")),
            RejectionCode::Anonymous
        );
    }

    #[test]
    fn reporter_rules() {
        let bob = reporter("bob");
        let mut t = ticket("bob");
        assert!(check(&bob, Some(&t), "still broken for me").is_ok());

        let carol = reporter("carol");
        assert_eq!(
            code(check(&carol, Some(&t), "me too, same crash")),
            RejectionCode::AssignmentReporter
        );

        t.assign("alice", day(2)).expect("assign");
        t.advance_status("alice", day(3)).expect("resolve");
        t.advance_status("alice", day(4)).expect("close");
        assert_eq!(code(check(&bob, Some(&t), "x")), RejectionCode::Closed);
    }

    #[test]
    fn developer_must_hold_the_ticket() {
        let alice = developer("alice");
        let mut t = ticket("bob");
        assert_eq!(
            code(check(&alice, Some(&t), "looking into it now")),
            RejectionCode::AssignmentDeveloper
        );
        t.assign("alice", day(2)).expect("assign");
        assert!(check(&alice, Some(&t), "looking into it now").is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let alice = developer("alice");
        let mut t = ticket("bob");
        t.assign("alice", day(2)).expect("assign");
        assert!(check(&alice, Some(&t), "ééééééééé").is_err());
        assert!(check(&alice, Some(&t), "éééééééééé").is_ok());
    }

    #[test]
    fn undo_chain_only_checks_existence_and_anonymity() {
        let bob = reporter("bob");
        let ctx = CommentContext {
            author: &bob,
            ticket_id: 3,
            ticket: None,
            content: "",
            min_length: 10,
        };
        assert_eq!(undo_comment_chain().len(), 2);
        assert_eq!(
            undo_comment_chain().validate(&ctx).expect_err("missing").code,
            RejectionCode::NotFound
        );
    }
}
