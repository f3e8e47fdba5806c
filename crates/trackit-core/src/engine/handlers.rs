//! Per-command handlers.
//!
//! [`Engine::dispatch`] runs the checks every command shares (phase, then
//! actor, then role) and hands off to the handler for the action.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::outcome::{HistoryView, MilestoneView, Payload, TicketView};
use super::phase::{Phase, Window};
use super::{Engine, ticket_mut};
use crate::command::{Action, Command, CommandKind, ReportKind};
use crate::error::{Rejection, RejectionCode};
use crate::model::milestone::{Milestone, MilestoneSpec};
use crate::model::ticket::{Status, Ticket, TicketSpec, TicketType};
use crate::model::user::{DeveloperProfile, Role, User};
use crate::report::{self, Report};
use crate::validate::assignment::{AssignmentContext, assignment_chain};
use crate::validate::comment::{CommentContext, comment_chain, undo_comment_chain};

type Outcome = Result<Payload, Rejection>;

fn not_found(ticket_id: u32) -> Rejection {
    Rejection::new(
        RejectionCode::NotFound,
        format!("Ticket {ticket_id} does not exist."),
    )
}

fn not_assignee(ticket_id: u32, developer: &str) -> Rejection {
    Rejection::new(
        RejectionCode::AssignmentDeveloper,
        format!("Ticket {ticket_id} is not assigned to the developer {developer}."),
    )
}

impl Engine {
    pub(super) fn dispatch(&mut self, command: &Command) -> Outcome {
        let Some(kind) = command.kind else {
            return Err(Rejection::new(
                RejectionCode::NotFound,
                format!("Unknown command {}.", command.name),
            ));
        };

        self.check_phase(kind)?;

        let role = self
            .users
            .get(&command.actor)
            .map(User::role)
            .ok_or_else(|| {
                Rejection::new(
                    RejectionCode::UnknownUser,
                    format!("The user {} does not exist.", command.actor),
                )
            })?;
        if !kind.allows(role) {
            let required = kind
                .allowed_roles()
                .iter()
                .copied()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Rejection::new(
                RejectionCode::Role,
                format!(
                    "The user does not have permission to execute this command: required role {required}; user role {role}."
                ),
            ));
        }

        let actor = command.actor.as_str();
        match &command.action {
            Action::ReportTicket(spec) => self.report_ticket(actor, spec),
            Action::ViewTickets => Ok(self.view_tickets(actor)),
            Action::Search(query) => self.search(actor, query),
            Action::CreateMilestone(spec) => self.create_milestone(actor, spec),
            Action::ViewMilestones => Ok(self.view_milestones(actor)),
            Action::AssignTicket { ticket_id } => self.assign_ticket(actor, *ticket_id),
            Action::UndoAssignTicket { ticket_id } => self.undo_assign_ticket(actor, *ticket_id),
            Action::AddComment { ticket_id, comment } => {
                self.add_comment(actor, *ticket_id, comment)
            }
            Action::UndoAddComment { ticket_id } => self.undo_add_comment(actor, *ticket_id),
            Action::ChangeStatus { ticket_id } => self.change_status(actor, *ticket_id),
            Action::UndoChangeStatus { ticket_id } => self.undo_change_status(actor, *ticket_id),
            Action::ViewAssignedTickets => Ok(self.view_assigned_tickets(actor)),
            Action::ViewTicketHistory { ticket_id } => self.view_ticket_history(actor, *ticket_id),
            Action::ViewNotifications => Ok(self.view_notifications(actor)),
            Action::Report(report) => Ok(self.generate_report(actor, *report)),
            Action::StartTestingPhase => Ok(self.start_testing_phase()),
            Action::Unknown(name) => Err(Rejection::new(
                RejectionCode::NotFound,
                format!("Unknown command {name}."),
            )),
        }
    }

    fn check_phase(&self, kind: CommandKind) -> Result<(), Rejection> {
        let phase = self.window.phase;
        if phase.permits(kind.phase_rule()) {
            return Ok(());
        }
        let message = match phase {
            Phase::Development => "Tickets can only be reported during testing phases.".to_string(),
            Phase::Testing => format!("{kind} is only available during the development phase."),
        };
        Err(Rejection::new(RejectionCode::WrongPhase, message))
    }

    // -----------------------------------------------------------------------
    // Tickets
    // -----------------------------------------------------------------------

    fn report_ticket(&mut self, actor: &str, spec: &TicketSpec) -> Outcome {
        if spec.reported_by.is_empty() && spec.ticket_type() != TicketType::Bug {
            return Err(Rejection::new(
                RejectionCode::Anonymous,
                "Anonymous reports are only allowed for tickets of type BUG.",
            ));
        }
        if !spec.reported_by.is_empty() && spec.reported_by != actor {
            return Err(Rejection::new(
                RejectionCode::UnknownUser,
                format!(
                    "The reporter {} does not match the user {actor}.",
                    spec.reported_by
                ),
            ));
        }

        let id = self.next_ticket_id;
        self.next_ticket_id += 1;
        let ticket = Ticket::new(id, spec.clone(), self.today());
        info!(ticket = id, kind = %ticket.ticket_type(), priority = %ticket.priority, "ticket reported");
        self.tickets.push(ticket);
        Ok(Payload::Ack)
    }

    fn view_tickets(&self, actor: &str) -> Payload {
        let mut tickets = self.visible_tickets(actor);
        tickets.sort_by_key(|ticket| (ticket.created_at, ticket.id));
        Payload::Tickets(tickets.into_iter().map(TicketView::from).collect())
    }

    fn view_assigned_tickets(&self, actor: &str) -> Payload {
        let mut tickets: Vec<&Ticket> = self
            .tickets
            .iter()
            .filter(|ticket| ticket.is_assigned_to(actor))
            .collect();
        tickets.sort_by_key(|ticket| {
            (
                std::cmp::Reverse(ticket.priority),
                ticket.created_at,
                ticket.id,
            )
        });
        Payload::Tickets(tickets.into_iter().map(TicketView::from).collect())
    }

    fn assign_ticket(&mut self, actor: &str, ticket_id: u32) -> Outcome {
        {
            let ticket = self.ticket(ticket_id).ok_or_else(|| not_found(ticket_id))?;
            let profile = self
                .users
                .get(actor)
                .and_then(User::as_developer)
                .ok_or_else(|| Rejection::new(RejectionCode::Role, "Only developers can take tickets."))?;
            let ctx = AssignmentContext {
                developer: actor,
                profile,
                ticket,
                milestone: self.milestone_of(ticket_id),
            };
            assignment_chain().validate(&ctx)?;
        }

        let today = self.today();
        if let Some(ticket) = ticket_mut(&mut self.tickets, ticket_id) {
            ticket
                .assign(actor, today)
                .map_err(|e| Rejection::new(RejectionCode::Status, e.to_string()))?;
        }
        if let Some(milestone) = self.milestones.iter_mut().find(|m| m.contains(ticket_id)) {
            milestone.record_assignment(actor, ticket_id);
        }
        debug!(ticket = ticket_id, developer = actor, "ticket assigned");
        Ok(Payload::Ack)
    }

    fn undo_assign_ticket(&mut self, actor: &str, ticket_id: u32) -> Outcome {
        let today = self.today();
        let ticket = ticket_mut(&mut self.tickets, ticket_id).ok_or_else(|| not_found(ticket_id))?;
        if !ticket.is_assigned_to(actor) {
            return Err(not_assignee(ticket_id, actor));
        }
        ticket
            .unassign(actor, today)
            .map_err(|_| Rejection::new(RejectionCode::Status, "Only IN_PROGRESS tickets can be unassigned."))?;

        if let Some(milestone) = self.milestones.iter_mut().find(|m| m.contains(ticket_id)) {
            milestone.remove_assignment(actor, ticket_id);
        }
        Ok(Payload::Ack)
    }

    fn change_status(&mut self, actor: &str, ticket_id: u32) -> Outcome {
        let today = self.today();
        let ticket = ticket_mut(&mut self.tickets, ticket_id).ok_or_else(|| not_found(ticket_id))?;
        if !ticket.is_assigned_to(actor) {
            return Err(not_assignee(ticket_id, actor));
        }
        let status = ticket.advance_status(actor, today).map_err(|e| {
            Rejection::new(
                RejectionCode::Status,
                format!("Ticket {ticket_id} cannot change status from {}.", e.from),
            )
        })?;
        debug!(ticket = ticket_id, %status, "status changed");

        if status == Status::Closed {
            self.on_ticket_closed(ticket_id, today);
        }
        Ok(Payload::Ack)
    }

    fn undo_change_status(&mut self, actor: &str, ticket_id: u32) -> Outcome {
        let today = self.today();
        let ticket = ticket_mut(&mut self.tickets, ticket_id).ok_or_else(|| not_found(ticket_id))?;
        if !ticket.is_assigned_to(actor) {
            return Err(not_assignee(ticket_id, actor));
        }
        let previous = ticket.status;
        let status = ticket.revert_status(actor, today).map_err(|e| {
            Rejection::new(
                RejectionCode::Status,
                format!("Ticket {ticket_id} has no status change to undo from {}.", e.from),
            )
        })?;
        debug!(ticket = ticket_id, %status, "status change undone");

        if previous != Status::Closed {
            return Ok(Payload::Ack);
        }
        if let Some(milestone) = self.milestones.iter_mut().find(|m| m.contains(ticket_id)) {
            milestone.mark_reopened(ticket_id);
        }
        Ok(Payload::Ack)
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    fn add_comment(&mut self, actor: &str, ticket_id: u32, content: &str) -> Outcome {
        if let Some(author) = self.users.get(actor) {
            let ctx = CommentContext {
                author,
                ticket_id,
                ticket: self.ticket(ticket_id),
                content,
                min_length: self.config.min_comment_length,
            };
            comment_chain().validate(&ctx)?;
        }

        let today = self.today();
        let ticket = ticket_mut(&mut self.tickets, ticket_id).ok_or_else(|| not_found(ticket_id))?;
        ticket.add_comment(actor, content, today);
        Ok(Payload::Ack)
    }

    fn undo_add_comment(&mut self, actor: &str, ticket_id: u32) -> Outcome {
        if let Some(author) = self.users.get(actor) {
            let ctx = CommentContext {
                author,
                ticket_id,
                ticket: self.ticket(ticket_id),
                content: "",
                min_length: self.config.min_comment_length,
            };
            undo_comment_chain().validate(&ctx)?;
        }

        let ticket = ticket_mut(&mut self.tickets, ticket_id).ok_or_else(|| not_found(ticket_id))?;
        ticket.remove_last_comment_by(actor).ok_or_else(|| {
            Rejection::new(
                RejectionCode::NoUndo,
                format!("No comment by {actor} to undo on ticket {ticket_id}."),
            )
        })?;
        Ok(Payload::Ack)
    }

    fn view_ticket_history(&self, actor: &str, ticket_id: Option<u32>) -> Outcome {
        let Some(user) = self.users.get(actor) else {
            return Ok(Payload::History(Vec::new()));
        };

        if let Some(id) = ticket_id {
            let ticket = self.ticket(id).ok_or_else(|| not_found(id))?;
            if user.role() == Role::Developer && !ticket.was_assigned_to(actor) {
                return Err(Rejection::new(
                    RejectionCode::AssignmentDeveloper,
                    format!("The developer {actor} was never assigned to ticket {id}."),
                ));
            }
            return Ok(Payload::History(vec![HistoryView::from(ticket)]));
        }

        let history = self
            .tickets
            .iter()
            .filter(|ticket| match user.role() {
                Role::Developer => ticket.was_assigned_to(actor),
                Role::Manager => self
                    .milestone_of(ticket.id)
                    .is_some_and(|m| m.created_by == actor),
                Role::Reporter => false,
            })
            .map(HistoryView::from)
            .collect();
        Ok(Payload::History(history))
    }

    // -----------------------------------------------------------------------
    // Milestones
    // -----------------------------------------------------------------------

    fn create_milestone(&mut self, actor: &str, spec: &MilestoneSpec) -> Outcome {
        if self.milestone(&spec.name).is_some() {
            return Err(Rejection::new(
                RejectionCode::MilestoneConflict,
                format!("Milestone {} already exists.", spec.name),
            ));
        }
        let mut closed_ids = BTreeSet::new();
        for id in &spec.tickets {
            let ticket = self.ticket(*id).ok_or_else(|| not_found(*id))?;
            if let Some(owner) = self.milestone_of(*id) {
                return Err(Rejection::new(
                    RejectionCode::MilestoneConflict,
                    format!("Tickets {id} already assigned to milestone {}.", owner.name),
                ));
            }
            if ticket.status == Status::Closed {
                closed_ids.insert(*id);
            }
        }

        for cycle in self.graph.add_edges(&spec.name, &spec.blocking_for) {
            warn!(milestone = %spec.name, %cycle, "blocking cycle");
        }

        let today = self.today();
        let blocked = self.graph.is_blocked(&spec.name);
        let milestone = Milestone::new(spec.clone(), actor, today, blocked, &closed_ids);

        for id in milestone.tickets() {
            if let Some(ticket) = ticket_mut(&mut self.tickets, *id) {
                ticket.record_milestone(&milestone.name, actor, today);
            }
        }

        if milestone.is_complete() {
            let released = self.graph.release(&milestone.name);
            debug!(milestone = %milestone.name, ?released, "created complete, blocks nothing");
        } else {
            for target in &milestone.blocking_for {
                if let Some(other) = self.milestones.iter_mut().find(|m| m.name == *target) {
                    other.block();
                }
            }
        }

        info!(milestone = %milestone.name, blocked, tickets = milestone.tickets().len(), "milestone created");
        self.milestones.push(milestone);
        Ok(Payload::Ack)
    }

    fn view_milestones(&self, actor: &str) -> Payload {
        let today = self.today();
        let role = self.users.get(actor).map(User::role);
        let mut milestones: Vec<&Milestone> = self
            .milestones
            .iter()
            .filter(|m| match role {
                Some(Role::Manager) => m.created_by == actor,
                Some(Role::Developer) => m.has_developer(actor),
                Some(Role::Reporter) | None => false,
            })
            .collect();
        milestones.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.name.cmp(&b.name)));
        Payload::Milestones(
            milestones
                .into_iter()
                .map(|m| MilestoneView::new(m, today))
                .collect(),
        )
    }

    // -----------------------------------------------------------------------
    // Notifications, reports, phases
    // -----------------------------------------------------------------------

    fn view_notifications(&mut self, actor: &str) -> Payload {
        let notifications = self
            .users
            .get_mut(actor)
            .and_then(User::as_developer_mut)
            .map(DeveloperProfile::drain_notifications)
            .unwrap_or_default();
        Payload::Notifications(notifications)
    }

    fn generate_report(&self, actor: &str, kind: ReportKind) -> Payload {
        let report = match kind {
            ReportKind::CustomerImpact => Report::Impact(report::customer_impact(&self.tickets)),
            ReportKind::TicketRisk => Report::Risk(report::ticket_risk(&self.tickets)),
            ReportKind::ResolutionEfficiency => {
                Report::Efficiency(report::resolution_efficiency(&self.tickets))
            }
            ReportKind::AppStability => Report::Stability(report::app_stability(&self.tickets)),
            ReportKind::Performance => {
                let subordinates = self
                    .users
                    .get(actor)
                    .and_then(User::as_manager)
                    .map(|manager| manager.subordinates.as_slice())
                    .unwrap_or_default();
                Report::Performance(report::performance(
                    subordinates.iter().filter_map(|name| self.users.get(name)),
                    &self.tickets,
                ))
            }
        };
        Payload::Report(report)
    }

    fn start_testing_phase(&mut self) -> Payload {
        let today = self.today();
        info!(anchor = %today, "testing phase restarted");
        self.window = Window::new(Phase::Testing, Some(today), self.config.testing_phase_days);
        Payload::Ack
    }
}
