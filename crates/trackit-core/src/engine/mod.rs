//! The command-replay engine.
//!
//! [`Engine::run`] walks the command log in the order given. Each command's
//! timestamp moves the simulated cursor forward (never back), the active
//! phase decides whether the command is legal, and the matching handler
//! mutates the model and yields a [`CommandOutcome`].
//!
//! Phase windows:
//!
//! - Testing starts at the first command and lasts
//!   [`EngineConfig::testing_phase_days`]. A command past the window ends the
//!   phase; the cursor stops at the window end and the same command is
//!   dispatched again under Development rules.
//! - Development is anchored at the end of Testing and lasts
//!   [`EngineConfig::development_phase_days`]. A command past that window
//!   ends the run.
//! - `startTestingPhase` re-enters Testing anchored at the cursor.
//!
//! Every cursor move runs the day tick: due-tomorrow notices and, when
//! configured, periodic priority escalation.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

use crate::command::Command;
use crate::config::EngineConfig;
use crate::graph::blocking::BlockingGraph;
use crate::graph::unlock::Notice;
use crate::model::milestone::Milestone;
use crate::model::ticket::Ticket;
use crate::model::user::User;
use crate::timing::Timings;

mod handlers;
pub mod outcome;
pub mod phase;
mod views;

pub use outcome::{CommandOutcome, Payload};
pub use phase::{Phase, Window};

/// Replay `commands` against a fresh model built from `users`.
#[must_use]
pub fn run(config: &EngineConfig, users: Vec<User>, commands: &[Command]) -> Vec<CommandOutcome> {
    Engine::new(config.clone(), users).run(commands)
}

/// Owns every entity for the lifetime of one run.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    users: BTreeMap<String, User>,
    tickets: Vec<Ticket>,
    /// Creation order.
    milestones: Vec<Milestone>,
    graph: BlockingGraph,
    next_ticket_id: u32,
    window: Window,
    cursor: Option<NaiveDate>,
    /// Periodic escalation steps already applied, per milestone.
    escalation_steps: BTreeMap<String, i64>,
    timings: Timings,
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig, users: Vec<User>) -> Self {
        let window = Window::new(Phase::Testing, None, config.testing_phase_days);
        Self {
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
            config,
            tickets: Vec::new(),
            milestones: Vec::new(),
            graph: BlockingGraph::new(),
            next_ticket_id: 0,
            window,
            cursor: None,
            escalation_steps: BTreeMap::new(),
            timings: Timings::default(),
        }
    }

    #[must_use]
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    /// Process `commands` in order and collect one outcome per dispatched
    /// command. Unknown commands and commands dropped past the development
    /// window produce no outcome.
    pub fn run(&mut self, commands: &[Command]) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::with_capacity(commands.len());
        let mut index = 0;

        while let Some(command) = commands.get(index) {
            if command.kind.is_none() {
                warn!(command = %command.name, user = %command.actor, "unknown command skipped");
                index += 1;
                continue;
            }

            self.window.anchor_at(command.timestamp);
            if let Some(end) = self.window.end().filter(|end| command.timestamp > *end) {
                self.advance_to(end);
                match self.window.phase {
                    Phase::Testing => {
                        info!(%end, "testing window elapsed, entering development");
                        self.window = Window::new(
                            Phase::Development,
                            Some(end),
                            self.config.development_phase_days,
                        );
                        continue;
                    }
                    Phase::Development => {
                        warn!(
                            %end,
                            dropped = commands.len() - index,
                            "development window elapsed, remaining commands dropped"
                        );
                        break;
                    }
                }
            }

            self.advance_to(command.timestamp);
            let started = self.timings.start();
            let result = self.dispatch(command);
            self.timings.finish(&command.name, started);

            match &result {
                Ok(_) => debug!(command = %command.name, user = %command.actor, "command applied"),
                Err(rejection) => debug!(
                    command = %command.name,
                    user = %command.actor,
                    code = %rejection.code,
                    "command rejected"
                ),
            }

            outcomes.push(CommandOutcome {
                command: command.name.clone(),
                username: command.actor.clone(),
                timestamp: command.timestamp,
                result,
            });
            index += 1;
        }

        info!(
            outcomes = outcomes.len(),
            tickets = self.tickets.len(),
            milestones = self.milestones.len(),
            phase = %self.window.phase,
            "run finished"
        );
        outcomes
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.window.phase
    }

    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }

    /// Current simulated date; `None` before the first command.
    #[must_use]
    pub const fn cursor(&self) -> Option<NaiveDate> {
        self.cursor
    }

    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    #[must_use]
    pub fn ticket(&self, id: u32) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| ticket.id == id)
    }

    #[must_use]
    pub fn milestones(&self) -> &[Milestone] {
        &self.milestones
    }

    #[must_use]
    pub fn milestone(&self, name: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.name == name)
    }

    /// The milestone whose target set contains `ticket_id`.
    #[must_use]
    pub fn milestone_of(&self, ticket_id: u32) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.contains(ticket_id))
    }

    #[must_use]
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users.get(username)
    }

    #[must_use]
    pub const fn graph(&self) -> &BlockingGraph {
        &self.graph
    }

    #[must_use]
    pub const fn timings(&self) -> &Timings {
        &self.timings
    }

    // -----------------------------------------------------------------------
    // Simulated time
    // -----------------------------------------------------------------------

    fn today(&self) -> NaiveDate {
        self.cursor.unwrap_or_default()
    }

    /// Move the cursor to `date` unless it is already later, then run the
    /// day tick.
    fn advance_to(&mut self, date: NaiveDate) {
        let today = self.cursor.map_or(date, |cursor| cursor.max(date));
        self.cursor = Some(today);
        self.tick(today);
    }

    fn tick(&mut self, today: NaiveDate) {
        for index in 0..self.milestones.len() {
            if self.milestones[index].latch_due_tomorrow(today) {
                let notice = Notice::DueTomorrow {
                    milestone: self.milestones[index].name.clone(),
                };
                info!(milestone = %notice.milestone(), %today, "milestone due tomorrow");
                self.escalate_unresolved(index);
                self.broadcast(index, &notice);
            }
        }
        if let Some(every) = self.config.priority_escalation_days {
            self.escalate_periodically(today, every);
        }
    }

    /// Raise the priority of every unresolved target of a milestone one tier
    /// per `every` days since its creation. Blocked and completed milestones
    /// accrue no steps.
    fn escalate_periodically(&mut self, today: NaiveDate, every: i64) {
        const MAX_STEPS: i64 = 3;

        for milestone in &self.milestones {
            let due_steps = (today - milestone.created_at).num_days() / every.max(1);
            let applied = self
                .escalation_steps
                .entry(milestone.name.clone())
                .or_insert(0);
            if *applied >= due_steps {
                continue;
            }
            if !milestone.is_blocked() && !milestone.is_complete() {
                let steps = (due_steps - *applied).min(MAX_STEPS);
                for id in milestone.open_tickets() {
                    if let Some(ticket) = ticket_mut(&mut self.tickets, *id)
                        .filter(|ticket| ticket.status.is_unresolved())
                    {
                        for _ in 0..steps {
                            ticket.escalate();
                        }
                    }
                }
                debug!(milestone = %milestone.name, steps, "periodic escalation");
            }
            *applied = due_steps;
        }
    }

    // -----------------------------------------------------------------------
    // Milestone cascade
    // -----------------------------------------------------------------------

    /// Every unresolved target ticket of the milestone at `index` becomes
    /// `CRITICAL`.
    fn escalate_unresolved(&mut self, index: usize) {
        let milestone = &self.milestones[index];
        for id in milestone.open_tickets() {
            let ticket = ticket_mut(&mut self.tickets, *id);
            debug_assert!(ticket.is_some(), "milestone references unknown ticket {id}");
            match ticket {
                Some(ticket) if ticket.status.is_unresolved() => {
                    ticket.escalate_to_critical();
                }
                Some(_) => {}
                None => error!(milestone = %milestone.name, ticket = id, "milestone references unknown ticket"),
            }
        }
    }

    /// Deliver `notice` to the milestone's developers in registration order.
    fn broadcast(&mut self, index: usize, notice: &Notice) {
        let message = notice.to_string();
        for developer in self.milestones[index].assigned_devs() {
            if let Some(profile) = self
                .users
                .get_mut(developer)
                .and_then(User::as_developer_mut)
            {
                profile.notify(message.clone());
            }
        }
    }

    /// A target ticket reached `CLOSED`. If that completed its milestone,
    /// release every milestone it blocks.
    fn on_ticket_closed(&mut self, ticket_id: u32, today: NaiveDate) {
        let Some(index) = self.milestones.iter().position(|m| m.contains(ticket_id)) else {
            return;
        };
        if !self.milestones[index].mark_closed(ticket_id, today) {
            return;
        }

        let name = self.milestones[index].name.clone();
        let overdue = self.milestones[index].overdue_by(today) > 0;
        info!(milestone = %name, ticket = ticket_id, overdue, "milestone completed");

        for target in self.graph.release(&name) {
            let Some(target_index) = self.milestones.iter().position(|m| m.name == target) else {
                debug!(blocker = %name, milestone = %target, "released milestone does not exist yet");
                continue;
            };
            self.milestones[target_index].unblock(today);
            let notice = Notice::unlock(&target, ticket_id, overdue);
            if notice.escalates() {
                self.escalate_unresolved(target_index);
            }
            info!(blocker = %name, milestone = %target, "milestone unblocked");
            self.broadcast(target_index, &notice);
        }
    }
}

fn ticket_mut(tickets: &mut [Ticket], id: u32) -> Option<&mut Ticket> {
    tickets.iter_mut().find(|ticket| ticket.id == id)
}
