//! Role-scoped visibility and search.
//!
//! Visibility decides which tickets or developers are candidates at all;
//! named filters only narrow that set.

use std::collections::BTreeSet;

use super::Engine;
use super::outcome::{DeveloperView, Payload, SearchHits, SearchResult, TicketView};
use crate::command::{SearchQuery, SearchTarget};
use crate::error::{Rejection, RejectionCode};
use crate::filter::developer::developer_filters;
use crate::filter::ticket::{KEYWORDS, matched_keywords, register_availability, ticket_filters};
use crate::model::ticket::{Status, Ticket};
use crate::model::user::{User, UserKind};
use crate::report;
use crate::validate::assignment::{AssignmentContext, assignment_chain};

impl Engine {
    /// Tickets `actor` may see.
    ///
    /// Managers see every ticket. Developers see `OPEN` tickets of the
    /// milestones they are on, once each. Reporters see the tickets they
    /// reported.
    pub(super) fn visible_tickets(&self, actor: &str) -> Vec<&Ticket> {
        let Some(user) = self.users.get(actor) else {
            return Vec::new();
        };
        match &user.kind {
            UserKind::Manager(_) => self.tickets.iter().collect(),
            UserKind::Developer(_) => {
                let ids: BTreeSet<u32> = self
                    .milestones
                    .iter()
                    .filter(|m| m.has_developer(actor))
                    .flat_map(|m| m.tickets().iter().copied())
                    .collect();
                self.tickets
                    .iter()
                    .filter(|t| t.status == Status::Open && ids.contains(&t.id))
                    .collect()
            }
            UserKind::Reporter => self
                .tickets
                .iter()
                .filter(|t| t.reported_by == actor)
                .collect(),
        }
    }

    /// Developers a manager may search: their direct subordinates, in
    /// roster order.
    fn visible_developers(&self, actor: &str) -> Vec<&User> {
        self.users
            .get(actor)
            .and_then(User::as_manager)
            .map(|manager| {
                manager
                    .subordinates
                    .iter()
                    .filter_map(|name| self.users.get(name))
                    .filter(|user| user.as_developer().is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn performance_score(&self, developer: &User) -> f64 {
        report::performance_of(developer, &self.tickets).map_or(0.0, |entry| entry.performance_score)
    }

    pub(super) fn search(&self, actor: &str, query: &SearchQuery) -> Result<Payload, Rejection> {
        let hits = match query.target {
            SearchTarget::Ticket => SearchHits::Tickets(self.search_tickets(actor, query)),
            SearchTarget::Developer => {
                if self.users.get(actor).and_then(User::as_manager).is_none() {
                    return Err(Rejection::new(
                        RejectionCode::Role,
                        "Only managers can search for developers.",
                    ));
                }
                let candidates = self.visible_developers(actor);
                let kept = developer_filters(|user: &User| self.performance_score(user))
                    .apply(candidates, &query.filters);
                SearchHits::Developers(
                    kept.into_iter()
                        .filter_map(|user| DeveloperView::new(user, self.performance_score(user)))
                        .collect(),
                )
            }
        };
        Ok(Payload::Search(SearchResult {
            target: query.target,
            hits,
        }))
    }

    fn search_tickets(&self, actor: &str, query: &SearchQuery) -> Vec<TicketView> {
        let mut registry = ticket_filters();
        if let Some(profile) = self.users.get(actor).and_then(User::as_developer) {
            register_availability(&mut registry, move |ticket: &Ticket| {
                let ctx = AssignmentContext {
                    developer: actor,
                    profile,
                    ticket,
                    milestone: self.milestone_of(ticket.id),
                };
                assignment_chain().validate(&ctx).is_ok()
            });
        }

        let mut kept = registry.apply(self.visible_tickets(actor), &query.filters);
        kept.sort_by_key(|ticket| ticket.id);

        let keywords = query.filters.get(KEYWORDS).filter(|value| !value.is_blank());
        kept.into_iter()
            .map(|ticket| {
                let mut view = TicketView::from(ticket);
                view.matching_words = keywords.map(|value| matched_keywords(ticket, value));
                view
            })
            .collect()
    }
}
