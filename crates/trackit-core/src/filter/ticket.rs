//! Ticket search predicates.

use std::str::FromStr;

use super::{FilterRegistry, FilterValue};
use crate::model::ticket::{Priority, Status, Ticket, TicketType};

pub const BUSINESS_PRIORITY: &str = "businessPriority";
pub const TYPE: &str = "type";
pub const CREATED_AT: &str = "createdAt";
pub const CREATED_BEFORE: &str = "createdBefore";
pub const CREATED_AFTER: &str = "createdAfter";
pub const KEYWORDS: &str = "keywords";
pub const AVAILABLE_FOR_ASSIGNMENT: &str = "availableForAssignment";

/// Registry with every ticket filter except availability, which depends on
/// the searching developer.
#[must_use]
pub fn ticket_filters<'a>() -> FilterRegistry<'a, Ticket> {
    let mut registry = FilterRegistry::new();
    registry.register(BUSINESS_PRIORITY, |t: &Ticket, v: &FilterValue| {
        v.as_text()
            .and_then(|text| Priority::from_str(text).ok())
            .is_some_and(|p| p == t.priority)
    });
    registry.register(TYPE, |t: &Ticket, v: &FilterValue| {
        v.as_text()
            .and_then(|text| TicketType::from_str(text).ok())
            .is_some_and(|ty| ty == t.ticket_type())
    });
    registry.register(CREATED_AT, |t: &Ticket, v: &FilterValue| {
        v.as_date().is_some_and(|d| t.created_at == d)
    });
    registry.register(CREATED_BEFORE, |t: &Ticket, v: &FilterValue| {
        v.as_date().is_some_and(|d| t.created_at < d)
    });
    registry.register(CREATED_AFTER, |t: &Ticket, v: &FilterValue| {
        v.as_date().is_some_and(|d| t.created_at > d)
    });
    registry.register(KEYWORDS, |t: &Ticket, v: &FilterValue| {
        !matched_keywords(t, v).is_empty()
    });
    registry
}

/// Add `availableForAssignment`, limited to `OPEN` tickets that also pass
/// `assignable`.
pub fn register_availability<'a>(
    registry: &mut FilterRegistry<'a, Ticket>,
    assignable: impl Fn(&Ticket) -> bool + 'a,
) {
    registry.register(AVAILABLE_FOR_ASSIGNMENT, move |t: &Ticket, _: &FilterValue| {
        t.status == Status::Open && assignable(t)
    });
}

/// Keywords from `value` found in the ticket's title or description,
/// case-insensitively, in the order they were supplied.
#[must_use]
pub fn matched_keywords(ticket: &Ticket, value: &FilterValue) -> Vec<String> {
    let haystack = format!(
        "{} {}",
        ticket.title,
        ticket.description.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    let mut matched: Vec<String> = Vec::new();
    for word in value.words() {
        if haystack.contains(&word) && !matched.contains(&word) {
            matched.push(word);
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterValues;
    use crate::model::ticket::{
        BugDetails, BusinessValue, CustomerDemand, FeatureDetails, Frequency, Severity,
        TicketKind, TicketSpec,
    };
    use crate::model::user::Expertise;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, n).expect("valid date")
    }

    fn bug(id: u32, title: &str, priority: Priority, created: u32) -> Ticket {
        Ticket::new(
            id,
            TicketSpec {
                kind: TicketKind::Bug(BugDetails {
                    frequency: Frequency::Rare,
                    severity: Severity::Minor,
                    expected_behavior: None,
                    actual_behavior: None,
                    environment: None,
                    error_code: None,
                }),
                title: title.into(),
                description: Some("Happens after Login".into()),
                priority,
                expertise_area: Expertise::Backend,
                reported_by: "bob".into(),
            },
            day(created),
        )
    }

    fn feature(id: u32, created: u32) -> Ticket {
        Ticket::new(
            id,
            TicketSpec {
                kind: TicketKind::FeatureRequest(FeatureDetails {
                    business_value: BusinessValue::M,
                    customer_demand: CustomerDemand::High,
                }),
                title: "Dark mode".into(),
                description: None,
                priority: Priority::Medium,
                expertise_area: Expertise::Frontend,
                reported_by: "bob".into(),
            },
            day(created),
        )
    }

    fn ids(tickets: &[&Ticket]) -> Vec<u32> {
        tickets.iter().map(|t| t.id).collect()
    }

    fn apply(tickets: &[Ticket], values: &FilterValues) -> Vec<u32> {
        ids(&ticket_filters().apply(tickets.iter().collect(), values))
    }

    fn one(name: &str, value: FilterValue) -> FilterValues {
        [(name.to_string(), value)].into_iter().collect()
    }

    #[test]
    fn priority_is_case_insensitive() {
        let tickets = vec![bug(0, "a", Priority::High, 1), bug(1, "b", Priority::Low, 1)];
        let values = one(BUSINESS_PRIORITY, FilterValue::Text("high".into()));
        assert_eq!(apply(&tickets, &values), vec![0]);
    }

    #[test]
    fn type_and_dates() {
        let tickets = vec![bug(0, "a", Priority::Low, 3), feature(1, 5), feature(2, 7)];
        assert_eq!(
            apply(&tickets, &one(TYPE, FilterValue::Text("FEATURE_REQUEST".into()))),
            vec![1, 2]
        );
        assert_eq!(apply(&tickets, &one(CREATED_AT, FilterValue::Date(day(5)))), vec![1]);
        assert_eq!(apply(&tickets, &one(CREATED_BEFORE, FilterValue::Date(day(5)))), vec![0]);
        assert_eq!(apply(&tickets, &one(CREATED_AFTER, FilterValue::Date(day(5)))), vec![2]);
    }

    #[test]
    fn keywords_match_title_or_description() {
        let tickets = vec![bug(0, "Crash on save", Priority::Low, 1), feature(1, 1)];
        let value = FilterValue::List(vec!["LOGIN".into(), "crash".into(), "nothing".into()]);
        assert_eq!(apply(&tickets, &one(KEYWORDS, value.clone())), vec![0]);
        assert_eq!(matched_keywords(&tickets[0], &value), vec!["login", "crash"]);
    }

    #[test]
    fn availability_requires_open_and_assignable() {
        let mut tickets = vec![bug(0, "a", Priority::Low, 1), bug(1, "b", Priority::High, 1)];
        tickets[0].assign("alice", day(2)).expect("assign");

        let mut registry = ticket_filters();
        register_availability(&mut registry, |t: &Ticket| t.priority == Priority::High);
        let values = one(AVAILABLE_FOR_ASSIGNMENT, FilterValue::Flag(true));
        assert_eq!(ids(&registry.apply(tickets.iter().collect(), &values)), vec![1]);

        // without the developer-only filter, the flag is ignored
        assert_eq!(apply(&tickets, &values), vec![0, 1]);
    }
}
