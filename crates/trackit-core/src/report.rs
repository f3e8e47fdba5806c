//! Reporting aggregator.
//!
//! Every report is a read-only fold over the ticket store. Counts cover every
//! ticket type and priority, so absent categories show up as zero rather than
//! disappearing from the output.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::score::{self, RiskGrade, round2};
use crate::model::ticket::{Priority, Status, Ticket, TicketType};
use crate::model::user::{Seniority, User};

/// Counts shared by every ticket report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCounts {
    pub total_tickets: usize,
    pub tickets_by_type: BTreeMap<TicketType, usize>,
    pub tickets_by_priority: BTreeMap<Priority, usize>,
}

impl TicketCounts {
    fn over<'a>(tickets: impl IntoIterator<Item = &'a Ticket>) -> Self {
        let mut by_type: BTreeMap<TicketType, usize> =
            TicketType::ALL.iter().map(|ty| (*ty, 0)).collect();
        let mut by_priority: BTreeMap<Priority, usize> =
            Priority::ALL.iter().map(|p| (*p, 0)).collect();
        let mut total = 0;
        for ticket in tickets {
            total += 1;
            *by_type.entry(ticket.ticket_type()).or_default() += 1;
            *by_priority.entry(ticket.priority).or_default() += 1;
        }
        Self {
            total_tickets: total,
            tickets_by_type: by_type,
            tickets_by_priority: by_priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    #[serde(flatten)]
    pub counts: TicketCounts,
    pub customer_impact_by_type: BTreeMap<TicketType, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskReport {
    #[serde(flatten)]
    pub counts: TicketCounts,
    pub risk_by_type: BTreeMap<TicketType, RiskGrade>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficiencyReport {
    #[serde(flatten)]
    pub counts: TicketCounts,
    pub efficiency_by_type: BTreeMap<TicketType, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stability {
    #[serde(rename = "STABLE")]
    Stable,
    #[serde(rename = "PARTIALLY STABLE")]
    PartiallyStable,
    #[serde(rename = "UNSTABLE")]
    Unstable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StabilityReport {
    #[serde(flatten)]
    pub counts: TicketCounts,
    pub risk_by_type: BTreeMap<TicketType, RiskGrade>,
    pub impact_by_type: BTreeMap<TicketType, f64>,
    pub app_stability: Stability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEntry {
    pub username: String,
    pub seniority: Seniority,
    pub closed_tickets: usize,
    pub average_resolution_time: f64,
    pub performance_score: f64,
}

/// Any report a manager can generate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Report {
    Impact(ImpactReport),
    Risk(RiskReport),
    Efficiency(EfficiencyReport),
    Stability(StabilityReport),
    Performance(Vec<PerformanceEntry>),
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

fn unresolved(tickets: &[Ticket]) -> Vec<&Ticket> {
    tickets.iter().filter(|t| t.status.is_unresolved()).collect()
}

fn resolved(tickets: &[Ticket]) -> Vec<&Ticket> {
    tickets
        .iter()
        .filter(|t| matches!(t.status, Status::Resolved | Status::Closed))
        .collect()
}

/// Per-type mean of `metric`, two decimals; `0.0` for empty types.
#[allow(clippy::cast_precision_loss)]
fn average_by_type(
    tickets: &[&Ticket],
    metric: impl Fn(&Ticket) -> Option<f64>,
) -> BTreeMap<TicketType, f64> {
    TicketType::ALL
        .iter()
        .map(|ty| {
            let values: Vec<f64> = tickets
                .iter()
                .filter(|t| t.ticket_type() == *ty)
                .filter_map(|t| metric(t))
                .collect();
            let mean = if values.is_empty() {
                0.0
            } else {
                round2(values.iter().sum::<f64>() / values.len() as f64)
            };
            (*ty, mean)
        })
        .collect()
}

fn grade_by_type(tickets: &[&Ticket]) -> BTreeMap<TicketType, RiskGrade> {
    average_by_type(tickets, |t| Some(score::risk(t)))
        .into_iter()
        .map(|(ty, mean)| (ty, RiskGrade::from_score(mean)))
        .collect()
}

/// Customer impact over `OPEN` and `IN_PROGRESS` tickets.
#[must_use]
pub fn customer_impact(tickets: &[Ticket]) -> ImpactReport {
    let population = unresolved(tickets);
    ImpactReport {
        counts: TicketCounts::over(population.iter().copied()),
        customer_impact_by_type: average_by_type(&population, |t| Some(score::impact(t))),
    }
}

/// Risk grades over `OPEN` and `IN_PROGRESS` tickets.
#[must_use]
pub fn ticket_risk(tickets: &[Ticket]) -> RiskReport {
    let population = unresolved(tickets);
    RiskReport {
        counts: TicketCounts::over(population.iter().copied()),
        risk_by_type: grade_by_type(&population),
    }
}

/// Resolution efficiency over `RESOLVED` and `CLOSED` tickets.
#[must_use]
pub fn resolution_efficiency(tickets: &[Ticket]) -> EfficiencyReport {
    let population = resolved(tickets);
    EfficiencyReport {
        counts: TicketCounts::over(population.iter().copied()),
        efficiency_by_type: average_by_type(&population, score::efficiency),
    }
}

/// Overall stability verdict over `OPEN` and `IN_PROGRESS` tickets.
///
/// No open work is stable. Any type graded `SIGNIFICANT` or worse is
/// unstable. All types `NEGLIGIBLE` with impact under 50 is stable.
/// Anything in between is partially stable.
#[must_use]
pub fn app_stability(tickets: &[Ticket]) -> StabilityReport {
    let population = unresolved(tickets);
    let risk_by_type = grade_by_type(&population);
    let impact_by_type = average_by_type(&population, |t| Some(score::impact(t)));

    let app_stability = if population.is_empty() {
        Stability::Stable
    } else if risk_by_type.values().any(|g| *g >= RiskGrade::Significant) {
        Stability::Unstable
    } else if risk_by_type.values().all(|g| *g == RiskGrade::Negligible)
        && impact_by_type.values().all(|i| *i < 50.0)
    {
        Stability::Stable
    } else {
        Stability::PartiallyStable
    };

    StabilityReport {
        counts: TicketCounts::over(population.iter().copied()),
        risk_by_type,
        impact_by_type,
        app_stability,
    }
}

/// Closed-ticket statistics and score for one developer.
///
/// Score is `closed * 10 / average_days + seniority bonus`, or `0` with no
/// closed tickets.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn performance_of(developer: &User, tickets: &[Ticket]) -> Option<PerformanceEntry> {
    let profile = developer.as_developer()?;
    let days: Vec<i64> = tickets
        .iter()
        .filter(|t| t.status == Status::Closed && t.is_assigned_to(&developer.username))
        .filter_map(score::days_to_resolve)
        .collect();

    let closed = days.len();
    let (average, performance) = if closed == 0 {
        (0.0, 0.0)
    } else {
        let average = days.iter().sum::<i64>() as f64 / closed as f64;
        let performance =
            closed as f64 * 10.0 / average + profile.seniority.performance_bonus();
        (round2(average), round2(performance))
    };

    Some(PerformanceEntry {
        username: developer.username.clone(),
        seniority: profile.seniority,
        closed_tickets: closed,
        average_resolution_time: average,
        performance_score: performance,
    })
}

/// Performance of each developer in `subordinates`, in the given order.
#[must_use]
pub fn performance<'a>(
    subordinates: impl IntoIterator<Item = &'a User>,
    tickets: &[Ticket],
) -> Vec<PerformanceEntry> {
    subordinates
        .into_iter()
        .filter_map(|dev| performance_of(dev, tickets))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ticket::{
        BugDetails, BusinessValue, CustomerDemand, FeatureDetails, Frequency, Severity,
        TicketKind, TicketSpec,
    };
    use crate::model::user::{DeveloperProfile, Expertise, UserKind};
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, n).expect("valid date")
    }

    fn bug(id: u32, frequency: Frequency, severity: Severity, priority: Priority) -> Ticket {
        Ticket::new(
            id,
            TicketSpec {
                kind: TicketKind::Bug(BugDetails {
                    frequency,
                    severity,
                    expected_behavior: None,
                    actual_behavior: None,
                    environment: None,
                    error_code: None,
                }),
                title: format!("bug {id}"),
                description: None,
                priority,
                expertise_area: Expertise::Backend,
                reported_by: "bob".into(),
            },
            day(1),
        )
    }

    fn feature(id: u32) -> Ticket {
        Ticket::new(
            id,
            TicketSpec {
                kind: TicketKind::FeatureRequest(FeatureDetails {
                    business_value: BusinessValue::S,
                    customer_demand: CustomerDemand::Low,
                }),
                title: "f".into(),
                description: None,
                priority: Priority::Low,
                expertise_area: Expertise::Frontend,
                reported_by: "bob".into(),
            },
            day(1),
        )
    }

    fn close(ticket: &mut Ticket, dev: &str, assigned: u32, solved: u32) {
        ticket.assign(dev, day(assigned)).expect("assign");
        ticket.advance_status(dev, day(solved)).expect("resolve");
        ticket.advance_status(dev, day(solved)).expect("close");
    }

    fn developer(name: &str, seniority: Seniority) -> User {
        User {
            username: name.into(),
            email: String::new(),
            kind: UserKind::Developer(DeveloperProfile::new(
                Expertise::Backend,
                seniority,
                day(1),
            )),
        }
    }

    #[test]
    fn impact_counts_only_unresolved() {
        let mut tickets = vec![
            bug(0, Frequency::Always, Severity::Severe, Priority::Critical),
            bug(1, Frequency::Rare, Severity::Minor, Priority::Low),
            feature(2),
        ];
        close(&mut tickets[1], "alice", 2, 3);

        let report = customer_impact(&tickets);
        assert_eq!(report.counts.total_tickets, 2);
        assert_eq!(report.counts.tickets_by_type[&TicketType::Bug], 1);
        assert_eq!(report.counts.tickets_by_priority[&Priority::High], 0);
        assert!((report.customer_impact_by_type[&TicketType::Bug] - 100.0).abs() < f64::EPSILON);
        assert!((report.customer_impact_by_type[&TicketType::UiFeedback]).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_grades_average_per_type() {
        let tickets = vec![
            bug(0, Frequency::Always, Severity::Severe, Priority::Low),
            bug(1, Frequency::Rare, Severity::Minor, Priority::Low),
        ];
        // (100 + 8.33) / 2 = 54.17
        let report = ticket_risk(&tickets);
        assert_eq!(report.risk_by_type[&TicketType::Bug], RiskGrade::Significant);
        assert_eq!(report.risk_by_type[&TicketType::FeatureRequest], RiskGrade::Negligible);
    }

    #[test]
    fn efficiency_covers_resolved_and_closed() {
        let mut tickets = vec![bug(0, Frequency::Frequent, Severity::Severe, Priority::High)];
        close(&mut tickets[0], "alice", 2, 3);
        let report = resolution_efficiency(&tickets);
        assert_eq!(report.counts.total_tickets, 1);
        assert!((report.efficiency_by_type[&TicketType::Bug] - 42.86).abs() < 1e-9);
    }

    #[test]
    fn stability_verdicts() {
        assert_eq!(app_stability(&[]).app_stability, Stability::Stable);

        let calm = vec![feature(0)];
        assert_eq!(app_stability(&calm).app_stability, Stability::Stable);

        let risky = vec![bug(0, Frequency::Always, Severity::Severe, Priority::Low)];
        assert_eq!(app_stability(&risky).app_stability, Stability::Unstable);

        // risk 4/12 = 33.33 is MODERATE
        let middling = vec![bug(0, Frequency::Occasional, Severity::Moderate, Priority::Low)];
        assert_eq!(app_stability(&middling).app_stability, Stability::PartiallyStable);
    }

    #[test]
    fn performance_scores_closed_work() {
        let mut tickets = vec![
            bug(0, Frequency::Rare, Severity::Minor, Priority::Low),
            bug(1, Frequency::Rare, Severity::Minor, Priority::Low),
            bug(2, Frequency::Rare, Severity::Minor, Priority::Low),
        ];
        close(&mut tickets[0], "alice", 2, 2);
        close(&mut tickets[1], "alice", 2, 4);
        tickets[2].assign("alice", day(2)).expect("assign");

        let alice = developer("alice", Seniority::Mid);
        let idle = developer("idle", Seniority::Senior);
        let entries = performance([&alice, &idle], &tickets);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].closed_tickets, 2);
        // days 1 and 3, average 2; 2 * 10 / 2 + 15
        assert!((entries[0].average_resolution_time - 2.0).abs() < f64::EPSILON);
        assert!((entries[0].performance_score - 25.0).abs() < f64::EPSILON);
        assert_eq!(entries[1].closed_tickets, 0);
        assert!(entries[1].performance_score.abs() < f64::EPSILON);
    }

    #[test]
    fn stability_serializes_with_space() {
        let json = serde_json::to_string(&Stability::PartiallyStable).expect("json");
        assert_eq!(json, "\"PARTIALLY STABLE\"");
    }
}
