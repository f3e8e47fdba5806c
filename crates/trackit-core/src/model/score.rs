//! Derived ticket scores.
//!
//! Every score is computed on demand from the ticket's current fields and
//! normalized onto `0..=100` with two-decimal rounding. Nothing is cached.

use serde::Serialize;

use super::ticket::{
    BusinessValue, CustomerDemand, Frequency, Priority, Severity, Ticket, TicketKind,
};
use super::wire_enum;

const BUG_IMPACT_MAX: f64 = 48.0;
const BUG_RISK_MAX: f64 = 12.0;
const BUG_EFFICIENCY_MAX: f64 = 70.0;
const FEATURE_IMPACT_MAX: f64 = 100.0;
const FEATURE_RISK_MAX: f64 = 20.0;
const FEATURE_EFFICIENCY_MAX: f64 = 20.0;
const UI_IMPACT_MAX: f64 = 100.0;
const UI_RISK_MAX: f64 = 100.0;
const UI_EFFICIENCY_MAX: f64 = 20.0;

/// `min(100, value * 100 / max)`, rounded to two decimals.
#[must_use]
pub fn normalize(value: f64, max: f64) -> f64 {
    round2((value * 100.0 / max).min(100.0))
}

#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

const fn frequency_score(f: Frequency) -> f64 {
    match f {
        Frequency::Rare => 1.0,
        Frequency::Occasional => 2.0,
        Frequency::Frequent => 3.0,
        Frequency::Always => 4.0,
    }
}

const fn severity_score(s: Severity) -> f64 {
    match s {
        Severity::Minor => 1.0,
        Severity::Moderate => 2.0,
        Severity::Severe => 3.0,
    }
}

const fn priority_score(p: Priority) -> f64 {
    match p {
        Priority::Low => 1.0,
        Priority::Medium => 2.0,
        Priority::High => 3.0,
        Priority::Critical => 4.0,
    }
}

const fn business_value_score(v: BusinessValue) -> f64 {
    match v {
        BusinessValue::S => 1.0,
        BusinessValue::M => 3.0,
        BusinessValue::L => 6.0,
        BusinessValue::Xl => 10.0,
    }
}

const fn demand_score(d: CustomerDemand) -> f64 {
    match d {
        CustomerDemand::Low => 1.0,
        CustomerDemand::Medium => 3.0,
        CustomerDemand::High => 6.0,
        CustomerDemand::VeryHigh => 10.0,
    }
}

/// Customer impact on `0..=100`.
#[must_use]
pub fn impact(ticket: &Ticket) -> f64 {
    match &ticket.kind {
        TicketKind::Bug(bug) => normalize(
            frequency_score(bug.frequency)
                * priority_score(ticket.priority)
                * severity_score(bug.severity),
            BUG_IMPACT_MAX,
        ),
        TicketKind::FeatureRequest(fr) => normalize(
            business_value_score(fr.business_value) * demand_score(fr.customer_demand),
            FEATURE_IMPACT_MAX,
        ),
        TicketKind::UiFeedback(ui) => normalize(
            business_value_score(ui.business_value) * f64::from(ui.usability_score),
            UI_IMPACT_MAX,
        ),
    }
}

/// Risk on `0..=100`.
#[must_use]
pub fn risk(ticket: &Ticket) -> f64 {
    match &ticket.kind {
        TicketKind::Bug(bug) => normalize(
            frequency_score(bug.frequency) * severity_score(bug.severity),
            BUG_RISK_MAX,
        ),
        TicketKind::FeatureRequest(fr) => normalize(
            business_value_score(fr.business_value) + demand_score(fr.customer_demand),
            FEATURE_RISK_MAX,
        ),
        TicketKind::UiFeedback(ui) => normalize(
            f64::from(11 - ui.usability_score.min(10)) * business_value_score(ui.business_value),
            UI_RISK_MAX,
        ),
    }
}

/// Days spent between assignment and resolution, inclusive.
///
/// Clamped to at least one day so a resolution stamped before its assignment
/// never produces a zero or negative denominator. `None` while unresolved.
#[must_use]
pub fn days_to_resolve(ticket: &Ticket) -> Option<i64> {
    let assigned = ticket.assigned_at?;
    let solved = ticket.solved_at?;
    Some(((solved - assigned).num_days() + 1).max(1))
}

/// Resolution efficiency on `0..=100`; `None` while unresolved.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn efficiency(ticket: &Ticket) -> Option<f64> {
    let days = days_to_resolve(ticket)? as f64;
    let score = match &ticket.kind {
        TicketKind::Bug(bug) => normalize(
            (frequency_score(bug.frequency) + severity_score(bug.severity)) * 10.0 / days,
            BUG_EFFICIENCY_MAX,
        ),
        TicketKind::FeatureRequest(fr) => normalize(
            (business_value_score(fr.business_value) + demand_score(fr.customer_demand)) / days,
            FEATURE_EFFICIENCY_MAX,
        ),
        TicketKind::UiFeedback(ui) => normalize(
            (f64::from(ui.usability_score) + business_value_score(ui.business_value)) / days,
            UI_EFFICIENCY_MAX,
        ),
    };
    Some(score)
}

/// Qualitative risk band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskGrade {
    Negligible,
    Moderate,
    Significant,
    Major,
}

wire_enum!(RiskGrade, "risk grade", {
    Negligible => "NEGLIGIBLE",
    Moderate => "MODERATE",
    Significant => "SIGNIFICANT",
    Major => "MAJOR",
});

impl RiskGrade {
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            Self::Negligible
        } else if score < 50.0 {
            Self::Moderate
        } else if score < 75.0 {
            Self::Significant
        } else {
            Self::Major
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ticket::{
        BugDetails, FeatureDetails, TicketSpec, UiFeedbackDetails,
    };
    use crate::model::user::Expertise;
    use chrono::NaiveDate;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, n).expect("valid date")
    }

    fn ticket(kind: TicketKind, priority: Priority) -> Ticket {
        Ticket::new(
            0,
            TicketSpec {
                kind,
                title: "t".into(),
                description: None,
                priority,
                expertise_area: Expertise::Backend,
                reported_by: "bob".into(),
            },
            day(1),
        )
    }

    fn bug(frequency: Frequency, severity: Severity) -> TicketKind {
        TicketKind::Bug(BugDetails {
            frequency,
            severity,
            expected_behavior: None,
            actual_behavior: None,
            environment: None,
            error_code: None,
        })
    }

    #[test]
    fn normalize_caps_at_one_hundred() {
        assert!((normalize(60.0, 48.0) - 100.0).abs() < f64::EPSILON);
        assert!((normalize(12.0, 48.0) - 25.0).abs() < f64::EPSILON);
        assert!((normalize(1.0, 3.0) - 33.33).abs() < 1e-9);
    }

    #[test]
    fn bug_impact_and_risk_follow_table() {
        let t = ticket(bug(Frequency::Always, Severity::Severe), Priority::Critical);
        assert!((impact(&t) - 100.0).abs() < f64::EPSILON);
        assert!((risk(&t) - 100.0).abs() < f64::EPSILON);

        let t = ticket(bug(Frequency::Occasional, Severity::Moderate), Priority::Medium);
        // 2 * 2 * 2 = 8 of 48
        assert!((impact(&t) - 16.67).abs() < 1e-9);
        // 2 * 2 = 4 of 12
        assert!((risk(&t) - 33.33).abs() < 1e-9);
    }

    #[test]
    fn bug_efficiency_uses_inclusive_day_count() {
        let mut t = ticket(bug(Frequency::Frequent, Severity::Severe), Priority::High);
        assert!(efficiency(&t).is_none());
        t.assign("alice", day(2)).expect("assign");
        t.advance_status("alice", day(3)).expect("resolve");
        assert_eq!(days_to_resolve(&t), Some(2));
        // (3 + 3) * 10 / 2 = 30 of 70
        assert!((efficiency(&t).expect("resolved") - 42.86).abs() < 1e-9);
    }

    #[test]
    fn efficiency_clamps_inverted_dates() {
        let mut t = ticket(bug(Frequency::Rare, Severity::Minor), Priority::Low);
        t.assigned_at = Some(day(10));
        t.solved_at = Some(day(4));
        assert_eq!(days_to_resolve(&t), Some(1));
        assert!(efficiency(&t).expect("score").is_finite());
    }

    #[test]
    fn feature_and_ui_scores_stay_in_range() {
        let fr = ticket(
            TicketKind::FeatureRequest(FeatureDetails {
                business_value: BusinessValue::Xl,
                customer_demand: CustomerDemand::VeryHigh,
            }),
            Priority::Low,
        );
        assert!((impact(&fr) - 100.0).abs() < f64::EPSILON);
        assert!((risk(&fr) - 100.0).abs() < f64::EPSILON);

        let ui = ticket(
            TicketKind::UiFeedback(UiFeedbackDetails {
                business_value: BusinessValue::M,
                usability_score: 10,
                ui_element_id: None,
                screenshot_url: None,
                suggested_fix: None,
            }),
            Priority::Low,
        );
        assert!((impact(&ui) - 30.0).abs() < f64::EPSILON);
        assert!((risk(&ui) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn risk_grades_band_boundaries() {
        assert_eq!(RiskGrade::from_score(0.0), RiskGrade::Negligible);
        assert_eq!(RiskGrade::from_score(25.0), RiskGrade::Moderate);
        assert_eq!(RiskGrade::from_score(74.99), RiskGrade::Significant);
        assert_eq!(RiskGrade::from_score(75.0), RiskGrade::Major);
    }
}
