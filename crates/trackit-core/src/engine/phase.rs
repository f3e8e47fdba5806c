//! Simulation phases and their date windows.

use chrono::{NaiveDate, TimeDelta};
use serde::Serialize;
use std::fmt;

use crate::command::PhaseRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Testing,
    Development,
}

impl Phase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Testing => "TESTING",
            Self::Development => "DEVELOPMENT",
        }
    }

    /// Whether a command with `rule` may run in this phase.
    #[must_use]
    pub const fn permits(self, rule: PhaseRule) -> bool {
        matches!(
            (self, rule),
            (_, PhaseRule::Any)
                | (Self::Testing, PhaseRule::Testing)
                | (Self::Development, PhaseRule::Development)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active phase plus its window.
///
/// The anchor is unset until the first command seen in the phase supplies
/// it. A timestamp strictly after `anchor + length` lies outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub phase: Phase,
    pub anchor: Option<NaiveDate>,
    pub length_days: i64,
}

impl Window {
    #[must_use]
    pub const fn new(phase: Phase, anchor: Option<NaiveDate>, length_days: i64) -> Self {
        Self {
            phase,
            anchor,
            length_days,
        }
    }

    /// Anchor the window at `date` if no anchor is set yet.
    pub fn anchor_at(&mut self, date: NaiveDate) -> NaiveDate {
        *self.anchor.get_or_insert(date)
    }

    /// Last day inside the window; `None` until anchored.
    #[must_use]
    pub fn end(&self) -> Option<NaiveDate> {
        self.anchor.map(|anchor| add_days(anchor, self.length_days))
    }

    #[must_use]
    pub fn is_past(&self, date: NaiveDate) -> bool {
        self.end().is_some_and(|end| date > end)
    }
}

/// `date + days`, saturating at the calendar bounds.
#[must_use]
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}
