//! Developer search predicates, used by managers.
//!
//! Non-developers never pass a developer filter.

use std::str::FromStr;

use super::{FilterRegistry, FilterValue};
use crate::model::user::{Expertise, Seniority, User};

pub const EXPERTISE_AREA: &str = "expertiseArea";
pub const SENIORITY: &str = "seniority";
pub const PERFORMANCE_SCORE_ABOVE: &str = "performanceScoreAbove";
pub const PERFORMANCE_SCORE_BELOW: &str = "performanceScoreBelow";

/// Registry of developer filters. `score` supplies each developer's
/// current performance score for the bound filters.
#[must_use]
pub fn developer_filters<'a>(score: impl Fn(&User) -> f64 + Clone + 'a) -> FilterRegistry<'a, User> {
    let mut registry = FilterRegistry::new();
    registry.register(EXPERTISE_AREA, |u: &User, v: &FilterValue| {
        let wanted = v.as_text().and_then(|text| Expertise::from_str(text).ok());
        matches!((u.as_developer(), wanted), (Some(dev), Some(area)) if dev.expertise == area)
    });
    registry.register(SENIORITY, |u: &User, v: &FilterValue| {
        let wanted = v.as_text().and_then(|text| Seniority::from_str(text).ok());
        matches!((u.as_developer(), wanted), (Some(dev), Some(tier)) if dev.seniority == tier)
    });

    let above = score.clone();
    registry.register(PERFORMANCE_SCORE_ABOVE, move |u: &User, v: &FilterValue| {
        within_bound(u, v, |threshold| above(u) >= threshold)
    });
    registry.register(PERFORMANCE_SCORE_BELOW, move |u: &User, v: &FilterValue| {
        within_bound(u, v, |threshold| score(u) <= threshold)
    });
    registry
}

/// Bounds only apply to developers and only when the threshold is positive.
fn within_bound(user: &User, value: &FilterValue, test: impl Fn(f64) -> bool) -> bool {
    if user.as_developer().is_none() {
        return false;
    }
    match value.as_number() {
        Some(threshold) if threshold > 0.0 => test(threshold),
        _ => true,
    }
}
