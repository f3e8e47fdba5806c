//! Named-predicate filter composition.
//!
//! A [`FilterRegistry`] maps filter names to predicates. [`FilterRegistry::apply`]
//! folds a candidate list through every filter that is both registered and
//! present in the caller's [`FilterValues`], skipping blank values. Filters
//! combine with AND semantics and are independent of each other, so the
//! result does not depend on application order.
//!
//! ## Submodules
//!
//! - [`ticket`]: ticket predicates used by `search`.
//! - [`developer`]: developer predicates used by manager `search`.

use chrono::NaiveDate;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::trace;

pub mod developer;
pub mod ticket;

/// Date format accepted by date-valued filters.
const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A caller-supplied filter argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Date(NaiveDate),
    List(Vec<String>),
    Flag(bool),
    Number(f64),
}

impl FilterValue {
    /// Blank values never reach a predicate.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.iter().all(|item| item.trim().is_empty()),
            Self::Flag(set) => !set,
            Self::Date(_) | Self::Number(_) => false,
        }
    }

    /// Convert a JSON payload value. `null` and nested objects yield `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null | Value::Object(_) => None,
            Value::Bool(flag) => Some(Self::Flag(*flag)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(text) => Some(
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .map_or_else(|_| Self::Text(text.clone()), Self::Date),
            ),
            Value::Array(items) => Some(Self::List(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            )),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Words carried by a text or list value, lowercased.
    #[must_use]
    pub fn words(&self) -> Vec<String> {
        match self {
            Self::Text(text) => text.split_whitespace().map(str::to_lowercase).collect(),
            Self::List(items) => items
                .iter()
                .map(|item| item.trim().to_lowercase())
                .filter(|item| !item.is_empty())
                .collect(),
            Self::Date(_) | Self::Flag(_) | Self::Number(_) => Vec::new(),
        }
    }
}

/// Filter name → value, iterated in name order.
pub type FilterValues = BTreeMap<String, FilterValue>;

/// Build [`FilterValues`] from a JSON object, dropping `null` entries and the
/// names listed in `skip`.
#[must_use]
pub fn values_from_json(map: &BTreeMap<String, Value>, skip: &[&str]) -> FilterValues {
    map.iter()
        .filter(|(name, _)| !skip.contains(&name.as_str()))
        .filter_map(|(name, value)| FilterValue::from_json(value).map(|v| (name.clone(), v)))
        .collect()
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

type Predicate<'a, T> = Box<dyn Fn(&T, &FilterValue) -> bool + 'a>;

/// Named predicates over `T`.
pub struct FilterRegistry<'a, T: ?Sized> {
    filters: Vec<(&'static str, Predicate<'a, T>)>,
}

impl<T: ?Sized> Default for FilterRegistry<'_, T> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
        }
    }
}

impl<'a, T: ?Sized> FilterRegistry<'a, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `predicate` under `name`, replacing any earlier entry.
    pub fn register(
        &mut self,
        name: &'static str,
        predicate: impl Fn(&T, &FilterValue) -> bool + 'a,
    ) {
        self.filters.retain(|(existing, _)| *existing != name);
        self.filters.push((name, Box::new(predicate)));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.filters.iter().any(|(existing, _)| *existing == name)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|(name, _)| *name).collect()
    }

    fn get(&self, name: &str) -> Option<&Predicate<'a, T>> {
        self.filters
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, predicate)| predicate)
    }

    /// Keep the candidates that pass every applicable filter.
    ///
    /// Filters named in `values` but not registered are ignored.
    #[must_use]
    pub fn apply<'t>(&self, mut items: Vec<&'t T>, values: &FilterValues) -> Vec<&'t T> {
        for (name, value) in values {
            if value.is_blank() {
                continue;
            }
            let Some(predicate) = self.get(name) else {
                trace!(filter = %name, "filter not registered");
                continue;
            };
            items.retain(|item| predicate(*item, value));
        }
        items
    }
}
