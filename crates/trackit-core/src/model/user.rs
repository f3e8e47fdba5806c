//! Users: reporters, developers, and managers.
//!
//! Identity is fixed at load time. The only mutable state a user carries is
//! a developer's notification queue.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use super::ticket::Priority;
use super::wire_enum;
use crate::error::LoadError;

/// The closed set of user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Reporter,
    Developer,
    Manager,
}

wire_enum!(Role, "role", {
    Reporter => "REPORTER",
    Developer => "DEVELOPER",
    Manager => "MANAGER",
});

/// Areas of expertise, shared by developers and tickets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Expertise {
    Frontend,
    Backend,
    Fullstack,
    Devops,
    Design,
    Db,
}

wire_enum!(Expertise, "expertise area", {
    Frontend => "FRONTEND",
    Backend => "BACKEND",
    Fullstack => "FULLSTACK",
    Devops => "DEVOPS",
    Design => "DESIGN",
    Db => "DB",
});

impl Expertise {
    /// Whether a developer with this expertise can work a ticket requiring
    /// `required`.
    ///
    /// Fullstack covers everything, Frontend also covers Design, and Backend
    /// also covers DB.
    #[must_use]
    pub const fn covers(self, required: Self) -> bool {
        matches!(
            (self, required),
            (Self::Fullstack, _)
                | (Self::Frontend, Self::Frontend | Self::Design)
                | (Self::Backend, Self::Backend | Self::Db)
                | (Self::Devops, Self::Devops)
                | (Self::Design, Self::Design)
                | (Self::Db, Self::Db)
        )
    }
}

/// Developer seniority tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Seniority {
    Junior,
    Mid,
    Senior,
}

wire_enum!(Seniority, "seniority", {
    Junior => "JUNIOR",
    Mid => "MID",
    Senior => "SENIOR",
});

impl Seniority {
    /// Numeric tier compared against [`Priority::rank`].
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Junior => 2,
            Self::Mid => 3,
            Self::Senior => 4,
        }
    }

    #[must_use]
    pub const fn can_handle(self, priority: Priority) -> bool {
        self.rank() >= priority.rank()
    }

    /// Flat bonus added to the performance score.
    #[must_use]
    pub const fn performance_bonus(self) -> f64 {
        match self {
            Self::Junior => 5.0,
            Self::Mid => 15.0,
            Self::Senior => 30.0,
        }
    }
}

/// Developer-only profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeveloperProfile {
    pub expertise: Expertise,
    pub seniority: Seniority,
    pub hire_date: NaiveDate,
    notifications: VecDeque<String>,
}

impl DeveloperProfile {
    #[must_use]
    pub const fn new(expertise: Expertise, seniority: Seniority, hire_date: NaiveDate) -> Self {
        Self {
            expertise,
            seniority,
            hire_date,
            notifications: VecDeque::new(),
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notifications.push_back(message.into());
    }

    /// Return every pending notification in arrival order and clear the queue.
    pub fn drain_notifications(&mut self) -> Vec<String> {
        self.notifications.drain(..).collect()
    }

    #[must_use]
    pub fn pending_notifications(&self) -> usize {
        self.notifications.len()
    }
}

/// Manager-only profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ManagerProfile {
    pub subordinates: Vec<String>,
    pub hire_date: Option<NaiveDate>,
}

/// Role-specific data. Exhaustively matched wherever roles matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKind {
    Reporter,
    Developer(DeveloperProfile),
    Manager(ManagerProfile),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
    pub email: String,
    pub kind: UserKind,
}

impl User {
    #[must_use]
    pub const fn role(&self) -> Role {
        match self.kind {
            UserKind::Reporter => Role::Reporter,
            UserKind::Developer(_) => Role::Developer,
            UserKind::Manager(_) => Role::Manager,
        }
    }

    #[must_use]
    pub const fn as_developer(&self) -> Option<&DeveloperProfile> {
        match &self.kind {
            UserKind::Developer(profile) => Some(profile),
            UserKind::Reporter | UserKind::Manager(_) => None,
        }
    }

    pub fn as_developer_mut(&mut self) -> Option<&mut DeveloperProfile> {
        match &mut self.kind {
            UserKind::Developer(profile) => Some(profile),
            UserKind::Reporter | UserKind::Manager(_) => None,
        }
    }

    #[must_use]
    pub const fn as_manager(&self) -> Option<&ManagerProfile> {
        match &self.kind {
            UserKind::Manager(profile) => Some(profile),
            UserKind::Reporter | UserKind::Developer(_) => None,
        }
    }

    /// Validating factory from a raw input record.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::MissingDeveloperField`] when a developer record
    /// lacks expertise, seniority, or hire date.
    pub fn from_record(record: UserRecord) -> Result<Self, LoadError> {
        let kind = match record.role {
            Role::Reporter => UserKind::Reporter,
            Role::Developer => {
                let missing = |field| LoadError::MissingDeveloperField {
                    username: record.username.clone(),
                    field,
                };
                let expertise = record.expertise_area.ok_or_else(|| missing("expertiseArea"))?;
                let seniority = record.seniority.ok_or_else(|| missing("seniority"))?;
                let hire_date = record.hire_date.ok_or_else(|| missing("hireDate"))?;
                UserKind::Developer(DeveloperProfile::new(expertise, seniority, hire_date))
            }
            Role::Manager => UserKind::Manager(ManagerProfile {
                subordinates: record.subordinates.unwrap_or_default(),
                hire_date: record.hire_date,
            }),
        };

        Ok(Self {
            username: record.username,
            email: record.email,
            kind,
        })
    }
}

/// Raw user record as supplied by the loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub expertise_area: Option<Expertise>,
    #[serde(default)]
    pub seniority: Option<Seniority>,
    #[serde(default)]
    pub hire_date: Option<NaiveDate>,
    #[serde(default)]
    pub subordinates: Option<Vec<String>>,
}

/// Build the user directory, rejecting duplicate usernames.
///
/// # Errors
///
/// Returns the first [`LoadError`] encountered.
pub fn users_from_records(records: Vec<UserRecord>) -> Result<Vec<User>, LoadError> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .map(|record| {
            if !seen.insert(record.username.clone()) {
                return Err(LoadError::DuplicateUser(record.username));
            }
            User::from_record(record)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn dev_record(name: &str) -> UserRecord {
        UserRecord {
            username: name.into(),
            email: format!("{name}@example.com"),
            role: Role::Developer,
            expertise_area: Some(Expertise::Backend),
            seniority: Some(Seniority::Mid),
            hire_date: Some(date("2024-01-01")),
            subordinates: None,
        }
    }

    #[test]
    fn expertise_coverage_rules() {
        assert!(Expertise::Fullstack.covers(Expertise::Db));
        assert!(Expertise::Fullstack.covers(Expertise::Design));
        assert!(Expertise::Frontend.covers(Expertise::Design));
        assert!(Expertise::Backend.covers(Expertise::Db));
        assert!(Expertise::Devops.covers(Expertise::Devops));

        assert!(!Expertise::Design.covers(Expertise::Frontend));
        assert!(!Expertise::Db.covers(Expertise::Backend));
        assert!(!Expertise::Backend.covers(Expertise::Frontend));
        assert!(!Expertise::Devops.covers(Expertise::Fullstack));
    }

    #[test]
    fn seniority_against_priority() {
        assert!(Seniority::Junior.can_handle(Priority::Medium));
        assert!(!Seniority::Junior.can_handle(Priority::High));
        assert!(Seniority::Mid.can_handle(Priority::High));
        assert!(!Seniority::Mid.can_handle(Priority::Critical));
        assert!(Seniority::Senior.can_handle(Priority::Critical));
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!(Role::from_str("developer").expect("role"), Role::Developer);
        assert_eq!(Expertise::from_str(" db ").expect("area"), Expertise::Db);
        assert!(Seniority::from_str("principal").is_err());
    }

    #[test]
    fn developer_record_requires_profile_fields() {
        let mut record = dev_record("alice");
        record.seniority = None;
        let err = User::from_record(record).expect_err("missing seniority");
        assert_eq!(
            err,
            LoadError::MissingDeveloperField {
                username: "alice".into(),
                field: "seniority",
            }
        );
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let err = users_from_records(vec![dev_record("alice"), dev_record("alice")])
            .expect_err("duplicate");
        assert_eq!(err, LoadError::DuplicateUser("alice".into()));
    }

    #[test]
    fn notifications_drain_in_fifo_order() {
        let mut user = User::from_record(dev_record("alice")).expect("user");
        let dev = user.as_developer_mut().expect("developer");
        dev.notify("first");
        dev.notify("second");
        assert_eq!(dev.pending_notifications(), 2);
        assert_eq!(dev.drain_notifications(), vec!["first", "second"]);
        assert!(dev.drain_notifications().is_empty());
    }

    #[test]
    fn user_record_reads_camel_case_json() {
        let json = r#"{
            "username": "m1", "email": "m1@x.io", "role": "MANAGER",
            "hireDate": "2020-05-01", "subordinates": ["alice", "bob"]
        }"#;
        let record: UserRecord = serde_json::from_str(json).expect("parse");
        let user = User::from_record(record).expect("user");
        assert_eq!(user.role(), Role::Manager);
        assert_eq!(
            user.as_manager().expect("manager").subordinates,
            vec!["alice", "bob"]
        );
    }
}
