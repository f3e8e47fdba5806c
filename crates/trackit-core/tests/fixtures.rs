//! Shared builders for the integration tests.
//!
//! Included from each test binary with `#[path = "fixtures.rs"]`, so not
//! every helper is used everywhere.
#![allow(dead_code)]

use serde_json::{Map, Value, json};
use trackit_core::command::Command;
use trackit_core::load::{commands_from_str, users_from_str};
use trackit_core::model::user::User;

/// First testing day. The default window ends on `2025-01-13`.
pub const TESTING: &str = "2025-01-01";
/// First day of development under the default config.
pub const DEV: &str = "2025-01-14";

pub fn users() -> Vec<User> {
    users_from_str(
        &json!([
            {"username": "bob", "email": "bob@example.com", "role": "REPORTER"},
            {"username": "alice", "email": "alice@example.com", "role": "DEVELOPER",
             "expertiseArea": "BACKEND", "seniority": "MID", "hireDate": "2024-01-01"},
            {"username": "jr", "email": "jr@example.com", "role": "DEVELOPER",
             "expertiseArea": "BACKEND", "seniority": "JUNIOR", "hireDate": "2024-06-01"},
            {"username": "carol", "email": "carol@example.com", "role": "DEVELOPER",
             "expertiseArea": "FRONTEND", "seniority": "SENIOR", "hireDate": "2020-01-01"},
            {"username": "dan", "email": "dan@example.com", "role": "DEVELOPER",
             "expertiseArea": "FULLSTACK", "seniority": "SENIOR", "hireDate": "2019-01-01"},
            {"username": "boss", "email": "boss@example.com", "role": "MANAGER",
             "subordinates": ["alice", "jr", "carol", "dan"]}
        ])
        .to_string(),
    )
    .expect("fixture users load")
}

/// A command record with an optional flat payload.
pub fn cmd(name: &str, user: &str, timestamp: &str, payload: Value) -> Value {
    let mut record = Map::new();
    record.insert("command".into(), json!(name));
    record.insert("username".into(), json!(user));
    record.insert("timestamp".into(), json!(timestamp));
    if let Value::Object(fields) = payload {
        record.extend(fields);
    }
    Value::Object(record)
}

/// `reportTicket` for a bug reported by `bob`.
pub fn bug(timestamp: &str, title: &str, priority: &str, area: &str) -> Value {
    cmd(
        "reportTicket",
        "bob",
        timestamp,
        json!({"params": {
            "type": "BUG",
            "title": title,
            "description": format!("{title} description"),
            "businessPriority": priority,
            "expertiseArea": area,
            "reportedBy": "bob",
            "frequency": "OCCASIONAL",
            "severity": "MODERATE"
        }}),
    )
}

pub fn milestone(timestamp: &str, name: &str, due: &str, tickets: &[u32], devs: &[&str], blocking: &[&str]) -> Value {
    cmd(
        "createMilestone",
        "boss",
        timestamp,
        json!({
            "name": name,
            "dueDate": due,
            "tickets": tickets,
            "assignedDevs": devs,
            "blockingFor": blocking
        }),
    )
}

pub fn on_ticket(name: &str, user: &str, timestamp: &str, ticket: u32) -> Value {
    cmd(name, user, timestamp, json!({ "ticketID": ticket }))
}

pub fn commands(records: Vec<Value>) -> Vec<Command> {
    commands_from_str(&Value::Array(records).to_string()).expect("fixture commands load")
}
