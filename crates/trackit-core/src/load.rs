//! Startup input: the user directory and the command log.
//!
//! Both files are JSON arrays. Any read, parse, or validation failure is
//! fatal and aborts the run before a single command is processed.

use anyhow::{Context, Result};
use std::path::Path;

use crate::command::{Command, CommandRecord, parse_commands};
use crate::model::user::{User, UserRecord, users_from_records};

/// Parse a users document.
///
/// # Errors
///
/// Fails on malformed JSON, unknown enum strings, duplicate usernames, or
/// developers missing required fields.
pub fn users_from_str(json: &str) -> Result<Vec<User>> {
    let records: Vec<UserRecord> =
        serde_json::from_str(json).context("users input is not a valid user array")?;
    Ok(users_from_records(records)?)
}

/// Parse a commands document.
///
/// # Errors
///
/// Fails on malformed JSON or a recognized command with a malformed
/// payload.
pub fn commands_from_str(json: &str) -> Result<Vec<Command>> {
    let records: Vec<CommandRecord> =
        serde_json::from_str(json).context("commands input is not a valid command array")?;
    Ok(parse_commands(records)?)
}

/// Read and parse the users file at `path`.
///
/// # Errors
///
/// Fails when the file cannot be read or its content does not load.
pub fn read_users(path: &Path) -> Result<Vec<User>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    users_from_str(&content).with_context(|| format!("Failed to load users from {}", path.display()))
}

/// Read and parse the commands file at `path`.
///
/// # Errors
///
/// Fails when the file cannot be read or its content does not load.
pub fn read_commands(path: &Path) -> Result<Vec<Command>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    commands_from_str(&content)
        .with_context(|| format!("Failed to load commands from {}", path.display()))
}
