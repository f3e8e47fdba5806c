use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;
use trackit_core::command::Command;
use trackit_core::load::{read_commands, read_users};
use trackit_core::model::user::{Role, User};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `tk check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// JSON array of users.
    #[arg(long, value_name = "FILE")]
    pub users: PathBuf,

    /// JSON array of dated commands.
    #[arg(long, value_name = "FILE")]
    pub commands: PathBuf,
}

/// What a replay would start from.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub config: Option<String>,
    pub users: usize,
    pub reporters: usize,
    pub developers: usize,
    pub managers: usize,
    pub commands: usize,
    /// Command names the engine will skip.
    pub unknown_commands: Vec<String>,
    /// Command actors missing from the user file.
    pub unknown_actors: Vec<String>,
}

impl CheckReport {
    fn new(config: Option<String>, users: &[User], commands: &[Command]) -> Self {
        let count = |role: Role| users.iter().filter(|user| user.role() == role).count();
        let known: BTreeSet<&str> = users.iter().map(|user| user.username.as_str()).collect();

        let unknown_commands: BTreeSet<&str> = commands
            .iter()
            .filter(|command| command.kind.is_none())
            .map(|command| command.name.as_str())
            .collect();
        let unknown_actors: BTreeSet<&str> = commands
            .iter()
            .map(|command| command.actor.as_str())
            .filter(|actor| !known.contains(actor))
            .collect();

        Self {
            config,
            users: users.len(),
            reporters: count(Role::Reporter),
            developers: count(Role::Developer),
            managers: count(Role::Manager),
            commands: commands.len(),
            unknown_commands: unknown_commands.into_iter().map(String::from).collect(),
            unknown_actors: unknown_actors.into_iter().map(String::from).collect(),
        }
    }
}

/// Load both input files and summarize them without replaying.
///
/// # Errors
///
/// Returns an error if either file does not load.
pub fn run_check(args: &CheckArgs, config_source: Option<String>, output: OutputMode) -> Result<()> {
    let users = read_users(&args.users)?;
    let commands = read_commands(&args.commands)?;
    let report = CheckReport::new(config_source, &users, &commands);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_mode(
        &mut out,
        output,
        &report,
        |r, w| {
            writeln!(
                w,
                "ok  users={}  commands={}  unknown_commands={}  unknown_actors={}",
                r.users,
                r.commands,
                r.unknown_commands.len(),
                r.unknown_actors.len()
            )
        },
        |r, w| {
            pretty_section(w, "Input check")?;
            pretty_kv(w, "config", r.config.as_deref().unwrap_or("(defaults)"))?;
            pretty_kv(
                w,
                "users",
                format!(
                    "{} ({} reporters, {} developers, {} managers)",
                    r.users, r.reporters, r.developers, r.managers
                ),
            )?;
            pretty_kv(w, "commands", r.commands.to_string())?;
            if !r.unknown_commands.is_empty() {
                pretty_kv(w, "skipped", r.unknown_commands.join(", "))?;
            }
            if !r.unknown_actors.is_empty() {
                pretty_kv(w, "strangers", r.unknown_actors.join(", "))?;
            }
            Ok(())
        },
    )
}
