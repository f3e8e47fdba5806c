use anyhow::{Context, Result};
use clap::Args;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use trackit_core::config::TrackitConfig;
use trackit_core::engine::outcome::SearchHits;
use trackit_core::engine::{CommandOutcome, Engine, Payload};
use trackit_core::load::{read_commands, read_users};
use trackit_core::timing::{TimingReport, Timings};

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `tk run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON array of users.
    #[arg(long, value_name = "FILE")]
    pub users: PathBuf,

    /// JSON array of dated commands.
    #[arg(long, value_name = "FILE")]
    pub commands: PathBuf,

    /// Write outcomes to FILE instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also write outcomes of commands that produced nothing to show.
    #[arg(long)]
    pub include_acks: bool,
}

/// Replay the command log and write the outcomes.
///
/// Returns the dispatch timings collected while replaying.
///
/// # Errors
///
/// Returns an error if an input file does not load or the output cannot be
/// written.
pub fn run_run(
    args: &RunArgs,
    config: &TrackitConfig,
    output: OutputMode,
    timings: Timings,
) -> Result<TimingReport> {
    let users = read_users(&args.users)?;
    let commands = read_commands(&args.commands)?;
    info!(users = users.len(), commands = commands.len(), "inputs loaded");

    let mut engine = Engine::new(config.engine.clone(), users).with_timings(timings);
    let outcomes = engine.run(&commands);

    let include_acks = args.include_acks || config.output.include_acks;
    let shown: Vec<&CommandOutcome> = outcomes
        .iter()
        .filter(|outcome| include_acks || !outcome.is_ack())
        .collect();

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    render_mode(
        &mut *out,
        output,
        &shown,
        |outcomes, w| {
            for outcome in outcomes {
                write_text(w, outcome)?;
            }
            Ok(())
        },
        |outcomes, w| {
            for outcome in outcomes {
                write_pretty(w, outcome)?;
            }
            Ok(())
        },
    )?;
    out.flush().context("Failed to flush outcomes")?;

    info!(written = shown.len(), total = outcomes.len(), "outcomes written");
    Ok(engine.timings().report())
}

/// One line: date, user, command, and a short summary.
fn write_text(w: &mut dyn Write, outcome: &CommandOutcome) -> io::Result<()> {
    writeln!(
        w,
        "{}  {}  {}  {}",
        outcome.timestamp,
        outcome.username,
        outcome.command,
        summary(outcome)
    )
}

fn summary(outcome: &CommandOutcome) -> String {
    match &outcome.result {
        Err(rejection) => format!("ERROR {}: {}", rejection.code, rejection.message),
        Ok(Payload::Ack) => "ok".to_string(),
        Ok(Payload::Tickets(tickets)) => {
            let ids: Vec<String> = tickets.iter().map(|t| format!("#{}", t.id)).collect();
            format!("{} ticket(s) {}", tickets.len(), ids.join(" "))
        }
        Ok(Payload::Milestones(milestones)) => {
            let names: Vec<&str> = milestones.iter().map(|m| m.name.as_str()).collect();
            format!("{} milestone(s) {}", milestones.len(), names.join(" "))
        }
        Ok(Payload::History(history)) => format!("{} ticket history entries", history.len()),
        Ok(Payload::Search(search)) => match &search.hits {
            SearchHits::Tickets(tickets) => format!("{} ticket hit(s)", tickets.len()),
            SearchHits::Developers(devs) => format!("{} developer hit(s)", devs.len()),
        },
        Ok(Payload::Notifications(list)) => format!("{} notification(s)", list.len()),
        Ok(Payload::Report(report)) => serde_json::to_string(report).unwrap_or_default(),
    }
}

fn write_pretty(w: &mut dyn Write, outcome: &CommandOutcome) -> io::Result<()> {
    pretty_section(
        w,
        &format!(
            "{} by {} on {}",
            outcome.command, outcome.username, outcome.timestamp
        ),
    )?;
    match &outcome.result {
        Err(rejection) => {
            pretty_kv(w, "error", rejection.code.tag())?;
            pretty_kv(w, "message", &rejection.message)?;
        }
        Ok(Payload::Ack) => pretty_kv(w, "result", "ok")?,
        Ok(Payload::Tickets(tickets)) => {
            for ticket in tickets {
                writeln!(
                    w,
                    "  #{:<4} {:<12} {:<9} {}",
                    ticket.id, ticket.status, ticket.business_priority, ticket.title
                )?;
            }
        }
        Ok(Payload::Milestones(milestones)) => {
            for milestone in milestones {
                writeln!(
                    w,
                    "  {:<16} {:<10} {:>6.2}%  due {}{}",
                    milestone.name,
                    milestone.status,
                    milestone.completion_percentage,
                    milestone.due_date,
                    if milestone.is_blocked { "  (blocked)" } else { "" }
                )?;
            }
        }
        Ok(Payload::History(history)) => {
            for entry in history {
                writeln!(
                    w,
                    "  #{:<4} {:<12} {} action(s), {} comment(s)  {}",
                    entry.id,
                    entry.status,
                    entry.actions.len(),
                    entry.comments.len(),
                    entry.title
                )?;
            }
        }
        Ok(Payload::Search(search)) => match &search.hits {
            SearchHits::Tickets(tickets) => {
                for ticket in tickets {
                    writeln!(w, "  #{:<4} {}", ticket.id, ticket.title)?;
                }
            }
            SearchHits::Developers(devs) => {
                for dev in devs {
                    writeln!(
                        w,
                        "  {:<16} {:<10} {:<7} {:.2}",
                        dev.username, dev.expertise_area, dev.seniority, dev.performance_score
                    )?;
                }
            }
        },
        Ok(Payload::Notifications(list)) => {
            for message in list {
                writeln!(w, "  {message}")?;
            }
        }
        Ok(Payload::Report(report)) => {
            let body = serde_json::to_string_pretty(report).unwrap_or_default();
            for line in body.lines() {
                writeln!(w, "  {line}")?;
            }
        }
    }
    writeln!(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use trackit_core::error::{Rejection, RejectionCode};

    fn outcome(result: Result<Payload, Rejection>) -> CommandOutcome {
        CommandOutcome {
            command: "assignTicket".into(),
            username: "alice".into(),
            timestamp: NaiveDate::from_ymd_opt(2025, 1, 14).expect("valid date"),
            result,
        }
    }

    #[test]
    fn text_line_shows_rejection_code() {
        let mut buf = Vec::new();
        write_text(
            &mut buf,
            &outcome(Err(Rejection::new(RejectionCode::Seniority, "too junior"))),
        )
        .expect("write");
        let line = String::from_utf8(buf).expect("utf8");
        assert_eq!(
            line,
            "2025-01-14  alice  assignTicket  ERROR SENIORITY: too junior\n"
        );
    }

    #[test]
    fn pretty_ack_says_ok() {
        let mut buf = Vec::new();
        write_pretty(&mut buf, &outcome(Ok(Payload::Ack))).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("assignTicket by alice on 2025-01-14\n"));
        assert!(text.contains("result:"));
    }
}
