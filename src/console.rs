//! Line commands for driving the assistant from a terminal.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};

use crate::alerts::AlertLevel;

pub const HELP: &str = "\
commands:
  online | offline          simulate a connectivity change
  sync                      push queued updates now
  say <phrase>              handle a spoken command
  listen                    toggle voice recognition
  read                      read the current view aloud
  pass <check> | fail <check> | reset <check>
  note <check> <text>       attach a note to a check
  photo <check> <file>      attach a photo to a check
  next | prev | guide       move between sections, walk the current one
  checklist | progress | complete
  jobs | summary
  start <id> | done <id> | select <id> | navigate <id>
  instructions              repeat navigation guidance
  status                    read the shift status aloud
  alerts | hear <id> | dismiss <id>
  raise <danger|warning|info> <priority> <message>
  rate <value>              change the speaking rate
  reload                    re-read settings.json
  stop                      stop speaking
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Help,
    Online,
    Offline,
    Sync,
    Say(String),
    Listen,
    Read,
    Pass(String),
    Fail(String),
    Reset(String),
    Note { check_id: String, text: String },
    Photo { check_id: String, path: PathBuf },
    Next,
    Prev,
    Guide,
    Checklist,
    Progress,
    Complete,
    Jobs,
    Summary,
    Start(u32),
    Done(u32),
    Select(u32),
    Navigate(u32),
    Instructions,
    Status,
    Alerts,
    Hear(u32),
    Dismiss(u32),
    Raise {
        level: AlertLevel,
        priority: u8,
        message: String,
    },
    Rate(f32),
    Reload,
    Stop,
    Quit,
}

fn required<'a>(rest: Option<&'a str>, what: &str) -> Result<&'a str> {
    rest.map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("missing {what}"))
}

fn job_id(rest: Option<&str>) -> Result<u32> {
    let raw = required(rest, "job id")?;
    raw.parse()
        .with_context(|| format!("'{raw}' is not a job id"))
}

fn numeric_id(rest: Option<&str>, what: &str) -> Result<u32> {
    let raw = required(rest, what)?;
    raw.parse()
        .with_context(|| format!("'{raw}' is not a valid {what}"))
}

fn alert_level(raw: &str) -> Result<AlertLevel> {
    match raw.to_lowercase().as_str() {
        "danger" => Ok(AlertLevel::Danger),
        "warning" => Ok(AlertLevel::Warning),
        "info" => Ok(AlertLevel::Info),
        other => bail!("unknown alert level '{other}'"),
    }
}

fn raise(rest: Option<&str>) -> Result<ConsoleCommand> {
    let rest = required(rest, "alert level")?;
    let mut parts = rest.splitn(3, char::is_whitespace);
    let level = alert_level(parts.next().unwrap_or_default())?;
    let priority = parts
        .next()
        .ok_or_else(|| anyhow!("missing alert priority"))?
        .parse()
        .context("alert priority must be 0-255")?;
    let message = required(parts.next(), "alert message")?.to_string();
    Ok(ConsoleCommand::Raise {
        level,
        priority,
        message,
    })
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, Some(rest)),
        None => (line, None),
    };

    let command = match verb.to_lowercase().as_str() {
        "help" | "?" => ConsoleCommand::Help,
        "online" => ConsoleCommand::Online,
        "offline" => ConsoleCommand::Offline,
        "sync" => ConsoleCommand::Sync,
        "say" => ConsoleCommand::Say(required(rest, "phrase")?.to_string()),
        "listen" => ConsoleCommand::Listen,
        "read" => ConsoleCommand::Read,
        "pass" => ConsoleCommand::Pass(required(rest, "check id")?.to_string()),
        "fail" => ConsoleCommand::Fail(required(rest, "check id")?.to_string()),
        "reset" => ConsoleCommand::Reset(required(rest, "check id")?.to_string()),
        "note" => {
            let rest = required(rest, "check id")?;
            let (check_id, text) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("missing note text"))?;
            ConsoleCommand::Note {
                check_id: check_id.to_string(),
                text: text.trim().to_string(),
            }
        }
        "photo" => {
            let rest = required(rest, "check id")?;
            let (check_id, path) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| anyhow!("missing photo path"))?;
            ConsoleCommand::Photo {
                check_id: check_id.to_string(),
                path: PathBuf::from(path.trim()),
            }
        }
        "next" => ConsoleCommand::Next,
        "prev" | "back" => ConsoleCommand::Prev,
        "guide" => ConsoleCommand::Guide,
        "checklist" => ConsoleCommand::Checklist,
        "progress" => ConsoleCommand::Progress,
        "complete" => ConsoleCommand::Complete,
        "jobs" => ConsoleCommand::Jobs,
        "summary" => ConsoleCommand::Summary,
        "start" => ConsoleCommand::Start(job_id(rest)?),
        "done" => ConsoleCommand::Done(job_id(rest)?),
        "select" => ConsoleCommand::Select(job_id(rest)?),
        "navigate" => ConsoleCommand::Navigate(job_id(rest)?),
        "instructions" => ConsoleCommand::Instructions,
        "status" => ConsoleCommand::Status,
        "alerts" => ConsoleCommand::Alerts,
        "hear" => ConsoleCommand::Hear(numeric_id(rest, "alert id")?),
        "dismiss" => ConsoleCommand::Dismiss(numeric_id(rest, "alert id")?),
        "raise" => raise(rest)?,
        "rate" => {
            let raw = required(rest, "rate")?;
            ConsoleCommand::Rate(
                raw.parse()
                    .with_context(|| format!("'{raw}' is not a speaking rate"))?,
            )
        }
        "reload" => ConsoleCommand::Reload,
        "stop" => ConsoleCommand::Stop,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => bail!("unknown command '{other}' (try 'help')"),
    };

    Ok(Some(command))
}
