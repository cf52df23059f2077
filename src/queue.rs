//! Start times of queued jobs, as reported by the batch scheduler.

use std::collections::{HashMap, HashSet};
use std::process::Command;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use tracing::{debug, warn};

use crate::error::{MonitorError, Result};

/// Scheduler job name to the time the job was submitted or started.
pub type StartTimes = HashMap<String, DateTime<Local>>;

/// Anything that can list running jobs with their start times.
pub trait QueueStatusProvider {
    fn start_times(&self) -> Result<StartTimes>;
}

/// A fixed set of start times. An empty one disables ETA for script jobs.
#[derive(Debug, Clone, Default)]
pub struct StaticQueueStatus(pub StartTimes);

impl QueueStatusProvider for StaticQueueStatus {
    fn start_times(&self) -> Result<StartTimes> {
        Ok(self.0.clone())
    }
}

/// Runs a `qstat`-like command and parses its table.
#[derive(Debug, Clone)]
pub struct CommandQueueStatus {
    program: String,
    args: Vec<String>,
}

impl CommandQueueStatus {
    /// Splits `command_line` on whitespace into a program and its arguments.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut words = command_line.split_whitespace().map(str::to_string);
        let program = words
            .next()
            .ok_or_else(|| MonitorError::QueueStatus("empty queue command".to_string()))?;
        Ok(CommandQueueStatus {
            program,
            args: words.collect(),
        })
    }
}

impl QueueStatusProvider for CommandQueueStatus {
    fn start_times(&self) -> Result<StartTimes> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| MonitorError::QueueStatus(format!("{} execution failed: {e}", self.program)))?;
        if !output.status.success() {
            return Err(MonitorError::QueueStatus(format!(
                "{} failed: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let times = parse_qstat(&String::from_utf8_lossy(&output.stdout));
        debug!(program = %self.program, jobs = times.len(), "read queue status");
        Ok(times)
    }
}

/// Width SGE `qstat` cuts job names to.
pub const SGE_NAME_WIDTH: usize = 10;

/// Parses SGE `qstat` output.
///
/// Columns: job-ID, prior, name, user, state, date (`%m/%d/%Y`),
/// time (`%H:%M:%S`), queue, slots. The header, the dashed separator and any
/// other line whose date and time do not parse are skipped. A name listed
/// more than once cannot be tied to one start time and is dropped.
pub fn parse_qstat(text: &str) -> StartTimes {
    let mut times = StartTimes::new();
    let mut repeated = HashSet::new();
    for line in text.lines() {
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < 7 {
            continue;
        }
        let stamp = format!("{} {}", columns[5], columns[6]);
        let Ok(naive) = NaiveDateTime::parse_from_str(&stamp, "%m/%d/%Y %H:%M:%S") else {
            continue;
        };
        match Local.from_local_datetime(&naive).earliest() {
            Some(start) => {
                if times.insert(columns[2].to_string(), start).is_some() {
                    repeated.insert(columns[2].to_string());
                }
            }
            None => warn!(line, "queue time does not exist in local time zone"),
        }
    }
    for name in repeated {
        debug!(name = %name, "job name listed more than once, ignoring it");
        times.remove(&name);
    }
    times
}

/// Start time of the queued job that runs `script_name`.
///
/// An exact job name match wins. Otherwise a job name counts only if it is
/// exactly [`SGE_NAME_WIDTH`] characters long and a prefix of `script_name`,
/// i.e. what `qstat` shows for a longer name. Anything else, including more
/// than one candidate, is a miss.
pub fn find_start_time(times: &StartTimes, script_name: &str) -> Option<DateTime<Local>> {
    if let Some(start) = times.get(script_name) {
        return Some(*start);
    }
    if script_name.chars().count() <= SGE_NAME_WIDTH {
        return None;
    }
    let mut candidates = times.iter().filter(|(name, _)| {
        name.chars().count() == SGE_NAME_WIDTH && script_name.starts_with(name.as_str())
    });
    match (candidates.next(), candidates.next()) {
        (Some((_, start)), None) => Some(*start),
        _ => None,
    }
}
