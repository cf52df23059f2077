//! Command-line interface code.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use clap::{ArgAction, Parser};
use tracing::warn;

use crate::error::MonitorError;
use crate::job::Job;
use crate::monitor::HitCounting;
use crate::queue::{CommandQueueStatus, QueueStatusProvider, StaticQueueStatus};
use crate::report::ReportFormat;

// --------------------------------------------------
// Arguments.

/// Reports how far running BLAST jobs have got through their input.
#[derive(Debug, Parser)]
#[command(about, author, version)]
pub struct Args {
    #[arg(
        short = 'i',
        long = "input",
        visible_aliases = ["sample", "sample-file"],
        value_name = "FILE",
        help = "Query .FASTA file of a job, paired with the -o at the same position"
    )]
    pub input: Vec<PathBuf>,

    #[arg(
        short = 'o',
        long = "output",
        visible_alias = "blast-output",
        value_name = "FILE",
        help = "Tabular BLAST output of a job"
    )]
    pub output: Vec<PathBuf>,

    #[arg(
        short = 's',
        long = "shell-script",
        value_name = "FILE",
        help = "Job submission script naming the input with -i and the output with -o"
    )]
    pub shell_script: Vec<PathBuf>,

    #[arg(
        long = "start-time",
        value_name = "TIME",
        value_parser = parse_start_time,
        help = "Local start time of the -i/-o jobs, as \"YYYY-MM-DD HH:MM:SS\""
    )]
    pub start_time: Option<DateTime<Local>>,

    #[arg(
        long = "queue-command",
        env = "BLAST_PROGRESS_QUEUE_CMD",
        value_name = "CMD",
        default_value = "qstat",
        help = "Command listing queued jobs with their start times"
    )]
    pub queue_command: String,

    #[arg(long = "no-queue", help = "Do not ask the queue for start times")]
    pub no_queue: bool,

    #[arg(long = "hit-counting", value_enum, default_value_t = HitCounting::Adjacent)]
    pub hit_counting: HitCounting,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    #[arg(short, long, action = ArgAction::Count, help = "Log more (-v info, -vv debug)")]
    pub verbose: u8,

    #[arg(short, long, conflicts_with = "verbose", help = "Log errors only")]
    pub quiet: bool,
}

fn parse_start_time(value: &str) -> std::result::Result<DateTime<Local>, String> {
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").map_err(|e| e.to_string())?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| format!("{value} does not exist in the local time zone"))
}

// --------------------------------------------------
// Job resolution

/// Turns the parsed arguments into jobs.
///
/// The k-th `-i` goes with the k-th `-o`. Any failure here means a job could
/// not be formed at all, so the whole run stops.
pub fn resolve_jobs(args: &Args) -> Result<Vec<Job>> {
    if args.input.len() != args.output.len() {
        return Err(MonitorError::UnpairedDirectJob {
            inputs: args.input.len(),
            outputs: args.output.len(),
        }
        .into());
    }
    if args.input.is_empty() && args.shell_script.is_empty() {
        bail!("No jobs given: use -i FILE -o FILE or -s FILE");
    }

    let mut jobs: Vec<Job> = args
        .input
        .iter()
        .zip(&args.output)
        .map(|(input, output)| Job::direct(input, output, args.start_time))
        .collect();

    if !args.shell_script.is_empty() {
        let queue = queue_snapshot(args);
        for script in &args.shell_script {
            jobs.push(Job::from_script(script, &queue)?);
        }
    }
    Ok(jobs)
}

/// Asks the queue once for every script job of this run.
fn queue_snapshot(args: &Args) -> StaticQueueStatus {
    if args.no_queue {
        return StaticQueueStatus::default();
    }
    let times = CommandQueueStatus::from_command_line(&args.queue_command)
        .and_then(|queue| queue.start_times());
    match times {
        Ok(times) => StaticQueueStatus(times),
        Err(e) => {
            warn!("{e}, ETA disabled for script jobs");
            StaticQueueStatus::default()
        }
    }
}

// --------------------------------------------------
#[cfg(test)]
mod cli_tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn parse(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("blast_progress_monitor").chain(argv.iter().copied()))
    }

    #[test]
    fn test_direct_jobs_pair_in_order() -> Result<()> {
        let args = parse(&["-i", "a.fa", "-o", "a.tab", "--sample", "b.fa", "--blast-output", "b.tab"]);
        let jobs = resolve_jobs(&args)?;
        assert_eq!(2, jobs.len());
        assert_eq!(Path::new("a.fa"), jobs[0].corpus.path());
        assert_eq!(Path::new("a.tab"), jobs[0].results.path());
        assert_eq!(Path::new("b.fa"), jobs[1].corpus.path());
        assert_eq!(Path::new("b.tab"), jobs[1].results.path());
        Ok(())
    }

    #[test]
    fn test_unpaired_direct_job() {
        let args = parse(&["-i", "a.fa", "-i", "b.fa", "-o", "a.tab"]);
        let err = resolve_jobs(&args).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MonitorError>(),
            Some(MonitorError::UnpairedDirectJob { inputs: 2, outputs: 1 })
        ));
    }

    #[test]
    fn test_no_jobs() {
        assert!(resolve_jobs(&parse(&[])).is_err());
    }

    #[test]
    fn test_start_time_applies_to_direct_jobs() -> Result<()> {
        let args = parse(&["-i", "a.fa", "-o", "a.tab", "--start-time", "2026-10-18 08:30:00"]);
        let jobs = resolve_jobs(&args)?;
        let expected = Local.with_ymd_and_hms(2026, 10, 18, 8, 30, 0).unwrap();
        assert_eq!(Some(expected), jobs[0].start_time);
        Ok(())
    }

    #[test]
    fn test_bad_start_time_rejected() {
        let argv = ["blast_progress_monitor", "-i", "a.fa", "-o", "a.tab", "--start-time", "yesterday"];
        assert!(Args::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_script_job_without_queue() -> Result<()> {
        let dir = TempDir::new()?;
        let script = dir.path().join("run.sh");
        fs::write(&script, "blastp -i reads.fa -o hits.tab\n")?;
        let script = script.to_string_lossy().into_owned();
        let args = parse(&["--no-queue", "-s", &script]);
        let jobs = resolve_jobs(&args)?;
        assert_eq!(1, jobs.len());
        assert_eq!(dir.path().join("reads.fa"), jobs[0].corpus.path());
        assert_eq!(None, jobs[0].start_time);
        Ok(())
    }

    #[test]
    fn test_script_missing_flag_aborts() -> Result<()> {
        let dir = TempDir::new()?;
        let script = dir.path().join("run.sh");
        fs::write(&script, "blastp -i reads.fa\n")?;
        let script = script.to_string_lossy().into_owned();
        let err = resolve_jobs(&parse(&["--no-queue", "-s", &script])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MonitorError>(),
            Some(MonitorError::MissingFlag { .. })
        ));
        Ok(())
    }
}
