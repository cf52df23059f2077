//! Measures one job and turns every job-local failure into a degraded report.

use std::path::PathBuf;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use tracing::{error, warn};

use crate::error::{MonitorError, Result};
use crate::estimator::{estimate, Estimate};
use crate::job::Job;
use crate::result_stream::StreamSnapshot;

/// How hits are counted per query entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum HitCounting {
    /// Collapse repeated keys only when they are next to each other.
    #[default]
    Adjacent,
    /// Count every key once, wherever it appears.
    Distinct,
}

/// State of a job at the time it was looked at.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Running(Estimate),
    /// The result stream is still empty.
    NotStarted,
    /// Progress could not be computed, with the reason.
    Unavailable(String),
}

/// Everything known about one job, ready for formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct JobReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Entries in the corpus, `None` if it could not be read.
    pub entry_count: Option<usize>,
    /// Hits written so far, `None` if the result stream could not be read.
    pub hit_count: Option<usize>,
    pub start_time: Option<DateTime<Local>>,
    pub status: JobStatus,
}

/// Takes a snapshot of `job` and derives its metrics as of `now`.
pub fn assess(job: &Job, now: DateTime<Local>, counting: HitCounting) -> JobReport {
    let entry_count = job.corpus.entry_count();
    let snapshot = job.results.snapshot();
    let mut report = JobReport {
        input: job.corpus.path().to_path_buf(),
        output: job.results.path().to_path_buf(),
        entry_count: entry_count.as_ref().ok().copied(),
        hit_count: snapshot.as_ref().ok().map(|s| s.total_count),
        start_time: job.start_time,
        status: JobStatus::NotStarted,
    };
    report.status = match measure(job, entry_count, snapshot, now, counting) {
        Ok(estimate) => JobStatus::Running(estimate),
        Err(MonitorError::EmptyStream { .. }) => JobStatus::NotStarted,
        Err(e) if e.is_job_local() => {
            warn!(input = %report.input.display(), "progress unavailable: {e}");
            JobStatus::Unavailable(e.to_string())
        }
        Err(e) => {
            error!(input = %report.input.display(), "unexpected error while measuring: {e}");
            JobStatus::Unavailable(e.to_string())
        }
    };
    report
}

fn measure(
    job: &Job,
    entry_count: Result<usize>,
    snapshot: Result<StreamSnapshot>,
    now: DateTime<Local>,
    counting: HitCounting,
) -> Result<Estimate> {
    let entry_count = entry_count?;
    let snapshot = snapshot?;
    let last_key = snapshot.last_key.ok_or_else(|| MonitorError::EmptyStream {
        path: job.results.path().to_path_buf(),
    })?;
    let position = job.corpus.position_of(&last_key)?;
    if cfg!(debug_assertions) {
        let ranked = job
            .corpus
            .ordered_entry_keys()?
            .iter()
            .position(|key| *key == last_key)
            .map(|i| i + 1);
        if ranked != position {
            warn!(key = %last_key, ?position, ?ranked, "header scan and FASTA reader disagree");
        }
    }
    let position = position.ok_or_else(|| MonitorError::KeyNotFound {
        key: last_key,
        corpus: job.corpus.path().to_path_buf(),
    })?;
    let unique_hits = match counting {
        HitCounting::Adjacent => snapshot.unique_key_count,
        HitCounting::Distinct => snapshot.distinct_key_count,
    };
    Ok(estimate(entry_count, position, unique_hits, job.start_time, now))
}
