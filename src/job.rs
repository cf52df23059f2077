//! Job descriptors and their resolution from paths or submission scripts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use regex::Regex;
use tracing::{info, warn};

use crate::corpus::Corpus;
use crate::error::{MonitorError, Result};
use crate::queue::{find_start_time, QueueStatusProvider};
use crate::result_stream::ResultStream;

/// One BLAST job to report on.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub corpus: Corpus,
    pub results: ResultStream,
    /// When the job started running, if known. Without it there is no ETA.
    pub start_time: Option<DateTime<Local>>,
}

impl Job {
    /// Wraps explicitly given paths. Nothing is checked until the job is measured.
    pub fn direct(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        start_time: Option<DateTime<Local>>,
    ) -> Self {
        Job {
            corpus: Corpus::new(input),
            results: ResultStream::new(output),
            start_time,
        }
    }

    /// Reads the `-i` and `-o` arguments out of a job submission script.
    ///
    /// This is a text scrape, not a shell parse: a flag inside a comment or a
    /// branch that never runs is picked up like any other. Relative paths are
    /// taken relative to the script's directory. The start time comes from
    /// `queue`; a failing or silent queue only means there will be no ETA.
    pub fn from_script(script: &Path, queue: &dyn QueueStatusProvider) -> Result<Self> {
        let contents = fs::read_to_string(script).map_err(|e| MonitorError::io(script, e))?;
        let dir = script.parent().unwrap_or_else(|| Path::new(""));

        let input = flag_value(input_flag(), &contents).ok_or_else(|| MonitorError::MissingFlag {
            script: script.to_path_buf(),
            flag: "input with -i",
        })?;
        let output = flag_value(output_flag(), &contents).ok_or_else(|| MonitorError::MissingFlag {
            script: script.to_path_buf(),
            flag: "output with -o",
        })?;

        let script_name = script
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let start_time = match queue.start_times() {
            Ok(times) => find_start_time(&times, &script_name),
            Err(e) => {
                warn!("{e}");
                None
            }
        };
        if start_time.is_none() {
            info!(script = %script.display(), "no queue entry, ETA disabled");
        }

        let job = Job::direct(dir.join(input), dir.join(output), start_time);
        info!(
            script = %script.display(),
            input = %job.corpus.path().display(),
            output = %job.results.path().display(),
            "resolved job"
        );
        Ok(job)
    }
}

fn input_flag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)-i\s+(\S+)").expect("valid input flag pattern"))
}

fn output_flag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\s)-o\s+(\S+)").expect("valid output flag pattern"))
}

/// First argument following the flag matched by `pattern`.
fn flag_value<'a>(pattern: &Regex, contents: &'a str) -> Option<&'a str> {
    pattern
        .captures(contents)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
