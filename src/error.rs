//! Error taxonomy for job resolution and per-job metric computation.

use std::io;
use std::path::PathBuf;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while resolving or measuring a job.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// A corpus, result stream or script could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A submission script does not name an input or output.
    #[error("Shell script {} does not specify an {flag}", script.display())]
    MissingFlag { script: PathBuf, flag: &'static str },

    /// The result stream holds no records yet.
    #[error("no results in {} yet", path.display())]
    EmptyStream { path: PathBuf },

    /// The last processed key is not an entry of the corpus.
    #[error("last hit {key} not found in {}", corpus.display())]
    KeyNotFound { key: String, corpus: PathBuf },

    /// Direct mode needs one `-o` for every `-i`.
    #[error("{inputs} input file(s) given but {outputs} output file(s)")]
    UnpairedDirectJob { inputs: usize, outputs: usize },

    /// The queue status command could not be run or returned garbage.
    #[error("queue status: {0}")]
    QueueStatus(String),
}

impl MonitorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        MonitorError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors that spoil only the job they occurred in.
    ///
    /// Everything else means a job could not be formed at all and the run
    /// stops.
    pub fn is_job_local(&self) -> bool {
        matches!(
            self,
            MonitorError::Io { .. } | MonitorError::EmptyStream { .. } | MonitorError::KeyNotFound { .. }
        )
    }
}
