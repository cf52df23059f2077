//! Live progress of long-running BLAST jobs.
//!
//! A job is a FASTA corpus of queries and the tabular output BLAST appends
//! to as it works through them. Queries are processed in file order, so the
//! rank of the query named on the last output line tells how far the job has
//! got. From that rank, the number of queries with hits and the time the job
//! started, this crate derives progress, hit rate and an expected finish time.

pub mod cli;
pub mod corpus;
pub mod error;
pub mod estimator;
pub mod job;
pub mod logging;
pub mod monitor;
pub mod queue;
pub mod report;
pub mod result_stream;

pub use corpus::Corpus;
pub use error::{MonitorError, Result};
pub use estimator::{estimate, Estimate, Eta};
pub use job::Job;
pub use monitor::{assess, HitCounting, JobReport, JobStatus};
pub use queue::{CommandQueueStatus, QueueStatusProvider, StartTimes, StaticQueueStatus};
pub use result_stream::{ResultStream, StreamSnapshot};
