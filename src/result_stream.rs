//! The tabular output a BLAST job appends to while it runs.
//!
//! The first whitespace-delimited token of every line names the query entry
//! the hit belongs to. The file is read without locking; whatever is on disk
//! at read time is the snapshot.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use tracing::debug;

use crate::error::{MonitorError, Result};

/// Counts derived from a single pass over the result stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSnapshot {
    /// Non-blank lines, i.e. hits reported so far.
    pub total_count: usize,
    /// Keys counted with adjacent duplicates collapsed.
    pub unique_key_count: usize,
    /// Keys counted as a true set.
    pub distinct_key_count: usize,
    /// Key of the final non-blank line, `None` while the stream is empty.
    pub last_key: Option<String>,
}

/// A growing result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultStream {
    path: PathBuf,
}

impl ResultStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ResultStream { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file once and derives every count from that read.
    ///
    /// Lines are split on bytes, so a half-written multibyte character in
    /// the last line only garbles that line's key.
    pub fn snapshot(&self) -> Result<StreamSnapshot> {
        let file = File::open(&self.path).map_err(|e| MonitorError::io(&self.path, e))?;
        let keys = BufReader::new(file)
            .split(b'\n')
            .filter_map(|line| match line {
                Ok(line) => leading_key(&line).map(Ok),
                Err(e) => Some(Err(e)),
            });
        let snapshot = itertools::process_results(keys, |keys| {
            let mut snapshot = StreamSnapshot {
                total_count: 0,
                unique_key_count: 0,
                distinct_key_count: 0,
                last_key: None,
            };
            let mut seen = HashSet::new();
            for (count, key) in keys.dedup_with_count() {
                snapshot.total_count += count;
                snapshot.unique_key_count += 1;
                if !seen.contains(&key) {
                    seen.insert(key.clone());
                }
                snapshot.last_key = Some(key);
            }
            snapshot.distinct_key_count = seen.len();
            snapshot
        })
        .map_err(|e| MonitorError::io(&self.path, e))?;
        debug!(path = %self.path.display(), ?snapshot, "read result stream");
        Ok(snapshot)
    }

    /// Key of the most recently completed entry.
    ///
    /// Trailing blank lines are skipped. Fails with
    /// [`MonitorError::EmptyStream`] when the job has written nothing yet.
    pub fn last_key(&self) -> Result<String> {
        self.snapshot()?
            .last_key
            .ok_or_else(|| MonitorError::EmptyStream {
                path: self.path.clone(),
            })
    }

    pub fn total_count(&self) -> Result<usize> {
        Ok(self.snapshot()?.total_count)
    }

    /// Number of query entries with at least one hit.
    ///
    /// Only adjacent repeats of a key are collapsed, so results that are not
    /// grouped by query overcount. Use [`ResultStream::distinct_key_count`]
    /// for a true distinct count.
    pub fn unique_key_count(&self) -> Result<usize> {
        Ok(self.snapshot()?.unique_key_count)
    }

    pub fn distinct_key_count(&self) -> Result<usize> {
        Ok(self.snapshot()?.distinct_key_count)
    }
}

/// First whitespace-delimited token of a line, `None` for blank lines.
fn leading_key(line: &[u8]) -> Option<String> {
    line.split(|b| b.is_ascii_whitespace())
        .find(|token| !token.is_empty())
        .map(|token| String::from_utf8_lossy(token).into_owned())
}

// --------------------------------------------------
#[cfg(test)]
mod result_stream_tests {
    use super::*;
    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn stream(contents: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{contents}")?;
        Ok(file)
    }

    const HITS: &str = "\
read1\tsp|P1|X\t98.0\t100
read1\tsp|P2|Y\t91.2\t100
read2\tsp|P1|X\t88.0\t90
read4\tsp|P9|Z\t75.5\t60
read4\tsp|P3|W\t70.1\t60
";

    #[test]
    fn test_snapshot_counts() -> Result<()> {
        let file = stream(HITS)?;
        let snapshot = ResultStream::new(file.path()).snapshot()?;
        assert_eq!(
            StreamSnapshot {
                total_count: 5,
                unique_key_count: 3,
                distinct_key_count: 3,
                last_key: Some("read4".to_string()),
            },
            snapshot
        );
        Ok(())
    }

    #[test]
    fn test_last_key_skips_trailing_blank_lines() -> Result<()> {
        let file = stream("read1 a\nread7 b\n\n   \n")?;
        assert_eq!("read7", ResultStream::new(file.path()).last_key()?);
        Ok(())
    }

    #[test]
    fn test_last_key_of_unterminated_line() -> Result<()> {
        let file = stream("read1 a\nread2 b")?;
        assert_eq!("read2", ResultStream::new(file.path()).last_key()?);
        Ok(())
    }

    #[test]
    fn test_empty_stream() -> Result<()> {
        let file = stream("")?;
        let results = ResultStream::new(file.path());
        assert!(matches!(results.last_key(), Err(MonitorError::EmptyStream { .. })));
        assert_eq!(0, results.total_count()?);
        assert_eq!(0, results.unique_key_count()?);
        Ok(())
    }

    #[test]
    fn test_unique_count_collapses_only_adjacent_keys() -> Result<()> {
        let file = stream("a 1\nb 1\na 2\na 3\n")?;
        let results = ResultStream::new(file.path());
        assert_eq!(3, results.unique_key_count()?);
        assert_eq!(2, results.distinct_key_count()?);
        assert_eq!(4, results.total_count()?);
        Ok(())
    }

    #[test]
    fn test_partial_multibyte_last_line() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"read1\tsp|P1|X\nread2\tsp|\xc3\xa9|Y\nread3\tdescription \xe2\x82")?;
        let snapshot = ResultStream::new(file.path()).snapshot()?;
        assert_eq!(3, snapshot.total_count);
        assert_eq!(Some("read3".to_string()), snapshot.last_key);
        Ok(())
    }

    #[test]
    fn test_partial_multibyte_key() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        file.write_all(b"read1 a\nr\xc3")?;
        let results = ResultStream::new(file.path());
        assert_eq!("r\u{FFFD}", results.last_key()?);
        assert_eq!(2, results.unique_key_count()?);
        Ok(())
    }

    #[test]
    fn test_missing_stream_is_io_error() {
        let results = ResultStream::new("no/such/output.tab");
        assert!(matches!(results.snapshot(), Err(MonitorError::Io { .. })));
    }
}
