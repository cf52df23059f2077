//! The FASTA input a monitored BLAST job works through.
//!
//! Entries are assumed to be processed in file order, so the rank of an entry
//! is what the job's progress is measured against.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};

use bio::io::fasta::Reader;
use tracing::debug;

use crate::error::{MonitorError, Result};

/// First byte of every FASTA header line.
pub const RECORD_MARKER: u8 = b'>';

/// A sequence input file, read fresh on every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    path: PathBuf,
}

impl Corpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Corpus { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<BufReader<File>> {
        File::open(&self.path)
            .map(BufReader::new)
            .map_err(|e| MonitorError::io(&self.path, e))
    }

    /// Number of lines starting with [`RECORD_MARKER`].
    ///
    /// A `>` anywhere but the first byte of a line does not count.
    pub fn entry_count(&self) -> Result<usize> {
        let mut reader = self.open()?;
        let mut line = Vec::new();
        let mut count = 0;
        loop {
            line.clear();
            let n = reader
                .read_until(b'\n', &mut line)
                .map_err(|e| MonitorError::io(&self.path, e))?;
            if n == 0 {
                break;
            }
            if line.first() == Some(&RECORD_MARKER) {
                count += 1;
            }
        }
        debug!(path = %self.path.display(), count, "counted corpus entries");
        Ok(count)
    }

    /// Record identifiers in file order, as parsed by [`bio::io::fasta::Reader`].
    ///
    /// Lines before the first header are skipped, as [`Corpus::entry_count`]
    /// and [`Corpus::position_of`] skip them.
    pub fn ordered_entry_keys(&self) -> Result<Vec<String>> {
        let mut reader = self.open()?;
        let mut first_header = Vec::new();
        loop {
            first_header.clear();
            let n = reader
                .read_until(b'\n', &mut first_header)
                .map_err(|e| MonitorError::io(&self.path, e))?;
            if n == 0 || first_header.first() == Some(&RECORD_MARKER) {
                break;
            }
        }
        let records = Cursor::new(first_header).chain(reader);
        let mut keys = Vec::new();
        for record in Reader::new(records).records() {
            let record = record.map_err(|e| MonitorError::io(&self.path, e))?;
            keys.push(record.id().to_string());
        }
        Ok(keys)
    }

    /// 1-based rank of the entry whose identifier is exactly `key`.
    ///
    /// Scans header lines only, without parsing sequences. Agrees with the
    /// index of `key` in [`Corpus::ordered_entry_keys`] plus one.
    pub fn position_of(&self, key: &str) -> Result<Option<usize>> {
        let reader = self.open()?;
        let mut rank = 0;
        for line in reader.split(b'\n') {
            let line = line.map_err(|e| MonitorError::io(&self.path, e))?;
            if line.first() != Some(&RECORD_MARKER) {
                continue;
            }
            rank += 1;
            if header_id(&line[1..]) == key.as_bytes() {
                return Ok(Some(rank));
            }
        }
        Ok(None)
    }
}

/// The identifier token of a header line with the marker already stripped.
fn header_id(header: &[u8]) -> &[u8] {
    let end = header
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(header.len());
    &header[..end]
}
