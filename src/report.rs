//! Rendering of job reports as text blocks or CSV rows.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use csv::WriterBuilder;
use serde::Serialize;

use crate::estimator::Eta;
use crate::monitor::{JobReport, JobStatus};

const FENCE: &str = "===========";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Text,
    Csv,
}

/// Writes `reports` to `out` in the requested format.
pub fn write_reports<W: Write>(out: W, reports: &[JobReport], format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => write_text(out, reports),
        ReportFormat::Csv => write_csv(out, reports),
    }
}

fn count(n: Option<usize>, unit: &str) -> String {
    match n {
        Some(n) => format!("{n} {unit}"),
        None => "unreadable".to_string(),
    }
}

fn timestamp(t: &DateTime<Local>) -> String {
    t.format(TIME_FORMAT).to_string()
}

/// One fenced block per job.
pub fn write_text<W: Write>(mut out: W, reports: &[JobReport]) -> Result<()> {
    for report in reports {
        writeln!(out, "{FENCE}")?;
        writeln!(out, "INPUT:         {} [{}]", report.input.display(), count(report.entry_count, "reads"))?;
        writeln!(out, "OUTPUT:        {} [{}]", report.output.display(), count(report.hit_count, "hits"))?;
        if let Some(start) = &report.start_time {
            writeln!(out, "STARTED:       {}", timestamp(start))?;
        }
        writeln!(out)?;
        match &report.status {
            JobStatus::Running(estimate) => {
                writeln!(out, "PROGRESS:      {:.2}% [{} of {}]", estimate.progress_pct, estimate.position, estimate.entry_count)?;
                writeln!(out)?;
                match estimate.hit_rate_pct {
                    Some(rate) => writeln!(out, "HIT RATE:      {rate:.2}%")?,
                    None => writeln!(out, "HIT RATE:      undefined")?,
                }
                writeln!(out)?;
                match estimate.eta {
                    Eta::At(eta) => writeln!(out, "ETA:           {}", timestamp(&eta))?,
                    Eta::NotEstimable => writeln!(out, "ETA:           not estimable (start time unknown)")?,
                }
            }
            JobStatus::NotStarted => {
                writeln!(out, "PROGRESS:      not started")?;
                writeln!(out)?;
                writeln!(out, "HIT RATE:      unavailable")?;
            }
            JobStatus::Unavailable(reason) => {
                writeln!(out, "PROGRESS:      unavailable - {reason}")?;
                writeln!(out)?;
                writeln!(out, "HIT RATE:      unavailable")?;
            }
        }
        writeln!(out, "{FENCE}")?;
    }
    out.flush()?;
    Ok(())
}

/* One serde-serialized CSV row per job. */
#[derive(Debug, Serialize)]
struct CsvRow {
    input: String,
    output: String,
    reads: Option<usize>,
    hits: Option<usize>,
    position: Option<usize>,
    progress: Option<String>,
    hit_rate: Option<String>,
    started: Option<String>,
    eta: Option<String>,
    status: String,
}

impl From<&JobReport> for CsvRow {
    fn from(report: &JobReport) -> Self {
        let mut row = CsvRow {
            input: report.input.display().to_string(),
            output: report.output.display().to_string(),
            reads: report.entry_count,
            hits: report.hit_count,
            position: None,
            progress: None,
            hit_rate: None,
            started: report.start_time.as_ref().map(timestamp),
            eta: None,
            status: String::new(),
        };
        match &report.status {
            JobStatus::Running(estimate) => {
                row.position = Some(estimate.position);
                row.progress = Some(format!("{:.2}", estimate.progress_pct));
                row.hit_rate = estimate.hit_rate_pct.map(|rate| format!("{rate:.2}"));
                if let Eta::At(eta) = &estimate.eta {
                    row.eta = Some(timestamp(eta));
                }
                row.status = "running".to_string();
            }
            JobStatus::NotStarted => row.status = "not started".to_string(),
            JobStatus::Unavailable(reason) => row.status = format!("unavailable: {reason}"),
        }
        row
    }
}

pub fn write_csv<W: Write>(out: W, reports: &[JobReport]) -> Result<()> {
    let mut wtr = WriterBuilder::new().delimiter(b',').from_writer(out);
    for report in reports {
        wtr.serialize(CsvRow::from(report))?;
    }
    wtr.flush()?;
    Ok(())
}

// --------------------------------------------------
#[cfg(test)]
mod report_tests {
    use super::*;
    use crate::estimator::Estimate;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn running(eta: Eta, start_time: Option<DateTime<Local>>) -> JobReport {
        JobReport {
            input: PathBuf::from("in.fa"),
            output: PathBuf::from("out.tab"),
            entry_count: Some(10),
            hit_count: Some(8),
            start_time,
            status: JobStatus::Running(Estimate {
                position: 5,
                entry_count: 10,
                progress_pct: 50.0,
                hit_rate_pct: Some(80.0),
                eta,
            }),
        }
    }

    #[test]
    fn test_text_running_job() -> Result<()> {
        let start = Local.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap();
        let eta = Local.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        let mut out = Vec::new();
        write_text(&mut out, &[running(Eta::At(eta), Some(start))])?;
        let expected = "\
===========
INPUT:         in.fa [10 reads]
OUTPUT:        out.tab [8 hits]
STARTED:       2026-10-18 08:00:00

PROGRESS:      50.00% [5 of 10]

HIT RATE:      80.00%

ETA:           2026-10-18 12:00:00
===========
";
        assert_eq!(expected, String::from_utf8(out)?);
        Ok(())
    }

    #[test]
    fn test_text_degraded_jobs() -> Result<()> {
        let reports = [
            JobReport {
                input: PathBuf::from("a.fa"),
                output: PathBuf::from("a.tab"),
                entry_count: Some(3),
                hit_count: Some(0),
                start_time: None,
                status: JobStatus::NotStarted,
            },
            JobReport {
                input: PathBuf::from("b.fa"),
                output: PathBuf::from("b.tab"),
                entry_count: None,
                hit_count: Some(2),
                start_time: None,
                status: JobStatus::Unavailable("cannot read b.fa".to_string()),
            },
        ];
        let mut out = Vec::new();
        write_text(&mut out, &reports)?;
        let text = String::from_utf8(out)?;
        assert!(text.contains("PROGRESS:      not started\n"));
        assert!(text.contains("INPUT:         b.fa [unreadable]\n"));
        assert!(text.contains("PROGRESS:      unavailable - cannot read b.fa\n"));
        assert_eq!(4, text.matches(FENCE).count());
        Ok(())
    }

    #[test]
    fn test_text_without_start_time() -> Result<()> {
        let mut out = Vec::new();
        write_text(&mut out, &[running(Eta::NotEstimable, None)])?;
        let text = String::from_utf8(out)?;
        assert!(!text.contains("STARTED:"));
        assert!(text.contains("ETA:           not estimable (start time unknown)\n"));
        Ok(())
    }

    #[test]
    fn test_csv_rows() -> Result<()> {
        let reports = [
            running(Eta::NotEstimable, None),
            JobReport {
                input: PathBuf::from("c.fa"),
                output: PathBuf::from("c.tab"),
                entry_count: Some(4),
                hit_count: Some(0),
                start_time: None,
                status: JobStatus::NotStarted,
            },
        ];
        let mut out = Vec::new();
        write_reports(&mut out, &reports, ReportFormat::Csv)?;
        let expected = "\
input,output,reads,hits,position,progress,hit_rate,started,eta,status
in.fa,out.tab,10,8,5,50.00,80.00,,,running
c.fa,c.tab,4,0,,,,,,not started
";
        assert_eq!(expected, String::from_utf8(out)?);
        Ok(())
    }
}
