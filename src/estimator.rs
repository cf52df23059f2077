//! Progress, hit rate and completion time of a partially finished job.

use chrono::{DateTime, Duration, Local, Utc};

/// Projected completion of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eta {
    At(DateTime<Local>),
    /// The start time is unknown, so no rate can be measured.
    NotEstimable,
}

/// Metrics of one job at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    /// 1-based rank of the last processed entry in the corpus.
    pub position: usize,
    pub entry_count: usize,
    pub progress_pct: f64,
    /// Share of processed entries with at least one hit. `None` when nothing
    /// has been processed.
    pub hit_rate_pct: Option<f64>,
    pub eta: Eta,
}

/// Derives the job metrics from raw counts.
///
/// Progress is `position / entry_count`. The ETA assumes the remaining
/// `entry_count - position` entries take as long on average as the ones
/// already done: `now + elapsed * (entry_count / position - 1)`.
pub fn estimate(
    entry_count: usize,
    position: usize,
    unique_hits: usize,
    start_time: Option<DateTime<Local>>,
    now: DateTime<Local>,
) -> Estimate {
    let progress_pct = percent(position, entry_count).unwrap_or(0.0);
    let hit_rate_pct = percent(unique_hits, position);
    let eta = match start_time {
        Some(start) if position > 0 => Eta::At(project(start, now, entry_count, position)),
        _ => Eta::NotEstimable,
    };
    Estimate {
        position,
        entry_count,
        progress_pct,
        hit_rate_pct,
        eta,
    }
}

fn percent(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

fn project(start: DateTime<Local>, now: DateTime<Local>, entry_count: usize, position: usize) -> DateTime<Local> {
    // A start time in the future (clock skew) counts as no time spent.
    let elapsed_ms = (now - start).num_milliseconds().max(0) as i128;
    let remaining = entry_count.saturating_sub(position) as i128;
    let remaining_ms = elapsed_ms * remaining / position as i128;
    let remaining_ms = i64::try_from(remaining_ms).unwrap_or(i64::MAX);
    Duration::try_milliseconds(remaining_ms)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or_else(|| DateTime::<Utc>::MAX_UTC.with_timezone(&Local))
}
