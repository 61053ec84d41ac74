//! Progress scoring for cessation programs.
//!
//! The score blends two halves and a penalty:
//! - Time progress: days into the program over the goal's target horizon
//! - Reduction progress: how far recent consumption dropped from baseline
//! - Relapse penalty: per-relapse weight decayed by age, capped at 0.3
//!
//! The calculation is pure: callers pass pre-filtered event windows and an
//! explicit `now`, and identical inputs always produce identical reports.

use crate::{Event, Program, ProgressReport};
use chrono::{DateTime, Utc};

/// Length of the recent-consumption window, in days
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Length of the relapse lookback window, in days
pub const RELAPSE_WINDOW_DAYS: i64 = 30;

/// Penalty contributed by a relapse before decay
const RELAPSE_WEIGHT: f64 = 0.05;

/// Ceiling on the total relapse penalty
const PENALTY_CAP: f64 = 0.3;

/// Decay constant for relapse age, in days
const PENALTY_DECAY_DAYS: f64 = 7.0;

/// Whole days from `start` to `end`, clamped at zero
fn days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_days().max(0)
}

/// Round to 2 decimal places
pub(crate) fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Round to 4 decimal places
fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Average daily consumption over a window, rounded to 2 decimals
///
/// Only use/relapse events carrying an amount contribute. The divisor is the
/// window length rather than the event count, so quiet days pull the average
/// down.
pub fn recent_average(events: &[Event], days: i64) -> f64 {
    let total: f64 = events
        .iter()
        .filter(|e| e.counts_toward_average())
        .filter_map(|e| e.amount)
        .sum();
    round2(total / days.max(1) as f64)
}

/// Total relapse penalty as of `now`
///
/// Each relapse contributes `RELAPSE_WEIGHT * exp(-days_ago / 7)`. The sum is
/// rounded to 4 decimals before the cap is applied. Future-dated relapses
/// clamp to `days_ago = 0` and count at full weight.
pub fn relapse_penalty(relapse_events: &[Event], now: DateTime<Utc>) -> f64 {
    let mut penalty = 0.0;
    for event in relapse_events {
        let days_ago = days_between(event.occurred_at, now);
        penalty += (-(days_ago as f64) / PENALTY_DECAY_DAYS).exp() * RELAPSE_WEIGHT;
    }
    round4(penalty).min(PENALTY_CAP)
}

/// Calculate the progress report for a program
///
/// `recent_events` holds everything logged within `RECENT_WINDOW_DAYS`;
/// `relapse_events` holds relapses within `RELAPSE_WINDOW_DAYS`. Both windows
/// are the caller's responsibility; this function trusts the slices it gets.
pub fn calculate_progress(
    program: &Program,
    recent_events: &[Event],
    relapse_events: &[Event],
    now: DateTime<Utc>,
) -> ProgressReport {
    let baseline = program.product_profile.baseline_amount;
    let days_since_start = days_between(program.started_at, now) + 1;

    let recent_avg = recent_average(recent_events, RECENT_WINDOW_DAYS);

    let target_days = program.goal_type.target_days();
    let time_progress = (days_since_start as f64 / target_days.max(1) as f64).min(1.0);

    // A baseline of zero or less carries no reduction signal
    let reduction_progress = if baseline <= 0.0 {
        0.0
    } else {
        ((baseline - recent_avg) / baseline).clamp(0.0, 1.0)
    };

    let penalty = relapse_penalty(relapse_events, now);

    let progress = 0.5 * time_progress + 0.5 * reduction_progress - penalty;
    let progress_percent = round2(progress.clamp(0.0, 1.0) * 100.0);

    tracing::debug!(
        "Progress: {}% (day {}, avg {}, penalty {})",
        progress_percent,
        days_since_start,
        recent_avg,
        penalty
    );

    ProgressReport {
        progress_percent,
        days_since_start,
        baseline_daily_amount: baseline,
        recent_average_daily_amount: recent_avg,
        relapse_penalty: penalty,
    }
}
