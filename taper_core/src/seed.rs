//! Development-only data helpers.
//!
//! Seeding backfills one plausible day of diary and craving activity per
//! call, always landing on the first date that has no data yet. Reset
//! removes the active program's events and diary entries and restarts its
//! clock. The CLI only exposes these in test and development environments.

use crate::wal::{self, EventSink, JsonlSink};
use crate::{csv_rollup, history};
use crate::{DiaryEntry, DiaryLog, Error, Event, EventKind, Program, ProgramBook, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::prelude::*;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// Note attached to every seeded diary entry
const SEED_NOTE: &str = "Test dummy diary entry.";

/// What one seeding run produced
#[derive(Debug, Clone)]
pub struct SeededDay {
    pub date: NaiveDate,
    pub mood: u8,
    pub craving_count: usize,
}

/// What a progress reset removed
#[derive(Debug, Clone)]
pub struct ResetOutcome {
    pub deleted_events: usize,
    pub deleted_diary_entries: usize,
    pub started_at: DateTime<Utc>,
}

/// Backfill one dummy day of diary and craving data
///
/// The seeded date is the day after the latest of: today, the program's
/// newest diary entry, and its newest event. Repeated calls therefore walk
/// forward one day at a time. The diary entry gets a random mood and a
/// fixed note; between 0 and 10 cravings land at random times of day.
pub fn seed_dummy_day<R: Rng>(
    rng: &mut R,
    program: &Program,
    wal_path: &Path,
    csv_path: &Path,
    diary: &DiaryLog,
    now: DateTime<Utc>,
) -> Result<SeededDay> {
    let mut latest = now.date_naive();
    if let Some(date) = diary.latest_entry_date(program.id)? {
        latest = latest.max(date);
    }
    let events = history::load_events_between(wal_path, csv_path, program.id, None, None)?;
    if let Some(date) = events.iter().map(|e| e.occurred_at.date_naive()).max() {
        latest = latest.max(date);
    }
    let date = latest + Duration::days(1);

    let mood = rng.gen_range(1..=10);
    let entry = DiaryEntry {
        id: Uuid::new_v4(),
        program_id: program.id,
        entry_date: date,
        mood,
        note: Some(SEED_NOTE.to_string()),
        created_at: now,
    };
    diary.append_unchecked(&entry)?;

    let craving_count: usize = rng.gen_range(0..=10);
    let mut sink = JsonlSink::new(wal_path);
    for _ in 0..craving_count {
        let hour = rng.gen_range(0..24);
        let minute = rng.gen_range(0..60);
        let occurred_at = date
            .and_hms_opt(hour, minute, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| {
                Error::Other(format!("invalid seeded time {:02}:{:02}", hour, minute))
            })?;

        let event = Event {
            id: Uuid::new_v4(),
            program_id: program.id,
            kind: EventKind::Craving,
            amount: None,
            intensity: Some(rng.gen_range(1..=10)),
            trigger: None,
            notes: None,
            occurred_at,
        };
        event.validate()?;
        sink.append(&event)?;
    }

    tracing::info!(
        "Seeded {} with mood {} and {} cravings",
        date,
        mood,
        craving_count
    );

    Ok(SeededDay {
        date,
        mood,
        craving_count,
    })
}

/// Seed one dummy day, building the RNG here
///
/// Pass a seed for reproducible output, `None` for the thread RNG.
pub fn seed_dummy_day_with(
    seed: Option<u64>,
    program: &Program,
    wal_path: &Path,
    csv_path: &Path,
    diary: &DiaryLog,
    now: DateTime<Utc>,
) -> Result<SeededDay> {
    match seed {
        Some(seed) => {
            let mut rng = StdRng::seed_from_u64(seed);
            seed_dummy_day(&mut rng, program, wal_path, csv_path, diary, now)
        }
        None => {
            let mut rng = thread_rng();
            seed_dummy_day(&mut rng, program, wal_path, csv_path, diary, now)
        }
    }
}

/// Remove the active program's history and restart its clock
///
/// Deletes the program's events from both the WAL and the CSV archive,
/// drops its diary entries, and sets `started_at` to `now`. Other
/// programs' data is left untouched.
pub fn reset_progress(
    book_path: &Path,
    wal_path: &Path,
    csv_path: &Path,
    diary: &DiaryLog,
    now: DateTime<Utc>,
) -> Result<ResetOutcome> {
    let book = ProgramBook::load(book_path)?;
    let program_id = book.require_active()?.id;

    let mut deleted_ids: HashSet<Uuid> = HashSet::new();

    let (purged, kept): (Vec<Event>, Vec<Event>) = wal::read_events(wal_path)?
        .into_iter()
        .partition(|e| e.program_id == program_id);
    deleted_ids.extend(purged.iter().map(|e| e.id));
    if !purged.is_empty() {
        wal::rewrite_events(wal_path, &kept)?;
    }

    if csv_path.exists() {
        let (purged, kept): (Vec<Event>, Vec<Event>) =
            history::load_events_from_csv(csv_path)?
                .into_iter()
                .partition(|e| e.program_id == program_id);
        deleted_ids.extend(purged.iter().map(|e| e.id));
        if !purged.is_empty() {
            csv_rollup::rewrite_csv(csv_path, &kept)?;
        }
    }

    let (purged_entries, kept_entries): (Vec<DiaryEntry>, Vec<DiaryEntry>) = diary
        .read_all()?
        .into_iter()
        .partition(|e| e.program_id == program_id);
    if !purged_entries.is_empty() {
        diary.rewrite(&kept_entries)?;
    }

    ProgramBook::update(book_path, |book| {
        let program = book.active.as_mut().ok_or(Error::NoActiveProgram)?;
        program.started_at = now;
        Ok(())
    })?;

    tracing::info!(
        "Reset program {}: removed {} events and {} diary entries",
        program_id,
        deleted_ids.len(),
        purged_entries.len()
    );

    Ok(ResetOutcome {
        deleted_events: deleted_ids.len(),
        deleted_diary_entries: purged_entries.len(),
        started_at: now,
    })
}
