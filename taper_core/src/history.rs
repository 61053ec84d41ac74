//! Event history loading with time windows.
//!
//! This module loads logged events from both WAL and CSV files to provide
//! the windowed slices the progress calculation and dashboard consume.

use crate::{Event, Result};
use chrono::{DateTime, Duration, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// CSV row format for reading archived events
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    program_id: String,
    kind: String,
    amount: Option<f64>,
    intensity: Option<u8>,
    trigger: Option<String>,
    notes: Option<String>,
    occurred_at: String,
}

impl TryFrom<CsvRow> for Event {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let program_id = Uuid::parse_str(&row.program_id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let kind = row.kind.parse()?;

        let occurred_at = DateTime::parse_from_rfc3339(&row.occurred_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        let trigger = row.trigger.as_deref().and_then(|s| s.parse().ok());

        Ok(Event {
            id,
            program_id,
            kind,
            amount: row.amount,
            intensity: row.intensity,
            trigger,
            notes: row.notes,
            occurred_at,
        })
    }
}

/// Load all events for a program from both WAL and CSV, deduplicated
///
/// WAL entries win over CSV copies of the same event. No ordering guarantee.
fn load_merged(wal_path: &Path, csv_path: &Path, program_id: Uuid) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    let mut seen_ids = HashSet::new();

    // Load from WAL first (most recent)
    if wal_path.exists() {
        for event in crate::wal::read_events(wal_path)? {
            if event.program_id == program_id {
                seen_ids.insert(event.id);
                events.push(event);
            }
        }
        tracing::debug!("Loaded {} events from WAL", events.len());
    }

    // Load from CSV (archived)
    if csv_path.exists() {
        let mut csv_count = 0;
        for event in load_events_from_csv(csv_path)? {
            if event.program_id == program_id && !seen_ids.contains(&event.id) {
                seen_ids.insert(event.id);
                events.push(event);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} events from CSV", csv_count);
    }

    Ok(events)
}

/// Load a program's events from the trailing window of `days` before `now`
///
/// Returns events sorted by occurred_at (newest first).
pub fn load_recent_events(
    wal_path: &Path,
    csv_path: &Path,
    program_id: Uuid,
    days: i64,
    now: DateTime<Utc>,
) -> Result<Vec<Event>> {
    let cutoff = now - Duration::days(days);

    let mut events = load_merged(wal_path, csv_path, program_id)?;
    events.retain(|e| e.occurred_at >= cutoff);

    // Sort by occurred_at, newest first
    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

    tracing::info!(
        "Loaded {} events from last {} days",
        events.len(),
        days
    );

    Ok(events)
}

/// Load a program's events within an optional closed datetime range
///
/// Returns events sorted by occurred_at (newest first).
pub fn load_events_between(
    wal_path: &Path,
    csv_path: &Path,
    program_id: Uuid,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Result<Vec<Event>> {
    let mut events = load_merged(wal_path, csv_path, program_id)?;

    if let Some(start) = start {
        events.retain(|e| e.occurred_at >= start);
    }
    if let Some(end) = end {
        events.retain(|e| e.occurred_at <= end);
    }

    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    Ok(events)
}

/// Load all events from a CSV file
pub(crate) fn load_events_from_csv(path: &Path) -> Result<Vec<Event>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut events = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match Event::try_from(row) {
                Ok(event) => events.push(event),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                    // Continue processing other rows
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(events)
}
