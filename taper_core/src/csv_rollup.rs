//! CSV rollup for archiving WAL events.
//!
//! Converts the WAL to CSV atomically so that an interrupted rollup
//! never loses events.

use crate::{Event, Result};
use std::fs::OpenOptions;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
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

impl From<&Event> for CsvRow {
    fn from(event: &Event) -> Self {
        CsvRow {
            id: event.id.to_string(),
            program_id: event.program_id.to_string(),
            kind: event.kind.as_str().to_string(),
            amount: event.amount,
            intensity: event.intensity,
            trigger: event.trigger.map(|t| t.as_str().to_string()),
            notes: event.notes.clone(),
            occurred_at: event.occurred_at.to_rfc3339(),
        }
    }
}

/// Roll up WAL events into CSV and archive the WAL atomically
///
/// Reads all events from the WAL, appends them to the CSV file (writing
/// headers when the file is new), syncs the CSV to disk, then renames the
/// WAL to `.processed`. Returns the number of events rolled up.
///
/// # Safety
/// - CSV is fsynced before WAL is renamed
/// - WAL is renamed (not deleted) to allow manual recovery if needed
/// - Processed WAL files can be cleaned up manually
pub fn wal_to_csv_and_archive(wal_path: &Path, csv_path: &Path) -> Result<usize> {
    // Read all events from WAL
    let events = crate::wal::read_events(wal_path)?;

    if events.is_empty() {
        tracing::info!("No events in WAL to roll up");
        return Ok(0);
    }

    // Ensure parent directory exists
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Open CSV file for appending
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Determine if we need to write headers by checking file size after opening
    // This avoids an extra stat() syscall
    let needs_headers = file.metadata()?.len() == 0;

    // CSV writer automatically writes headers if the serialized type has them
    // For appending, we need to skip headers manually if file already has content
    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    // Write all events to CSV
    for event in &events {
        let row = CsvRow::from(event);
        writer.serialize(row)?;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} events to CSV", events.len());

    // Atomically archive the WAL by renaming it
    let processed_path = wal_path.with_extension("wal.processed");
    std::fs::rename(wal_path, &processed_path)?;

    tracing::info!("Archived WAL to {:?}", processed_path);

    Ok(events.len())
}

/// Rewrite the CSV archive so it contains exactly the given events
///
/// Used when events are purged (e.g. a progress reset). The file is
/// truncated and rewritten in full, then synced to disk.
pub(crate) fn rewrite_csv(csv_path: &Path, events: &[Event]) -> Result<()> {
    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(csv_path)?;

    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);

    for event in events {
        let row = CsvRow::from(event);
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::debug!("Rewrote CSV with {} events", events.len());

    Ok(())
}

/// Clean up old processed WAL files
///
/// This removes all .wal.processed files in the given directory.
pub fn cleanup_processed_wals(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let mut count = 0;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if let Some(extension) = path.extension() {
            if extension == "processed" {
                std::fs::remove_file(&path)?;
                tracing::debug!("Removed processed WAL: {:?}", path);
                count += 1;
            }
        }
    }

    if count > 0 {
        tracing::info!("Cleaned up {} processed WAL files", count);
    }

    Ok(count)
}
