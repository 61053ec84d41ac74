//! Evening diary entries.
//!
//! One entry per program per calendar day, stored as JSONL with file
//! locking. Logging only unlocks in the evening (configurable hour, UTC)
//! so the entry reflects the whole day rather than a morning guess.

use crate::{DiaryEntry, Error, Program, Result, MAX_NOTE_LEN};
use chrono::{DateTime, NaiveDate, Timelike, Utc};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use uuid::Uuid;

/// JSONL-backed diary storage
pub struct DiaryLog {
    path: PathBuf,
}

impl DiaryLog {
    /// Create a diary log handle for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn append(&self, entry: &DiaryEntry) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended diary entry {} for {}", entry.id, entry.entry_date);
        Ok(())
    }

    /// Read every entry in the log
    pub fn read_all(&self) -> Result<Vec<DiaryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let reader = BufReader::new(&file);
        let mut entries = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<DiaryEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    tracing::warn!("Failed to parse diary entry at line {}: {}", line_num + 1, e);
                }
            }
        }

        file.unlock()?;
        Ok(entries)
    }

    /// Rewrite the log so it contains exactly the given entries
    ///
    /// Used when a program's entries are purged. The file is truncated
    /// and rewritten under an exclusive lock.
    pub(crate) fn rewrite(&self, entries: &[DiaryEntry]) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        for entry in entries {
            let line = serde_json::to_string(entry)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        file.unlock()?;
        tracing::debug!("Rewrote diary with {} entries", entries.len());
        Ok(())
    }

    /// Create today's diary entry for a program
    ///
    /// Rejected when:
    /// - `now` is before the unlock hour (UTC)
    /// - an entry already exists for this program and date
    /// - mood is outside 1..=10 or the note exceeds `MAX_NOTE_LEN`
    pub fn create_entry(
        &self,
        program: &Program,
        mood: u8,
        note: Option<String>,
        now: DateTime<Utc>,
        unlock_hour: u32,
    ) -> Result<DiaryEntry> {
        if now.hour() < unlock_hour {
            return Err(Error::Diary(format!(
                "Diary logging is available after {:02}:00 UTC",
                unlock_hour
            )));
        }

        if !(1..=10).contains(&mood) {
            return Err(Error::Diary(format!(
                "mood must be in 1..=10, got {}",
                mood
            )));
        }
        if let Some(ref note) = note {
            if note.chars().count() > MAX_NOTE_LEN {
                return Err(Error::Diary(format!(
                    "note exceeds {} characters",
                    MAX_NOTE_LEN
                )));
            }
        }

        let entry_date = now.date_naive();
        let existing = self.read_all()?;
        if existing
            .iter()
            .any(|e| e.program_id == program.id && e.entry_date == entry_date)
        {
            return Err(Error::Diary(
                "Diary entry already exists for today".into(),
            ));
        }

        let entry = DiaryEntry {
            id: Uuid::new_v4(),
            program_id: program.id,
            entry_date,
            mood,
            note,
            created_at: now,
        };
        self.append(&entry)?;
        Ok(entry)
    }

    /// Append an entry without the unlock-hour or duplicate checks
    ///
    /// Used by the dev seeding helper, which backfills past days.
    pub fn append_unchecked(&self, entry: &DiaryEntry) -> Result<()> {
        self.append(entry)
    }

    /// List a program's entries, optionally bounded by inclusive dates
    ///
    /// Sorted by entry date (newest first), ties broken by creation time.
    pub fn list_entries(
        &self,
        program_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DiaryEntry>> {
        let mut entries = self.read_all()?;
        entries.retain(|e| e.program_id == program_id);

        if let Some(start) = start {
            entries.retain(|e| e.entry_date >= start);
        }
        if let Some(end) = end {
            entries.retain(|e| e.entry_date <= end);
        }

        entries.sort_by(|a, b| {
            b.entry_date
                .cmp(&a.entry_date)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(entries)
    }

    /// The most recent entry date for a program, if any
    pub fn latest_entry_date(&self, program_id: Uuid) -> Result<Option<NaiveDate>> {
        let entries = self.read_all()?;
        Ok(entries
            .iter()
            .filter(|e| e.program_id == program_id)
            .map(|e| e.entry_date)
            .max())
    }
}
