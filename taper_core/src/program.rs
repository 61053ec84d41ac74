//! Program book persistence and lifecycle.
//!
//! The program book holds one optional active program plus every archived
//! attempt, saved as a single JSON file with file locking. Unlike the event
//! WAL, the book is authoritative data: a corrupted file is an error, not
//! something to silently replace with defaults.

use crate::{Error, GoalType, ProductProfile, Program, ProgramBook, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

impl ProgramBook {
    /// Load the program book from a file with shared locking
    ///
    /// Returns an empty book if the file doesn't exist. A file that exists
    /// but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No program book found, starting empty");
            return Ok(Self::default());
        }

        let file = File::open(path)?;

        // Acquire shared lock for reading
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        file.unlock()?;
        read_result?;

        match serde_json::from_str::<ProgramBook>(&contents) {
            Ok(book) => {
                tracing::debug!("Loaded program book from {:?}", path);
                Ok(book)
            }
            Err(e) => Err(Error::Program(format!(
                "program book {:?} is corrupted: {}",
                path, e
            ))),
        }
    }

    /// Save the program book to a file with exclusive locking
    ///
    /// Atomically writes by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Create unique temp file in the same directory for atomic rename
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "book path missing parent")
        })?)?;

        // Acquire exclusive lock on the temp file to serialize concurrent writers
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        // Atomically replace the old book
        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved program book to {:?}", path);
        Ok(())
    }

    /// Load the book, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut ProgramBook) -> Result<()>,
    {
        let mut book = Self::load(path)?;
        f(&mut book)?;
        book.save(path)?;
        Ok(book)
    }

    /// Start a new program, archiving any currently active one
    ///
    /// The previous active program, if any, is marked inactive with
    /// `ended_at = now`. Returns the new program's id.
    pub fn start_program(
        &mut self,
        goal_type: GoalType,
        started_at: DateTime<Utc>,
        profile: ProductProfile,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        profile.validate()?;

        if let Some(mut previous) = self.active.take() {
            previous.is_active = false;
            previous.ended_at = Some(now);
            tracing::info!("Archiving program {} to start a new one", previous.id);
            self.archived.push(previous);
        }

        let program = Program::new(goal_type, started_at, profile);
        let id = program.id;
        self.active = Some(program);
        Ok(id)
    }

    /// The active program, if one exists
    pub fn active(&self) -> Option<&Program> {
        self.active.as_ref()
    }

    /// The active program, or `Error::NoActiveProgram`
    pub fn require_active(&self) -> Result<&Program> {
        self.active.as_ref().ok_or(Error::NoActiveProgram)
    }

    /// Update the cost per unit on the active program's product profile
    pub fn update_active_cost(&mut self, cost_per_unit: f64) -> Result<()> {
        let program = self.active.as_mut().ok_or(Error::NoActiveProgram)?;
        if !(cost_per_unit > 0.0) {
            return Err(Error::Program("cost_per_unit must be positive".into()));
        }
        program.product_profile.cost_per_unit = Some(cost_per_unit);
        Ok(())
    }

    /// All programs, active first, then archived, newest started first
    pub fn all_programs(&self) -> Vec<&Program> {
        let mut programs: Vec<&Program> =
            self.active.iter().chain(self.archived.iter()).collect();
        programs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        programs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProductKind;
    use chrono::Duration;

    fn test_profile() -> ProductProfile {
        ProductProfile {
            kind: ProductKind::Cigarette,
            baseline_amount: 20.0,
            unit_label: "cigarettes".into(),
            strength_mg: None,
            cost_per_unit: Some(0.5),
        }
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book_path = temp_dir.path().join("programs.json");

        let mut book = ProgramBook::default();
        let now = Utc::now();
        book.start_program(GoalType::ReduceToZero, now, test_profile(), now)
            .unwrap();

        // Save
        book.save(&book_path).unwrap();

        // Load
        let loaded = ProgramBook::load(&book_path).unwrap();

        assert!(loaded.active().is_some());
        assert_eq!(
            loaded.active().unwrap().goal_type,
            GoalType::ReduceToZero
        );
        assert!(loaded.archived.is_empty());
    }

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book_path = temp_dir.path().join("nonexistent.json");

        let book = ProgramBook::load(&book_path).unwrap();
        assert!(book.active().is_none());
        assert!(book.archived.is_empty());
    }

    #[test]
    fn test_corrupted_book_is_an_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book_path = temp_dir.path().join("corrupted.json");

        // Write invalid JSON
        std::fs::write(&book_path, "{ invalid json }").unwrap();

        let result = ProgramBook::load(&book_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_starting_second_program_archives_first() {
        let mut book = ProgramBook::default();
        let now = Utc::now();

        let first_id = book
            .start_program(GoalType::ReduceToZero, now - Duration::days(30), test_profile(), now)
            .unwrap();
        let second_id = book
            .start_program(GoalType::ImmediateZero, now, test_profile(), now)
            .unwrap();

        assert_ne!(first_id, second_id);
        assert_eq!(book.active().unwrap().id, second_id);
        assert_eq!(book.archived.len(), 1);

        let archived = &book.archived[0];
        assert_eq!(archived.id, first_id);
        assert!(!archived.is_active);
        assert_eq!(archived.ended_at, Some(now));
    }

    #[test]
    fn test_require_active_on_empty_book() {
        let book = ProgramBook::default();
        assert!(matches!(
            book.require_active(),
            Err(Error::NoActiveProgram)
        ));
    }

    #[test]
    fn test_cost_update() {
        let mut book = ProgramBook::default();
        let now = Utc::now();
        book.start_program(GoalType::ReduceToZero, now, test_profile(), now)
            .unwrap();

        book.update_active_cost(2.75).unwrap();
        assert_eq!(
            book.active().unwrap().product_profile.cost_per_unit,
            Some(2.75)
        );

        assert!(book.update_active_cost(0.0).is_err());
        assert!(book.update_active_cost(-1.0).is_err());
    }

    #[test]
    fn test_cost_update_without_active_program() {
        let mut book = ProgramBook::default();
        assert!(matches!(
            book.update_active_cost(1.0),
            Err(Error::NoActiveProgram)
        ));
    }

    #[test]
    fn test_invalid_profile_rejected_on_start() {
        let mut book = ProgramBook::default();
        let now = Utc::now();
        let mut profile = test_profile();
        profile.baseline_amount = 0.0;

        let result = book.start_program(GoalType::ReduceToZero, now, profile, now);
        assert!(result.is_err());
        assert!(book.active().is_none());
    }

    #[test]
    fn test_all_programs_newest_first() {
        let mut book = ProgramBook::default();
        let now = Utc::now();

        book.start_program(
            GoalType::ReduceToZero,
            now - Duration::days(100),
            test_profile(),
            now,
        )
        .unwrap();
        book.start_program(GoalType::ImmediateZero, now, test_profile(), now)
            .unwrap();

        let programs = book.all_programs();
        assert_eq!(programs.len(), 2);
        assert!(programs[0].is_active);
        assert!(programs[0].started_at > programs[1].started_at);
    }

    #[test]
    fn test_update_pattern() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book_path = temp_dir.path().join("programs.json");

        // Initialize empty book
        ProgramBook::default().save(&book_path).unwrap();

        let now = Utc::now();
        // Update using the update helper
        ProgramBook::update(&book_path, |book| {
            book.start_program(GoalType::ReduceToZero, now, test_profile(), now)?;
            Ok(())
        })
        .unwrap();

        // Verify update persisted
        let loaded = ProgramBook::load(&book_path).unwrap();
        assert!(loaded.active().is_some());
    }

    #[test]
    fn test_atomic_save() {
        let temp_dir = tempfile::tempdir().unwrap();
        let book_path = temp_dir.path().join("programs.json");

        let book = ProgramBook::default();
        book.save(&book_path).unwrap();

        // Verify book file exists and no stray temp files remain
        assert!(book_path.exists());
        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "programs.json")
            .collect();
        assert!(
            extras.is_empty(),
            "Expected only programs.json, found extras: {:?}",
            extras
        );
    }
}
