#![forbid(unsafe_code)]

//! Core domain model and business logic for the Taper cessation tracker.
//!
//! This crate provides:
//! - Domain types (programs, products, events, diary entries)
//! - Product catalog management
//! - Progress scoring and the daily message rotation
//! - Persistence (WAL, CSV, program book, diary)
//! - Development seeding and reset helpers

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod wal;
pub mod csv_rollup;
pub mod program;
pub mod diary;
pub mod history;
pub mod progress;
pub mod messages;
pub mod dashboard;
pub mod seed;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::build_default_catalog;
pub use config::Config;
pub use wal::{EventSink, JsonlSink};
pub use diary::DiaryLog;
pub use history::{load_events_between, load_recent_events};
pub use progress::{calculate_progress, recent_average, relapse_penalty};
pub use messages::select_message_of_the_day;
pub use dashboard::build_dashboard;
pub use seed::{reset_progress, seed_dummy_day, seed_dummy_day_with, ResetOutcome, SeededDay};
