//! Core domain types for the taper system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Products and their properties
//! - Cessation programs and goals
//! - Logged events (use, craving, relapse)
//! - Diary entries
//! - Progress and dashboard reports

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Maximum length for free-text notes on events and diary entries
pub const MAX_NOTE_LEN: usize = 500;

// ============================================================================
// Product Types
// ============================================================================

/// Kind of nicotine product being tapered
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    Cigarette,
    Snus,
    Vape,
    Chew,
    Patch,
    Gum,
    Lozenge,
    Other,
}

impl ProductKind {
    /// Wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Cigarette => "cigarette",
            ProductKind::Snus => "snus",
            ProductKind::Vape => "vape",
            ProductKind::Chew => "chew",
            ProductKind::Patch => "patch",
            ProductKind::Gum => "gum",
            ProductKind::Lozenge => "lozenge",
            ProductKind::Other => "other",
        }
    }
}

impl std::str::FromStr for ProductKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cigarette" => Ok(ProductKind::Cigarette),
            "snus" => Ok(ProductKind::Snus),
            "vape" => Ok(ProductKind::Vape),
            "chew" => Ok(ProductKind::Chew),
            "patch" => Ok(ProductKind::Patch),
            "gum" => Ok(ProductKind::Gum),
            "lozenge" => Ok(ProductKind::Lozenge),
            "other" => Ok(ProductKind::Other),
            other => Err(crate::Error::Program(format!(
                "unknown product kind '{}'",
                other
            ))),
        }
    }
}

/// Profile of the product a program is tapering off
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductProfile {
    pub kind: ProductKind,
    pub baseline_amount: f64,
    pub unit_label: String,
    pub strength_mg: Option<f64>,
    pub cost_per_unit: Option<f64>,
}

impl ProductProfile {
    /// Validate field constraints before the profile reaches persistence
    ///
    /// Rules:
    /// - baseline_amount must be positive
    /// - unit_label must be 1..=50 characters
    /// - strength_mg and cost_per_unit, if present, must be positive
    pub fn validate(&self) -> crate::Result<()> {
        if !(self.baseline_amount > 0.0) {
            return Err(crate::Error::Program(format!(
                "baseline amount must be positive, got {}",
                self.baseline_amount
            )));
        }
        if self.unit_label.is_empty() || self.unit_label.chars().count() > 50 {
            return Err(crate::Error::Program(
                "unit label must be 1..=50 characters".into(),
            ));
        }
        if let Some(strength) = self.strength_mg {
            if !(strength > 0.0) {
                return Err(crate::Error::Program(
                    "strength_mg must be positive".into(),
                ));
            }
        }
        if let Some(cost) = self.cost_per_unit {
            if !(cost > 0.0) {
                return Err(crate::Error::Program(
                    "cost_per_unit must be positive".into(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// Program Types
// ============================================================================

/// Cessation goal driving the time-progress target
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GoalType {
    ReduceToZero,
    ImmediateZero,
}

impl GoalType {
    /// Number of days after which time progress saturates at 1.0
    pub fn target_days(&self) -> i64 {
        match self {
            GoalType::ReduceToZero => 90,
            GoalType::ImmediateZero => 30,
        }
    }

    /// Wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalType::ReduceToZero => "reduce_to_zero",
            GoalType::ImmediateZero => "immediate_zero",
        }
    }
}

impl std::str::FromStr for GoalType {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "reduce_to_zero" => Ok(GoalType::ReduceToZero),
            "immediate_zero" => Ok(GoalType::ImmediateZero),
            other => Err(crate::Error::Program(format!(
                "unknown goal type '{}'",
                other
            ))),
        }
    }
}

/// A cessation program: one attempt to quit or taper a product
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub goal_type: GoalType,
    pub started_at: DateTime<Utc>,
    pub is_active: bool,
    pub ended_at: Option<DateTime<Utc>>,
    pub product_profile: ProductProfile,
}

impl Program {
    /// Create a new active program starting at the given instant
    pub fn new(goal_type: GoalType, started_at: DateTime<Utc>, profile: ProductProfile) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_type,
            started_at,
            is_active: true,
            ended_at: None,
            product_profile: profile,
        }
    }
}

/// All programs for the local user: at most one active, the rest archived
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ProgramBook {
    pub active: Option<Program>,
    pub archived: Vec<Program>,
}

// ============================================================================
// Event Types
// ============================================================================

/// What kind of moment is being logged
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Use,
    Craving,
    Relapse,
}

impl EventKind {
    /// Use and relapse events consume product, so they must carry an amount
    pub fn requires_amount(&self) -> bool {
        matches!(self, EventKind::Use | EventKind::Relapse)
    }

    /// Wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Use => "use",
            EventKind::Craving => "craving",
            EventKind::Relapse => "relapse",
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "use" => Ok(EventKind::Use),
            "craving" => Ok(EventKind::Craving),
            "relapse" => Ok(EventKind::Relapse),
            other => Err(crate::Error::InvalidEvent(format!(
                "unknown event kind '{}'",
                other
            ))),
        }
    }
}

/// Situational trigger attached to an event
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Stress,
    Social,
    Alcohol,
    Boredom,
    Morning,
    AfterMeal,
    Other,
}

impl Trigger {
    /// Wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Stress => "stress",
            Trigger::Social => "social",
            Trigger::Alcohol => "alcohol",
            Trigger::Boredom => "boredom",
            Trigger::Morning => "morning",
            Trigger::AfterMeal => "after_meal",
            Trigger::Other => "other",
        }
    }
}

impl std::str::FromStr for Trigger {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "stress" => Ok(Trigger::Stress),
            "social" => Ok(Trigger::Social),
            "alcohol" => Ok(Trigger::Alcohol),
            "boredom" => Ok(Trigger::Boredom),
            "morning" => Ok(Trigger::Morning),
            "after_meal" => Ok(Trigger::AfterMeal),
            "other" => Ok(Trigger::Other),
            other => Err(crate::Error::InvalidEvent(format!(
                "unknown trigger '{}'",
                other
            ))),
        }
    }
}

/// A logged use, craving, or relapse moment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub program_id: Uuid,
    pub kind: EventKind,
    pub amount: Option<f64>,
    pub intensity: Option<u8>,
    pub trigger: Option<Trigger>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl Event {
    /// Validate field constraints before the event reaches persistence
    ///
    /// Rules:
    /// - use/relapse events must carry an amount
    /// - amount, if present, must be positive
    /// - intensity, if present, must be in 1..=10
    /// - notes, if present, are capped at `MAX_NOTE_LEN` characters
    pub fn validate(&self) -> crate::Result<()> {
        if self.kind.requires_amount() && self.amount.is_none() {
            return Err(crate::Error::InvalidEvent(
                "amount is required for use/relapse".into(),
            ));
        }
        if let Some(amount) = self.amount {
            if !(amount > 0.0) {
                return Err(crate::Error::InvalidEvent(format!(
                    "amount must be positive, got {}",
                    amount
                )));
            }
        }
        if let Some(intensity) = self.intensity {
            if !(1..=10).contains(&intensity) {
                return Err(crate::Error::InvalidEvent(format!(
                    "intensity must be in 1..=10, got {}",
                    intensity
                )));
            }
        }
        if let Some(ref notes) = self.notes {
            if notes.chars().count() > MAX_NOTE_LEN {
                return Err(crate::Error::InvalidEvent(format!(
                    "notes exceed {} characters",
                    MAX_NOTE_LEN
                )));
            }
        }
        Ok(())
    }

    /// Whether this event contributes to the recent consumption average
    pub fn counts_toward_average(&self) -> bool {
        self.kind.requires_amount() && self.amount.is_some()
    }
}

// ============================================================================
// Diary Types
// ============================================================================

/// One diary entry per program per calendar day
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub id: Uuid,
    pub program_id: Uuid,
    pub entry_date: NaiveDate,
    pub mood: u8,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Catalog Type
// ============================================================================

/// Static metadata for a product kind
#[derive(Clone, Debug)]
pub struct ProductInfo {
    pub kind: ProductKind,
    pub display_name: String,
    pub default_unit: String,
}

/// The complete catalog of known product kinds
#[derive(Clone, Debug)]
pub struct ProductCatalog {
    pub products: HashMap<ProductKind, ProductInfo>,
}

// ============================================================================
// Report Types
// ============================================================================

/// Output of the progress calculation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProgressReport {
    pub progress_percent: f64,
    pub days_since_start: i64,
    pub baseline_daily_amount: f64,
    pub recent_average_daily_amount: f64,
    pub relapse_penalty: f64,
}

/// Everything the dashboard shows in one shot
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub progress_percent: f64,
    pub days_since_start: i64,
    pub baseline_daily_amount: f64,
    pub recent_average_daily_amount: f64,
    pub money_saved_estimate: Option<f64>,
    pub cravings_last_7_days: usize,
    pub relapses_last_30_days: usize,
    pub message_of_the_day: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn base_event(kind: EventKind) -> Event {
        Event {
            id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            kind,
            amount: Some(1.0),
            intensity: None,
            trigger: None,
            notes: None,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn test_use_without_amount_rejected() {
        let mut event = base_event(EventKind::Use);
        event.amount = None;
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_craving_without_amount_allowed() {
        let mut event = base_event(EventKind::Craving);
        event.amount = None;
        event.intensity = Some(6);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut event = base_event(EventKind::Use);
        event.amount = Some(0.0);
        assert!(event.validate().is_err());

        event.amount = Some(-2.0);
        assert!(event.validate().is_err());
    }

    #[test]
    fn test_intensity_bounds() {
        let mut event = base_event(EventKind::Craving);
        event.amount = None;

        event.intensity = Some(0);
        assert!(event.validate().is_err());

        event.intensity = Some(11);
        assert!(event.validate().is_err());

        event.intensity = Some(1);
        assert!(event.validate().is_ok());

        event.intensity = Some(10);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_overlong_notes_rejected() {
        let mut event = base_event(EventKind::Use);
        event.notes = Some("x".repeat(MAX_NOTE_LEN + 1));
        assert!(event.validate().is_err());

        event.notes = Some("x".repeat(MAX_NOTE_LEN));
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_event_kind_serde_names() {
        let json = serde_json::to_string(&EventKind::Use).unwrap();
        assert_eq!(json, "\"use\"");
        let json = serde_json::to_string(&Trigger::AfterMeal).unwrap();
        assert_eq!(json, "\"after_meal\"");
    }

    #[test]
    fn test_goal_target_days() {
        assert_eq!(GoalType::ReduceToZero.target_days(), 90);
        assert_eq!(GoalType::ImmediateZero.target_days(), 30);
    }

    #[test]
    fn test_kind_parse_matches_wire_name() {
        for kind in [EventKind::Use, EventKind::Craving, EventKind::Relapse] {
            let parsed: EventKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("inhale".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_profile_validation() {
        let mut profile = ProductProfile {
            kind: ProductKind::Snus,
            baseline_amount: 8.0,
            unit_label: "pouches".into(),
            strength_mg: Some(4.0),
            cost_per_unit: Some(0.4),
        };
        assert!(profile.validate().is_ok());

        profile.baseline_amount = 0.0;
        assert!(profile.validate().is_err());

        profile.baseline_amount = 8.0;
        profile.unit_label = String::new();
        assert!(profile.validate().is_err());

        profile.unit_label = "pouches".into();
        profile.cost_per_unit = Some(-1.0);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_counts_toward_average() {
        let use_event = base_event(EventKind::Use);
        assert!(use_event.counts_toward_average());

        let mut craving = base_event(EventKind::Craving);
        craving.amount = None;
        assert!(!craving.counts_toward_average());

        let relapse = base_event(EventKind::Relapse);
        assert!(relapse.counts_toward_average());
    }
}
