//! Dashboard assembly.
//!
//! Combines the progress report with derived stats (money saved, craving
//! and relapse counts) and the message of the day into one summary.

use crate::messages::select_message_of_the_day;
use crate::progress::{calculate_progress, round2};
use crate::{DashboardSummary, Event, EventKind, Program};
use chrono::{DateTime, Utc};

/// Build the dashboard summary for a program
///
/// Window filtering is the caller's job, same as for the progress
/// calculation: `recent_events` covers the last 7 days (all kinds),
/// `relapse_events` the relapses of the last 30.
pub fn build_dashboard(
    program: &Program,
    recent_events: &[Event],
    relapse_events: &[Event],
    now: DateTime<Utc>,
) -> DashboardSummary {
    let progress = calculate_progress(program, recent_events, relapse_events, now);

    let cravings_last_7_days = recent_events
        .iter()
        .filter(|e| e.kind == EventKind::Craving)
        .count();

    // Money saved only makes sense when we know the unit cost
    let money_saved_estimate = program.product_profile.cost_per_unit.map(|cost| {
        let daily_savings = (progress.baseline_daily_amount
            - progress.recent_average_daily_amount)
            .max(0.0)
            * cost;
        round2(daily_savings * progress.days_since_start as f64)
    });

    let message_of_the_day = select_message_of_the_day(progress.days_since_start).to_string();

    DashboardSummary {
        progress_percent: progress.progress_percent,
        days_since_start: progress.days_since_start,
        baseline_daily_amount: progress.baseline_daily_amount,
        recent_average_daily_amount: progress.recent_average_daily_amount,
        money_saved_estimate,
        cravings_last_7_days,
        relapses_last_30_days: relapse_events.len(),
        message_of_the_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GoalType, ProductKind, ProductProfile, Trigger};
    use chrono::Duration;
    use uuid::Uuid;

    fn test_program(
        cost_per_unit: Option<f64>,
        started_days_ago: i64,
        now: DateTime<Utc>,
    ) -> Program {
        Program::new(
            GoalType::ReduceToZero,
            now - Duration::days(started_days_ago),
            ProductProfile {
                kind: ProductKind::Cigarette,
                baseline_amount: 20.0,
                unit_label: "cigarettes".into(),
                strength_mg: None,
                cost_per_unit,
            },
        )
    }

    fn event(kind: EventKind, amount: Option<f64>, days_ago: i64) -> Event {
        Event {
            id: Uuid::new_v4(),
            program_id: Uuid::new_v4(),
            kind,
            amount,
            intensity: None,
            trigger: Some(Trigger::Stress),
            notes: None,
            occurred_at: Utc::now() - Duration::days(days_ago),
        }
    }

    #[test]
    fn test_money_saved_uses_whole_days() {
        let now = Utc::now();
        // Day 10, fully abstinent, 0.50 per cigarette, baseline 20
        let program = test_program(Some(0.5), 9, now);

        let summary = build_dashboard(&program, &[], &[], now);

        assert_eq!(summary.days_since_start, 10);
        // 20 units/day * 0.50 * 10 days
        assert_eq!(summary.money_saved_estimate, Some(100.0));
    }

    #[test]
    fn test_money_saved_absent_without_cost() {
        let now = Utc::now();
        let program = test_program(None, 9, now);

        let summary = build_dashboard(&program, &[], &[], now);
        assert_eq!(summary.money_saved_estimate, None);
    }

    #[test]
    fn test_money_saved_never_negative() {
        let now = Utc::now();
        let program = test_program(Some(0.5), 0, now);
        // Consuming twice the baseline this week
        let recent = vec![event(EventKind::Use, Some(280.0), 0)];

        let summary = build_dashboard(&program, &recent, &[], now);
        assert_eq!(summary.money_saved_estimate, Some(0.0));
    }

    #[test]
    fn test_craving_count_ignores_other_kinds() {
        let now = Utc::now();
        let program = test_program(None, 4, now);
        let recent = vec![
            event(EventKind::Craving, None, 0),
            event(EventKind::Craving, None, 2),
            event(EventKind::Use, Some(1.0), 1),
        ];

        let summary = build_dashboard(&program, &recent, &[], now);
        assert_eq!(summary.cravings_last_7_days, 2);
    }

    #[test]
    fn test_relapse_count_reflects_window_slice() {
        let now = Utc::now();
        let program = test_program(None, 4, now);
        let relapses = vec![
            event(EventKind::Relapse, Some(1.0), 1),
            event(EventKind::Relapse, Some(2.0), 12),
        ];

        let summary = build_dashboard(&program, &[], &relapses, now);
        assert_eq!(summary.relapses_last_30_days, 2);
    }

    #[test]
    fn test_message_follows_day_counter() {
        let now = Utc::now();
        let program = test_program(None, 0, now); // day 1

        let summary = build_dashboard(&program, &[], &[], now);
        assert_eq!(
            summary.message_of_the_day,
            "Small reductions compound. Keep going."
        );
    }
}
