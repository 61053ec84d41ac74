//! Rotating message of the day.
//!
//! Messages cycle with the program day counter so each day of the week
//! surfaces a different one, deterministically.

/// The rotation, in display order
pub const MESSAGES: [&str; 7] = [
    "One day at a time. You are building momentum.",
    "Small reductions compound. Keep going.",
    "You are learning your patterns and taking control.",
    "Progress over perfection. Stay steady.",
    "Every log is a win for awareness.",
    "Cravings pass. Your commitment stays.",
    "You are proving to yourself that change is possible.",
];

/// Select the message for a given program day
///
/// Selection is `days_since_start mod 7`; euclidean so that out-of-range
/// day counters still land on a message instead of panicking.
pub fn select_message_of_the_day(days_since_start: i64) -> &'static str {
    let index = days_since_start.rem_euclid(MESSAGES.len() as i64) as usize;
    MESSAGES[index]
}
