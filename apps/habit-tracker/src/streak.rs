//! Streak calculation.
//!
//! A streak counts consecutive *calendar* days ending at "today" that are present
//! in a habit's completed set. Target days are not consulted: a weekday-only habit
//! loses its streak over an unmarked weekend.

use crate::dates::DayKey;
use std::collections::BTreeSet;

/// Current streak: consecutive completed days walking back from `today`.
///
/// Returns 0 when `today` itself is not completed.
pub fn compute_streak(completed: &BTreeSet<DayKey>, today: DayKey) -> u32 {
    let mut streak = 0u32;
    let mut day = today;

    while completed.contains(&day) {
        streak += 1;
        let prev = day.pred();
        // Calendar lower bound reached.
        if prev == day {
            break;
        }
        day = prev;
    }

    streak
}

/// Longest streak after observing `streak`. Never decreases.
pub fn next_longest(longest: u32, streak: u32) -> u32 {
    longest.max(streak)
}
