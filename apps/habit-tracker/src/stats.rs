//! Read-only summaries over habits.

use crate::dates::{day_key, DayKey};
use crate::models::Habit;
use chrono::Local;

/// Days covered by the weekly strip.
pub const WEEK_DAYS: usize = 7;
/// Days covered by the heatmap.
pub const HEATMAP_DAYS: usize = 30;

/// One day of a habit's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayCell {
    pub day: DayKey,
    /// Scheduled on this weekday.
    pub target: bool,
    pub completed: bool,
}

impl DayCell {
    fn of(habit: &Habit, day: DayKey) -> Self {
        Self {
            day,
            target: habit.is_due_on(day),
            completed: habit.is_completed_on(day),
        }
    }
}

/// Statistics for a single habit.
#[derive(Debug, Clone)]
pub struct HabitStats {
    /// Total completed days.
    pub total_completions: usize,
    pub completed_today: bool,
    pub due_today: bool,
    /// Last seven days ending today, oldest first.
    pub week: Vec<DayCell>,
    /// Completed days within the week strip.
    pub weekly_completed: usize,
    /// Scheduled days within the week strip.
    pub weekly_target: usize,
    /// Completion counts by weekday index.
    pub weekday_counts: [u32; 7],
    pub days_since_created: i64,
    /// Completions per day since creation, as a percentage.
    pub consistency_percent: u32,
    /// Last thirty days ending today, oldest first.
    pub heatmap: Vec<DayCell>,
}

impl HabitStats {
    /// Calculate statistics relative to `today`.
    pub fn compute(habit: &Habit, today: DayKey) -> Self {
        let week: Vec<DayCell> = DayKey::last_n_days(today, WEEK_DAYS)
            .into_iter()
            .map(|day| DayCell::of(habit, day))
            .collect();
        let weekly_completed = week.iter().filter(|c| c.completed).count();
        let weekly_target = week.iter().filter(|c| c.target).count();

        let mut weekday_counts = [0u32; 7];
        for day in &habit.completed_dates {
            weekday_counts[day.weekday() as usize] += 1;
        }

        let created = day_key(&habit.created_at.with_timezone(&Local));
        let days_since_created = today
            .date()
            .signed_duration_since(created.date())
            .num_days()
            .max(0);
        let total_completions = habit.completed_dates.len();
        let consistency_percent = if days_since_created > 0 {
            (total_completions as f64 / days_since_created as f64 * 100.0).round() as u32
        } else {
            0
        };

        let heatmap = DayKey::last_n_days(today, HEATMAP_DAYS)
            .into_iter()
            .map(|day| DayCell::of(habit, day))
            .collect();

        Self {
            total_completions,
            completed_today: habit.is_completed_on(today),
            due_today: habit.is_due_on(today),
            week,
            weekly_completed,
            weekly_target,
            weekday_counts,
            days_since_created,
            consistency_percent,
            heatmap,
        }
    }

    /// Weekly completion percentage, 0 when nothing was scheduled.
    pub fn weekly_percent(&self) -> f64 {
        if self.weekly_target == 0 {
            return 0.0;
        }
        self.weekly_completed as f64 / self.weekly_target as f64 * 100.0
    }
}

/// Completion share of one day's due habits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayProgress {
    pub day: DayKey,
    pub percent: f64,
}

/// Summary across all habits.
#[derive(Debug, Clone)]
pub struct Overview {
    pub total: usize,
    /// Habits scheduled today.
    pub due_today: usize,
    /// Scheduled habits completed today.
    pub due_completed_today: usize,
    /// Any habit completed today, scheduled or not.
    pub completed_today: usize,
    /// Mean current streak, rounded.
    pub average_streak: u32,
    pub best_longest_streak: u32,
    /// Highest current streak and its habit name.
    pub top_current: Option<(String, u32)>,
    /// Last seven days, oldest first.
    pub weekly: Vec<DayProgress>,
}

impl Overview {
    pub fn compute(habits: &[Habit], today: DayKey) -> Self {
        let due: Vec<&Habit> = habits.iter().filter(|h| h.is_due_on(today)).collect();
        let due_completed_today = due.iter().filter(|h| h.is_completed_on(today)).count();
        let completed_today = habits.iter().filter(|h| h.is_completed_on(today)).count();

        let average_streak = if habits.is_empty() {
            0
        } else {
            let sum: u64 = habits.iter().map(|h| h.streak as u64).sum();
            (sum as f64 / habits.len() as f64).round() as u32
        };
        let best_longest_streak = habits.iter().map(|h| h.longest_streak).max().unwrap_or(0);

        // First habit wins ties.
        let top_current = habits
            .iter()
            .fold(None::<&Habit>, |best, h| match best {
                Some(b) if b.streak >= h.streak => Some(b),
                _ => Some(h),
            })
            .map(|h| (h.name.clone(), h.streak));

        let weekly = DayKey::last_n_days(today, WEEK_DAYS)
            .into_iter()
            .map(|day| {
                let scheduled: Vec<&Habit> = habits.iter().filter(|h| h.is_due_on(day)).collect();
                let done = scheduled.iter().filter(|h| h.is_completed_on(day)).count();
                let percent = if scheduled.is_empty() {
                    0.0
                } else {
                    done as f64 / scheduled.len() as f64 * 100.0
                };
                DayProgress { day, percent }
            })
            .collect();

        Self {
            total: habits.len(),
            due_today: due.len(),
            due_completed_today,
            completed_today,
            average_streak,
            best_longest_streak,
            top_current,
            weekly,
        }
    }

    /// Today's share of due habits completed, 0 when nothing is due.
    pub fn today_rate(&self) -> f64 {
        if self.due_today == 0 {
            return 0.0;
        }
        self.due_completed_today as f64 / self.due_today as f64
    }

    /// Average of the weekly series, rounded.
    pub fn weekly_average(&self) -> u32 {
        if self.weekly.is_empty() {
            return 0;
        }
        let sum: f64 = self.weekly.iter().map(|d| d.percent).sum();
        (sum / self.weekly.len() as f64).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HabitId, NewHabit, TargetDays};
    use chrono::{Local, TimeZone, Utc};

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn habit(name: &str, days: TargetDays, done: &[&str]) -> Habit {
        let mut input = NewHabit::named(name);
        input.target_days = days;
        let created = Local
            .with_ymd_and_hms(2023, 12, 28, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let mut habit = Habit::from_input(input.validate().unwrap(), HabitId::generate(), created);
        habit.completed_dates = done.iter().map(|d| key(d)).collect();
        habit
    }

    #[test]
    fn test_habit_week_strip() {
        // 2024-01-07 is Sunday; strip covers Mon 1st through Sun 7th.
        let h = habit(
            "Exercise",
            TargetDays::weekdays(),
            &["2024-01-01", "2024-01-02", "2024-01-06"],
        );
        let stats = HabitStats::compute(&h, key("2024-01-07"));

        assert_eq!(stats.week.len(), 7);
        assert_eq!(stats.week[0].day, key("2024-01-01"));
        assert_eq!(stats.weekly_target, 5);
        assert_eq!(stats.weekly_completed, 3);
        assert!((stats.weekly_percent() - 60.0).abs() < 1e-9);
        assert!(!stats.due_today);
        assert!(!stats.completed_today);
    }

    #[test]
    fn test_habit_weekday_counts_and_consistency() {
        let h = habit("Read", TargetDays::daily(), &["2024-01-01", "2024-01-08", "2024-01-07"]);
        let stats = HabitStats::compute(&h, key("2024-01-07"));

        assert_eq!(stats.weekday_counts[1], 2);
        assert_eq!(stats.weekday_counts[0], 1);
        assert_eq!(stats.total_completions, 3);
        assert_eq!(stats.days_since_created, 10);
        assert_eq!(stats.consistency_percent, 30);
        assert_eq!(stats.heatmap.len(), 30);
        assert_eq!(stats.heatmap.last().map(|c| c.day), Some(key("2024-01-07")));
        assert!(stats.heatmap.last().unwrap().completed);
    }

    #[test]
    fn test_days_since_created_uses_local_day() {
        let mut h = habit("Journal", TargetDays::daily(), &[]);
        h.created_at = Local
            .with_ymd_and_hms(2024, 1, 5, 23, 0, 0)
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(HabitStats::compute(&h, key("2024-01-05")).days_since_created, 0);
        assert_eq!(HabitStats::compute(&h, key("2024-01-07")).days_since_created, 2);
    }

    #[test]
    fn test_no_target_days() {
        let h = habit("Someday", TargetDays::none(), &[]);
        let stats = HabitStats::compute(&h, key("2024-01-07"));
        assert_eq!(stats.weekly_target, 0);
        assert_eq!(stats.weekly_percent(), 0.0);
    }

    #[test]
    fn test_overview() {
        let mut a = habit("Water", TargetDays::daily(), &["2024-01-02"]);
        a.streak = 1;
        a.longest_streak = 4;
        let mut b = habit("Exercise", TargetDays::weekdays(), &["2024-01-01", "2024-01-02"]);
        b.streak = 2;
        b.longest_streak = 2;
        let c = habit("Weekend", TargetDays::from_indices([0, 6]).unwrap(), &["2024-01-02"]);

        let overview = Overview::compute(&[a, b, c], key("2024-01-02"));
        assert_eq!(overview.total, 3);
        assert_eq!(overview.due_today, 2);
        assert_eq!(overview.due_completed_today, 2);
        assert_eq!(overview.completed_today, 3);
        assert_eq!(overview.average_streak, 1);
        assert_eq!(overview.best_longest_streak, 4);
        assert_eq!(overview.top_current, Some(("Exercise".to_string(), 2)));
        assert!((overview.today_rate() - 1.0).abs() < 1e-9);

        assert_eq!(overview.weekly.len(), 7);
        let monday = overview.weekly[5];
        assert_eq!(monday.day, key("2024-01-01"));
        assert!((monday.percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_overview_empty() {
        let overview = Overview::compute(&[], key("2024-01-02"));
        assert_eq!(overview.average_streak, 0);
        assert_eq!(overview.best_longest_streak, 0);
        assert_eq!(overview.top_current, None);
        assert_eq!(overview.today_rate(), 0.0);
        assert_eq!(overview.weekly_average(), 0);
    }
}
