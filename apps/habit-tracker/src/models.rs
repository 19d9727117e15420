//! Data models for habit tracking.

use crate::dates::{weekday_label, DayKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

/// Colors offered by the habit form.
pub const HABIT_COLORS: &[&str] = &[
    "blue", "green", "purple", "pink", "orange", "indigo", "red", "yellow",
];

/// Icons offered by the habit form.
pub const HABIT_ICONS: &[&str] = &[
    "droplets", "dumbbell", "book-open", "coffee", "moon", "sun", "heart", "brain", "leaf",
    "zap", "star", "target",
];

/// Unique habit identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitId(String);

impl HabitId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl From<&str> for HabitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for HabitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tracked habit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    /// Unique identifier.
    pub id: HabitId,
    /// Habit name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category.
    pub category: Category,
    /// Weekdays the habit is scheduled on.
    pub target_days: TargetDays,
    /// Current streak, cached from the last toggle.
    pub streak: u32,
    /// Highest streak ever reached.
    pub longest_streak: u32,
    /// Days the habit was marked done, ascending.
    pub completed_dates: BTreeSet<DayKey>,
    /// When the habit was created.
    pub created_at: DateTime<Utc>,
    /// Display color.
    pub color: String,
    /// Display icon.
    pub icon: String,
}

impl Habit {
    /// Build a habit from validated input. Derived fields start at zero.
    pub fn from_input(input: ValidHabit, id: HabitId, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: input.name,
            description: input.description,
            category: input.category,
            target_days: input.target_days,
            streak: 0,
            longest_streak: 0,
            completed_dates: BTreeSet::new(),
            created_at,
            color: input.color,
            icon: input.icon,
        }
    }

    /// Check if the habit is scheduled on a given day.
    pub fn is_due_on(&self, day: DayKey) -> bool {
        self.target_days.contains(day.weekday())
    }

    /// Check if the habit was completed on a given day.
    pub fn is_completed_on(&self, day: DayKey) -> bool {
        self.completed_dates.contains(&day)
    }
}

/// Habit category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Health,
    Productivity,
    Learning,
    Social,
    Mindfulness,
    Fitness,
}

impl Category {
    /// All categories in form order.
    pub const ALL: [Category; 6] = [
        Self::Health,
        Self::Productivity,
        Self::Learning,
        Self::Social,
        Self::Mindfulness,
        Self::Fitness,
    ];

    /// Get display name.
    pub fn display(&self) -> &'static str {
        match self {
            Self::Health => "Health",
            Self::Productivity => "Productivity",
            Self::Learning => "Learning",
            Self::Social => "Social",
            Self::Mindfulness => "Mindfulness",
            Self::Fitness => "Fitness",
        }
    }

    /// Palette color associated with the category.
    pub fn default_color(&self) -> &'static str {
        match self {
            Self::Health => "green",
            Self::Productivity => "blue",
            Self::Learning => "purple",
            Self::Social => "pink",
            Self::Mindfulness => "indigo",
            Self::Fitness => "orange",
        }
    }

    /// The category after this one, wrapping around.
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Rejected weekday index.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("weekday index out of range: {0} (expected 0-6)")]
pub struct InvalidWeekday(pub u8);

/// Weekdays a habit is scheduled on, Sunday=0 through Saturday=6.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct TargetDays(BTreeSet<u8>);

impl TargetDays {
    /// Every day of the week.
    pub fn daily() -> Self {
        Self((0..7).collect())
    }

    /// Monday through Friday.
    pub fn weekdays() -> Self {
        Self((1..6).collect())
    }

    /// No scheduled days.
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    /// Build from indices, collapsing duplicates.
    pub fn from_indices(days: impl IntoIterator<Item = u8>) -> Result<Self, InvalidWeekday> {
        let mut set = BTreeSet::new();
        for day in days {
            if day > 6 {
                return Err(InvalidWeekday(day));
            }
            set.insert(day);
        }
        Ok(Self(set))
    }

    /// Check whether a weekday index is scheduled.
    pub fn contains(&self, weekday: u8) -> bool {
        self.0.contains(&weekday)
    }

    /// Flip a weekday on or off. Out-of-range indices are ignored.
    pub fn toggle(&mut self, weekday: u8) {
        if weekday > 6 {
            return;
        }
        if !self.0.remove(&weekday) {
            self.0.insert(weekday);
        }
    }

    /// Scheduled indices, ascending.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// Number of scheduled weekdays.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get display string.
    pub fn display(&self) -> String {
        match self.0.len() {
            0 => "Never".to_string(),
            7 => "Daily".to_string(),
            _ if *self == Self::weekdays() => "Weekdays".to_string(),
            _ => self
                .iter()
                .map(weekday_label)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl TryFrom<Vec<u8>> for TargetDays {
    type Error = InvalidWeekday;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        Self::from_indices(days)
    }
}

impl From<TargetDays> for Vec<u8> {
    fn from(days: TargetDays) -> Self {
        days.0.into_iter().collect()
    }
}

/// Input for creating a habit.
#[derive(Debug, Clone)]
pub struct NewHabit {
    pub name: String,
    pub description: Option<String>,
    pub category: Category,
    pub target_days: TargetDays,
    pub color: String,
    pub icon: String,
}

impl NewHabit {
    /// Daily habit with default category and cosmetics.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Trim and check the input. Fails when the name is blank.
    pub fn validate(self) -> Result<ValidHabit, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("habit name must not be empty".to_string());
        }

        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(ValidHabit {
            name: name.to_string(),
            description,
            category: self.category,
            target_days: self.target_days,
            color: self.color,
            icon: self.icon,
        })
    }
}

impl Default for NewHabit {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            category: Category::Health,
            target_days: TargetDays::daily(),
            color: "blue".to_string(),
            icon: "target".to_string(),
        }
    }
}

/// Habit input that passed validation.
#[derive(Debug, Clone)]
pub struct ValidHabit {
    name: String,
    description: Option<String>,
    category: Category,
    target_days: TargetDays,
    color: String,
    icon: String,
}

/// Collection wrapper persisted under the store key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitsRecord {
    pub habits: Vec<Habit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_target_days_collapse_duplicates() {
        let days = TargetDays::from_indices([1, 1, 3, 5, 3]).unwrap();
        assert_eq!(days.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert_eq!(TargetDays::from_indices([7]), Err(InvalidWeekday(7)));
    }

    #[test]
    fn test_target_days_display() {
        assert_eq!(TargetDays::daily().display(), "Daily");
        assert_eq!(TargetDays::weekdays().display(), "Weekdays");
        assert_eq!(TargetDays::none().display(), "Never");
        assert_eq!(TargetDays::from_indices([0, 6]).unwrap().display(), "Sun, Sat");
    }

    #[test]
    fn test_target_days_toggle() {
        let mut days = TargetDays::none();
        days.toggle(2);
        days.toggle(9);
        assert_eq!(days.iter().collect::<Vec<_>>(), vec![2]);
        days.toggle(2);
        assert!(days.is_empty());
    }

    #[test]
    fn test_weekday_schedule() {
        let mut input = NewHabit::named("Exercise");
        input.target_days = TargetDays::weekdays();
        let habit = Habit::from_input(input.validate().unwrap(), HabitId::generate(), Utc::now());
        // Jan 1, 2024 is Monday
        assert!(habit.is_due_on(key("2024-01-01")));
        assert!(!habit.is_due_on(key("2024-01-06")));
        assert!(!habit.is_due_on(key("2024-01-07")));
    }

    #[test]
    fn test_validate_trims() {
        let mut input = NewHabit::named("  Read  ");
        input.description = Some("   ".to_string());
        let valid = input.validate().unwrap();
        assert_eq!(valid.name, "Read");
        assert_eq!(valid.description, None);

        assert!(NewHabit::named(" \t ").validate().is_err());
    }

    #[test]
    fn test_category_cycle() {
        assert_eq!(Category::Health.next(), Category::Productivity);
        assert_eq!(Category::Fitness.next(), Category::Health);
    }

    #[test]
    fn test_persisted_layout() {
        let mut habit = Habit::from_input(
            NewHabit::named("Read").validate().unwrap(),
            HabitId::from("42"),
            Utc::now(),
        );
        habit.completed_dates.insert(key("2024-01-02"));
        habit.completed_dates.insert(key("2024-01-01"));

        let value = serde_json::to_value(&habit).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["category"], "health");
        assert_eq!(value["targetDays"], serde_json::json!([0, 1, 2, 3, 4, 5, 6]));
        assert_eq!(value["longestStreak"], 0);
        assert_eq!(
            value["completedDates"],
            serde_json::json!(["2024-01-01", "2024-01-02"])
        );
        assert!(value.get("description").is_none());
        assert!(value["createdAt"].is_string());
    }

    #[test]
    fn test_rejects_out_of_range_target_day() {
        let json = r#"{"id":"1","name":"x","category":"social","targetDays":[1,9],
            "streak":0,"longestStreak":0,"completedDates":[],
            "createdAt":"2024-01-01T00:00:00Z","color":"red","icon":"zap"}"#;
        assert!(serde_json::from_str::<Habit>(json).is_err());
    }
}
