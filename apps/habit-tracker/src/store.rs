//! The habit store: owns the collection and persists it on every mutation.

use crate::dates::{Clock, DayKey};
use crate::models::{Category, Habit, HabitId, HabitsRecord, NewHabit, TargetDays};
use crate::storage::{KeyValueStore, StorageError};
use crate::streak::{compute_streak, next_longest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Key the collection is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "habit-tracker-data";

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid habit: {0}")]
    Validation(String),
    #[error("habit not found: {0}")]
    NotFound(HabitId),
    #[error("storage error: {0}")]
    Persistence(#[from] StorageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What to do when no saved collection exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SeedPolicy {
    /// Three example habits with no history.
    #[default]
    Examples,
    /// Start with an empty collection.
    Empty,
}

/// Store options.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub key: String,
    pub seed: SeedPolicy,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
            seed: SeedPolicy::Examples,
        }
    }
}

#[derive(Serialize)]
struct RecordRef<'a> {
    habits: &'a [Habit],
}

/// Canonical habit collection.
pub struct HabitStore<S: KeyValueStore> {
    habits: Vec<Habit>,
    storage: S,
    clock: Box<dyn Clock>,
    key: String,
    last_persist_error: Option<StoreError>,
}

impl<S: KeyValueStore> HabitStore<S> {
    /// Load the saved collection, or seed one.
    ///
    /// An unreadable payload falls back to the seed set in memory and is left in
    /// storage until the next mutation overwrites it.
    pub fn open(storage: S, clock: impl Clock + 'static, options: StoreOptions) -> Self {
        let mut store = Self {
            habits: Vec::new(),
            storage,
            clock: Box::new(clock),
            key: options.key,
            last_persist_error: None,
        };

        match store.read() {
            Ok(Some(habits)) => {
                info!(count = habits.len(), key = %store.key, "loaded habits");
                store.habits = habits;
            }
            Ok(None) => {
                info!(policy = ?options.seed, "no saved habits, seeding");
                store.habits = seed_habits(options.seed, store.clock.now());
                store.persist();
            }
            Err(err) => {
                warn!(%err, key = %store.key, "saved habits unreadable, using seed set");
                store.habits = seed_habits(options.seed, store.clock.now());
            }
        }

        store
    }

    fn read(&self) -> StoreResult<Option<Vec<Habit>>> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(None);
        };
        let record: HabitsRecord = serde_json::from_str(&raw)?;

        let mut seen = HashSet::new();
        let habits = record
            .habits
            .into_iter()
            .filter(|h| {
                let fresh = seen.insert(h.id.clone());
                if !fresh {
                    warn!(id = %h.id, "dropping habit with duplicate id");
                }
                fresh
            })
            .map(|mut h| {
                h.longest_streak = next_longest(h.longest_streak, h.streak);
                h
            })
            .collect();

        Ok(Some(habits))
    }

    /// All habits in insertion order.
    pub fn load_all(&self) -> &[Habit] {
        &self.habits
    }

    /// Get a habit by ID.
    pub fn get(&self, id: &HabitId) -> Option<&Habit> {
        self.habits.iter().find(|h| &h.id == id)
    }

    pub fn len(&self) -> usize {
        self.habits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.habits.is_empty()
    }

    /// Today's local day according to the store clock.
    pub fn today(&self) -> DayKey {
        self.clock.today()
    }

    /// Replace the clock.
    pub fn set_clock(&mut self, clock: impl Clock + 'static) {
        self.clock = Box::new(clock);
    }

    /// Create a habit. Nothing changes when validation fails.
    pub fn add_habit(&mut self, input: NewHabit) -> StoreResult<Habit> {
        let valid = input.validate().map_err(StoreError::Validation)?;

        let mut id = HabitId::generate();
        while self.get(&id).is_some() {
            id = HabitId::generate();
        }

        let habit = Habit::from_input(valid, id, self.clock.now());
        debug!(id = %habit.id, name = %habit.name, "habit added");
        self.habits.push(habit.clone());
        self.persist();
        Ok(habit)
    }

    /// Mark `day` done, or undo it if already done.
    ///
    /// The streak is recomputed against today, not against `day`.
    pub fn toggle_completion(&mut self, id: &HabitId, day: DayKey) -> StoreResult<Habit> {
        let today = self.clock.today();
        let habit = self
            .habits
            .iter_mut()
            .find(|h| &h.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let completed = if habit.completed_dates.remove(&day) {
            false
        } else {
            habit.completed_dates.insert(day);
            true
        };
        habit.streak = compute_streak(&habit.completed_dates, today);
        habit.longest_streak = next_longest(habit.longest_streak, habit.streak);

        debug!(
            id = %habit.id,
            %day,
            completed,
            streak = habit.streak,
            longest = habit.longest_streak,
            "completion toggled"
        );
        let updated = habit.clone();
        self.persist();
        Ok(updated)
    }

    /// Remove a habit. Unknown ids are ignored and nothing is written.
    pub fn delete_habit(&mut self, id: &HabitId) -> Option<Habit> {
        let index = self.habits.iter().position(|h| &h.id == id)?;
        let removed = self.habits.remove(index);
        debug!(id = %removed.id, "habit deleted");
        self.persist();
        Some(removed)
    }

    /// Write the whole collection under the store key.
    pub fn save(&mut self) -> StoreResult<()> {
        let payload = serde_json::to_string(&RecordRef {
            habits: &self.habits,
        })?;
        self.storage.set(&self.key, &payload)?;
        Ok(())
    }

    fn persist(&mut self) {
        match self.save() {
            Ok(()) => self.last_persist_error = None,
            Err(err) => {
                warn!(%err, "failed to persist habits, keeping in-memory state");
                self.last_persist_error = Some(err);
            }
        }
    }

    /// The most recent write failure, cleared by the next successful write.
    pub fn last_persist_error(&self) -> Option<&StoreError> {
        self.last_persist_error.as_ref()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}

fn seed_habits(policy: SeedPolicy, now: DateTime<Utc>) -> Vec<Habit> {
    if policy == SeedPolicy::Empty {
        return Vec::new();
    }

    let examples = [
        (
            "Drink 8 glasses of water",
            "Stay hydrated through the day",
            Category::Health,
            TargetDays::daily(),
            "blue",
            "droplets",
        ),
        (
            "Exercise 30 min",
            "Daily physical activity",
            Category::Fitness,
            TargetDays::weekdays(),
            "orange",
            "dumbbell",
        ),
        (
            "Read 20 pages",
            "Daily reading to keep learning",
            Category::Learning,
            TargetDays::daily(),
            "purple",
            "book-open",
        ),
    ];

    examples
        .into_iter()
        .filter_map(|(name, description, category, target_days, color, icon)| {
            let input = NewHabit {
                name: name.to_string(),
                description: Some(description.to_string()),
                category,
                target_days,
                color: color.to_string(),
                icon: icon.to_string(),
            };
            input
                .validate()
                .ok()
                .map(|valid| Habit::from_input(valid, HabitId::generate(), now))
        })
        .collect()
}
