//! Habit Tracker - Track daily habits with calendar-day streaks.
//!
//! The core is [`store::HabitStore`], which owns the habit collection, applies
//! [`streak::compute_streak`] on every completion toggle and writes the whole
//! collection to a [`storage::KeyValueStore`] after each mutation.

pub mod app;
pub mod config;
pub mod dates;
pub mod logging;
pub mod models;
pub mod stats;
pub mod storage;
pub mod store;
pub mod streak;
pub mod ui;
