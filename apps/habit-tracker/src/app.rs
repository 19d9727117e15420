//! Application state and logic.

use crate::config::Config;
use crate::dates::{weekday_label, DayKey, SystemClock};
use crate::models::{Category, Habit, HabitId, NewHabit, TargetDays, HABIT_COLORS, HABIT_ICONS};
use crate::stats::{HabitStats, Overview};
use crate::storage::{KeyValueStore, SqliteStore};
use crate::store::{HabitStore, StoreError};
use crossterm::event::{KeyCode, KeyEvent};
use tracing::info;

/// Application state.
pub struct App<S: KeyValueStore = SqliteStore> {
    /// Habit collection.
    pub store: HabitStore<S>,
    /// Configuration.
    pub config: Config,
    /// Current view.
    pub view: View,
    /// Day that toggles apply to.
    pub selected_date: DayKey,
    /// Selected habit index.
    pub selected_index: usize,
    /// Open add-habit form.
    pub form: Option<HabitForm>,
    /// Show the detail popup for the selected habit.
    pub show_details: bool,
    /// Message to display.
    pub message: Option<(String, MessageType)>,
    /// Show help popup.
    pub show_help: bool,
    /// Confirmation dialog.
    pub confirm_dialog: Option<ConfirmDialog>,
}

/// Current view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Habit list with completion checkboxes.
    Daily,
    /// Statistics.
    Stats,
}

/// Message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

/// Confirmation dialog.
#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Confirm action type.
#[derive(Debug, Clone)]
pub enum ConfirmAction {
    DeleteHabit(HabitId),
}

/// Field focused in the add-habit form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Description,
    Category,
    Days,
    Color,
    Icon,
}

impl FormField {
    const ORDER: [FormField; 6] = [
        Self::Name,
        Self::Description,
        Self::Category,
        Self::Days,
        Self::Color,
        Self::Icon,
    ];

    fn step(self, delta: isize) -> Self {
        let len = Self::ORDER.len() as isize;
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0) as isize;
        Self::ORDER[(idx + delta).rem_euclid(len) as usize]
    }
}

/// Add-habit form state.
#[derive(Debug, Clone)]
pub struct HabitForm {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub target_days: TargetDays,
    pub color_index: usize,
    pub icon_index: usize,
    pub focus: FormField,
    /// Weekday under the cursor in the days row.
    pub day_cursor: u8,
}

impl Default for HabitForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: Category::Health,
            target_days: TargetDays::daily(),
            color_index: 0,
            icon_index: HABIT_ICONS.len() - 1,
            focus: FormField::Name,
            day_cursor: 1,
        }
    }
}

impl HabitForm {
    pub fn color(&self) -> &'static str {
        HABIT_COLORS[self.color_index % HABIT_COLORS.len()]
    }

    pub fn icon(&self) -> &'static str {
        HABIT_ICONS[self.icon_index % HABIT_ICONS.len()]
    }

    /// Store input built from the form.
    pub fn to_input(&self) -> NewHabit {
        NewHabit {
            name: self.name.clone(),
            description: Some(self.description.clone()),
            category: self.category,
            target_days: self.target_days.clone(),
            color: self.color().to_string(),
            icon: self.icon().to_string(),
        }
    }

    fn cycle(&mut self, delta: isize) {
        match self.focus {
            FormField::Category => {
                self.category = if delta > 0 {
                    self.category.next()
                } else {
                    // Five steps forward is one step back.
                    (0..Category::ALL.len() - 1).fold(self.category, |c, _| c.next())
                };
            }
            FormField::Days => {
                self.day_cursor = (self.day_cursor as isize + delta).rem_euclid(7) as u8;
            }
            FormField::Color => {
                self.color_index = wrap(self.color_index, delta, HABIT_COLORS.len());
            }
            FormField::Icon => {
                self.icon_index = wrap(self.icon_index, delta, HABIT_ICONS.len());
            }
            FormField::Name | FormField::Description => {}
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            FormField::Name => Some(&mut self.name),
            FormField::Description => Some(&mut self.description),
            _ => None,
        }
    }
}

fn wrap(index: usize, delta: isize, len: usize) -> usize {
    (index as isize + delta).rem_euclid(len as isize) as usize
}

impl App<SqliteStore> {
    /// Create new application backed by the configured database.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let db_path = config.db_path();
        info!(path = %db_path.display(), "opening habit database");
        let storage = SqliteStore::open(&db_path)?;
        let store = HabitStore::open(storage, SystemClock, config.store_options());

        Ok(Self::with_store(store, config))
    }
}

impl<S: KeyValueStore> App<S> {
    /// Create application around an opened store.
    pub fn with_store(store: HabitStore<S>, config: Config) -> Self {
        let today = store.today();
        let mut app = Self {
            store,
            config,
            view: View::Daily,
            selected_date: today,
            selected_index: 0,
            form: None,
            show_details: false,
            message: None,
            show_help: false,
            confirm_dialog: None,
        };
        app.report_persist_error();
        app
    }

    /// Check if in editing mode.
    pub fn is_editing(&self) -> bool {
        self.form.is_some()
    }

    /// All habits in display order.
    pub fn habits(&self) -> &[Habit] {
        self.store.load_all()
    }

    /// Today according to the store clock.
    pub fn today(&self) -> DayKey {
        self.store.today()
    }

    /// Get selected habit.
    pub fn selected_habit(&self) -> Option<&Habit> {
        self.habits().get(self.selected_index)
    }

    /// Statistics for the selected habit.
    pub fn selected_stats(&self) -> Option<HabitStats> {
        self.selected_habit()
            .map(|h| HabitStats::compute(h, self.today()))
    }

    /// Summary across all habits.
    pub fn overview(&self) -> Overview {
        Overview::compute(self.habits(), self.today())
    }

    /// Handle key input.
    pub fn handle_key(&mut self, key: KeyEvent) {
        // Handle confirmation dialog
        if let Some(dialog) = self.confirm_dialog.clone() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    self.execute_confirm(dialog.action);
                    self.confirm_dialog = None;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.confirm_dialog = None;
                }
                _ => {}
            }
            return;
        }

        // Handle help popup
        if self.show_help {
            self.show_help = false;
            return;
        }

        // Clear message on any key
        self.message = None;

        if self.form.is_some() {
            self.handle_form_key(key);
            return;
        }

        if self.show_details && matches!(key.code, KeyCode::Esc | KeyCode::Char('i')) {
            self.show_details = false;
            return;
        }

        match key.code {
            // Navigation
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('g') if key.modifiers.is_empty() => self.selected_index = 0,
            KeyCode::Char('G') => {
                if !self.habits().is_empty() {
                    self.selected_index = self.habits().len() - 1;
                }
            }

            // Date navigation
            KeyCode::Char('h') | KeyCode::Left => self.change_date(-1),
            KeyCode::Char('l') | KeyCode::Right => self.change_date(1),
            KeyCode::Char('t') => self.selected_date = self.today(),

            // Toggle completion
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_completion(),

            // Views
            KeyCode::Char('1') => self.view = View::Daily,
            KeyCode::Char('s') => self.view = View::Stats,
            KeyCode::Char('i') => self.show_details = self.selected_habit().is_some(),

            // Actions
            KeyCode::Char('a') => self.form = Some(HabitForm::default()),
            KeyCode::Char('d') => self.confirm_delete_habit(),

            // Help
            KeyCode::Char('?') => self.show_help = true,

            _ => {}
        }
    }

    /// Handle keys while the form is open.
    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.form = None;
                return;
            }
            KeyCode::Enter => {
                self.submit_form();
                return;
            }
            _ => {}
        }

        let Some(form) = self.form.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus = form.focus.step(1),
            KeyCode::BackTab | KeyCode::Up => form.focus = form.focus.step(-1),
            KeyCode::Left => form.cycle(-1),
            KeyCode::Right => form.cycle(1),
            KeyCode::Backspace => {
                if let Some(text) = form.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(' ') if form.focus == FormField::Days => {
                let day = form.day_cursor;
                form.target_days.toggle(day);
            }
            KeyCode::Char(c) => {
                if let Some(text) = form.text_mut() {
                    text.push(c);
                }
            }
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        let Some(input) = self.form.as_ref().map(HabitForm::to_input) else {
            return;
        };

        match self.store.add_habit(input) {
            Ok(habit) => {
                self.form = None;
                self.selected_index = self.habits().len().saturating_sub(1);
                self.message = Some((format!("Created '{}'", habit.name), MessageType::Success));
                self.report_persist_error();
            }
            Err(StoreError::Validation(reason)) => {
                self.message = Some((reason, MessageType::Error));
            }
            Err(err) => {
                self.message = Some((err.to_string(), MessageType::Error));
            }
        }
    }

    /// Move selection by delta.
    fn move_selection(&mut self, delta: i32) {
        if self.habits().is_empty() {
            return;
        }

        let new_index = self.selected_index as i32 + delta;
        self.selected_index = new_index.clamp(0, self.habits().len() as i32 - 1) as usize;
    }

    /// Change selected date. Never moves past today.
    fn change_date(&mut self, delta: i64) {
        let target = self.selected_date.offset(delta);
        self.selected_date = target.min(self.today());
    }

    /// Toggle completion of the selected habit on the selected date.
    fn toggle_completion(&mut self) {
        let Some(habit) = self.selected_habit() else {
            return;
        };
        // Off-schedule days can be cleared but not checked.
        if !habit.is_due_on(self.selected_date) && !habit.is_completed_on(self.selected_date) {
            self.message = Some((
                format!(
                    "{} is not scheduled on {}",
                    habit.name,
                    weekday_label(self.selected_date.weekday())
                ),
                MessageType::Info,
            ));
            return;
        }
        let id = habit.id.clone();

        match self.store.toggle_completion(&id, self.selected_date) {
            Ok(habit) => {
                let done = habit.is_completed_on(self.selected_date);
                self.message = Some((
                    format!(
                        "{} {} ({}d streak)",
                        habit.name,
                        if done { "completed" } else { "uncompleted" },
                        habit.streak
                    ),
                    MessageType::Success,
                ));
                self.report_persist_error();
            }
            // Stale selection; nothing to toggle.
            Err(StoreError::NotFound(_)) => {}
            Err(err) => self.message = Some((err.to_string(), MessageType::Error)),
        }
    }

    /// Confirm delete habit.
    fn confirm_delete_habit(&mut self) {
        if let Some(habit) = self.selected_habit() {
            self.confirm_dialog = Some(ConfirmDialog {
                title: "Delete Habit".to_string(),
                message: format!("Delete '{}'? This cannot be undone. (y/n)", habit.name),
                action: ConfirmAction::DeleteHabit(habit.id.clone()),
            });
        }
    }

    /// Execute confirmed action.
    fn execute_confirm(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteHabit(id) => {
                if self.store.delete_habit(&id).is_some() {
                    self.message = Some(("Habit deleted".to_string(), MessageType::Success));
                    self.show_details = false;
                    self.report_persist_error();
                }
                if self.selected_index >= self.habits().len() {
                    self.selected_index = self.habits().len().saturating_sub(1);
                }
            }
        }
    }

    /// Surface the last write failure as a warning.
    fn report_persist_error(&mut self) {
        if let Some(err) = self.store.last_persist_error() {
            self.message = Some((
                format!("Changes not saved: {err}"),
                MessageType::Warning,
            ));
        }
    }

    /// Get view title.
    pub fn view_title(&self) -> &str {
        match self.view {
            View::Daily => "Habits",
            View::Stats => "Statistics",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::FixedClock;
    use crate::storage::MemoryStore;
    use crate::store::{SeedPolicy, StoreOptions};
    use crossterm::event::KeyModifiers;

    fn key(s: &str) -> DayKey {
        s.parse().unwrap()
    }

    fn press(app: &mut App<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn app_on(today: &str, seed: SeedPolicy) -> App<MemoryStore> {
        let store = HabitStore::open(
            MemoryStore::new(),
            FixedClock::on(key(today)),
            StoreOptions {
                seed,
                ..StoreOptions::default()
            },
        );
        App::with_store(store, Config::default())
    }

    #[test]
    fn test_add_habit_through_form() {
        let mut app = app_on("2024-01-02", SeedPolicy::Empty);
        press(&mut app, KeyCode::Char('a'));
        assert!(app.is_editing());

        type_text(&mut app, "Stretch");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "after waking up");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Tab);
        // Cursor starts on Monday; turn Monday off.
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Enter);

        assert!(!app.is_editing());
        let habit = &app.habits()[0];
        assert_eq!(habit.name, "Stretch");
        assert_eq!(habit.description.as_deref(), Some("after waking up"));
        assert_eq!(habit.category, Category::Productivity);
        assert!(!habit.target_days.contains(1));
        assert_eq!(habit.target_days.len(), 6);
        assert_eq!(habit.icon, "target");
    }

    #[test]
    fn test_blank_name_keeps_form_open() {
        let mut app = app_on("2024-01-02", SeedPolicy::Empty);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);

        assert!(app.is_editing());
        assert!(app.habits().is_empty());
        assert!(matches!(app.message, Some((_, MessageType::Error))));
    }

    #[test]
    fn test_toggle_past_day_keeps_today_anchor() {
        let mut app = app_on("2024-01-02", SeedPolicy::Examples);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.habits()[0].streak, 1);

        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.selected_date, key("2024-01-01"));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.habits()[0].streak, 2);

        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.habits()[0].streak, 2);
        assert_eq!(app.habits()[0].completed_dates.len(), 3);
    }

    #[test]
    fn test_toggle_skips_unscheduled_day() {
        // 2024-01-06 is Saturday; the second example habit runs on weekdays.
        let mut app = app_on("2024-01-06", SeedPolicy::Examples);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char(' '));

        assert!(matches!(app.message, Some((ref text, MessageType::Info)) if text.contains("Sat")));
        assert!(app.habits()[1].completed_dates.is_empty());
        assert_eq!(app.habits()[1].streak, 0);

        // Scheduled habits on the same day still toggle.
        press(&mut app, KeyCode::Char('k'));
        press(&mut app, KeyCode::Char(' '));
        assert!(matches!(app.message, Some((_, MessageType::Success))));
        assert_eq!(app.habits()[0].streak, 1);
    }

    #[test]
    fn test_date_never_passes_today() {
        let mut app = app_on("2024-01-02", SeedPolicy::Empty);
        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.selected_date, key("2024-01-02"));
        press(&mut app, KeyCode::Char('h'));
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.selected_date, key("2024-01-02"));
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut app = app_on("2024-01-02", SeedPolicy::Examples);
        press(&mut app, KeyCode::Char('G'));
        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.habits().len(), 3);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.habits().len(), 2);
        assert_eq!(app.selected_index, 1);
    }

    #[test]
    fn test_write_failure_shows_warning() {
        let mut app = app_on("2024-01-02", SeedPolicy::Examples);
        app.store.storage_mut().set_fail_writes(true);
        press(&mut app, KeyCode::Char(' '));

        assert!(matches!(app.message, Some((_, MessageType::Warning))));
        assert_eq!(app.habits()[0].streak, 1);
    }

    #[test]
    fn test_details_popup() {
        let mut app = app_on("2024-01-02", SeedPolicy::Empty);
        press(&mut app, KeyCode::Char('i'));
        assert!(!app.show_details);

        let mut app = app_on("2024-01-02", SeedPolicy::Examples);
        press(&mut app, KeyCode::Char('i'));
        assert!(app.show_details);
        assert_eq!(app.selected_stats().map(|s| s.heatmap.len()), Some(30));
        press(&mut app, KeyCode::Esc);
        assert!(!app.show_details);
    }
}
