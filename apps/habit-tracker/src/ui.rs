//! UI rendering for habit tracker.

use crate::app::{App, ConfirmDialog, FormField, HabitForm, MessageType, View};
use crate::dates::{weekday_label, DayKey};
use crate::models::Habit;
use crate::stats::{DayCell, HabitStats};
use crate::storage::KeyValueStore;
use chrono::format::{Item, StrftimeItems};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Clear, List, ListItem, Paragraph, Row, Table, Wrap},
    Frame,
};

/// Draw the application.
pub fn draw<S: KeyValueStore>(f: &mut Frame, app: &App<S>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer/status
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    match app.view {
        View::Daily => draw_daily_view(f, app, chunks[1]),
        View::Stats => draw_stats_view(f, app, chunks[1]),
    }
    draw_footer(f, app, chunks[2]);

    // Draw popups
    if app.show_details {
        if let (Some(habit), Some(stats)) = (app.selected_habit(), app.selected_stats()) {
            draw_details_popup(f, habit, &stats);
        }
    }

    if app.show_help {
        draw_help_popup(f);
    }

    if let Some(dialog) = &app.confirm_dialog {
        draw_confirm_dialog(f, dialog);
    }

    if let Some(form) = &app.form {
        draw_form(f, form);
    }
}

fn draw_header<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let date_str = format_date(app.selected_date, &app.config.display.date_format);
    let marker = if app.selected_date == app.today() {
        ""
    } else {
        " (past day)"
    };
    let title = format!(" {} - {}{} ", app.view_title(), date_str, marker);

    let overview = app.overview();
    let tabs: Vec<Span> = vec![
        styled_tab("1:Habits", app.view == View::Daily),
        Span::raw(" "),
        styled_tab("s:Stats", app.view == View::Stats),
        Span::raw("   "),
        Span::styled(
            format!(
                "Today {}/{} done",
                overview.due_completed_today, overview.due_today
            ),
            Style::default().fg(Color::Cyan),
        ),
    ];

    let header = Paragraph::new(Line::from(tabs))
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Center);

    f.render_widget(header, area);
}

/// Format with a user-supplied pattern, falling back to the day key when invalid.
fn format_date(day: DayKey, pattern: &str) -> String {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return day.to_string();
    }
    day.date().format(pattern).to_string()
}

fn styled_tab(label: &str, active: bool) -> Span<'static> {
    if active {
        Span::styled(
            format!("[{}]", label),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {} ", label), Style::default().fg(Color::Gray))
    }
}

fn draw_daily_view<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    if app.habits().is_empty() {
        let msg = Paragraph::new("No habits yet. Press 'a' to add a habit.")
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let today = app.today();
    let items: Vec<ListItem> = app
        .habits()
        .iter()
        .enumerate()
        .map(|(i, habit)| {
            let completed = habit.is_completed_on(app.selected_date);
            let due = habit.is_due_on(app.selected_date);

            let checkbox = if completed { "[x]" } else { "[ ]" };
            let mut spans = vec![
                Span::styled(
                    checkbox,
                    Style::default().fg(if completed {
                        Color::Green
                    } else {
                        Color::Gray
                    }),
                ),
                Span::raw(" "),
            ];

            // Habit name
            let name_style = if completed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else if i == app.selected_index {
                Style::default()
                    .fg(palette_color(&habit.color))
                    .add_modifier(Modifier::BOLD)
            } else if !due {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(palette_color(&habit.color))
            };
            spans.push(Span::styled(habit.name.clone(), name_style));
            spans.push(Span::styled(
                format!(" ({})", habit.category.display()),
                Style::default().fg(Color::DarkGray),
            ));

            // Streak info
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                format!("{}d streak, best {}d", habit.streak, habit.longest_streak),
                Style::default().fg(Color::Magenta),
            ));

            if app.config.display.show_weekly_strip {
                let stats = HabitStats::compute(habit, today);
                spans.push(Span::raw("  "));
                spans.extend(stats.week.iter().map(day_cell_span));
            }

            let style = if i == app.selected_index {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };

            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    let completion = app.overview().today_rate() * 100.0;
    let title = format!(" Habits ({:.0}% of today's habits complete) ", completion);

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));

    f.render_widget(list, area);
}

fn day_cell_span(cell: &DayCell) -> Span<'static> {
    let (symbol, color) = match (cell.completed, cell.target) {
        (true, _) => ("■", Color::Green),
        (false, true) => ("□", Color::Gray),
        (false, false) => ("·", Color::DarkGray),
    };
    Span::styled(symbol, Style::default().fg(color))
}

fn draw_stats_view<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    if app.habits().is_empty() {
        let msg = Paragraph::new("No habits to show statistics for.")
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Length(9),
            Constraint::Min(0),
        ])
        .split(area);

    let overview = app.overview();
    let top = overview
        .top_current
        .as_ref()
        .map(|(name, streak)| format!("{} days ({})", streak, name))
        .unwrap_or_else(|| "-".to_string());
    let text = format!(
        "Completed today: {}/{}\nDue today: {}/{}\nAverage streak: {}\nBest streak ever: {}\nBest current streak: {}\nWeekly progress: {}%",
        overview.completed_today,
        overview.total,
        overview.due_completed_today,
        overview.due_today,
        overview.average_streak,
        overview.best_longest_streak,
        top,
        overview.weekly_average(),
    );
    let summary = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title(" Overview "))
        .wrap(Wrap { trim: true });
    f.render_widget(summary, chunks[0]);

    // Last seven days
    let data: Vec<(&str, u64)> = overview
        .weekly
        .iter()
        .map(|d| (weekday_label(d.day.weekday()), d.percent.round() as u64))
        .collect();
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Last 7 days (% of due habits) "),
        )
        .data(data.as_slice())
        .bar_width(5)
        .bar_gap(2)
        .max(100)
        .bar_style(Style::default().fg(Color::Blue))
        .value_style(Style::default().fg(Color::White).bg(Color::Blue));
    f.render_widget(chart, chunks[1]);

    // Per-habit stats
    let header = Row::new(vec!["Habit", "Current", "Best", "Week", "Consistency"])
        .style(Style::default().add_modifier(Modifier::BOLD))
        .bottom_margin(1);

    let today = app.today();
    let rows: Vec<Row> = app
        .habits()
        .iter()
        .enumerate()
        .map(|(i, habit)| {
            let stats = HabitStats::compute(habit, today);
            let row = Row::new(vec![
                habit.name.clone(),
                format!("{} days", habit.streak),
                format!("{} days", habit.longest_streak),
                format!("{}/{}", stats.weekly_completed, stats.weekly_target),
                format!("{}%", stats.consistency_percent),
            ]);
            if i == app.selected_index {
                row.style(Style::default().bg(Color::DarkGray))
            } else {
                row
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(36),
            Constraint::Percentage(16),
            Constraint::Percentage(16),
            Constraint::Percentage(16),
            Constraint::Percentage(16),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(" Per-Habit "));

    f.render_widget(table, chunks[2]);
}

fn draw_details_popup(f: &mut Frame, habit: &Habit, stats: &HabitStats) {
    let area = centered_rect(70, 70, f.area());
    f.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(Span::styled(
            habit.name.clone(),
            Style::default()
                .fg(palette_color(&habit.color))
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(habit.description.clone().unwrap_or_default()),
        Line::from(format!(
            "{} | {} | icon: {}",
            habit.category.display(),
            habit.target_days.display(),
            habit.icon
        )),
        Line::from(""),
        Line::from(format!(
            "Current streak: {}   Best streak: {}   Total: {}   Consistency: {}%",
            habit.streak, habit.longest_streak, stats.total_completions, stats.consistency_percent
        )),
        Line::from(""),
        Line::from("Last 30 days:"),
    ];

    let mut heatmap = vec![Span::raw("  ")];
    heatmap.extend(stats.heatmap.iter().map(day_cell_span));
    lines.push(Line::from(heatmap));
    lines.push(Line::from(""));

    lines.push(Line::from("Completions by weekday:"));
    let max = stats.weekday_counts.iter().copied().max().unwrap_or(0);
    for (index, count) in stats.weekday_counts.iter().enumerate() {
        let width = if max > 0 {
            (*count as usize * 20) / max as usize
        } else {
            0
        };
        let color = if habit.target_days.contains(index as u8) {
            Color::Green
        } else {
            Color::DarkGray
        };
        lines.push(Line::from(vec![
            Span::raw(format!("  {} ", weekday_label(index as u8))),
            Span::styled("█".repeat(width), Style::default().fg(color)),
            Span::raw(format!(" {}", count)),
        ]));
    }

    let popup = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Details (Esc to close) "))
        .wrap(Wrap { trim: false });

    f.render_widget(popup, area);
}

fn draw_footer<S: KeyValueStore>(f: &mut Frame, app: &App<S>, area: Rect) {
    let (msg, style) = if let Some((ref message, msg_type)) = app.message {
        let color = match msg_type {
            MessageType::Info => Color::Blue,
            MessageType::Success => Color::Green,
            MessageType::Warning => Color::Yellow,
            MessageType::Error => Color::Red,
        };
        (message.clone(), Style::default().fg(color))
    } else {
        let help = match app.view {
            View::Daily => "j/k:Navigate  Space:Toggle  a:Add  d:Delete  i:Details  h/l:Date  ?:Help  q:Quit",
            View::Stats => "j/k:Navigate  i:Details  1:Habits view  ?:Help  q:Quit",
        };
        (help.to_string(), Style::default().fg(Color::DarkGray))
    };

    let footer = Paragraph::new(msg)
        .style(style)
        .block(Block::default().borders(Borders::ALL));

    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(60, 80, f.area());
    f.render_widget(Clear, area);

    let help_text = r#"
Habit Tracker Keybindings

Navigation:
  j/k, Up/Down    Move selection
  h/l, Left/Right Change date (up to today)
  t               Jump to today
  g/G             Jump to first/last

Views:
  1               Habits view
  s               Statistics view
  i               Habit details

Actions:
  Space, Enter    Toggle completion on the selected date
  a               Add new habit
  d               Delete habit

Add form:
  Tab/Shift-Tab   Next/previous field
  Left/Right      Change category, day, color or icon
  Space           Toggle the day under the cursor
  Enter           Save   Esc Cancel

General:
  ?               Show this help
  q               Quit

Press any key to close
"#;

    let popup = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title(" Help "))
        .wrap(Wrap { trim: false });

    f.render_widget(popup, area);
}

fn draw_confirm_dialog(f: &mut Frame, dialog: &ConfirmDialog) {
    let area = centered_rect(50, 20, f.area());
    f.render_widget(Clear, area);

    let text = Paragraph::new(dialog.message.clone())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", dialog.title)),
        )
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(text, area);
}

fn draw_form(f: &mut Frame, form: &HabitForm) {
    let area = centered_rect(60, 50, f.area());
    f.render_widget(Clear, area);

    let label = |field: FormField, text: &'static str| {
        let style = if form.focus == field {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        Span::styled(format!("{:<13}", text), style)
    };

    let mut days = vec![label(FormField::Days, "Days:")];
    for index in 0..7u8 {
        let on = form.target_days.contains(index);
        let mut style = Style::default().fg(if on { Color::Green } else { Color::DarkGray });
        if form.focus == FormField::Days && form.day_cursor == index {
            style = style.add_modifier(Modifier::REVERSED);
        }
        days.push(Span::styled(format!("{} ", weekday_label(index)), style));
    }

    let lines = vec![
        Line::from(vec![label(FormField::Name, "Name:"), Span::raw(form.name.clone())]),
        Line::from(vec![
            label(FormField::Description, "Description:"),
            Span::raw(form.description.clone()),
        ]),
        Line::from(vec![
            label(FormField::Category, "Category:"),
            Span::raw(format!("< {} >", form.category.display())),
        ]),
        Line::from(days),
        Line::from(vec![
            label(FormField::Color, "Color:"),
            Span::styled(
                format!("< {} >", form.color()),
                Style::default().fg(palette_color(form.color())),
            ),
        ]),
        Line::from(vec![
            label(FormField::Icon, "Icon:"),
            Span::raw(format!("< {} >", form.icon())),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Tab: next field  Enter: save  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" New Habit "));
    f.render_widget(popup, area);

    let text_len = match form.focus {
        FormField::Name => Some(form.name.chars().count()),
        FormField::Description => Some(form.description.chars().count()),
        _ => None,
    };
    if let Some(len) = text_len {
        let row = if form.focus == FormField::Name { 0 } else { 1 };
        f.set_cursor_position((area.x + 1 + 13 + len as u16, area.y + 1 + row));
    }
}

/// Terminal color for a palette name.
fn palette_color(name: &str) -> Color {
    match name {
        "blue" => Color::Blue,
        "green" => Color::Green,
        "purple" => Color::Magenta,
        "pink" => Color::LightMagenta,
        "orange" => Color::Rgb(255, 165, 0),
        "indigo" => Color::Rgb(99, 102, 241),
        "red" => Color::Red,
        "yellow" => Color::Yellow,
        _ => Color::White,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
