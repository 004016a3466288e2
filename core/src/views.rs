//! Derived views over a collection.
//!
//! Everything here is a pure function of the slice it is given. Nothing is
//! cached, so a view can never drift from the collection it was computed from.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone};

use crate::types::{Frequency, Habit, Priority, Todo};

/// How many pending todos the dashboard lists.
pub const UP_NEXT_LIMIT: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TodoFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl TodoFilter {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Pending => !todo.completed,
            TodoFilter::Completed => todo.completed,
        }
    }
}

pub fn completed_count(todos: &[Todo]) -> usize {
    todos.iter().filter(|t| t.completed).count()
}

pub fn pending_count(todos: &[Todo]) -> usize {
    todos.iter().filter(|t| !t.completed).count()
}

pub fn filter_todos(todos: &[Todo], filter: TodoFilter) -> Vec<&Todo> {
    todos.iter().filter(|t| filter.matches(t)).collect()
}

pub fn with_priority(todos: &[Todo], priority: Priority) -> Vec<&Todo> {
    todos.iter().filter(|t| t.priority == priority).collect()
}

pub fn total_streak(habits: &[Habit]) -> u64 {
    habits.iter().map(|h| u64::from(h.streak)).sum()
}

/// Habits whose streak is still alive.
pub fn active_habits(habits: &[Habit]) -> usize {
    habits.iter().filter(|h| h.streak > 0).count()
}

/// Milestone band a streak falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StreakTier {
    Starting,
    Week,
    Fortnight,
    Month,
}

impl StreakTier {
    pub fn of(streak: u32) -> Self {
        match streak {
            30.. => StreakTier::Month,
            14.. => StreakTier::Fortnight,
            7.. => StreakTier::Week,
            _ => StreakTier::Starting,
        }
    }
}

/// Whether the habit's last check-in falls in the current period, judged in
/// the timezone of `now`.
///
/// Only a hint for disabling the check-in control. The server decides whether
/// a check-in is accepted.
pub fn is_checked_in<Tz: TimeZone>(habit: &Habit, now: &DateTime<Tz>) -> bool {
    let Some(last) = habit.last_check_in else {
        return false;
    };
    let last = last.with_timezone(&now.timezone()).date_naive();
    let today = now.date_naive();
    match habit.frequency {
        Frequency::Daily => last == today,
        Frequency::Weekly => same_iso_week(last, today),
    }
}

fn same_iso_week(a: NaiveDate, b: NaiveDate) -> bool {
    a.iso_week() == b.iso_week()
}

/// Aggregate figures for the dashboard, computed from both collections.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary<'a> {
    pub total_todos: usize,
    pub completed_todos: usize,
    pub pending_todos: usize,
    /// Whole percent of todos completed; 0 when there are none.
    pub completion_percent: u8,
    pub total_habits: usize,
    pub active_habits: usize,
    pub total_streak: u64,
    pub up_next: Vec<&'a Todo>,
}

impl<'a> DashboardSummary<'a> {
    pub fn compute(todos: &'a [Todo], habits: &[Habit]) -> Self {
        let completed = completed_count(todos);
        let completion_percent = if todos.is_empty() {
            0
        } else {
            // At most 100, fits in u8.
            (completed * 100 / todos.len()) as u8
        };
        Self {
            total_todos: todos.len(),
            completed_todos: completed,
            pending_todos: pending_count(todos),
            completion_percent,
            total_habits: habits.len(),
            active_habits: active_habits(habits),
            total_streak: total_streak(habits),
            up_next: todos
                .iter()
                .filter(|t| !t.completed)
                .take(UP_NEXT_LIMIT)
                .collect(),
        }
    }

    pub fn all_caught_up(&self) -> bool {
        self.pending_todos == 0
    }
}
