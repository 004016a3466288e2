use clap::Args;
use productivity_core::views::DashboardSummary;
use productivity_core::{HabitSync, TodoSync, Transport};

use super::loaded;
use super::todo::format_todo;

#[derive(Args)]
pub struct DashboardCommand {}

impl DashboardCommand {
    pub fn run<T: Transport>(self, base_url: &str, transport: &T) {
        let todos: TodoSync = loaded(base_url, transport);
        let habits: HabitSync = loaded(base_url, transport);
        print!("{}", render(&DashboardSummary::compute(todos.items(), habits.items())));
    }
}

fn render(summary: &DashboardSummary<'_>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Todos   {} total, {} done, {} pending ({}% complete)\n",
        summary.total_todos,
        summary.completed_todos,
        summary.pending_todos,
        summary.completion_percent
    ));
    out.push_str(&format!(
        "Habits  {} total, {} with active streaks, {} streak days\n",
        summary.total_habits, summary.active_habits, summary.total_streak
    ));
    out.push_str("\nUp next\n");
    if summary.all_caught_up() {
        out.push_str("  All caught up!\n");
    }
    for todo in &summary.up_next {
        out.push_str(&format!("  {}\n", format_todo(todo)));
    }
    out
}
