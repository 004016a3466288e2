use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};
use productivity_core::views::{self, TodoFilter};
use productivity_core::{NewTodo, Priority, Todo, TodoSync, Transport};

use super::{loaded, report};

#[derive(Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
        }
    }
}

#[derive(Clone, Copy, Default, ValueEnum)]
pub enum FilterArg {
    #[default]
    All,
    Pending,
    Completed,
}

impl From<FilterArg> for TodoFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => TodoFilter::All,
            FilterArg::Pending => TodoFilter::Pending,
            FilterArg::Completed => TodoFilter::Completed,
        }
    }
}

#[derive(Args)]
pub struct TodoCommand {
    #[command(subcommand)]
    pub command: TodoSubcommand,
}

#[derive(Subcommand)]
pub enum TodoSubcommand {
    /// List todos
    List {
        /// Which todos to show
        #[arg(long, short, value_enum, default_value = "all")]
        filter: FilterArg,

        /// Only show todos with this priority
        #[arg(long, short, value_enum)]
        priority: Option<PriorityArg>,
    },

    /// Add a todo
    Add {
        /// Title of the todo
        title: String,

        #[arg(long, short, default_value = "")]
        description: String,

        #[arg(long, short, value_enum, default_value = "medium")]
        priority: PriorityArg,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },

    /// Mark a todo done, or open again
    Toggle {
        /// Todo ID
        id: String,
    },

    /// Delete a todo
    Rm {
        /// Todo ID
        id: String,
    },
}

impl TodoCommand {
    pub fn run<T: Transport>(self, base_url: &str, transport: &T) {
        let mut todos: TodoSync = loaded(base_url, transport);

        match self.command {
            TodoSubcommand::List { filter, priority } => {
                let shown: Vec<&Todo> = views::filter_todos(todos.items(), filter.into())
                    .into_iter()
                    .filter(|t| priority.map_or(true, |p| t.priority == Priority::from(p)))
                    .collect();
                if shown.is_empty() {
                    println!("No todos.");
                }
                for todo in shown {
                    println!("{}", format_todo(todo));
                }
                println!(
                    "{} of {} completed",
                    views::completed_count(todos.items()),
                    todos.items().len()
                );
            }
            TodoSubcommand::Add {
                title,
                description,
                priority,
                due,
            } => {
                let draft = NewTodo {
                    title,
                    description,
                    priority: priority.into(),
                    due_date: due,
                };
                let outcome = todos.create(&draft, transport);
                if let Some(todo) = todos.items().last().filter(|_| outcome.is_committed()) {
                    println!("{}", format_todo(todo));
                }
            }
            TodoSubcommand::Toggle { id } => {
                let outcome = todos.toggle_completed(&id, transport);
                report(&outcome, "Toggled.");
                if let Some(todo) = todos.get(&id).filter(|_| outcome.is_committed()) {
                    println!("{}", format_todo(todo));
                }
            }
            TodoSubcommand::Rm { id } => {
                let outcome = todos.remove(&id, transport);
                report(&outcome, "Deleted.");
            }
        }
    }
}

pub fn format_todo(todo: &Todo) -> String {
    let mark = if todo.completed { "x" } else { " " };
    let priority = match todo.priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    };
    let mut line = format!("[{mark}] {}  ({priority}", todo.title);
    if let Some(due) = todo.due_date {
        line.push_str(&format!(", due {}", due.format("%b %d")));
    }
    line.push_str(&format!(")  {}", todo.id));
    line
}
