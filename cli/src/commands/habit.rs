use chrono::{DateTime, Local};
use clap::{Args, Subcommand, ValueEnum};
use productivity_core::views::{self, StreakTier};
use productivity_core::{Frequency, Habit, HabitSync, NewHabit, Transport};

use super::{loaded, report};

#[derive(Clone, Copy, ValueEnum)]
pub enum FrequencyArg {
    Daily,
    Weekly,
}

impl From<FrequencyArg> for Frequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
        }
    }
}

#[derive(Args)]
pub struct HabitCommand {
    #[command(subcommand)]
    pub command: HabitSubcommand,
}

#[derive(Subcommand)]
pub enum HabitSubcommand {
    /// List habits with their streaks
    List,

    /// Add a habit
    Add {
        /// Name of the habit
        name: String,

        #[arg(long, short, default_value = "")]
        description: String,

        #[arg(long, short, value_enum, default_value = "daily")]
        frequency: FrequencyArg,
    },

    /// Check in for today
    Checkin {
        /// Habit ID
        id: String,
    },

    /// Delete a habit
    Rm {
        /// Habit ID
        id: String,
    },
}

impl HabitCommand {
    pub fn run<T: Transport>(self, base_url: &str, transport: &T) {
        let mut habits: HabitSync = loaded(base_url, transport);
        let now = Local::now();

        match self.command {
            HabitSubcommand::List => {
                if habits.items().is_empty() {
                    println!("No habits yet.");
                }
                for habit in habits.items() {
                    println!("{}", format_habit(habit, &now));
                }
            }
            HabitSubcommand::Add {
                name,
                description,
                frequency,
            } => {
                let draft = NewHabit {
                    name,
                    description,
                    frequency: frequency.into(),
                };
                let outcome = habits.create(&draft, transport);
                if let Some(habit) = habits.items().last().filter(|_| outcome.is_committed()) {
                    println!("{}", format_habit(habit, &now));
                }
            }
            HabitSubcommand::Checkin { id } => {
                let outcome = habits.check_in(&id, transport);
                report(&outcome, "Checked in.");
                if let Some(habit) = habits.get(&id).filter(|_| outcome.is_committed()) {
                    println!("{}", format_habit(habit, &now));
                }
            }
            HabitSubcommand::Rm { id } => {
                let outcome = habits.remove(&id, transport);
                report(&outcome, "Deleted.");
            }
        }
    }
}

pub fn format_habit(habit: &Habit, now: &DateTime<Local>) -> String {
    let badge = match StreakTier::of(habit.streak) {
        StreakTier::Month => " ***",
        StreakTier::Fortnight => " **",
        StreakTier::Week => " *",
        StreakTier::Starting => "",
    };
    let done = if views::is_checked_in(habit, now) {
        "  done"
    } else {
        ""
    };
    format!(
        "{}  streak {}{badge}, {} check-ins{done}  {}",
        habit.name,
        habit.streak,
        habit.completions.len(),
        habit.id
    )
}
