//! Command line front end for the habit store.
//!
//! # Responsibility
//! - Drive `HabitStore` against a local SQLite document store.
//! - Keep the `ping` probe for checking `habits_core` linkage.

use chrono::{Local, TimeZone};
use clap::{Parser, Subcommand};
use habits_core::db::open_db;
use habits_core::{
    default_log_level, init_logging, CompletionHistory, DocumentHabitRepository, Habit, HabitId,
    HabitStore, SqliteDocumentStore,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "habits", version, about = "Track daily habits")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "HABITS_DB_PATH", default_value = "habits.sqlite3")]
    db: PathBuf,

    /// Absolute directory for rolling log files (logging is off when unset)
    #[arg(long, env = "HABITS_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage info
    Ping,
    /// List habits
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Create a habit
    Add {
        name: String,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Rename a habit and replace its description
    Edit {
        id: String,
        name: String,
        #[arg(long, short)]
        description: Option<String>,
        /// Also clear the completion history
        #[arg(long)]
        reset_history: bool,
    },
    /// Mark today complete, or undo today's completion
    Done { id: String },
    /// Delete a habit
    Rm { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, &log_dir.to_string_lossy())?;
    }

    if let Command::Ping = cli.command {
        println!("habits_core ping={}", habits_core::ping());
        println!("habits_core version={}", habits_core::core_version());
        return Ok(());
    }

    let conn = open_db(&cli.db)?;
    let mut store = HabitStore::new(DocumentHabitRepository::new(SqliteDocumentStore::new(
        &conn,
    )));

    match cli.command {
        Command::Ping => {}
        Command::List { json } => {
            let habits = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(habits)?);
            } else if habits.is_empty() {
                println!("No habits yet.");
            } else {
                for habit in store.snapshot() {
                    println!("{}", render_row(habit, store.is_completed_today(habit)));
                }
            }
        }
        Command::Add { name, description } => {
            let id = store.create(name, description)?;
            println!("{id}");
        }
        Command::Edit {
            id,
            name,
            description,
            reset_history,
        } => {
            let history = if reset_history {
                CompletionHistory::Reset
            } else {
                CompletionHistory::Keep
            };
            store.update(&HabitId::new(id)?, name, description, history)?;
        }
        Command::Done { id } => {
            let habit = store.toggle_completion(&HabitId::new(id)?)?;
            let state = if store.is_completed_today(&habit) {
                "completed"
            } else {
                "undone"
            };
            println!("{} {state}", habit.id);
        }
        Command::Rm { id } => store.delete(&HabitId::new(id)?)?,
    }
    Ok(())
}

fn render_row(habit: &Habit, completed_today: bool) -> String {
    let mark = if completed_today { "x" } else { " " };
    let last = habit
        .last_completed_at()
        .and_then(|at| Local.timestamp_millis_opt(at).single())
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "never".to_string());
    let mut row = format!("[{mark}] {}  {}  last={last}", habit.id, habit.name);
    if let Some(description) = habit.description.as_deref().filter(|d| !d.is_empty()) {
        row.push_str("  -- ");
        row.push_str(description);
    }
    row
}

#[cfg(test)]
mod tests {
    use super::{render_row, Cli};
    use clap::CommandFactory;
    use habits_core::{Habit, HabitId};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn render_row_marks_completion_and_skips_blank_description() {
        let habit = Habit {
            id: HabitId::new("h1").unwrap(),
            name: "Read".to_string(),
            description: Some(String::new()),
            completion_dates: Vec::new(),
            revision: 1,
        };
        assert_eq!(render_row(&habit, false), "[ ] h1  Read  last=never");
        assert!(render_row(&habit, true).starts_with("[x] h1"));
    }
}
