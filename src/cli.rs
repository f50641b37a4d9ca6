use clap::{Parser, Subcommand};

use crate::models::{Priority, TaskFilter};

#[derive(Parser)]
#[command(author, version, about = "TaskPilot: tasks, focus timer and an AI study coach", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task
    Add {
        #[arg(value_name = "TITLE")]
        title: String,
        #[arg(short = 'd', long = "description", default_value = "")]
        description: String,
        /// Due date as YYYY-MM-DD (defaults to today)
        #[arg(long = "due")]
        due: Option<String>,
        /// low, moderate or high
        #[arg(short = 'p', long = "priority", default_value = "moderate")]
        priority: Priority,
    },
    /// List tasks, newest first
    List {
        /// all, pending, completed or high
        #[arg(short = 'f', long = "filter", default_value = "all")]
        filter: TaskFilter,
        /// Fuzzy search over title and description
        #[arg(short = 's', long = "search")]
        search: Option<String>,
    },
    /// Show one task (id or unique id prefix)
    Show {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Flip a task between pending and completed
    Toggle {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Edit fields of a task
    Edit {
        #[arg(value_name = "ID")]
        id: String,
        #[arg(long = "title")]
        title: Option<String>,
        #[arg(short = 'd', long = "description")]
        description: Option<String>,
        #[arg(long = "due")]
        due: Option<String>,
        #[arg(short = 'p', long = "priority")]
        priority: Option<Priority>,
    },
    /// Delete a task
    Remove {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Show task counts
    Stats,
    /// Ask the AI coach how to tackle a task
    Advice {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Chat with TaskPilot AI
    Ask {
        #[arg(value_name = "MESSAGE")]
        message: String,
    },
    /// Set configuration value
    Set {
        #[arg(value_name = "KEY")]
        key: String,
        #[arg(value_name = "VALUE")]
        value: String,
    },
    /// Get configuration value
    Get {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// List all configuration values
    ConfigList,
    /// Delete configuration value
    ConfigDelete {
        #[arg(value_name = "KEY")]
        key: String,
    },
    /// Launch TUI interface
    Tui,
    /// Generate shell completion scripts
    Completions {
        /// bash, zsh, fish, elvish or powershell
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_add_with_options() {
        let cli = Cli::try_parse_from([
            "taskpilot", "add", "Essay", "-d", "five pages", "--due", "2024-05-01", "-p", "high",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Add { title, description, due, priority }) => {
                assert_eq!(title, "Essay");
                assert_eq!(description, "five pages");
                assert_eq!(due.as_deref(), Some("2024-05-01"));
                assert_eq!(priority, Priority::High);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["taskpilot"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn rejects_unknown_priority() {
        assert!(Cli::try_parse_from(["taskpilot", "add", "Essay", "-p", "urgent"]).is_err());
    }

    #[test]
    fn list_filter_parses() {
        let cli = Cli::try_parse_from(["taskpilot", "list", "--filter", "completed"]).unwrap();
        match cli.command {
            Some(Commands::List { filter, search }) => {
                assert_eq!(filter, TaskFilter::Completed);
                assert!(search.is_none());
            }
            _ => panic!("expected list"),
        }
    }
}
