mod cli;
mod config;
mod database;
mod form;
mod llm;
mod logging;
mod models;
mod pomodoro;
mod router;
mod search;
mod stats;
mod store;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use config::AiConfig;
use database::Database;
use llm::{Advisor, GeminiModel};
use models::{Task, TaskDraft};
use stats::TaskStats;
use store::TaskStore;
use ui::run_tui;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Held until exit so buffered log lines get flushed
    let _logger = match logging::init_logging(&config::log_level(), &config::log_dir()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: logging disabled: {:#}", e);
            None
        }
    };

    let db = Database::open(&config::database_path())?;
    let mut store = TaskStore::load(db);

    match cli.command {
        Some(Commands::Add { title, description, due, priority }) => {
            let due_date = match due {
                Some(due) => form::parse_due_date(&due)?,
                None => chrono::Local::now().date_naive().format("%Y-%m-%d").to_string(),
            };
            let title = title.trim().to_string();
            if title.is_empty() {
                println!("Error: Title is required.");
                return Ok(());
            }
            let task = store.add(TaskDraft { title, description, due_date, priority })?;
            println!("Added task {} '{}'", task.short_id(), task.title);
        }
        Some(Commands::List { filter, search }) => {
            let tasks = search::filter_tasks(store.snapshot(), filter, search.as_deref().unwrap_or(""));
            if tasks.is_empty() {
                println!("No tasks found.");
            }
            for task in tasks {
                print_task_line(task);
            }
        }
        Some(Commands::Show { id }) => {
            if let Some(task) = resolve_task(&store, &id) {
                print_task_details(&task);
            }
        }
        Some(Commands::Toggle { id }) => {
            if let Some(task) = resolve_task(&store, &id) {
                if let Some(status) = store.toggle_status(&task.id)? {
                    println!("Task '{}' is now {}", task.title, status);
                }
            }
        }
        Some(Commands::Edit { id, title, description, due, priority }) => {
            let Some(mut task) = resolve_task(&store, &id) else {
                return Ok(());
            };
            if let Some(title) = title {
                let title = title.trim().to_string();
                if title.is_empty() {
                    println!("Error: Title is required.");
                    return Ok(());
                }
                task.title = title;
            }
            if let Some(description) = description {
                task.description = description;
            }
            if let Some(due) = due {
                task.due_date = form::parse_due_date(&due)?;
            }
            if let Some(priority) = priority {
                task.priority = priority;
            }
            store.update(task.clone())?;
            println!("Updated task {} '{}'", task.short_id(), task.title);
        }
        Some(Commands::Remove { id }) => {
            if let Some(task) = resolve_task(&store, &id) {
                store.remove(&task.id)?;
                println!("Removed task '{}'", task.title);
            }
        }
        Some(Commands::Stats) => {
            let stats = TaskStats::from_tasks(store.snapshot());
            println!("Total tasks:   {}", stats.total);
            println!("Completed:     {}", stats.completed);
            println!("Pending:       {}", stats.pending);
            println!("High priority: {}", stats.high_priority);
        }
        Some(Commands::Advice { id }) => {
            let Some(task) = resolve_task(&store, &id) else {
                return Ok(());
            };
            let advisor = build_advisor(store.storage())?;
            let rt = tokio::runtime::Runtime::new()?;
            match rt.block_on(advisor.get_task_advice(&task)) {
                Ok(advice) => println!("{}", advice),
                Err(e) => println!("Failed to connect to TaskPilot AI. ({})", e),
            }
        }
        Some(Commands::Ask { message }) => {
            let advisor = build_advisor(store.storage())?;
            let context = TaskStats::from_tasks(store.snapshot()).summary();
            let rt = tokio::runtime::Runtime::new()?;
            match rt.block_on(advisor.chat_with_ai(&message, &context)) {
                Ok(answer) => println!("{}", answer),
                Err(e) => println!("Sorry, I lost connection to the server. ({})", e),
            }
        }
        Some(Commands::Set { key, value }) => {
            if !config::KNOWN_CONFIG_KEYS.contains(&key.as_str()) {
                println!("Note: '{}' is not a recognized key ({})", key, config::KNOWN_CONFIG_KEYS.join(", "));
            }
            store.storage().set_config(&key, &value)?;
            println!("Set {} = {}", key, config::display_value(&key, &value));
        }
        Some(Commands::Get { key }) => match store.storage().get_config(&key)? {
            Some(value) => println!("{} = {}", key, config::display_value(&key, &value)),
            None => println!("Config key '{}' not found", key),
        },
        Some(Commands::ConfigList) => {
            let items = store.storage().get_all_configs()?;
            if items.is_empty() {
                println!("No configuration values set.");
            }
            for item in items {
                println!(
                    "{} = {} (created {}, updated {})",
                    item.key_name,
                    config::display_value(&item.key_name, &item.value),
                    item.created_at,
                    item.updated_at
                );
            }
        }
        Some(Commands::ConfigDelete { key }) => {
            if store.storage().delete_config(&key)? {
                println!("Deleted config key '{}'", key);
            } else {
                println!("Config key '{}' not found", key);
            }
        }
        Some(Commands::Completions { shell }) => {
            use clap_complete::{generate, Shell};
            let shell = shell.to_lowercase();
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "elvish" => Shell::Elvish,
                "powershell" => Shell::PowerShell,
                _ => {
                    println!("Unsupported shell: {}", shell);
                    return Ok(());
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "taskpilot", &mut std::io::stdout());
        }
        Some(Commands::Tui) | None => {
            let advisor = build_advisor(store.storage())?;
            let rt = tokio::runtime::Runtime::new()?;
            run_tui(store, advisor, rt.handle().clone())?;
        }
    }

    Ok(())
}

fn build_advisor(db: &Database) -> Result<Advisor> {
    let config = AiConfig::resolve(db)?;
    Ok(Advisor::new(GeminiModel::new(config)?))
}

/// Looks a task up by full id or unique prefix, reporting misses to the user.
fn resolve_task<S: store::Storage>(store: &TaskStore<S>, id: &str) -> Option<Task> {
    let matches = store.find_by_prefix(id.trim());
    match matches.as_slice() {
        [] => {
            println!("Task '{}' not found", id);
            None
        }
        [task] => Some((*task).clone()),
        _ => {
            println!("Id '{}' is ambiguous, matches:", id);
            for task in matches {
                print_task_line(task);
            }
            None
        }
    }
}

fn print_task_line(task: &Task) {
    let check = if task.is_completed() { "[x]" } else { "[ ]" };
    println!(
        "{} {} {} ({}, due {})",
        task.short_id(),
        check,
        task.title,
        task.priority,
        task.due_date
    );
}

fn print_task_details(task: &Task) {
    println!("{}", task.title);
    println!("  id:       {}", task.id);
    println!("  status:   {}", task.status);
    println!("  priority: {}", task.priority);
    println!("  due:      {}", task.due_date);
    println!("  created:  {}", task.created_date());
    if task.description.is_empty() {
        println!("  No description provided for this task.");
    } else {
        println!();
        println!("{}", task.description);
    }
}
