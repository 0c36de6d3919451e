//! Command-line front end for the task board.
//!
//! # Responsibility
//! - Parse one command, run it against the configured backend, print the result.
//! - Map board errors to exit codes (validation `2`, other failures `1`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tasklist_core::{
    init_from_config, AppConfig, BackendConfig, DetailView, ListRow, SyncError, TaskBoard, TaskId,
    TaskState, NOT_FOUND_MESSAGE,
};

const EXIT_FAILURE: u8 = 1;
const EXIT_VALIDATION: u8 = 2;

/// Shared to-do list over a REST or realtime backend
#[derive(Parser)]
#[command(name = "tasklist")]
#[command(version)]
struct Cli {
    /// JSON config file (defaults to the local json-server backend)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tasks with truncated text
    List {
        /// Order alphabetically by text, ignoring case
        #[arg(long)]
        sorted: bool,

        /// Keep only tasks whose text contains this substring
        #[arg(long)]
        search: Option<String>,
    },

    /// Show one task in full
    Show { id: String },

    /// Create a task
    Add { user: String, text: String },

    /// Change the owner name of a task
    Rename { id: String, user: String },

    /// Change the text of a task
    Edit { id: String, text: String },

    /// Flip a task between active and completed
    Toggle { id: String },

    /// Delete a task
    Delete { id: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_ref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    if let Err(err) = init_from_config(&config.logging) {
        eprintln!("logging disabled: {err}");
    }

    match run(&config, cli.command) {
        Ok(code) => code,
        Err(err) => report(&err),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, String> {
    let config = match path {
        Some(path) => AppConfig::load(path).map_err(|err| format!("config error: {err}"))?,
        None => AppConfig::default(),
    };
    require_persistent_backend(&config)?;
    Ok(config)
}

/// Each invocation is a new process, so an in-memory tree would start empty every time.
fn require_persistent_backend(config: &AppConfig) -> Result<(), String> {
    match &config.backend {
        BackendConfig::Realtime { db_path: None, .. } => Err(
            "config error: the realtime backend needs `db_path` when used from the command line"
                .to_string(),
        ),
        _ => Ok(()),
    }
}

fn run(config: &AppConfig, command: Command) -> Result<ExitCode, SyncError> {
    let mut board = TaskBoard::open(config)?;

    match command {
        Command::List { sorted, search } => {
            if sorted {
                board.toggle_sort()?;
            }
            if let Some(query) = search {
                board.set_query(query)?;
            }
            for row in board.rows() {
                println!("{}", format_row(&row));
            }
        }
        Command::Show { id } => match board.detail(&TaskId::new(id)) {
            DetailView::Found(detail) => {
                println!("id: {}", detail.id);
                println!("user: {}", detail.user_name);
                println!("text: {}", detail.text);
                println!("state: {}", state_label(detail.state));
            }
            DetailView::NotFound => {
                println!("{NOT_FOUND_MESSAGE}");
                return Ok(ExitCode::from(EXIT_FAILURE));
            }
        },
        Command::Add { user, text } => {
            let id = board.create(&user, &text)?;
            println!("{id}");
        }
        Command::Rename { id, user } => board.rename_owner(&TaskId::new(id), &user)?,
        Command::Edit { id, text } => board.edit_text(&TaskId::new(id), &text)?,
        Command::Toggle { id } => board.toggle_completed(&TaskId::new(id))?,
        Command::Delete { id } => board.delete(&TaskId::new(id))?,
    }
    Ok(ExitCode::SUCCESS)
}

fn report(err: &SyncError) -> ExitCode {
    match err {
        SyncError::Validation(validation) => {
            eprintln!("{validation}");
            ExitCode::from(EXIT_VALIDATION)
        }
        SyncError::NotFound(_) => {
            println!("{NOT_FOUND_MESSAGE}");
            ExitCode::from(EXIT_FAILURE)
        }
        SyncError::Store(store) => {
            eprintln!("store error: {store}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn format_row(row: &ListRow) -> String {
    let mark = match row.state {
        TaskState::Active => "[ ]",
        TaskState::Completed => "[x]",
    };
    format!("{mark} {}  {}", row.id, row.text)
}

fn state_label(state: TaskState) -> &'static str {
    match state {
        TaskState::Active => "active",
        TaskState::Completed => "completed",
    }
}
