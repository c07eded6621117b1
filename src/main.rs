//! bibly - spaced repetition for bibliographic citations
//!
//! CLI entry point with global panic handler.

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bibly::config::{crash_log_path, Config};
use bibly::core::{NewReference, RngRandom, SystemClock};
use bibly::error::exit_codes;
use bibly::storage::FileReviewStore;

// =============================================================================
// CLI Definition
// =============================================================================

/// bibly - memorize citations one field at a time
#[derive(Parser)]
#[command(name = "bibly")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a reference; every field becomes due immediately
    Add {
        /// Title of the work
        #[arg(long)]
        title: String,
        /// Authors, separated by " and "
        #[arg(long)]
        authors: String,
        /// Publication year
        #[arg(long)]
        year: String,
        /// Publisher
        #[arg(long)]
        publisher: String,
        /// Area or topic
        #[arg(long)]
        area: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// List references and their field schedules
    List {
        /// Show only references with due fields
        #[arg(long)]
        due: bool,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Remove a reference and its progress
    Remove {
        /// Reference ID
        id: String,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Start an interactive review session
    Review {
        /// Review every reference once in shuffled order
        #[arg(long, short)]
        all: bool,
        /// Print the session summary as JSON
        #[arg(long, short)]
        json: bool,
    },

    /// Display review statistics
    Stats {
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },

    /// Show recent review history
    History {
        /// Maximum number of entries
        #[arg(long, short)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long, short)]
        json: bool,
        /// Suppress output
        #[arg(long, short)]
        quiet: bool,
    },
}

// =============================================================================
// Main Entry Point
// =============================================================================

fn main() -> ExitCode {
    setup_panic_handler();
    init_logging();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("bibly error: {}", e);
            ExitCode::from(exit_codes::ERROR as u8)
        }
    }
}

/// Set up the global panic handler.
///
/// On panic, logs to ~/.bibly/crash.log and exits with code 3.
fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("bibly panic: {}", info);

        if let Some(crash_log) = crash_log_path() {
            if let Ok(mut file) = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&crash_log)
            {
                let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
                let _ = writeln!(file, "[{}] {}", timestamp, info);
            }
        }

        std::process::exit(exit_codes::CRASH);
    }));
}

/// Install the stderr log subscriber, filtered by `BIBLY_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("BIBLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI and return the exit code.
fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load();

    match cli.command {
        Commands::Add {
            title,
            authors,
            year,
            publisher,
            area,
            json,
            quiet,
        } => {
            let form = NewReference {
                title,
                authors,
                year,
                publisher,
                area,
            };
            run_add(form, json, quiet)
        }
        Commands::List { due, json, quiet } => run_list(due, json, quiet, config),
        Commands::Remove { id, json, quiet } => run_remove(&id, json, quiet),
        Commands::Review { all, json } => run_review(all, json, config),
        Commands::Stats { json, quiet } => run_stats(json, quiet, config),
        Commands::History { limit, json, quiet } => run_history(limit, json, quiet, config),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

/// Convert a success boolean to an exit code.
fn success_to_exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::from(exit_codes::SUCCESS as u8)
    } else {
        ExitCode::from(exit_codes::ERROR as u8)
    }
}

fn print_formatted(formatted: &str) {
    if !formatted.is_empty() {
        println!("{}", formatted.trim_end());
    }
}

fn run_add(
    form: NewReference,
    json: bool,
    quiet: bool,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use bibly::cli::add::{AddCommand, AddOptions};

    let store = FileReviewStore::new()?;
    let cmd = AddCommand::new(store, SystemClock);
    let options = AddOptions { json, quiet };

    let output = cmd.run(form);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_list(
    due: bool,
    json: bool,
    quiet: bool,
    config: Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use bibly::cli::list::{ListCommand, ListOptions};

    let store = FileReviewStore::new()?;
    let cmd = ListCommand::new(store, SystemClock, config);
    let options = ListOptions { json, quiet, due };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_remove(id: &str, json: bool, quiet: bool) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use bibly::cli::remove::{RemoveCommand, RemoveOptions};

    let store = FileReviewStore::new()?;
    let cmd = RemoveCommand::new(store);
    let options = RemoveOptions { json, quiet };

    let output = cmd.run(id);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_review(
    all: bool,
    json: bool,
    config: Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use bibly::cli::review::{ReviewCommand, ReviewOptions};

    let store = FileReviewStore::new()?;
    let mut cmd = ReviewCommand::new(store, SystemClock, RngRandom::thread(), config);
    let options = ReviewOptions { json, all };

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout();

    let output = cmd.run(&mut input, &mut out, &options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_stats(
    json: bool,
    quiet: bool,
    config: Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use bibly::cli::stats::{StatsCommand, StatsOptions};

    let store = FileReviewStore::new()?;
    let cmd = StatsCommand::new(store, SystemClock, config);
    let options = StatsOptions { json, quiet };

    let output = cmd.run();
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}

fn run_history(
    limit: Option<usize>,
    json: bool,
    quiet: bool,
    config: Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    use bibly::cli::history::{HistoryCommand, HistoryOptions};

    let store = FileReviewStore::new()?;
    let cmd = HistoryCommand::new(store, config);
    let options = HistoryOptions { json, quiet, limit };

    let output = cmd.run(&options);
    print_formatted(&cmd.format_output(&output, &options));

    Ok(success_to_exit_code(output.success))
}
