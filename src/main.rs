//! Geocaching map CLI entry point.

use clap::Parser;
use geocaching::cli::commands;
use geocaching::cli::{Cli, Commands};
use geocaching::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    // Set up tracing based on verbosity
    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if !cli.quiet {
                if let Some(hint) = e.hint() {
                    eprintln!("Error: {e}\n  Hint: {hint}");
                } else {
                    eprintln!("Error: {e}");
                }
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug,rusqlite=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    let db = cli.db.as_ref();
    let actor = cli.actor.as_deref();
    let json = cli.json;

    match &cli.command {
        Commands::Init { force } => commands::init::execute(db, *force, json),
        Commands::Version => commands::version::execute(json),
        Commands::Status => commands::status::execute(db, json),

        // Map interaction
        Commands::Map => commands::map::execute_map(db, json),
        Commands::Click {
            latitude,
            longitude,
            right,
        } => commands::map::execute_click(*latitude, *longitude, *right, db, actor, json),
        Commands::Pin { index } => commands::map::execute_pin(*index, db, actor, json),

        // Records
        Commands::Person { command } => commands::person::execute(command, db, actor, json),
        Commands::Geocache { command } => commands::geocache::execute(command, db, actor, json),

        // Text files
        Commands::Load { file } => commands::file::execute_load(file, db, actor, json),
        Commands::Save { file } => commands::file::execute_save(file.as_ref(), db, json),

        Commands::History { limit } => commands::history::execute(*limit, db, json),

        // Shell completions
        Commands::Completions { shell } => commands::completions::execute(shell),
    }
}
