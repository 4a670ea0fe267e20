//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Geocaching map - place people and geocaches, track who found what
#[derive(Parser, Debug)]
#[command(name = "geo", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.geocaching/data/geocaching.db)
    #[arg(long, global = true, env = "GEOCACHE_DB")]
    pub db: Option<PathBuf>,

    /// Actor name for audit trail
    #[arg(long, global = true, env = "GEOCACHE_ACTOR")]
    pub actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the map database
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Print version information
    Version,

    /// Show selection, latest click and record counts
    Status,

    /// List the markers currently on the map
    Map,

    /// Press the map at a coordinate (hits a pin if one is close enough)
    Click {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Use the right mouse button (keeps the selection)
        #[arg(long)]
        right: bool,
    },

    /// Press the marker at an index of `geo map`
    Pin {
        /// Marker index
        index: usize,
    },

    /// Person management
    Person {
        #[command(subcommand)]
        command: PersonCommands,
    },

    /// Geocache management
    Geocache {
        #[command(subcommand)]
        command: GeocacheCommands,
    },

    /// Replace the map with the contents of a text file
    Load {
        /// File to read
        file: PathBuf,
    },

    /// Write the map to a text file
    Save {
        /// File to write (default: Geocaches.txt)
        file: Option<PathBuf>,
    },

    /// Show recent changes
    History {
        /// Maximum events to show
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Person Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum PersonCommands {
    /// Add a person at the latest map click
    Add(PersonAddArgs),

    /// List persons
    List,

    /// Make a person active
    Select {
        /// Person ID
        id: i64,
    },

    /// Remove a person and their found geocaches
    Remove {
        /// Person ID
        id: i64,
    },
}

#[derive(Args, Debug)]
pub struct PersonAddArgs {
    /// First name
    #[arg(long)]
    pub first_name: String,

    /// Last name
    #[arg(long)]
    pub last_name: String,

    /// Country
    #[arg(long)]
    pub country: String,

    /// City
    #[arg(long)]
    pub city: String,

    /// Street name
    #[arg(long)]
    pub street: String,

    /// Street number (0-255)
    #[arg(long)]
    pub number: String,
}

// ============================================================================
// Geocache Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum GeocacheCommands {
    /// Add a geocache for the active person at the latest map click
    Add {
        /// Message for finders
        #[arg(short, long)]
        message: String,

        /// What is inside
        #[arg(short, long, default_value = "")]
        contents: String,
    },

    /// List geocaches
    List,

    /// Remove a geocache
    Remove {
        /// Geocache ID
        id: i64,
    },
}
