//! # engraft CLI Module
//!
//! ## Available Commands
//!
//! - `load`   - Stream a GraphML document into the database
//! - `status` - Show database status

mod commands;

use clap::{Parser, Subcommand};
use engraft_core::{DEFAULT_BUFFER_SIZE, IngestError};
use std::path::PathBuf;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// engraft - GraphML loader
///
/// Streams GraphML documents of arbitrary size into a redb-backed property
/// graph, committing in bounded transaction windows.
#[derive(Parser, Debug)]
#[command(name = "engraft")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the graph database
    #[arg(short = 'D', long, global = true, default_value = "engraft.db")]
    pub database: PathBuf,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a GraphML document into the database
    Load {
        /// Path to the GraphML file
        file: PathBuf,

        /// Mutations per transaction window
        #[arg(short, long, default_value_t = DEFAULT_BUFFER_SIZE)]
        buffer_size: usize,
    },

    /// Show database status
    Status,
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Execute the parsed command. `status` is the default when no subcommand is
/// given.
pub fn execute(cli: Cli) -> Result<(), IngestError> {
    match cli.command {
        Some(Commands::Load { file, buffer_size }) => {
            commands::cmd_load(&cli.database, &file, buffer_size, cli.json_mode)
        }
        Some(Commands::Status) | None => commands::cmd_status(&cli.database, cli.json_mode),
    }
}
