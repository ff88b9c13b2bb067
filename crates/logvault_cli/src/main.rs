//! Logvault CLI
//!
//! Command-line front end for the Logvault capture engine.
//!
//! # Commands
//!
//! - `capture` - Capture a process's log stream into rotating files
//! - `export` - Merge the rotation set into one chronological file
//! - `inspect` - Display rotation-directory statistics
//! - `version` - Show version information

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Logvault command-line capture tools.
#[derive(Parser)]
#[command(name = "logvault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Storage root holding the rotation and export directories
    #[arg(global = true, short, long)]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture this process's log stream into rotating files
    Capture {
        /// Shell command to read lines from instead of `logcat`
        #[arg(short, long)]
        command: Option<String>,

        /// Stop capturing after this many seconds (default: until the
        /// stream ends)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Maximum rotation-file size in bytes
        #[arg(long)]
        max_file_size: Option<u64>,

        /// Rotation-directory budget in bytes
        #[arg(long)]
        max_dir_size: Option<u64>,
    },

    /// Merge all rotation files into one chronological export
    Export {
        /// Shell command the resumed capture reads instead of `logcat`
        #[arg(short, long)]
        command: Option<String>,
    },

    /// Display rotation-directory statistics
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Capture {
            command,
            duration,
            max_file_size,
            max_dir_size,
        } => {
            let root = cli.root.ok_or("Storage root required for capture")?;
            commands::capture::run(
                &root,
                command.as_deref(),
                duration,
                max_file_size,
                max_dir_size,
            )?;
        }
        Commands::Export { command } => {
            let root = cli.root.ok_or("Storage root required for export")?;
            commands::export::run(&root, command.as_deref())?;
        }
        Commands::Inspect { format } => {
            let root = cli.root.ok_or("Storage root required for inspect")?;
            commands::inspect::run(&root, &format)?;
        }
        Commands::Version => {
            println!("Logvault CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("Logvault Core v{}", logvault_core::VERSION);
        }
    }

    Ok(())
}
