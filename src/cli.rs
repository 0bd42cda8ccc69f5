use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "toolroute", about = "Platform registry and tool event routing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replay a JSON-lines event script against an in-memory host
    Replay {
        /// Script file (reads stdin when omitted)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Configuration file used while no platform is registered
        #[arg(long)]
        config: Option<PathBuf>,

        /// Refuse command registration for this platform (repeatable)
        #[arg(long)]
        reject: Vec<String>,

        /// Report failed ops and continue
        #[arg(long)]
        keep_going: bool,
    },

    /// Load a configuration file and print the effective settings
    CheckConfig {
        /// Configuration file
        path: PathBuf,
    },
}
