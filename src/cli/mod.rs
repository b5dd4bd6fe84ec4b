//! CLI module for routebook
//!
//! Provides command-line interface parsing and handling for the
//! routebook-server binary. Uses clap for argument parsing and owo-colors for
//! colored terminal output.

pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// routebook - declarative HTTP routes with generated documentation
#[derive(Parser, Debug)]
#[command(
    name = "routebook-server",
    version,
    about = "Serve declaratively registered HTTP routes with generated Markdown docs",
    long_about = "Mounts every route group under /<group>/, serves a generated Markdown\n\
                  page at /<group>/docs and request metrics at /metrics.\n\n\
                  Run without arguments to start the server, or use 'init' to write a config file.",
    after_help = "EXAMPLES:\n    \
                  routebook-server init                 # Write routebook.toml\n    \
                  routebook-server                      # Start the server\n    \
                  routebook-server serve --port 8080    # Start on another port\n    \
                  routebook-server routes               # Print the route table"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "routebook.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (the default)
    Serve {
        /// Override the configured host address
        #[arg(long)]
        host: Option<String>,

        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the assembled route table and exit
    Routes,

    /// Write a default routebook.toml
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing routebook.toml
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
