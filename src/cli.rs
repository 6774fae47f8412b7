use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
pub struct Cli {
    /// Path to the scheme configuration file.
    ///
    /// Created with a single `public` scheme backed by `data/public` when
    /// missing.
    #[arg(long, short = 'c', default_value = "config.json")]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(long, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the contents of an object.
    Cat { uri: String },

    /// Write stdin (or a local file) to an object.
    Put {
        uri: String,
        /// Read the content from this file instead of stdin.
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
        /// Append instead of replacing.
        #[arg(long, short = 'a', default_value_t = false)]
        append: bool,
    },

    /// List the entries of a directory.
    Ls { uri: String },

    /// Print the stat record of an object as JSON.
    Stat { uri: String },

    /// Delete a file.
    Rm { uri: String },

    /// Create a directory.
    Mkdir { uri: String },

    /// Delete a directory and its contents.
    Rmdir { uri: String },

    /// Rename an object within one scheme.
    Mv { from: String, to: String },

    /// Print the external download URL of an object.
    Url { uri: String },

    /// Print the scheme serving the extension of a path.
    Scheme { path: String },

    /// List available adapter types and their config items.
    Adapters,
}
