//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Render bug-tracker text as safe, linked HTML
#[derive(Parser, Debug)]
#[command(name = "bagz", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Site root used for bug links (overrides config and BAGZ_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub url: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Append JSON-formatted logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Annotate text: escape HTML and link URLs and bug references
    #[command(long_about = "Annotate text: escape HTML and link URLs and bug references.

Text comes from the positional arguments (joined with spaces), from --file,
or from stdin when neither is given. `--file -` also reads stdin.

EXAMPLES:
  bagz annotate 'fixed in bug 42'
  bagz annotate --file comment.txt --url https://bugs.example.com
  echo 'see https://example.com/x' | bagz annotate --json")]
    Annotate(AnnotateArgs),

    /// Show the merged configuration
    Config(ConfigArgs),

    /// Show version information
    Version,
}

/// Arguments for the annotate command.
#[derive(Args, Debug, Clone, Default)]
pub struct AnnotateArgs {
    /// Text to annotate
    pub text: Vec<String>,

    /// Read text from file ('-' for stdin)
    #[arg(short = 'f', long = "file", conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Include the segment breakdown in JSON output
    #[arg(long)]
    pub segments: bool,
}

/// Arguments for the config command.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// List merged config values with their source (default)
    #[arg(long, short = 'l')]
    pub list: bool,

    /// Get a specific config value by key
    #[arg(long, short = 'g', value_name = "KEY", conflicts_with_all = ["list", "path"])]
    pub get: Option<String>,

    /// Show config file paths
    #[arg(long, short = 'p', conflicts_with = "list")]
    pub path: bool,
}
