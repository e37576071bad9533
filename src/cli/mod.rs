pub mod completions;
pub mod extract;
pub mod list;

use clap::{Parser, Subcommand};

use crate::output::Verbosity;

/// unatlas - Extract sprite frames and animations from texture atlases
#[derive(Parser, Debug)]
#[command(name = "unatlas")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Show per-atlas detail and debug logging
    #[arg(long, short, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(long, short, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.verbose {
            Verbosity::Verbose
        } else if self.quiet {
            Verbosity::Quiet
        } else {
            Verbosity::Normal
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract frames and animations from texture atlases
    Extract(extract::ExtractArgs),

    /// List the animations each atlas would produce
    List(list::ListArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
