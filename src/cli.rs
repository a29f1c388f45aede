//! CLI argument parsing using clap derive macros

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{check::CheckCommand, config::ConfigCommand, replay::ReplayCommand};

/// ROX - test result reporting client
///
/// Publishes test results to a ROX Center server.
#[derive(Parser, Debug)]
#[command(name = "rox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish the results of JUnit XML reports
    Replay(ReplayCommand),

    /// Show the resolved configuration with secrets masked
    Config(ConfigCommand),

    /// Validate the descriptors of an annotations file
    Check(CheckCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        // Set up terminal colors
        if self.no_color {
            console::set_colors_enabled(false);
            console::set_colors_enabled_stderr(false);
        }

        // Execute the subcommand
        match self.command {
            Commands::Replay(cmd) => cmd.execute(self.verbose),
            Commands::Config(cmd) => cmd.execute(self.verbose),
            Commands::Check(cmd) => cmd.execute(self.verbose),
        }
    }
}
