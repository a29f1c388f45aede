//! Replay command implementation
//!
//! Feeds existing JUnit XML reports through the ROX listener as one suite.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use crate::listener::{ListenerOptions, RoxListener};
use crate::testing::{junit, DescriptorRegistry};
use crate::utils::terminal;

/// Publish the results of JUnit XML reports
#[derive(Args, Debug)]
pub struct ReplayCommand {
    /// Report files or directories searched for *.xml
    #[arg(required = true)]
    pub reports: Vec<PathBuf>,

    /// TOML file mapping test identifiers to ROX descriptors
    #[arg(short, long)]
    pub annotations: Option<PathBuf>,

    /// Home directory holding .rox/config.yml
    #[arg(long)]
    pub home: Option<PathBuf>,

    /// Project root holding rox.yml
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,
}

impl ReplayCommand {
    /// Execute the replay command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let registry = match &self.annotations {
            Some(path) => DescriptorRegistry::load(path)?,
            None => DescriptorRegistry::new(),
        };

        let files = junit::find_reports(&self.reports);
        if files.is_empty() {
            bail!("No JUnit XML reports found in the given paths");
        }
        let mut suites = Vec::new();
        for file in &files {
            suites.extend(junit::load_report(file)?);
        }
        let cases: usize = suites.iter().map(|s| s.cases.len()).sum();

        let options = ListenerOptions {
            verbose,
            home: self.home,
            project_dir: self.project_dir,
        };
        let mut listener = RoxListener::system(&options, Box::new(registry));

        let spinner = terminal::create_spinner(&format!(
            "Replaying {} test cases from {} reports...",
            cases,
            files.len()
        ));
        junit::replay(&suites, &mut listener);
        spinner.finish_and_clear();

        let disabled = listener.publishing_disabled();
        let failed = listener.delivery_failed();
        // Flushes the run log
        drop(listener);

        if disabled {
            terminal::print_error("Test results were not published");
            std::process::exit(1);
        }
        if failed {
            terminal::print_error("Test results could not be delivered");
            std::process::exit(1);
        }
        terminal::print_success(&format!("Replayed {} test cases", cases));
        Ok(())
    }
}
