//! Config command implementation
//!
//! Prints the merged configuration as YAML with API key secrets masked.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::{load_configuration, resolve_home, FileConfigSource, ProcessEnvironment};
use crate::context::RunLog;

/// Show the resolved configuration
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Home directory holding .rox/config.yml
    #[arg(long)]
    pub home: Option<PathBuf>,

    /// Project root holding rox.yml
    #[arg(long, default_value = ".")]
    pub project_dir: PathBuf,
}

impl ConfigCommand {
    /// Execute the config command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let env = ProcessEnvironment;
        let home = resolve_home(self.home.as_deref(), &env)?;
        let source = FileConfigSource::new(home, &self.project_dir);
        let mut log = RunLog::new(verbose);

        let loaded = load_configuration(&source, &env, &mut log);
        log.flush();
        let config = loaded?;

        if verbose {
            eprintln!("User config:    {}", source.user_path().display());
            eprintln!("Project config: {}", source.project_path().display());
        }

        let yaml = serde_yaml::to_string(&config.masked())
            .context("Failed to serialize configuration")?;
        print!("{}", yaml);
        Ok(())
    }
}
