//! Check command implementation
//!
//! Validates every descriptor of an annotations file.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::testing::{annotation, DescriptorRegistry};
use crate::utils::terminal;

/// Validate an annotations file
#[derive(Args, Debug)]
pub struct CheckCommand {
    /// TOML file mapping test identifiers to ROX descriptors
    pub annotations: PathBuf,
}

impl CheckCommand {
    /// Execute the check command
    pub fn execute(self, verbose: bool) -> Result<()> {
        let registry = DescriptorRegistry::load(&self.annotations)?;
        let mut errors = 0;

        for (test_id, options) in registry.roxable() {
            match annotation::parse(options) {
                Ok(descriptor) => {
                    if verbose {
                        terminal::print_success(&format!("{} → {}", test_id, descriptor.key));
                    }
                }
                Err(e) => {
                    errors += 1;
                    terminal::print_error(&format!("{}: {}", test_id, e));
                }
            }
        }

        let total = registry.roxable().len();
        if errors > 0 {
            terminal::print_error(&format!("{} of {} descriptors are invalid", errors, total));
            std::process::exit(1);
        }

        terminal::print_success(&format!("{} descriptors are valid", total));
        Ok(())
    }
}
