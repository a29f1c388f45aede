//! ROX CLI - publish test results to ROX Center
//!
//! Replays JUnit XML reports through the ROX listener and inspects the
//! resolved client configuration.

use anyhow::Result;
use clap::Parser;

use rox_client::cli::Cli;
use rox_client::RoxError;

fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = cli.execute() {
        if let Some(rox) = e.downcast_ref::<RoxError>() {
            rox.display_with_hints();
            std::process::exit(1);
        }
        return Err(e);
    }
    Ok(())
}
