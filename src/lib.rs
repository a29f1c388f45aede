//! ROX client - test result reporting for ROX Center
//!
//! Collects test outcomes from a running suite and publishes them as one JSON
//! payload at the end of the run.
//!
//! ## Architecture
//!
//! ```text
//! host runner → RoxListener → ResultAccumulator → payload → PublishGateway
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod listener;
pub mod publish;
pub mod testing;
pub mod utils;

pub use error::RoxError;
pub use listener::{Collaborators, ListenerOptions, RoxListener, TestLifecycle};
