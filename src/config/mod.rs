//! Configuration resolution
//!
//! User-level and project-level YAML documents are merged into one
//! [`ConfigTree`], environment variables are applied on top, and the result is
//! extracted into a typed [`Configuration`].

pub mod env;
pub mod loader;
pub mod settings;
pub mod tree;

pub use env::{Environment, ProcessEnvironment};
pub use loader::{load_configuration, resolve_home, ConfigSource, FileConfigSource};
pub use settings::{
    Configuration, Credentials, PayloadOptions, ProjectConfig, ResolvedServer, ServerConfig,
};
pub use tree::{merge, ConfigTree, Scalar};
