//! Error types and helpers for user-friendly error messages
//!
//! Every failure inside the reporting pipeline is one of four kinds. None of
//! them is allowed to escape the listener: configuration errors disable
//! publishing for the rest of the run, the others are logged where they occur.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the reporting pipeline
#[derive(Error, Debug)]
pub enum RoxError {
    /// Missing or invalid server, credentials, project identity or workspace
    #[error("{message}")]
    Configuration {
        message: String,
        hint: Option<String>,
    },

    /// Malformed test descriptor
    #[error("{message}")]
    Validation { message: String },

    /// Non-202 response or transport-level failure
    #[error("{message}")]
    Transport {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// Cache or payload file unreadable or unwritable
    #[error("{message} ({})", path.display())]
    Persistence {
        message: String,
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl RoxError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            hint: None,
        }
    }

    /// Create a configuration error with a hint
    pub fn config_error_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    /// Create a validation error
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a transport error that never reached a response
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    /// Create a transport error from an unexpected HTTP status
    pub fn http_status(message: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: Some(status),
            body: Some(body.into()),
        }
    }

    /// Create a persistence error
    pub fn persistence_error(
        message: impl Into<String>,
        path: impl Into<PathBuf>,
        source: Option<std::io::Error>,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            path: path.into(),
            source,
        }
    }

    /// Whether this error must disable publishing for the remainder of the run
    pub fn is_fatal_to_publishing(&self) -> bool {
        matches!(self, RoxError::Configuration { .. })
    }

    /// Hint attached to this error, if any
    pub fn hint(&self) -> Option<&str> {
        match self {
            RoxError::Configuration { hint, .. } => hint.as_deref(),
            _ => None,
        }
    }

    /// Display error with formatting and hints
    pub fn display_with_hints(&self) {
        use console::style;

        eprintln!("\n{} {}", style("ERROR:").red().bold(), self);

        if let Some(h) = self.hint() {
            eprintln!("\n{} {}", style("HINT:").yellow().bold(), h);
        }

        if let RoxError::Transport {
            body: Some(body), ..
        } = self
        {
            if !body.is_empty() {
                eprintln!("\n{}", style("RESPONSE:").cyan().bold());
                for line in body.lines() {
                    eprintln!("  {}", line);
                }
            }
        }

        eprintln!();
    }
}

/// Common error hints for configuration issues
pub mod hints {
    /// Get hint when neither configuration file could be used
    pub fn config_files() -> &'static str {
        "ROX reads two YAML configuration files:\n\
         • ~/.rox/config.yml for servers and credentials\n\
         • <projectRoot>/rox.yml for the project apiId and version\n\
         \n\
         At least one of them must exist and be valid YAML."
    }

    /// Get hint for a missing server selection
    pub fn server_selection() -> &'static str {
        "Select a server with the 'server' key in ~/.rox/config.yml\n\
         or with the ROX_SERVER environment variable."
    }

    /// Get hint for a missing project identity
    pub fn project_identity() -> &'static str {
        "Add the project section to rox.yml:\n\
         \n\
         project:\n\
         \x20 apiId: my-project\n\
         \x20 version: 1.0.0"
    }

    /// Get hint for a missing workspace
    pub fn workspace() -> &'static str {
        "Set 'workspace' in the configuration files or ROX_WORKSPACE to a\n\
         writable directory used for the payload and cache files."
    }
}
