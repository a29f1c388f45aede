//! Path utilities for the ROX client

use std::path::{Path, PathBuf};

use crate::error::RoxError;

/// Name of the user-level configuration directory inside the home directory
pub const USER_CONFIG_DIR: &str = ".rox";

/// User-level configuration file name
pub const USER_CONFIG_FILE: &str = "config.yml";

/// Project-level configuration file name
pub const PROJECT_CONFIG_FILE: &str = "rox.yml";

/// Client namespace inside the workspace
const CLIENT_DIR: &str = "rust";

/// Get the user-level configuration file for a home directory
pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE)
}

/// Get the project-level configuration file for a project directory
pub fn project_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_CONFIG_FILE)
}

/// Get the per-server directory holding the cache and saved payload
pub fn server_dir(workspace: &Path, server: &str) -> PathBuf {
    workspace.join(CLIENT_DIR).join("servers").join(server)
}

/// Get the cache file for a server
pub fn cache_file(workspace: &Path, server: &str) -> PathBuf {
    server_dir(workspace, server).join("cache.json")
}

/// Get the saved payload file for a server
pub fn payload_file(workspace: &Path, server: &str) -> PathBuf {
    server_dir(workspace, server).join("payload.json")
}

/// Get the run identifier file of a workspace
pub fn uid_file(workspace: &Path) -> PathBuf {
    workspace.join("uid")
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<(), RoxError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| {
            RoxError::persistence_error("unable to create directory", path, Some(e))
        })?;
    }
    Ok(())
}
