//! Per-project cache stored in the workspace
//!
//! The file holds one JSON object per project API identifier:
//!
//! ```json
//! {"154sic93pxs0": {"T1": "c5d7e4a0"}}
//! ```

use std::path::Path;

use serde_json::{Map, Value};

use crate::context::RunLog;
use crate::error::RoxError;
use crate::utils::paths;

/// Cached data of the current project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectCache {
    entries: Map<String, Value>,
}

impl ProjectCache {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Load the cache of `api_id` for `server`
    ///
    /// A missing file is an empty cache.
    pub fn load(
        workspace: &Path,
        server: &str,
        api_id: &str,
        log: &mut RunLog,
    ) -> Result<Self, RoxError> {
        let path = paths::cache_file(workspace, server);
        if !path.exists() {
            return Ok(Self::empty());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| RoxError::persistence_error("unable to read cache file", &path, Some(e)))?;
        let document: Value = serde_json::from_str(&content).map_err(|_| {
            RoxError::persistence_error("unable to decode JSON of cache file", &path, None)
        })?;
        let Value::Object(mut projects) = document else {
            return Err(RoxError::persistence_error(
                "unable to decode JSON of cache file",
                &path,
                None,
            ));
        };

        match projects.remove(api_id) {
            Some(Value::Object(entries)) => Ok(Self { entries }),
            _ => {
                log.warn("no existing cache data for this project.");
                Ok(Self::empty())
            }
        }
    }
}
