//! Run payload assembly
//!
//! ```json
//! {"u": "run-uid", "d": 1234, "r": [{"j": "apiId", "v": "1.0.0", "t": [...]}]}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::encoding::WireEncoding;
use super::results::TestResult;
use crate::config::ProjectConfig;
use crate::error::RoxError;

/// Payload of one test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPayload {
    /// Run identifier
    #[serde(rename = "u")]
    pub run_uid: String,
    /// Suite wall-clock duration
    #[serde(rename = "d")]
    pub duration_ms: u64,
    #[serde(rename = "r")]
    pub projects: Vec<ProjectPayload>,
}

/// Results of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPayload {
    #[serde(rename = "j")]
    pub api_id: String,
    #[serde(rename = "v")]
    pub version: String,
    #[serde(rename = "t")]
    pub tests: Vec<TestResult>,
}

/// Run-level metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunMeta {
    pub run_uid: String,
    pub duration_ms: u64,
}

impl RunPayload {
    /// Number of test entries over all projects
    pub fn test_count(&self) -> usize {
        self.projects.iter().map(|p| p.tests.len()).sum()
    }
}

/// Assemble the payload of a run
pub fn build(
    results: Vec<TestResult>,
    project: &ProjectConfig,
    meta: &RunMeta,
) -> Result<RunPayload, RoxError> {
    let (api_id, version) = project.identity()?;

    Ok(RunPayload {
        run_uid: meta.run_uid.clone(),
        duration_ms: meta.duration_ms,
        projects: vec![ProjectPayload {
            api_id: api_id.to_string(),
            version: version.to_string(),
            tests: results,
        }],
    })
}

/// Payload re-encoded into the wire encoding
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPayload {
    value: Value,
}

impl EncodedPayload {
    /// Serialize and re-encode every string of the payload
    pub fn new(payload: &RunPayload, encoding: WireEncoding) -> Self {
        // Only string-keyed structs and sequences: serialization cannot fail
        let value = serde_json::to_value(payload).unwrap_or(Value::Null);
        Self {
            value: encoding.encode_value(value),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Compact wire form
    pub fn to_json(&self) -> String {
        self.value.to_string()
    }

    /// Indented form for the run log
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.value).unwrap_or_else(|_| self.to_json())
    }
}
