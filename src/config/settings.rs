//! Typed configuration extracted from the merged tree
//!
//! ```yaml
//! # ~/.rox/config.yml
//! server: dev
//! servers:
//!   dev:
//!     apiUrl: https://rox.example.com/api
//!     apiKeyId: 39fuc7x85lsoy9c0ek2d
//!     apiKeySecret: mwpqvvmagzoegxnqptxdaxkxonjmvrlctwcrfmowibqcpnsdqd
//! workspace: /var/rox
//!
//! # <projectRoot>/rox.yml
//! project:
//!   apiId: 154sic93pxs0
//!   version: 1.2.0
//!   category: Unit
//!   tags: [rust, backend]
//! payload:
//!   save: true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::env::parse_flag;
use super::tree::ConfigTree;
use crate::error::{hints, RoxError};
use crate::testing::encoding::WireEncoding;

const MASK: &str = "********";

/// Resolved client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    /// Selected server name
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Known servers by name
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,

    /// End-of-run toggles
    #[serde(default)]
    pub payload: PayloadOptions,

    /// Directory for the uid, cache and payload files
    #[serde(default, deserialize_with = "opt_path", skip_serializing_if = "Option::is_none")]
    pub workspace: Option<PathBuf>,

    /// Project identity and default test metadata
    #[serde(default)]
    pub project: ProjectConfig,
}

/// Connection settings for one server
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub api_key_id: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub api_key_secret: Option<String>,
}

/// End-of-run actions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadOptions {
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub publish: bool,
    #[serde(default, deserialize_with = "flag")]
    pub save: bool,
    #[serde(default, deserialize_with = "flag")]
    pub print: bool,
    #[serde(default, deserialize_with = "flag")]
    pub cache: bool,
    /// Wire text encoding
    #[serde(default)]
    pub encoding: WireEncoding,
}

impl Default for PayloadOptions {
    fn default() -> Self {
        Self {
            publish: true,
            save: false,
            print: false,
            cache: false,
            encoding: WireEncoding::default(),
        }
    }
}

/// Project identity and metadata applied to every test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub api_id: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, deserialize_with = "opt_text", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "text_list", skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "text_list", skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<String>,
}

impl ProjectConfig {
    /// Project API identifier and version, both mandatory before publishing
    pub fn identity(&self) -> Result<(&str, &str), RoxError> {
        let api_id = self.api_id.as_deref().ok_or_else(|| {
            RoxError::config_error_with_hint(
                "missing apiId for project in config files.",
                hints::project_identity(),
            )
        })?;
        let version = self.version.as_deref().ok_or_else(|| {
            RoxError::config_error_with_hint(
                "missing version for project in config files.",
                hints::project_identity(),
            )
        })?;
        Ok((api_id, version))
    }
}

/// API key credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key_id: String,
    pub secret: String,
}

impl Credentials {
    /// Value of the `Authorization` header
    pub fn authorization(&self) -> String {
        format!("RoxApiKey id=\"{}\" secret=\"{}\"", self.key_id, self.secret)
    }
}

/// Selected server with validated connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedServer {
    pub name: String,
    pub api_url: String,
    pub credentials: Credentials,
}

impl Configuration {
    /// Extract the typed configuration from a merged tree
    pub fn from_tree(tree: &ConfigTree) -> Result<Self, RoxError> {
        serde_json::from_value(tree.to_json()).map_err(|e| {
            RoxError::config_error_with_hint(
                format!("invalid configuration: {}", e),
                hints::config_files(),
            )
        })
    }

    /// Validate and return the selected server
    pub fn resolve_server(&self) -> Result<ResolvedServer, RoxError> {
        let name = self.server.as_deref().ok_or_else(|| {
            RoxError::config_error_with_hint(
                "no ROX server defined either by environment variable, either by config files.",
                hints::server_selection(),
            )
        })?;
        let server = self.servers.get(name);

        let api_url = server
            .and_then(|s| s.api_url.as_deref())
            .ok_or_else(|| RoxError::config_error(format!("no apiUrl found for {}.", name)))?;
        match reqwest::Url::parse(api_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(RoxError::config_error(format!(
                    "invalid url for {} ({})",
                    name, api_url
                )))
            }
        }

        let key_id = server
            .and_then(|s| s.api_key_id.as_deref())
            .ok_or_else(|| RoxError::config_error(format!("missing apiKeyId for {}.", name)))?;
        let secret = server
            .and_then(|s| s.api_key_secret.as_deref())
            .ok_or_else(|| {
                RoxError::config_error(format!("missing apiKeySecret for {}.", name))
            })?;

        Ok(ResolvedServer {
            name: name.to_string(),
            api_url: api_url.to_string(),
            credentials: Credentials {
                key_id: key_id.to_string(),
                secret: secret.to_string(),
            },
        })
    }

    /// Workspace directory, required for saving and caching
    pub fn require_workspace(&self, purpose: &str) -> Result<&Path, RoxError> {
        self.workspace.as_deref().ok_or_else(|| {
            RoxError::config_error_with_hint(
                format!("no 'workspace' parameter in config files. {}", purpose),
                hints::workspace(),
            )
        })
    }

    /// Copy with every API key secret hidden
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        for server in masked.servers.values_mut() {
            if server.api_key_secret.is_some() {
                server.api_key_secret = Some(MASK.to_string());
            }
        }
        masked
    }
}

fn default_true() -> bool {
    true
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_text(&value))
}

fn opt_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_text(deserializer)?.map(PathBuf::from))
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => parse_flag(&s),
        _ => false,
    })
}

/// A YAML list of scalars or a comma-separated string
fn text_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        other => scalar_text(&other).into_iter().collect(),
    };
    Ok(items)
}
