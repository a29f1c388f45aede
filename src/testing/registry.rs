//! Test annotation lookup
//!
//! Binding code registers descriptors per test identifier; the accumulator
//! only ever asks [`TestAnnotations::annotations`] for a test's descriptors.
//!
//! # Annotations file
//!
//! ```toml
//! [tests."login::accepts_valid_password"]
//! key = "T1"
//! tags = "auth,smoke"
//!
//! [tests."login::rejects_expired_token"]
//! key = "T2"
//! tickets = "INVALID"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Deserialize;

use super::annotation::RawOptions;
use crate::error::RoxError;

/// Descriptor attached to a test
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// Makes the test reportable
    Roxable(RawOptions),
    /// Any other descriptor kind, ignored by the reporter
    Other(String),
}

/// Introspection capability: descriptors attached to a test
pub trait TestAnnotations {
    fn annotations(&self, test_id: &str) -> Vec<Annotation>;
}

/// Explicit test identifier → descriptor table
#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    entries: HashMap<String, Vec<Annotation>>,
}

#[derive(Debug, Deserialize)]
struct AnnotationsFile {
    #[serde(default)]
    tests: BTreeMap<String, BTreeMap<String, toml::Value>>,
}

impl DescriptorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an annotation to a test
    pub fn register(&mut self, test_id: impl Into<String>, annotation: Annotation) {
        self.entries
            .entry(test_id.into())
            .or_default()
            .push(annotation);
    }

    /// Attach a roxable descriptor to a test
    pub fn register_roxable<K, V>(
        &mut self,
        test_id: impl Into<String>,
        options: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let options = options
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.register(test_id, Annotation::Roxable(options));
    }

    /// Number of annotated tests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over test identifiers and their roxable options, sorted by identifier
    pub fn roxable(&self) -> Vec<(&str, &RawOptions)> {
        let mut items: Vec<(&str, &RawOptions)> = self
            .entries
            .iter()
            .flat_map(|(id, annotations)| {
                annotations.iter().filter_map(move |a| match a {
                    Annotation::Roxable(options) => Some((id.as_str(), options)),
                    Annotation::Other(_) => None,
                })
            })
            .collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        items
    }

    /// Parse an annotations file
    ///
    /// Non-string values are dropped so they read as absent.
    pub fn parse(content: &str) -> Result<Self, RoxError> {
        let file: AnnotationsFile = toml::from_str(content).map_err(|e| {
            RoxError::validation_error(format!("invalid annotations file: {}", e))
        })?;

        let mut registry = Self::new();
        for (test_id, table) in file.tests {
            let options: RawOptions = table
                .into_iter()
                .filter_map(|(k, v)| match v {
                    toml::Value::String(s) => Some((k, s)),
                    _ => None,
                })
                .collect();
            registry.register(test_id, Annotation::Roxable(options));
        }
        Ok(registry)
    }

    /// Load an annotations file from disk
    pub fn load(path: &Path) -> Result<Self, RoxError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RoxError::persistence_error("unable to read annotations file", path, Some(e))
        })?;
        Self::parse(&content)
    }
}

impl TestAnnotations for DescriptorRegistry {
    fn annotations(&self, test_id: &str) -> Vec<Annotation> {
        self.entries.get(test_id).cloned().unwrap_or_default()
    }
}
