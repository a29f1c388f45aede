//! Typed configuration tree and layered merge
//!
//! YAML documents are converted into a [`ConfigTree`] so the merge dispatches
//! on a real tag instead of guessing whether an array is list-like:
//!
//! - map + map: merged key by key, recursively
//! - list + list: concatenated, base entries first, duplicates kept
//! - anything else: the override replaces the base value

use std::collections::BTreeMap;

use serde::Serialize;

/// Leaf value of a configuration tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// Configuration node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigTree {
    Scalar(Scalar),
    List(Vec<ConfigTree>),
    Map(BTreeMap<String, ConfigTree>),
}

impl Default for ConfigTree {
    fn default() -> Self {
        ConfigTree::Map(BTreeMap::new())
    }
}

impl From<&str> for ConfigTree {
    fn from(value: &str) -> Self {
        ConfigTree::Scalar(Scalar::String(value.to_string()))
    }
}

impl From<bool> for ConfigTree {
    fn from(value: bool) -> Self {
        ConfigTree::Scalar(Scalar::Bool(value))
    }
}

impl ConfigTree {
    /// Create an empty map node
    pub fn empty() -> Self {
        Self::default()
    }

    /// Convert a parsed YAML document
    pub fn from_yaml(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value;

        match value {
            Value::Null => ConfigTree::Scalar(Scalar::Null),
            Value::Bool(b) => ConfigTree::Scalar(Scalar::Bool(b)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ConfigTree::Scalar(Scalar::Int(i))
                } else {
                    ConfigTree::Scalar(Scalar::Float(n.as_f64().unwrap_or_default()))
                }
            }
            Value::String(s) => ConfigTree::Scalar(Scalar::String(s)),
            Value::Sequence(items) => {
                ConfigTree::List(items.into_iter().map(ConfigTree::from_yaml).collect())
            }
            Value::Mapping(mapping) => {
                let mut map = BTreeMap::new();
                for (key, value) in mapping {
                    if let Some(key) = yaml_key(key) {
                        map.insert(key, ConfigTree::from_yaml(value));
                    }
                }
                ConfigTree::Map(map)
            }
            Value::Tagged(tagged) => ConfigTree::from_yaml(tagged.value),
        }
    }

    /// Parse a YAML document into a tree
    pub fn parse_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        let value: serde_yaml::Value = serde_yaml::from_str(content)?;
        Ok(Self::from_yaml(value))
    }

    /// Look up a node by key path
    pub fn get_path(&self, path: &[&str]) -> Option<&ConfigTree> {
        let mut node = self;
        for key in path {
            match node {
                ConfigTree::Map(map) => node = map.get(*key)?,
                _ => return None,
            }
        }
        Some(node)
    }

    /// Replace the value at a key path, creating intermediate maps
    ///
    /// Non-map nodes met along the path are replaced by maps.
    pub fn set_path(&mut self, path: &[&str], value: ConfigTree) {
        let Some((first, rest)) = path.split_first() else {
            *self = value;
            return;
        };
        if !matches!(self, ConfigTree::Map(_)) {
            *self = ConfigTree::empty();
        }
        if let ConfigTree::Map(map) = self {
            map.entry((*first).to_string())
                .or_default()
                .set_path(rest, value);
        }
    }

    /// Convert to JSON for typed extraction
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Merge `overlay` on top of `base`
pub fn merge(base: ConfigTree, overlay: ConfigTree) -> ConfigTree {
    match (base, overlay) {
        (ConfigTree::Map(mut base), ConfigTree::Map(overlay)) => {
            for (key, value) in overlay {
                let merged = match base.remove(&key) {
                    Some(existing) => merge(existing, value),
                    None => value,
                };
                base.insert(key, merged);
            }
            ConfigTree::Map(base)
        }
        (ConfigTree::List(mut base), ConfigTree::List(overlay)) => {
            base.extend(overlay);
            ConfigTree::List(base)
        }
        (_, overlay) => overlay,
    }
}

fn yaml_key(key: serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
