//! Environment variable overrides
//!
//! Environment values are applied after the configuration files are merged.
//! Each one is a flat replace at a fixed key path.

use std::collections::HashMap;

use super::tree::ConfigTree;
use crate::context::RunLog;

/// Selected server name
pub const ROX_SERVER: &str = "ROX_SERVER";
/// Publish toggle
pub const ROX_PUBLISH: &str = "ROX_PUBLISH";
/// Pretty-print toggle
pub const ROX_PRINT_PAYLOAD: &str = "ROX_PRINT_PAYLOAD";
/// Save toggle
pub const ROX_SAVE_PAYLOAD: &str = "ROX_SAVE_PAYLOAD";
/// Workspace directory
pub const ROX_WORKSPACE: &str = "ROX_WORKSPACE";
/// Run identifier override
pub const ROX_TEST_RUN_UID: &str = "ROX_TEST_RUN_UID";

/// Read access to environment variables
pub trait Environment {
    /// Value of a variable, `None` when unset
    fn var(&self, name: &str) -> Option<String>;

    /// Value of a variable, `None` when unset or empty
    fn non_empty(&self, name: &str) -> Option<String> {
        self.var(name).filter(|v| !v.is_empty())
    }
}

/// The process environment
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Permissive boolean: `1`, `true` or `t`, case-insensitive
pub fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("t")
}

enum Override {
    Text,
    Flag,
}

const OVERRIDES: &[(&str, &[&str], Override)] = &[
    (ROX_SERVER, &["server"], Override::Text),
    (ROX_PUBLISH, &["payload", "publish"], Override::Flag),
    (ROX_PRINT_PAYLOAD, &["payload", "print"], Override::Flag),
    (ROX_SAVE_PAYLOAD, &["payload", "save"], Override::Flag),
    (ROX_WORKSPACE, &["workspace"], Override::Text),
];

/// Apply environment overrides to a merged configuration tree
pub fn apply_overrides(tree: &mut ConfigTree, env: &dyn Environment, log: &mut RunLog) {
    for (name, path, kind) in OVERRIDES {
        let Some(value) = env.non_empty(name) else {
            continue;
        };
        let node = match kind {
            Override::Text => ConfigTree::from(value.as_str()),
            Override::Flag => ConfigTree::from(parse_flag(&value)),
        };
        tree.set_path(path, node);
        log.warn(format!(
            "use environment variable instead of config files ({}={}).",
            name, value
        ));
    }
}
