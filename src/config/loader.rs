//! Configuration loading
//!
//! The user document supplies servers and credentials, the project document
//! supplies the project identity. Either may be missing or malformed as long
//! as the other one parses.

use std::path::{Path, PathBuf};

use super::env::{apply_overrides, Environment};
use super::settings::Configuration;
use super::tree::{merge, ConfigTree};
use crate::context::RunLog;
use crate::error::{hints, RoxError};
use crate::utils::paths;

/// Source of the two configuration documents
pub trait ConfigSource {
    /// Raw user-level document
    fn user_document(&self) -> Result<String, RoxError>;

    /// Raw project-level document
    fn project_document(&self) -> Result<String, RoxError>;
}

/// Configuration documents read from disk
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    home: PathBuf,
    project_dir: PathBuf,
}

impl FileConfigSource {
    /// Create a source for a home directory and a project directory
    pub fn new(home: impl Into<PathBuf>, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            home: home.into(),
            project_dir: project_dir.into(),
        }
    }

    /// Path of the user-level document
    pub fn user_path(&self) -> PathBuf {
        paths::user_config_path(&self.home)
    }

    /// Path of the project-level document
    pub fn project_path(&self) -> PathBuf {
        paths::project_config_path(&self.project_dir)
    }

    fn read(path: &Path) -> Result<String, RoxError> {
        std::fs::read_to_string(path)
            .map_err(|e| RoxError::persistence_error("unable to read config file", path, Some(e)))
    }
}

impl ConfigSource for FileConfigSource {
    fn user_document(&self) -> Result<String, RoxError> {
        Self::read(&self.user_path())
    }

    fn project_document(&self) -> Result<String, RoxError> {
        Self::read(&self.project_path())
    }
}

/// Resolve the home directory: explicit option, then `HOME`, then the platform
pub fn resolve_home(explicit: Option<&Path>, env: &dyn Environment) -> Result<PathBuf, RoxError> {
    let loaders: [&dyn Fn() -> Option<PathBuf>; 3] = [
        &|| explicit.map(Path::to_path_buf),
        &|| env.non_empty("HOME").map(PathBuf::from),
        &|| directories::BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()),
    ];

    loaders.iter().find_map(|load| load()).ok_or_else(|| {
        RoxError::config_error(
            "No variables set for user home either with HOME, either with the listener options.",
        )
    })
}

/// Load, merge and override the configuration
pub fn load_configuration(
    source: &dyn ConfigSource,
    env: &dyn Environment,
    log: &mut RunLog,
) -> Result<Configuration, RoxError> {
    let user = source.user_document();
    let project = source.project_document();
    if user.is_err() && project.is_err() {
        return Err(RoxError::config_error_with_hint(
            "Unable to load both ROX user config file (~/.rox/config.yml) and ROX project config file (<projectRoot>/rox.yml).",
            hints::config_files(),
        ));
    }

    let user = parse_document(user, "user", log);
    let project = parse_document(project, "project", log);
    if user.is_none() && project.is_none() {
        return Err(RoxError::config_error_with_hint(
            "Unable to parse both ROX user config file (~/.rox/config.yml) and ROX project config file (<projectRoot>/rox.yml).",
            hints::config_files(),
        ));
    }

    let mut tree = merge(
        user.unwrap_or_default(),
        project.unwrap_or_default(),
    );
    apply_overrides(&mut tree, env, log);

    Configuration::from_tree(&tree)
}

fn parse_document(
    document: Result<String, RoxError>,
    scope: &str,
    log: &mut RunLog,
) -> Option<ConfigTree> {
    let content = match document {
        Ok(content) => content,
        Err(e) => {
            log.verbose(crate::context::LogLevel::Info, e.to_string());
            return None;
        }
    };
    match ConfigTree::parse_yaml(&content) {
        // An empty document parses to null
        Ok(ConfigTree::Scalar(_)) => Some(ConfigTree::empty()),
        Ok(tree) => Some(tree),
        Err(e) => {
            log.error(format!("unable to parse ROX {} config file: {}", scope, e));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LogLevel;
    use std::collections::HashMap;
    use tempfile::TempDir;

    struct Documents {
        user: Option<&'static str>,
        project: Option<&'static str>,
    }

    impl ConfigSource for Documents {
        fn user_document(&self) -> Result<String, RoxError> {
            self.user
                .map(str::to_string)
                .ok_or_else(|| RoxError::persistence_error("missing", "config.yml", None))
        }

        fn project_document(&self) -> Result<String, RoxError> {
            self.project
                .map(str::to_string)
                .ok_or_else(|| RoxError::persistence_error("missing", "rox.yml", None))
        }
    }

    const USER: &str = r#"
server: dev
servers:
  dev:
    apiUrl: http://localhost:3000/api
    apiKeyId: key
    apiKeySecret: secret
project:
  tags: [shared]
"#;

    const PROJECT: &str = r#"
project:
  apiId: abc
  version: 1.0.0
  tags: [local]
"#;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    #[test]
    fn test_project_document_augments_user_document() {
        let source = Documents {
            user: Some(USER),
            project: Some(PROJECT),
        };
        let mut log = RunLog::new(false);
        let cfg = load_configuration(&source, &no_env(), &mut log).unwrap();

        assert_eq!(cfg.server.as_deref(), Some("dev"));
        assert_eq!(cfg.project.api_id.as_deref(), Some("abc"));
        assert_eq!(cfg.project.tags, vec!["shared", "local"]);
        assert!(log.is_empty());
    }

    #[test]
    fn test_one_missing_document_is_tolerated() {
        let source = Documents {
            user: Some(USER),
            project: None,
        };
        let mut log = RunLog::new(false);
        let cfg = load_configuration(&source, &no_env(), &mut log).unwrap();
        assert_eq!(cfg.project.api_id, None);
        assert_eq!(cfg.project.tags, vec!["shared"]);
    }

    #[test]
    fn test_one_malformed_document_is_tolerated() {
        let source = Documents {
            user: Some("server: [unclosed"),
            project: Some(PROJECT),
        };
        let mut log = RunLog::new(false);
        let cfg = load_configuration(&source, &no_env(), &mut log).unwrap();
        assert_eq!(cfg.project.api_id.as_deref(), Some("abc"));
        assert!(log.contains(LogLevel::Error, "unable to parse ROX user config file"));
    }

    #[test]
    fn test_both_missing_is_fatal() {
        let source = Documents {
            user: None,
            project: None,
        };
        let mut log = RunLog::new(false);
        let err = load_configuration(&source, &no_env(), &mut log).unwrap_err();
        assert!(err.to_string().starts_with("Unable to load both"));
        assert!(err.is_fatal_to_publishing());
    }

    #[test]
    fn test_both_malformed_is_fatal() {
        let source = Documents {
            user: Some("a: [b"),
            project: Some("c: {d"),
        };
        let mut log = RunLog::new(false);
        let err = load_configuration(&source, &no_env(), &mut log).unwrap_err();
        assert!(err.to_string().starts_with("Unable to parse both"));
    }

    #[test]
    fn test_environment_overrides_merged_files() {
        let source = Documents {
            user: Some(USER),
            project: Some(PROJECT),
        };
        let env: HashMap<String, String> = [("ROX_PUBLISH".to_string(), "false".to_string())]
            .into_iter()
            .collect();
        let mut log = RunLog::new(false);
        let cfg = load_configuration(&source, &env, &mut log).unwrap();
        assert!(!cfg.payload.publish);
        assert!(log.contains(LogLevel::Warning, "ROX_PUBLISH=false"));
    }

    #[test]
    fn test_file_source_reads_both_locations() {
        let home = TempDir::new().unwrap();
        let project = TempDir::new().unwrap();
        std::fs::create_dir_all(home.path().join(".rox")).unwrap();
        std::fs::write(home.path().join(".rox/config.yml"), USER).unwrap();
        std::fs::write(project.path().join("rox.yml"), PROJECT).unwrap();

        let source = FileConfigSource::new(home.path(), project.path());
        let mut log = RunLog::new(false);
        let cfg = load_configuration(&source, &no_env(), &mut log).unwrap();
        assert_eq!(cfg.server.as_deref(), Some("dev"));
        assert_eq!(cfg.project.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_resolve_home_chain() {
        let env: HashMap<String, String> = [("HOME".to_string(), "/home/env".to_string())]
            .into_iter()
            .collect();
        assert_eq!(
            resolve_home(Some(Path::new("/explicit")), &env).unwrap(),
            PathBuf::from("/explicit")
        );
        assert_eq!(resolve_home(None, &env).unwrap(), PathBuf::from("/home/env"));
    }
}
