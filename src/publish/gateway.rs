//! End-of-run publish, save and print
//!
//! Each step logs its own outcome. A failing step never prevents the
//! following ones.

use std::io::Write;
use std::path::PathBuf;

use super::http::{HttpClient, HttpRequest};
use crate::config::{Configuration, ResolvedServer};
use crate::context::RunLog;
use crate::error::RoxError;
use crate::testing::EncodedPayload;
use crate::utils::paths;

/// Server and submission endpoint resolved during setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishTarget {
    pub server: ResolvedServer,
    pub submission_url: String,
}

/// Test counts reported after a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTally {
    pub roxable: usize,
    pub total: usize,
}

pub struct PublishGateway<'a> {
    http: &'a dyn HttpClient,
    config: &'a Configuration,
    target: &'a PublishTarget,
}

impl<'a> PublishGateway<'a> {
    pub fn new(
        http: &'a dyn HttpClient,
        config: &'a Configuration,
        target: &'a PublishTarget,
    ) -> Self {
        Self {
            http,
            config,
            target,
        }
    }

    /// Run every enabled step
    ///
    /// Returns whether every enabled step succeeded.
    pub fn dispatch(&self, payload: &EncodedPayload, tally: RunTally, log: &mut RunLog) -> bool {
        let options = &self.config.payload;
        let mut delivered = true;

        if options.publish {
            match self.publish(payload) {
                Ok(()) => log.info(format!(
                    "{} test results successfully sent to ROX center ({}) out of {} tests.",
                    tally.roxable, self.target.submission_url, tally.total
                )),
                Err(e) => {
                    log.record(&e);
                    delivered = false;
                }
            }
        } else {
            log.warn(
                "RESULTS WERE NOT SENT TO ROX CENTER.\n\
                 This is due to 'publish' parameters in config file or to ROX_PUBLISH environment variable.",
            );
        }

        if options.save {
            match self.save(payload) {
                Ok(_) => log.info("payload saved in workspace."),
                Err(e) => {
                    log.record(&e);
                    delivered = false;
                }
            }
        }

        if options.print {
            log.debug(format!("generated JSON payload:\n{}", payload.to_pretty_json()));
        }

        delivered
    }

    /// POST the payload; only `202 Accepted` counts as success
    pub fn publish(&self, payload: &EncodedPayload) -> Result<(), RoxError> {
        let url = &self.target.submission_url;
        let request = HttpRequest::post_json(url, payload.to_json())
            .header("Authorization", self.target.server.credentials.authorization());

        let response = self.http.send(request)?;
        if response.status == 202 {
            return Ok(());
        }

        Err(RoxError::http_status(
            format!(
                "ROX server ({}) returned an HTTP {} error:\n{}",
                url, response.status, response.body
            ),
            response.status,
            response.body,
        ))
    }

    /// Write `payload.json` into the server directory of the workspace
    pub fn save(&self, payload: &EncodedPayload) -> Result<PathBuf, RoxError> {
        let workspace = self.config.require_workspace("Could not save payload.")?;
        let dir = paths::server_dir(workspace, &self.target.server.name);
        paths::ensure_dir(&dir)?;

        let path = paths::payload_file(workspace, &self.target.server.name);
        let failed = |e: std::io::Error| {
            RoxError::persistence_error("unable to save payload in workspace", &path, Some(e))
        };

        // Write to a sibling temp file, then rename over the target
        let mut file = tempfile::NamedTempFile::new_in(&dir).map_err(failed)?;
        file.write_all(payload.to_json().as_bytes()).map_err(failed)?;
        file.persist(&path).map_err(|e| failed(e.error))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, ProjectConfig};
    use crate::context::LogLevel;
    use crate::publish::http::fake::FakeHttp;
    use crate::publish::http::Method;
    use crate::testing::payload::{build, RunMeta};
    use crate::testing::WireEncoding;
    use tempfile::TempDir;

    fn target() -> PublishTarget {
        PublishTarget {
            server: ResolvedServer {
                name: "dev".to_string(),
                api_url: "https://rox.example.com/api".to_string(),
                credentials: Credentials {
                    key_id: "id1".to_string(),
                    secret: "s3cr3t".to_string(),
                },
            },
            submission_url: "https://rox.example.com/api/payloads".to_string(),
        }
    }

    fn payload() -> EncodedPayload {
        let project = ProjectConfig {
            api_id: Some("p1".to_string()),
            version: Some("1.0.0".to_string()),
            ..Default::default()
        };
        let meta = RunMeta {
            run_uid: "uid".to_string(),
            duration_ms: 10,
        };
        EncodedPayload::new(&build(Vec::new(), &project, &meta).unwrap(), WireEncoding::Utf8)
    }

    fn tally() -> RunTally {
        RunTally {
            roxable: 1,
            total: 3,
        }
    }

    #[test]
    fn test_accepted_publish_logs_success() {
        let http = FakeHttp::new().respond(202, "");
        let config = Configuration::default();
        let target = target();
        let mut log = RunLog::new(false);

        let gateway = PublishGateway::new(&http, &config, &target);
        assert!(gateway.dispatch(&payload(), tally(), &mut log));

        assert_eq!(
            log.render(),
            "INFO 1 test results successfully sent to ROX center (https://rox.example.com/api/payloads) out of 3 tests.\n"
        );
        let sent = http.sent();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].header_value("Content-Type"), Some("application/json"));
        assert!(sent[0].header_value("Authorization").unwrap().starts_with("RoxApiKey"));
        assert_eq!(sent[0].body.as_deref(), Some(payload().to_json().as_str()));
    }

    #[test]
    fn test_rejected_publish_still_saves_and_prints() {
        let temp_dir = TempDir::new().unwrap();
        let http = FakeHttp::new().respond(500, "server error");
        let mut config = Configuration::default();
        config.workspace = Some(temp_dir.path().to_path_buf());
        config.payload.save = true;
        config.payload.print = true;
        let target = target();
        let mut log = RunLog::new(false);

        let gateway = PublishGateway::new(&http, &config, &target);
        assert!(!gateway.dispatch(&payload(), tally(), &mut log));

        assert!(log.contains(LogLevel::Error, "HTTP 500"));
        assert!(log.contains(LogLevel::Error, "server error"));
        assert!(log.contains(LogLevel::Info, "payload saved in workspace."));
        assert!(log.contains(LogLevel::Debug, "generated JSON payload:\n{"));

        let saved = std::fs::read_to_string(paths::payload_file(temp_dir.path(), "dev")).unwrap();
        assert_eq!(saved, payload().to_json());
    }

    #[test]
    fn test_transport_failure_is_logged() {
        let http = FakeHttp::new().fail("connection refused");
        let config = Configuration::default();
        let target = target();
        let mut log = RunLog::new(false);

        let gateway = PublishGateway::new(&http, &config, &target);
        assert!(!gateway.dispatch(&payload(), tally(), &mut log));
        assert!(log.contains(LogLevel::Error, "connection refused"));
    }

    #[test]
    fn test_publish_disabled_warns_without_sending() {
        let http = FakeHttp::new();
        let mut config = Configuration::default();
        config.payload.publish = false;
        let target = target();
        let mut log = RunLog::new(false);

        let gateway = PublishGateway::new(&http, &config, &target);
        assert!(gateway.dispatch(&payload(), tally(), &mut log));

        assert!(http.sent().is_empty());
        assert!(log.contains(LogLevel::Warning, "RESULTS WERE NOT SENT TO ROX CENTER."));
        assert!(log.contains(LogLevel::Warning, "'publish' parameters"));
    }

    #[test]
    fn test_save_without_workspace_is_logged() {
        let http = FakeHttp::new();
        let mut config = Configuration::default();
        config.payload.publish = false;
        config.payload.save = true;
        config.payload.print = true;
        let target = target();
        let mut log = RunLog::new(false);

        let gateway = PublishGateway::new(&http, &config, &target);
        assert!(!gateway.dispatch(&payload(), tally(), &mut log));

        assert!(log.contains(LogLevel::Error, "no 'workspace' parameter in config files."));
        assert!(log.contains(LogLevel::Debug, "generated JSON payload"));
    }

    #[test]
    fn test_save_overwrites_previous_payload() {
        let temp_dir = TempDir::new().unwrap();
        let http = FakeHttp::new();
        let mut config = Configuration::default();
        config.workspace = Some(temp_dir.path().to_path_buf());
        let target = target();
        let gateway = PublishGateway::new(&http, &config, &target);

        let path = paths::payload_file(temp_dir.path(), "dev");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "stale").unwrap();

        assert_eq!(gateway.save(&payload()).unwrap(), path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), payload().to_json());
    }
}
