//! Test lifecycle listener
//!
//! [`RoxListener`] is handed to the host test runner. Setup resolves the
//! configuration, the server and its submission endpoint, the run identifier
//! and the cache. Any setup failure is logged and disables publishing, but the
//! listener keeps accepting lifecycle calls. The run log is flushed when the
//! listener is dropped.

use std::path::PathBuf;

use crate::config::env::ROX_TEST_RUN_UID;
use crate::config::{
    load_configuration, resolve_home, ConfigSource, Configuration, Environment, FileConfigSource,
    ProcessEnvironment,
};
use crate::context::{RunContext, RunLog};
use crate::error::RoxError;
use crate::publish::{
    discover_submission_endpoint, HttpClient, ProjectCache, PublishGateway, PublishTarget,
    ReqwestClient, RunTally,
};
use crate::testing::payload::{self, EncodedPayload, RunMeta};
use crate::testing::{DescriptorRegistry, ResultAccumulator, TestAnnotations};
use crate::utils::paths;

/// Lifecycle events emitted by a host test runner
pub trait TestLifecycle {
    fn on_suite_start(&mut self);
    fn on_test_start(&mut self, test_id: &str);
    /// Assertion failure with its formatted trace
    fn on_test_failure(&mut self, test_id: &str, message: &str);
    /// Unexpected error with its formatted trace
    fn on_test_error(&mut self, test_id: &str, message: &str);
    fn on_test_incomplete(&mut self, test_id: &str);
    fn on_test_skipped(&mut self, test_id: &str);
    /// Test finished after `elapsed_seconds`
    fn on_test_end(&mut self, test_id: &str, elapsed_seconds: f64);
    fn on_suite_end(&mut self);
}

/// Listener options
#[derive(Debug, Clone, Default)]
pub struct ListenerOptions {
    pub verbose: bool,
    /// Home directory holding `.rox/config.yml`
    pub home: Option<PathBuf>,
    /// Project root holding `rox.yml`
    pub project_dir: PathBuf,
}

/// Capabilities used by the listener
pub struct Collaborators {
    pub env: Box<dyn Environment>,
    pub source: Box<dyn ConfigSource>,
    pub http: Box<dyn HttpClient>,
    pub annotations: Box<dyn TestAnnotations>,
}

/// State established by a successful setup
struct Session {
    http: Box<dyn HttpClient>,
    target: PublishTarget,
    run_uid: String,
    cache: ProjectCache,
}

/// Collects results during a suite and publishes them at its end
pub struct RoxListener {
    ctx: RunContext,
    config: Configuration,
    session: Option<Session>,
    accumulator: ResultAccumulator,
    suite_started_ms: i64,
    delivery_failed: bool,
}

impl RoxListener {
    /// Listener reading files from disk and talking HTTP
    pub fn system(options: &ListenerOptions, annotations: Box<dyn TestAnnotations>) -> Self {
        let env = ProcessEnvironment;
        let home = match resolve_home(options.home.as_deref(), &env) {
            Ok(home) => home,
            Err(e) => return Self::disabled(options.verbose, &e),
        };
        let http = match ReqwestClient::new() {
            Ok(http) => http,
            Err(e) => {
                return Self::disabled(options.verbose, &RoxError::config_error(e.to_string()))
            }
        };

        Self::new(
            options.verbose,
            Collaborators {
                env: Box::new(env),
                source: Box::new(FileConfigSource::new(home, &options.project_dir)),
                http: Box::new(http),
                annotations,
            },
        )
    }

    /// Listener over explicit collaborators
    pub fn new(verbose: bool, collaborators: Collaborators) -> Self {
        let Collaborators {
            env,
            source,
            http,
            annotations,
        } = collaborators;
        let mut ctx = RunContext::new(verbose);

        let config = match load_configuration(source.as_ref(), env.as_ref(), &mut ctx.log) {
            Ok(config) => config,
            Err(e) => {
                ctx.fail(&e);
                return Self::assemble(ctx, Configuration::default(), None, annotations);
            }
        };

        let session = match Self::setup(&config, env.as_ref(), http, &mut ctx.log) {
            Ok(session) => Some(session),
            Err(e) => {
                ctx.fail(&e);
                None
            }
        };
        Self::assemble(ctx, config, session, annotations)
    }

    fn disabled(verbose: bool, err: &RoxError) -> Self {
        let mut ctx = RunContext::new(verbose);
        ctx.fail(err);
        Self::assemble(
            ctx,
            Configuration::default(),
            None,
            Box::new(DescriptorRegistry::new()),
        )
    }

    fn assemble(
        ctx: RunContext,
        config: Configuration,
        session: Option<Session>,
        annotations: Box<dyn TestAnnotations>,
    ) -> Self {
        let accumulator = ResultAccumulator::new(
            annotations,
            config.project.clone(),
            config.payload.encoding,
        );
        Self {
            ctx,
            config,
            session,
            accumulator,
            suite_started_ms: now_ms(),
            delivery_failed: false,
        }
    }

    fn setup(
        config: &Configuration,
        env: &dyn Environment,
        http: Box<dyn HttpClient>,
        log: &mut RunLog,
    ) -> Result<Session, RoxError> {
        let run_uid = run_uid(config, env)?;
        let server = config.resolve_server()?;
        let submission_url = discover_submission_endpoint(http.as_ref(), &server)?;
        let target = PublishTarget {
            server,
            submission_url,
        };
        let cache = load_cache(config, &target, log)?;

        Ok(Session {
            http,
            target,
            run_uid,
            cache,
        })
    }

    /// Resolved configuration
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn publishing_disabled(&self) -> bool {
        self.ctx.publishing_disabled()
    }

    /// Run identifier, once setup succeeded
    pub fn run_uid(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.run_uid.as_str())
    }

    /// Whether building, sending or saving the last payload failed
    pub fn delivery_failed(&self) -> bool {
        self.delivery_failed
    }

    /// Cached data of the project, once setup succeeded
    pub fn cache(&self) -> Option<&ProjectCache> {
        self.session.as_ref().map(|s| &s.cache)
    }

    /// Lines logged so far
    pub fn log(&self) -> &RunLog {
        &self.ctx.log
    }

    /// Print and drain the run log
    pub fn flush_log(&mut self) {
        self.ctx.log.flush();
    }

    fn publish(&mut self) {
        let suite = self.accumulator.end_suite();

        if self.ctx.publishing_disabled() {
            self.ctx.log.warn(
                "RESULTS WERE NOT SENT TO ROX CENTER.\nThis is due to previously logged errors.",
            );
            return;
        }
        // Setup failures always disable publishing
        let Some(session) = self.session.as_ref() else {
            return;
        };
        if suite.is_empty() {
            return;
        }

        let tally = RunTally {
            roxable: suite.roxable_tests_seen,
            total: suite.tests_seen,
        };
        let meta = RunMeta {
            run_uid: session.run_uid.clone(),
            duration_ms: (now_ms() - self.suite_started_ms).max(0) as u64,
        };
        let payload = match payload::build(suite.results, &self.config.project, &meta) {
            Ok(payload) => payload,
            Err(e) => {
                self.ctx.fail(&e);
                self.delivery_failed = true;
                return;
            }
        };

        let encoded = EncodedPayload::new(&payload, self.config.payload.encoding);
        let delivered = PublishGateway::new(session.http.as_ref(), &self.config, &session.target)
            .dispatch(&encoded, tally, &mut self.ctx.log);
        self.delivery_failed = !delivered;
    }
}

impl TestLifecycle for RoxListener {
    fn on_suite_start(&mut self) {
        self.suite_started_ms = now_ms();
        self.accumulator.start_suite();
    }

    fn on_test_start(&mut self, test_id: &str) {
        self.accumulator.start_test(&mut self.ctx, test_id);
    }

    fn on_test_failure(&mut self, _test_id: &str, message: &str) {
        self.accumulator.record_failure(message);
    }

    fn on_test_error(&mut self, _test_id: &str, message: &str) {
        self.accumulator.record_error(message);
    }

    fn on_test_incomplete(&mut self, _test_id: &str) {
        self.accumulator.record_incomplete();
    }

    fn on_test_skipped(&mut self, _test_id: &str) {
        self.accumulator.record_skipped();
    }

    fn on_test_end(&mut self, _test_id: &str, elapsed_seconds: f64) {
        self.accumulator.end_test(&mut self.ctx, elapsed_seconds);
    }

    fn on_suite_end(&mut self) {
        self.publish();
    }
}

impl Drop for RoxListener {
    fn drop(&mut self) {
        self.ctx.log.flush();
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Run identifier: environment, then the workspace `uid` file, then a new UUID
fn run_uid(config: &Configuration, env: &dyn Environment) -> Result<String, RoxError> {
    if let Some(uid) = env.non_empty(ROX_TEST_RUN_UID) {
        return Ok(uid);
    }

    if let Some(workspace) = config.workspace.as_deref() {
        let path = paths::uid_file(workspace);
        if path.exists() {
            return std::fs::read_to_string(&path)
                .ok()
                .map(|uid| uid.trim().to_string())
                .filter(|uid| !uid.is_empty())
                .ok_or_else(|| {
                    RoxError::config_error(format!(
                        "A UID file exist in workspace, but it cannot be read ({}).",
                        path.display()
                    ))
                });
        }
    }

    Ok(uuid::Uuid::new_v4().to_string())
}

/// Cache of the current project when caching is enabled
///
/// An unreadable cache is logged and replaced by an empty one.
fn load_cache(
    config: &Configuration,
    target: &PublishTarget,
    log: &mut RunLog,
) -> Result<ProjectCache, RoxError> {
    if !config.payload.cache {
        return Ok(ProjectCache::empty());
    }
    let workspace = config.require_workspace("Can not locate cache.")?;
    let api_id = config.project.api_id.as_deref().ok_or_else(|| {
        RoxError::config_error("missing apiId for project in config files.")
    })?;

    match ProjectCache::load(workspace, &target.server.name, api_id, log) {
        Ok(cache) => Ok(cache),
        Err(e) => {
            log.record(&e);
            Ok(ProjectCache::empty())
        }
    }
}
