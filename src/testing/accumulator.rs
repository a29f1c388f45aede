//! Test lifecycle state machine
//!
//! ```text
//! Idle ──start_suite──▶ SuiteRunning ──start_test──▶ TestRunning
//!   ▲                        │  ▲                         │
//!   └──────end_suite─────────┘  └─────────end_test────────┘
//! ```
//!
//! Outcome callbacks only act when the current test is roxable.

use super::annotation::{self, RoxableTestDescriptor};
use super::encoding::{WireEncoding, MESSAGE_MAX_LENGTH};
use super::registry::{Annotation, TestAnnotations};
use super::results::{SuiteResults, TestResult};
use crate::config::ProjectConfig;
use crate::context::{LogLevel, RunContext};

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuiteState {
    Idle,
    SuiteRunning,
    TestRunning,
}

/// Accumulates the results of one suite
pub struct ResultAccumulator {
    annotations: Box<dyn TestAnnotations>,
    project: ProjectConfig,
    encoding: WireEncoding,
    state: SuiteState,
    current_test_id: Option<String>,
    current: Option<TestResult>,
    suite: SuiteResults,
}

impl ResultAccumulator {
    /// Create an accumulator using `project` for default test metadata
    pub fn new(
        annotations: Box<dyn TestAnnotations>,
        project: ProjectConfig,
        encoding: WireEncoding,
    ) -> Self {
        Self {
            annotations,
            project,
            encoding,
            state: SuiteState::Idle,
            current_test_id: None,
            current: None,
            suite: SuiteResults::default(),
        }
    }

    pub fn state(&self) -> SuiteState {
        self.state
    }

    /// In-progress result of the running test, if roxable
    pub fn current(&self) -> Option<&TestResult> {
        self.current.as_ref()
    }

    /// Results sealed so far
    pub fn results(&self) -> &SuiteResults {
        &self.suite
    }

    /// Reset results and counters
    pub fn start_suite(&mut self) {
        self.suite = SuiteResults::default();
        self.current = None;
        self.current_test_id = None;
        self.state = SuiteState::SuiteRunning;
    }

    /// Start a test; builds an in-progress result when the test is roxable
    pub fn start_test(&mut self, ctx: &mut RunContext, test_id: &str) {
        self.current = None;
        self.current_test_id = Some(test_id.to_string());
        self.suite.tests_seen += 1;
        self.state = SuiteState::TestRunning;

        if ctx.publishing_disabled() {
            return;
        }

        let Some(descriptor) = self.descriptor(ctx, test_id) else {
            return;
        };
        self.suite.roxable_tests_seen += 1;
        self.current = Some(TestResult::start(test_id, descriptor, &self.project));
    }

    fn descriptor(&self, ctx: &mut RunContext, test_id: &str) -> Option<RoxableTestDescriptor> {
        let raw = self
            .annotations
            .annotations(test_id)
            .into_iter()
            .find_map(|a| match a {
                Annotation::Roxable(options) => Some(options),
                Annotation::Other(_) => None,
            })?;

        match annotation::parse(&raw) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                ctx.log.warn(format!("{} (test {})", e, test_id));
                None
            }
        }
    }

    /// Record an assertion failure
    pub fn record_failure(&mut self, trace: &str) {
        if let Some(result) = self.current.as_mut() {
            result.fail(trace);
        }
    }

    /// Record an unexpected error
    pub fn record_error(&mut self, trace: &str) {
        if let Some(result) = self.current.as_mut() {
            result.fail(trace);
        }
    }

    pub fn record_incomplete(&mut self) {
        if let Some(result) = self.current.as_mut() {
            result.incomplete();
        }
    }

    pub fn record_skipped(&mut self) {
        if let Some(result) = self.current.as_mut() {
            result.skip();
        }
    }

    /// Seal the running test and append it to the suite
    pub fn end_test(&mut self, ctx: &mut RunContext, elapsed_seconds: f64) {
        self.state = SuiteState::SuiteRunning;
        let test_id = self.current_test_id.take().unwrap_or_default();

        let Some(mut result) = self.current.take() else {
            ctx.log
                .verbose(LogLevel::Warning, format!("test {} is not roxable.", test_id));
            return;
        };

        result.duration_ms = duration_ms(elapsed_seconds);

        if let Some(message) = result.message.as_deref() {
            if let Some(truncated) = self.encoding.truncate(message, MESSAGE_MAX_LENGTH) {
                result.message = Some(truncated);
                ctx.log.warn("some error messages were truncated.");
            }
        }

        self.suite.results.push(result);
    }

    /// Hand the accumulated results onward
    pub fn end_suite(&mut self) -> SuiteResults {
        self.current = None;
        self.current_test_id = None;
        self.state = SuiteState::Idle;
        std::mem::take(&mut self.suite)
    }
}

/// Milliseconds from fractional seconds, rounded and never negative
fn duration_ms(elapsed_seconds: f64) -> u64 {
    if elapsed_seconds.is_finite() && elapsed_seconds > 0.0 {
        (elapsed_seconds * 1000.0).round() as u64
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoxError;
    use crate::testing::annotation::TestFlags;
    use crate::testing::registry::DescriptorRegistry;

    fn accumulator(registry: DescriptorRegistry) -> ResultAccumulator {
        let project = ProjectConfig {
            tags: vec!["x".to_string(), "y".to_string()],
            ..Default::default()
        };
        ResultAccumulator::new(Box::new(registry), project, WireEncoding::Utf8)
    }

    fn registry() -> DescriptorRegistry {
        let mut registry = DescriptorRegistry::new();
        registry.register_roxable("Suite.testSomethingInvalid", [("key", "T1"), ("tickets", "INVALID")]);
        registry.register_roxable("Suite.testTagged", [("key", "T2"), ("tags", "y,z")]);
        registry.register_roxable("Suite.testBroken", [("name", "no key")]);
        registry
    }

    #[test]
    fn test_roxable_test_is_recorded() {
        let mut ctx = RunContext::new(false);
        let mut acc = accumulator(registry());

        acc.start_suite();
        acc.start_test(&mut ctx, "Suite.testSomethingInvalid");
        assert_eq!(acc.state(), SuiteState::TestRunning);
        acc.end_test(&mut ctx, 0.5);
        let suite = acc.end_suite();

        assert_eq!(suite.tests_seen, 1);
        assert_eq!(suite.roxable_tests_seen, 1);
        let result = &suite.results[0];
        assert_eq!(result.key, "T1");
        assert_eq!(result.name, "Test something invalid");
        assert!(result.passed);
        assert_eq!(result.duration_ms, 500);
        assert_eq!(result.flags, TestFlags::Inactive);
        assert_eq!(result.tags, vec!["x", "y"]);
        assert_eq!(acc.state(), SuiteState::Idle);
    }

    #[test]
    fn test_unannotated_test_is_ignored() {
        let mut ctx = RunContext::new(true);
        let mut acc = accumulator(registry());

        acc.start_suite();
        acc.start_test(&mut ctx, "Suite.testPlain");
        assert!(acc.current().is_none());
        acc.record_failure("ignored");
        acc.end_test(&mut ctx, 1.0);
        let suite = acc.end_suite();

        assert_eq!(suite.tests_seen, 1);
        assert_eq!(suite.roxable_tests_seen, 0);
        assert!(suite.is_empty());
        assert!(ctx.log.contains(LogLevel::Warning, "Suite.testPlain is not roxable"));
    }

    #[test]
    fn test_invalid_descriptor_only_affects_that_test() {
        let mut ctx = RunContext::new(false);
        let mut acc = accumulator(registry());

        acc.start_suite();
        acc.start_test(&mut ctx, "Suite.testBroken");
        assert!(acc.current().is_none());
        acc.end_test(&mut ctx, 0.1);
        acc.start_test(&mut ctx, "Suite.testTagged");
        acc.end_test(&mut ctx, 0.1);
        let suite = acc.end_suite();

        assert_eq!(suite.results.len(), 1);
        assert_eq!(suite.results[0].tags, vec!["x", "y", "z"]);
        assert!(!ctx.publishing_disabled());
        assert!(ctx.log.contains(LogLevel::Warning, "Suite.testBroken"));
    }

    #[test]
    fn test_outcomes_update_current_result() {
        let mut ctx = RunContext::new(false);
        let mut acc = accumulator(registry());

        acc.start_suite();
        acc.start_test(&mut ctx, "Suite.testTagged");
        acc.record_error("Error: boom");
        acc.record_failure("AssertionError: expected 1");
        acc.end_test(&mut ctx, 0.0004);

        acc.start_test(&mut ctx, "Suite.testSomethingInvalid");
        acc.record_incomplete();
        acc.record_skipped();
        acc.end_test(&mut ctx, 1.2346);
        let suite = acc.end_suite();

        assert!(!suite.results[0].passed);
        assert_eq!(
            suite.results[0].message.as_deref(),
            Some("AssertionError: expected 1\n")
        );
        assert_eq!(suite.results[0].duration_ms, 0);
        assert_eq!(
            suite.results[1].message.as_deref(),
            Some("This test is marked as incomplete.")
        );
        assert_eq!(suite.results[1].duration_ms, 1235);
        assert_eq!(suite.results.iter().filter(|r| !r.passed).count(), 2);
        assert_eq!(suite.results.iter().filter(|r| r.flags == TestFlags::Inactive).count(), 1);
    }

    #[test]
    fn test_skip_overrides_descriptor_flag() {
        let mut ctx = RunContext::new(false);
        let mut acc = accumulator(registry());

        acc.start_suite();
        acc.start_test(&mut ctx, "Suite.testTagged");
        acc.record_skipped();
        acc.end_test(&mut ctx, 0.0);
        assert_eq!(acc.end_suite().results[0].flags, TestFlags::Inactive);
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let mut ctx = RunContext::new(false);
        let mut acc = accumulator(registry());

        acc.start_suite();
        acc.start_test(&mut ctx, "Suite.testTagged");
        acc.record_failure(&"e".repeat(70000));
        acc.end_test(&mut ctx, 0.0);
        let suite = acc.end_suite();

        assert_eq!(suite.results[0].message.as_ref().unwrap().len(), 65535);
        assert!(ctx.log.contains(LogLevel::Warning, "truncated"));
    }

    #[test]
    fn test_disabled_publishing_makes_every_test_non_roxable() {
        let mut ctx = RunContext::new(false);
        ctx.fail(&RoxError::config_error("missing apiKeyId for dev."));
        let mut acc = accumulator(registry());

        acc.start_suite();
        acc.start_test(&mut ctx, "Suite.testTagged");
        assert!(acc.current().is_none());
        acc.end_test(&mut ctx, 0.1);
        let suite = acc.end_suite();

        assert_eq!(suite.tests_seen, 1);
        assert!(suite.is_empty());
    }

    #[test]
    fn test_start_suite_resets_counters() {
        let mut ctx = RunContext::new(false);
        let mut acc = accumulator(registry());

        acc.start_suite();
        acc.start_test(&mut ctx, "Suite.testTagged");
        acc.end_test(&mut ctx, 0.1);
        acc.start_suite();

        assert_eq!(acc.results().tests_seen, 0);
        assert!(acc.results().is_empty());
    }

    #[test]
    fn test_duration_ms_rounding() {
        assert_eq!(duration_ms(0.5), 500);
        assert_eq!(duration_ms(0.0016), 2);
        assert_eq!(duration_ms(-1.0), 0);
        assert_eq!(duration_ms(f64::NAN), 0);
    }
}
