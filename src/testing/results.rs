//! Test result records
//!
//! A [`TestResult`] is created when a roxable test starts, mutated by outcome
//! callbacks and sealed when the test ends. Field names follow the compact
//! ROX payload schema.

use serde::{Deserialize, Serialize};

use super::annotation::{push_unique, RoxableTestDescriptor, TestFlags};
use crate::config::ProjectConfig;

/// Message recorded for incomplete tests
pub const INCOMPLETE_MESSAGE: &str = "This test is marked as incomplete.";

/// Result of one roxable test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Test key
    #[serde(rename = "k")]
    pub key: String,
    /// Display name
    #[serde(rename = "n")]
    pub name: String,
    #[serde(rename = "p")]
    pub passed: bool,
    #[serde(rename = "d")]
    pub duration_ms: u64,
    /// Failure trace
    #[serde(rename = "m", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "f", default, skip_serializing_if = "TestFlags::is_none")]
    pub flags: TestFlags,
    #[serde(rename = "c", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "g", default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(rename = "t", default, skip_serializing_if = "Vec::is_empty")]
    pub tickets: Vec<String>,
}

impl TestResult {
    /// Seed a passing result from a descriptor and the project defaults
    pub fn start(test_id: &str, descriptor: RoxableTestDescriptor, project: &ProjectConfig) -> Self {
        let name = descriptor
            .name
            .unwrap_or_else(|| humanize(method_name(test_id)));

        Self {
            key: descriptor.key,
            name,
            passed: true,
            duration_ms: 0,
            message: None,
            flags: descriptor.flags,
            category: descriptor.category.or_else(|| project.category.clone()),
            tags: union(&project.tags, &descriptor.tags),
            tickets: union(&project.tickets, &descriptor.tickets),
        }
    }

    /// Mark as failed with a trace; the last call wins
    pub fn fail(&mut self, trace: &str) {
        self.passed = false;
        let mut message = trace.to_string();
        if !message.ends_with('\n') {
            message.push('\n');
        }
        self.message = Some(message);
    }

    /// Mark as incomplete
    pub fn incomplete(&mut self) {
        self.passed = false;
        self.message = Some(INCOMPLETE_MESSAGE.to_string());
    }

    /// Mark as skipped
    pub fn skip(&mut self) {
        self.flags = TestFlags::Inactive;
    }
}

/// Results accumulated for one suite
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteResults {
    pub results: Vec<TestResult>,
    /// Every test started in the suite
    pub tests_seen: usize,
    /// Tests with a valid roxable descriptor
    pub roxable_tests_seen: usize,
}

impl SuiteResults {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Project values first, then test values, without duplicates
fn union(project: &[String], test: &[String]) -> Vec<String> {
    let mut all = Vec::with_capacity(project.len() + test.len());
    for item in project.iter().chain(test) {
        push_unique(&mut all, item);
    }
    all
}

/// Last path segment of a test identifier
///
/// `suite::module::test_name` and `Class.testName` both yield the method name.
pub fn method_name(test_id: &str) -> &str {
    let after_path = test_id.rsplit("::").next().unwrap_or(test_id);
    after_path.rsplit('.').next().unwrap_or(after_path)
}

/// Turn a test method name into a sentence
///
/// `testHTTPServerStarts` becomes `Test http server starts` and
/// `accepts_valid_password` becomes `Accepts valid password`.
pub fn humanize(method: &str) -> String {
    let chars: Vec<char> = method.chars().collect();
    let mut spaced = String::with_capacity(method.len() + 8);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() && starts_word(&chars, i) {
            spaced.push(' ');
        }
        spaced.push(if c == '_' { ' ' } else { c });
    }

    let lower = spaced.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    let mut out = lower.chars();
    match out.next() {
        Some(first) => first.to_uppercase().chain(out).collect(),
        None => String::new(),
    }
}

/// Whether the capital at `i` begins a word
///
/// A word begins at a capital followed by a lowercase letter, or at the first
/// capital of an acronym that runs into a capitalized word (`HTTPServer`).
fn starts_word(chars: &[char], i: usize) -> bool {
    let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
    if next_is_lower {
        return true;
    }
    if chars[i - 1].is_ascii_uppercase() {
        return false;
    }
    let run = chars[i..]
        .iter()
        .take_while(|c| c.is_ascii_uppercase())
        .count();
    run >= 3 && chars.get(i + run).is_some_and(|c| c.is_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::annotation::RoxableTestDescriptor;

    fn descriptor(key: &str) -> RoxableTestDescriptor {
        RoxableTestDescriptor {
            key: key.to_string(),
            name: None,
            category: None,
            tags: Vec::new(),
            tickets: Vec::new(),
            flags: TestFlags::None,
        }
    }

    #[test]
    fn test_humanize_camel_case() {
        assert_eq!(humanize("testSomethingInvalid"), "Test something invalid");
        assert_eq!(humanize("testHTTPServer"), "Test http server");
        assert_eq!(humanize("testABc"), "Testa bc");
        assert_eq!(humanize("getHTTP"), "Gethttp");
    }

    #[test]
    fn test_humanize_snake_case() {
        assert_eq!(humanize("accepts_valid_password"), "Accepts valid password");
        assert_eq!(humanize("test__double"), "Test double");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn test_method_name() {
        assert_eq!(method_name("auth::login::accepts_valid_password"), "accepts_valid_password");
        assert_eq!(method_name("SampleTest.testLogin"), "testLogin");
        assert_eq!(method_name("bin.tests::it_works"), "it_works");
        assert_eq!(method_name("plain"), "plain");
    }

    #[test]
    fn test_tags_union_is_ordered_and_deduplicated() {
        let project = ProjectConfig {
            tags: vec!["x".to_string(), "y".to_string()],
            ..Default::default()
        };
        let mut d = descriptor("T1");
        d.tags = vec!["y".to_string(), "z".to_string()];

        let result = TestResult::start("t", d, &project);
        assert_eq!(result.tags, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_category_falls_back_to_project() {
        let project = ProjectConfig {
            category: Some("Unit".to_string()),
            tickets: vec!["JIRA-1".to_string()],
            ..Default::default()
        };
        let result = TestResult::start("t", descriptor("T1"), &project);
        assert_eq!(result.category.as_deref(), Some("Unit"));
        assert_eq!(result.tickets, vec!["JIRA-1"]);

        let mut d = descriptor("T2");
        d.category = Some("Integration".to_string());
        let result = TestResult::start("t", d, &project);
        assert_eq!(result.category.as_deref(), Some("Integration"));
    }

    #[test]
    fn test_user_name_overrides_humanized_name() {
        let mut d = descriptor("T1");
        d.name = Some("Custom".to_string());
        let result = TestResult::start("Suite.testLogin", d, &ProjectConfig::default());
        assert_eq!(result.name, "Custom");

        let result = TestResult::start("Suite.testLogin", descriptor("T2"), &ProjectConfig::default());
        assert_eq!(result.name, "Test login");
    }

    #[test]
    fn test_failure_last_write_wins() {
        let mut result = TestResult::start("t", descriptor("T1"), &ProjectConfig::default());
        result.fail("first");
        result.fail("AssertionError: second\n");
        assert!(!result.passed);
        assert_eq!(result.message.as_deref(), Some("AssertionError: second\n"));
    }

    #[test]
    fn test_minimal_entry_serialization() {
        let mut d = descriptor("T1");
        d.flags = TestFlags::Inactive;
        let mut result = TestResult::start("Suite.testSomethingInvalid", d, &ProjectConfig::default());
        result.duration_ms = 500;

        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"k":"T1","n":"Test something invalid","p":true,"d":500,"f":1}"#
        );
    }
}
