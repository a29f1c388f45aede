//! JUnit / GoogleTest XML report replay
//!
//! Parses existing XML test reports and drives a [`TestLifecycle`] with the
//! recorded outcomes, so results of any runner that writes JUnit XML can be
//! published. Test identifiers are `classname.name`.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::RoxError;
use crate::listener::TestLifecycle;

/// Recorded outcome of a test case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    Failed(String),
    Errored(String),
    Skipped,
}

/// One test case from a report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportCase {
    pub classname: String,
    pub name: String,
    /// Duration in seconds
    pub time: f64,
    pub outcome: CaseOutcome,
}

impl ReportCase {
    /// Identifier used for descriptor lookup
    pub fn test_id(&self) -> String {
        if self.classname.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.classname, self.name)
        }
    }
}

/// One `<testsuite>` element
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSuite {
    pub name: String,
    pub cases: Vec<ReportCase>,
}

/// Find XML report files under the given files and directories
pub fn find_reports(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut reports = Vec::new();
    for input in inputs {
        if input.is_file() {
            reports.push(input.clone());
            continue;
        }
        let mut found: Vec<PathBuf> = walkdir::WalkDir::new(input)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "xml"))
            .collect();
        found.sort();
        reports.extend(found);
    }
    reports
}

/// Read and parse a report file
pub fn load_report(path: &Path) -> Result<Vec<ReportSuite>, RoxError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        RoxError::persistence_error("unable to read test report", path, Some(e))
    })?;
    parse_report(&content).map_err(|e| {
        RoxError::persistence_error(format!("invalid JUnit XML report: {}", e), path, None)
    })
}

/// Replay report suites as a single lifecycle suite
pub fn replay(suites: &[ReportSuite], lifecycle: &mut dyn TestLifecycle) {
    lifecycle.on_suite_start();
    for case in suites.iter().flat_map(|s| s.cases.iter()) {
        let id = case.test_id();
        lifecycle.on_test_start(&id);
        match &case.outcome {
            CaseOutcome::Passed => {}
            CaseOutcome::Failed(message) => lifecycle.on_test_failure(&id, message),
            CaseOutcome::Errored(message) => lifecycle.on_test_error(&id, message),
            CaseOutcome::Skipped => lifecycle.on_test_skipped(&id),
        }
        lifecycle.on_test_end(&id, case.time);
    }
    lifecycle.on_suite_end();
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Failure,
    Error,
}

/// Parse JUnit XML output
///
/// Reads XML events, so the layout of the document does not matter: one
/// element per line (GoogleTest, JUnit, cargo-nextest) and single-line
/// documents (pytest) give the same cases.
pub fn parse_report(content: &str) -> Result<Vec<ReportSuite>, quick_xml::Error> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut builder = ReportBuilder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => builder.open(&e, false)?,
            Event::Empty(e) => builder.open(&e, true)?,
            Event::Text(t) => builder.text(&t.unescape()?),
            Event::CData(c) => builder.text(&String::from_utf8_lossy(&c)),
            Event::End(e) => builder.close(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(builder.finish())
}

#[derive(Default)]
struct ReportBuilder {
    suites: Vec<ReportSuite>,
    suite: Option<ReportSuite>,
    case: Option<ReportCase>,
    section: Option<Section>,
    trace: String,
}

impl ReportBuilder {
    fn open(&mut self, element: &BytesStart<'_>, empty: bool) -> Result<(), quick_xml::Error> {
        match element.name().as_ref() {
            b"testsuite" => {
                self.close_suite();
                self.suite = Some(ReportSuite {
                    name: attr(element, "name")?.unwrap_or_else(|| "Unknown".to_string()),
                    cases: Vec::new(),
                });
                if empty {
                    self.close_suite();
                }
            }
            b"testcase" => {
                self.close_case();
                self.case = Some(ReportCase {
                    name: attr(element, "name")?.unwrap_or_else(|| "Unknown".to_string()),
                    classname: attr(element, "classname")?.unwrap_or_default(),
                    time: attr(element, "time")?
                        .and_then(|t| t.parse::<f64>().ok())
                        .unwrap_or(0.0),
                    outcome: CaseOutcome::Passed,
                });
                // Self-closing (passed)
                if empty {
                    self.close_case();
                }
            }
            b"failure" | b"error" => {
                let section = if element.name().as_ref() == b"failure" {
                    Section::Failure
                } else {
                    Section::Error
                };
                self.trace = header(element)?;
                self.section = Some(section);
                if empty {
                    self.close_section();
                }
            }
            b"skipped" => {
                if let Some(case) = self.case.as_mut() {
                    case.outcome = CaseOutcome::Skipped;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Body of a failure or error element
    fn text(&mut self, text: &str) {
        if self.section.is_none() {
            return;
        }
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if !self.trace.is_empty() {
                self.trace.push('\n');
            }
            self.trace.push_str(line);
        }
    }

    fn close(&mut self, name: &[u8]) {
        match name {
            b"failure" | b"error" => self.close_section(),
            b"testcase" => self.close_case(),
            b"testsuite" => self.close_suite(),
            _ => {}
        }
    }

    fn close_section(&mut self) {
        let (Some(section), Some(case)) = (self.section.take(), self.case.as_mut()) else {
            return;
        };
        let trace = std::mem::take(&mut self.trace).trim_end().to_string();
        case.outcome = match section {
            Section::Failure => CaseOutcome::Failed(trace),
            Section::Error => CaseOutcome::Errored(trace),
        };
    }

    fn close_case(&mut self) {
        let Some(case) = self.case.take() else {
            return;
        };
        self.suite
            .get_or_insert_with(|| ReportSuite {
                name: "Unknown".to_string(),
                cases: Vec::new(),
            })
            .cases
            .push(case);
    }

    fn close_suite(&mut self) {
        self.close_case();
        if let Some(suite) = self.suite.take() {
            self.suites.push(suite);
        }
    }

    fn finish(mut self) -> Vec<ReportSuite> {
        self.close_suite();
        self.suites
    }
}

/// `type: message` header of a failure element
fn header(element: &BytesStart<'_>) -> Result<String, quick_xml::Error> {
    let message = attr(element, "message")?.unwrap_or_default();
    Ok(match attr(element, "type")? {
        Some(kind) if !kind.is_empty() => format!("{}: {}", kind, message),
        _ => message,
    })
}

/// Unescaped value of an attribute
fn attr(element: &BytesStart<'_>, key: &str) -> Result<Option<String>, quick_xml::Error> {
    for attribute in element.attributes() {
        let attribute = attribute?;
        if attribute.key.as_ref() == key.as_bytes() {
            return Ok(Some(attribute.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}
