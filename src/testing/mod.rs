//! Test result collection
//!
//! This module turns test lifecycle events into a ROX payload:
//! - Descriptor parsing and lookup
//! - Per-suite result accumulation
//! - Payload assembly and wire encoding
//! - Replay of JUnit XML reports

pub mod accumulator;
pub mod annotation;
pub mod encoding;
pub mod junit;
pub mod payload;
pub mod registry;
pub mod results;

pub use accumulator::{ResultAccumulator, SuiteState};
pub use annotation::{RoxableTestDescriptor, TestFlags};
pub use encoding::{WireEncoding, MESSAGE_MAX_LENGTH};
pub use junit::{CaseOutcome, ReportCase, ReportSuite};
pub use payload::{EncodedPayload, ProjectPayload, RunMeta, RunPayload};
pub use registry::{Annotation, DescriptorRegistry, TestAnnotations};
pub use results::{SuiteResults, TestResult};
