//! Substitution search driver
//!
//! This crate runs a test suite against instrumented modules, records the
//! values every test observes and then searches, per failing test, for a
//! single-site substitution that makes the test pass. Sites where such a
//! substitution exists are ranked by the number of failing tests fixed.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod executor;
pub mod module_executor;
pub mod report;
pub mod search;

pub use error::LocalizeError;
pub use executor::{TestExecutor, TestResult};
pub use module_executor::{ModuleTestExecutor, TEST_ATTRIBUTE};
pub use report::{LocalizationReport, ReportEntry};
pub use search::{
    alternate_values, rank, Baseline, InconclusiveTrial, IvmpCandidate, Localizer, RankedSite,
    SearchOutcome,
};
