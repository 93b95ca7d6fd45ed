//! # attest
//!
//! A per-test-case assertion and reporting context for test harnesses.
//!
//! Each running case owns a [`CallContext`] tracking pass/fail status and
//! buffered log output. Assertions come in two flavors: `check_*` records
//! a failure and returns a `bool` so the body can keep going, while
//! `assert_*` stops the case on the spot. Every failure produces a
//! caller-located diagnostic block in the case log.
//!
//! ## Quick Start
//!
//! ```
//! use attest::{run_case, CaseOutcome};
//!
//! let report = run_case("arithmetic", |t| {
//!     t.check_equal(&(2 + 2), &4);
//!     t.assert_equal(&"ok", &"ok");
//!     Ok(())
//! });
//! assert_eq!(report.outcome, CaseOutcome::Passed);
//! ```
//!
//! ## Checking errors
//!
//! Error expectations support three shapes: no error, an exact value, or
//! an anchored regular expression over the error's text.
//!
//! ```
//! use attest::{run_case, ErrorExpectation};
//!
//! let report = run_case("refused", |t| {
//!     let err = "connection refused".to_string();
//!     t.check_err(Some(&err), ErrorExpectation::pattern("connection .*"));
//!     t.check_err(None::<&String>, ErrorExpectation::absent());
//!     Ok(())
//! });
//! assert!(report.passed());
//! ```
//!
//! ## Soft failures and short circuits
//!
//! ```
//! use attest::{run_case, CaseOutcome};
//!
//! let report = run_case("short-circuit", |t| {
//!     t.log("before");
//!     t.fatal("giving up");
//! });
//! assert_eq!(report.outcome, CaseOutcome::Failed);
//! assert!(report.log.contains("Error: giving up"));
//! ```

pub mod check;
pub mod compare;
pub mod context;
pub mod harness;
pub mod pattern;

// Core types
pub use check::ErrorExpectation;
pub use compare::{equal_values, TestValue};
pub use context::{CallContext, Status};
pub use harness::{run_case, CaseOutcome, CaseReport};
pub use pattern::PatternError;
