//! The comparison assertion surface.
//!
//! `check_*` methods record a failure and return a `bool` so the body can
//! decide whether to continue; `assert_*` methods additionally stop the
//! case via [`CallContext::stop_now`]. Every variant funnels through the
//! same internal checker, and every public entry point is `#[track_caller]`
//! so diagnostics point at the user's call site.

use std::any::TypeId;
use std::fmt;
use std::panic::Location;

use serde_json::Value;

use crate::compare::{self, equal_values, TestValue};
use crate::context::CallContext;
use crate::pattern::match_anchored;

/// What an error checker should find: nothing, an exact value, or text
/// matching an anchored regular expression.
///
/// The exact-value form erases its type at construction, capturing the
/// concrete type identity for the same-type gate and a rendering for
/// diagnostics.
///
/// # Example
///
/// ```
/// use attest::{run_case, ErrorExpectation};
///
/// let report = run_case("refused", |t| {
///     let err = Some("connection refused".to_string());
///     t.check_err(err.as_ref(), ErrorExpectation::pattern("connection .*"));
///     t.check_err(None::<&String>, ErrorExpectation::absent());
///     Ok(())
/// });
/// assert!(report.passed());
/// ```
#[derive(Debug)]
pub struct ErrorExpectation(Expected);

#[derive(Debug)]
enum Expected {
    Absent,
    Value {
        type_id: TypeId,
        value: Value,
        description: String,
    },
    Pattern(String),
}

impl ErrorExpectation {
    /// Expect no error at all.
    pub fn absent() -> Self {
        Self(Expected::Absent)
    }

    /// Expect exactly this value, under the same type-identity and
    /// equality rules as [`CallContext::check_equal`].
    pub fn value<E: TestValue>(expected: &E) -> Self {
        Self(Expected::Value {
            type_id: TypeId::of::<E>(),
            value: compare::lower(expected),
            description: compare::describe(expected),
        })
    }

    /// Expect the error's text to match `pattern`, anchored over the whole
    /// string.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self(Expected::Pattern(pattern.into()))
    }

    fn shape(&self) -> &'static str {
        match self.0 {
            Expected::Absent => "none",
            Expected::Value { .. } | Expected::Pattern(_) => "expected",
        }
    }
}

impl CallContext {
    // =========================================================================
    // Equality assertions
    // =========================================================================

    /// Check that `obtained` and `expected` are the same concrete type and
    /// structurally equal. On mismatch, logs a diagnostic block and marks
    /// the case failed.
    ///
    /// # Example
    ///
    /// ```
    /// use attest::CallContext;
    ///
    /// let mut t = CallContext::new();
    /// assert!(t.check_equal(&(2 + 2), &4));
    /// assert!(!t.check_equal(&"north", &"south"));
    /// assert!(t.failed());
    /// ```
    #[track_caller]
    pub fn check_equal<A: TestValue, B: TestValue>(&mut self, obtained: &A, expected: &B) -> bool {
        self.internal_check_equal(
            obtained,
            expected,
            true,
            "check_equal(obtained, expected):",
            None,
            Location::caller(),
        )
    }

    /// [`check_equal`](Self::check_equal) with an extra diagnostic message
    /// appended to the failure block.
    #[track_caller]
    pub fn check_equal_with<A: TestValue, B: TestValue>(
        &mut self,
        obtained: &A,
        expected: &B,
        issue: impl fmt::Display,
    ) -> bool {
        self.internal_check_equal(
            obtained,
            expected,
            true,
            "check_equal(obtained, expected):",
            Some(&issue),
            Location::caller(),
        )
    }

    /// Check that `obtained` and `expected` differ in type or value.
    #[track_caller]
    pub fn check_not_equal<A: TestValue, B: TestValue>(
        &mut self,
        obtained: &A,
        unexpected: &B,
    ) -> bool {
        self.internal_check_equal(
            obtained,
            unexpected,
            false,
            "check_not_equal(obtained, unexpected):",
            None,
            Location::caller(),
        )
    }

    /// [`check_not_equal`](Self::check_not_equal) with an extra diagnostic
    /// message.
    #[track_caller]
    pub fn check_not_equal_with<A: TestValue, B: TestValue>(
        &mut self,
        obtained: &A,
        unexpected: &B,
        issue: impl fmt::Display,
    ) -> bool {
        self.internal_check_equal(
            obtained,
            unexpected,
            false,
            "check_not_equal(obtained, unexpected):",
            Some(&issue),
            Location::caller(),
        )
    }

    /// Like [`check_equal`](Self::check_equal), but stops the case on
    /// mismatch: no code after the call executes.
    #[track_caller]
    pub fn assert_equal<A: TestValue, B: TestValue>(&mut self, obtained: &A, expected: &B) {
        if !self.internal_check_equal(
            obtained,
            expected,
            true,
            "assert_equal(obtained, expected):",
            None,
            Location::caller(),
        ) {
            self.stop_now();
        }
    }

    /// [`assert_equal`](Self::assert_equal) with an extra diagnostic
    /// message.
    #[track_caller]
    pub fn assert_equal_with<A: TestValue, B: TestValue>(
        &mut self,
        obtained: &A,
        expected: &B,
        issue: impl fmt::Display,
    ) {
        if !self.internal_check_equal(
            obtained,
            expected,
            true,
            "assert_equal(obtained, expected):",
            Some(&issue),
            Location::caller(),
        ) {
            self.stop_now();
        }
    }

    /// Like [`check_not_equal`](Self::check_not_equal), but stops the case
    /// on an unwanted match.
    #[track_caller]
    pub fn assert_not_equal<A: TestValue, B: TestValue>(&mut self, obtained: &A, unexpected: &B) {
        if !self.internal_check_equal(
            obtained,
            unexpected,
            false,
            "assert_not_equal(obtained, unexpected):",
            None,
            Location::caller(),
        ) {
            self.stop_now();
        }
    }

    /// [`assert_not_equal`](Self::assert_not_equal) with an extra
    /// diagnostic message.
    #[track_caller]
    pub fn assert_not_equal_with<A: TestValue, B: TestValue>(
        &mut self,
        obtained: &A,
        unexpected: &B,
        issue: impl fmt::Display,
    ) {
        if !self.internal_check_equal(
            obtained,
            unexpected,
            false,
            "assert_not_equal(obtained, unexpected):",
            Some(&issue),
            Location::caller(),
        ) {
            self.stop_now();
        }
    }

    // =========================================================================
    // Error assertions
    // =========================================================================

    /// Check an obtained error against an [`ErrorExpectation`].
    ///
    /// `None` means "no error occurred". The `Display` bound supplies the
    /// candidate text for pattern expectations.
    #[track_caller]
    pub fn check_err<O>(&mut self, obtained: Option<&O>, expected: ErrorExpectation) -> bool
    where
        O: TestValue + fmt::Display,
    {
        let summary = format!("check_err(error, {}):", expected.shape());
        self.internal_check_err(obtained, &expected.0, &summary, None, Location::caller())
    }

    /// [`check_err`](Self::check_err) with an extra diagnostic message.
    #[track_caller]
    pub fn check_err_with<O>(
        &mut self,
        obtained: Option<&O>,
        expected: ErrorExpectation,
        issue: impl fmt::Display,
    ) -> bool
    where
        O: TestValue + fmt::Display,
    {
        let summary = format!("check_err(error, {}):", expected.shape());
        self.internal_check_err(
            obtained,
            &expected.0,
            &summary,
            Some(&issue),
            Location::caller(),
        )
    }

    /// Like [`check_err`](Self::check_err), but stops the case on failure.
    #[track_caller]
    pub fn assert_err<O>(&mut self, obtained: Option<&O>, expected: ErrorExpectation)
    where
        O: TestValue + fmt::Display,
    {
        let summary = format!("assert_err(error, {}):", expected.shape());
        if !self.internal_check_err(obtained, &expected.0, &summary, None, Location::caller()) {
            self.stop_now();
        }
    }

    /// [`assert_err`](Self::assert_err) with an extra diagnostic message.
    #[track_caller]
    pub fn assert_err_with<O>(
        &mut self,
        obtained: Option<&O>,
        expected: ErrorExpectation,
        issue: impl fmt::Display,
    ) where
        O: TestValue + fmt::Display,
    {
        let summary = format!("assert_err(error, {}):", expected.shape());
        if !self.internal_check_err(
            obtained,
            &expected.0,
            &summary,
            Some(&issue),
            Location::caller(),
        ) {
            self.stop_now();
        }
    }

    // =========================================================================
    // Internal checkers
    // =========================================================================

    fn internal_check_equal<A: TestValue, B: TestValue>(
        &mut self,
        obtained: &A,
        expected: &B,
        equal: bool,
        summary: &str,
        issue: Option<&dyn fmt::Display>,
        location: &'static Location<'static>,
    ) -> bool {
        let matched = compare::same_type(obtained, expected)
            && equal_values(&compare::lower(obtained), &compare::lower(expected));
        if matched == equal {
            return true;
        }
        self.log_caller(location, summary);
        if equal {
            self.log_value("Obtained", &compare::describe(obtained));
            self.log_value("Expected", &compare::describe(expected));
        } else {
            self.log_value("Both", &compare::describe(obtained));
        }
        if let Some(issue) = issue {
            self.log_string(&issue.to_string());
        }
        self.log_newline();
        self.fail();
        false
    }

    fn internal_check_err<O>(
        &mut self,
        obtained: Option<&O>,
        expected: &Expected,
        summary: &str,
        issue: Option<&dyn fmt::Display>,
        location: &'static Location<'static>,
    ) -> bool
    where
        O: TestValue + fmt::Display,
    {
        match expected {
            Expected::Pattern(pattern) => {
                // An absent error has no text; a pattern can only mismatch.
                let verdict = match obtained {
                    Some(value) => match_anchored(pattern, &value.to_string()),
                    None => Ok(false),
                };
                match verdict {
                    Ok(true) => true,
                    Ok(false) => {
                        self.log_caller(location, summary);
                        self.log_value("Error", &describe_obtained(obtained));
                        self.log_string(&format!("Expected to match expression: {pattern:?}"));
                        self.finish_err_failure(issue)
                    }
                    Err(err) => {
                        self.log_caller(location, summary);
                        self.log_string(&err.to_string());
                        self.finish_err_failure(issue)
                    }
                }
            }
            Expected::Absent => {
                if obtained.is_none() {
                    return true;
                }
                self.log_caller(location, summary);
                self.log_value("Error", &describe_obtained(obtained));
                self.finish_err_failure(issue)
            }
            Expected::Value {
                type_id,
                value,
                description,
            } => {
                let matched = obtained.is_some_and(|o| {
                    TypeId::of::<O>() == *type_id && equal_values(&compare::lower(o), value)
                });
                if matched {
                    return true;
                }
                self.log_caller(location, summary);
                self.log_value("Error", &describe_obtained(obtained));
                self.log_value("Expected", description);
                self.finish_err_failure(issue)
            }
        }
    }

    fn finish_err_failure(&mut self, issue: Option<&dyn fmt::Display>) -> bool {
        if let Some(issue) = issue {
            self.log_string(&issue.to_string());
        }
        self.log_newline();
        self.fail();
        false
    }
}

fn describe_obtained<O: TestValue>(obtained: Option<&O>) -> String {
    match obtained {
        Some(value) => compare::describe(value),
        None => "(none)".to_string(),
    }
}
