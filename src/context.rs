//! Per-test-case state: the status machine, the log buffer, and the
//! stop-now control primitive.
//!
//! A `CallContext` is owned by exactly one test case and mutated only from
//! that case's thread, so nothing here takes a lock. The runner in
//! [`crate::harness`] constructs one per case and reads it back after the
//! body returns or unwinds.

use std::fmt;
use std::panic::{self, Location};

/// Lifecycle status of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    /// Body still executing, no verdict recorded yet.
    #[default]
    Running,
    /// Marked successful.
    Succeeded,
    /// Marked failed.
    Failed,
}

/// Marker payload carried by the stop-now unwind.
///
/// Private to the crate: only the case runner may observe it, so the
/// unwind can never be absorbed by test code.
pub(crate) struct StopNow;

/// Mutable per-test-case state handed to every test body.
///
/// Tracks pass/fail status and buffered log output, and provides the
/// assertion surface (see [`crate::check`]) plus the stop-now primitive
/// that aborts the remainder of the body.
///
/// # Example
///
/// ```
/// use attest::{CallContext, Status};
///
/// let mut t = CallContext::new();
/// t.log("starting");
/// t.fail();
/// assert!(t.failed());
/// assert_eq!(t.status(), Status::Failed);
/// ```
#[derive(Debug, Default)]
pub struct CallContext {
    status: Status,
    expected_failure: Option<String>,
    log: String,
}

impl CallContext {
    /// Create a fresh context in the `Running` state with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// `true` once the case has been marked failed.
    pub fn failed(&self) -> bool {
        self.status == Status::Failed
    }

    /// Mark the case failed. Idempotent; no side effect beyond status.
    ///
    /// Status is a plain last-write field: a later [`succeed`](Self::succeed)
    /// overwrites an earlier `fail`.
    pub fn fail(&mut self) {
        self.status = Status::Failed;
    }

    /// Mark the case successful. Idempotent.
    pub fn succeed(&mut self) {
        self.status = Status::Succeeded;
    }

    /// Mark the case failed and abort the rest of the body.
    pub fn fail_now(&mut self) -> ! {
        self.fail();
        self.stop_now()
    }

    /// Mark the case successful and abort the rest of the body.
    pub fn succeed_now(&mut self) -> ! {
        self.succeed();
        self.stop_now()
    }

    /// Abort the remainder of the current test body and return control to
    /// the case runner. Does not alter status; callers set status first.
    ///
    /// Unwinds only the calling thread's stack, via a panic carrying a
    /// private marker caught exclusively by [`crate::harness::run_case`].
    pub fn stop_now(&self) -> ! {
        panic::panic_any(StopNow)
    }

    /// Annotate the case so the runner reclassifies an eventual failure as
    /// expected. Purely a data-setter here; consumed by the runner.
    pub fn expect_failure(&mut self, reason: impl Into<String>) {
        self.expected_failure = Some(reason.into());
    }

    /// The expected-failure annotation, if any.
    pub fn expected_failure(&self) -> Option<&str> {
        self.expected_failure.as_deref()
    }

    // =========================================================================
    // Logging
    // =========================================================================

    /// Append one line to the case log.
    pub fn log(&mut self, message: impl fmt::Display) {
        self.log.push_str(&message.to_string());
        self.log.push('\n');
    }

    /// Append one formatted line to the case log.
    ///
    /// # Example
    ///
    /// ```
    /// use attest::CallContext;
    ///
    /// let mut t = CallContext::new();
    /// t.logf(format_args!("retry {} of {}", 1, 3));
    /// assert_eq!(t.get_log(), "retry 1 of 3\n");
    /// ```
    pub fn logf(&mut self, args: fmt::Arguments<'_>) {
        self.log(args);
    }

    /// The full log buffer, lines in call order.
    pub fn get_log(&self) -> &str {
        &self.log
    }

    /// Log an error message attributed to the caller and mark the case
    /// failed.
    #[track_caller]
    pub fn error(&mut self, message: impl fmt::Display) {
        self.log_caller(Location::caller(), &format!("Error: {message}"));
        self.fail();
    }

    /// Formatted variant of [`error`](Self::error).
    #[track_caller]
    pub fn errorf(&mut self, args: fmt::Arguments<'_>) {
        self.log_caller(Location::caller(), &format!("Error: {args}"));
        self.fail();
    }

    /// Log an error message attributed to the caller, mark the case failed,
    /// and abort the rest of the body.
    #[track_caller]
    pub fn fatal(&mut self, message: impl fmt::Display) -> ! {
        self.log_caller(Location::caller(), &format!("Error: {message}"));
        self.fail_now()
    }

    /// Formatted variant of [`fatal`](Self::fatal).
    #[track_caller]
    pub fn fatalf(&mut self, args: fmt::Arguments<'_>) -> ! {
        self.log_caller(Location::caller(), &format!("Error: {args}"));
        self.fail_now()
    }

    // =========================================================================
    // Diagnostic sink (crate-internal)
    // =========================================================================
    //
    // Every assertion captures `Location::caller()` behind `#[track_caller]`
    // at its public entry point and threads it down explicitly, so the
    // location line always points at the user's call site.

    pub(crate) fn log_caller(&mut self, location: &'static Location<'static>, summary: &str) {
        self.log
            .push_str(&format!("{}:{}:\n", location.file(), location.line()));
        self.log_string(summary);
    }

    pub(crate) fn log_string(&mut self, text: &str) {
        for line in text.lines() {
            self.log.push_str("    ");
            self.log.push_str(line);
            self.log.push('\n');
        }
    }

    pub(crate) fn log_value(&mut self, label: &str, description: &str) {
        self.log_string(&format!("{label} {description}"));
    }

    pub(crate) fn log_newline(&mut self) {
        self.log.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running_with_empty_log() {
        let t = CallContext::new();
        assert_eq!(t.status(), Status::Running);
        assert!(!t.failed());
        assert_eq!(t.get_log(), "");
    }

    #[test]
    fn fail_is_idempotent() {
        let mut t = CallContext::new();
        t.fail();
        t.fail();
        assert_eq!(t.status(), Status::Failed);
    }

    #[test]
    fn succeed_is_idempotent() {
        let mut t = CallContext::new();
        t.succeed();
        t.succeed();
        assert_eq!(t.status(), Status::Succeeded);
    }

    #[test]
    fn status_is_last_write() {
        // Deliberate: a later succeed overwrites an earlier fail.
        let mut t = CallContext::new();
        t.fail();
        t.succeed();
        assert_eq!(t.status(), Status::Succeeded);
    }

    #[test]
    fn log_keeps_lines_in_call_order() {
        let mut t = CallContext::new();
        t.log("a");
        t.log("b");
        assert_eq!(t.get_log(), "a\nb\n");
    }

    #[test]
    fn logf_formats_into_one_line() {
        let mut t = CallContext::new();
        t.logf(format_args!("{}-{}", "x", 9));
        assert_eq!(t.get_log(), "x-9\n");
    }

    #[test]
    fn error_logs_location_and_fails_softly() {
        let mut t = CallContext::new();
        t.error("boom");
        assert!(t.failed());
        let log = t.get_log();
        assert!(log.contains("context.rs"));
        assert!(log.contains("    Error: boom\n"));
    }

    #[test]
    fn expect_failure_is_just_data() {
        let mut t = CallContext::new();
        assert_eq!(t.expected_failure(), None);
        t.expect_failure("known flake");
        assert_eq!(t.expected_failure(), Some("known flake"));
        assert_eq!(t.status(), Status::Running);
    }

    #[test]
    fn sink_indents_and_separates() {
        let mut t = CallContext::new();
        t.log_string("summary:");
        t.log_value("Obtained", "(i32): 1");
        t.log_newline();
        assert_eq!(t.get_log(), "    summary:\n    Obtained (i32): 1\n\n");
    }

    #[test]
    fn context_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CallContext>();
    }
}
