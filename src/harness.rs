//! Per-case invocation wrapper.
//!
//! [`run_case`] gives a test body a fresh [`CallContext`], catches the
//! stop-now unwind (and genuine panics), folds the body's `Result` into the
//! status, and resolves the final [`CaseOutcome`] — including downgrading a
//! failure to [`CaseOutcome::ExpectedFailure`] when the body announced one.
//!
//! Each case runs on its own thread of control and owns its context
//! exclusively; a stop-now unwind never crosses into sibling cases.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use anyhow::Result;

use crate::context::{CallContext, Status, StopNow};

/// Final verdict for one executed case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    /// Completed with a successful status.
    Passed,
    /// Marked failed by an assertion, `fail`, or a body error.
    Failed,
    /// Failed while an expected-failure annotation was set.
    ExpectedFailure {
        /// The reason given to [`CallContext::expect_failure`].
        reason: String,
    },
    /// Completed successfully despite an expected-failure annotation.
    UnexpectedSuccess {
        /// The reason given to [`CallContext::expect_failure`].
        reason: String,
    },
    /// The body panicked with something other than the stop-now marker.
    Panicked {
        /// The panic payload, when it carried a message.
        message: String,
    },
}

/// Everything the harness reads back from one executed case.
#[derive(Debug, Clone)]
pub struct CaseReport {
    /// Case name as given to [`run_case`].
    pub name: String,
    /// Final verdict.
    pub outcome: CaseOutcome,
    /// The full case log, lines in call order.
    pub log: String,
}

impl CaseReport {
    /// `true` for outcomes that should not fail a run: [`CaseOutcome::Passed`]
    /// and [`CaseOutcome::ExpectedFailure`].
    pub fn passed(&self) -> bool {
        matches!(
            self.outcome,
            CaseOutcome::Passed | CaseOutcome::ExpectedFailure { .. }
        )
    }
}

static STOP_HOOK: Once = Once::new();

/// Keep the default panic hook quiet for the stop-now marker; every other
/// panic still reaches the previously installed hook.
fn install_stop_hook() {
    STOP_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if info.payload().downcast_ref::<StopNow>().is_none() {
                previous(info);
            }
        }));
    });
}

/// Run one test body against a fresh [`CallContext`] and report the result.
///
/// The body returns `anyhow::Result<()>` so fallible setup can use `?`; an
/// `Err` is logged and counts as a failure. A body that completes without
/// recording a verdict is successful.
///
/// # Example
///
/// ```
/// use attest::{run_case, CaseOutcome};
///
/// let report = run_case("arithmetic", |t| {
///     t.check_equal(&(2 + 2), &4);
///     t.assert_not_equal(&"left", &"right");
///     Ok(())
/// });
/// assert_eq!(report.outcome, CaseOutcome::Passed);
/// ```
pub fn run_case<F>(name: impl Into<String>, body: F) -> CaseReport
where
    F: FnOnce(&mut CallContext) -> Result<()>,
{
    install_stop_hook();
    let mut ctx = CallContext::new();
    let mut panic_message = None;

    match panic::catch_unwind(AssertUnwindSafe(|| body(&mut ctx))) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            ctx.log(format!("Error: {err:#}"));
            ctx.fail();
        }
        Err(payload) => {
            if payload.downcast_ref::<StopNow>().is_none() {
                panic_message = Some(payload_text(payload.as_ref()));
                ctx.fail();
            }
            // StopNow: status was already set by the caller.
        }
    }

    if ctx.status() == Status::Running {
        ctx.succeed();
    }

    let outcome = resolve_outcome(&mut ctx, panic_message);
    CaseReport {
        name: name.into(),
        outcome,
        log: ctx.get_log().to_string(),
    }
}

fn resolve_outcome(ctx: &mut CallContext, panic_message: Option<String>) -> CaseOutcome {
    if let Some(message) = panic_message {
        ctx.log(format!("Panic: {message}"));
        return CaseOutcome::Panicked { message };
    }
    let expected = ctx.expected_failure().map(str::to_string);
    match (ctx.status(), expected) {
        (Status::Failed, Some(reason)) => CaseOutcome::ExpectedFailure { reason },
        (Status::Failed, None) => CaseOutcome::Failed,
        (_, Some(reason)) => {
            ctx.log(format!(
                "Error: succeeded, but failure was expected: {reason}"
            ));
            CaseOutcome::UnexpectedSuccess { reason }
        }
        (_, None) => CaseOutcome::Passed,
    }
}

fn payload_text(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_body_passes() {
        let report = run_case("clean", |t| {
            t.log("fine");
            Ok(())
        });
        assert_eq!(report.outcome, CaseOutcome::Passed);
        assert_eq!(report.log, "fine\n");
    }

    #[test]
    fn body_error_is_logged_and_fails() {
        let report = run_case("errs", |_| anyhow::bail!("setup exploded"));
        assert_eq!(report.outcome, CaseOutcome::Failed);
        assert!(report.log.contains("Error: setup exploded"));
    }

    #[test]
    fn fail_now_stops_the_body() {
        let report = run_case("stops", |t| {
            t.fail_now();
        });
        assert_eq!(report.outcome, CaseOutcome::Failed);
    }

    #[test]
    fn succeed_now_stops_the_body_successfully() {
        let report = run_case("short", |t| {
            t.succeed_now();
        });
        assert_eq!(report.outcome, CaseOutcome::Passed);
    }

    #[test]
    fn stray_panic_is_reported_not_propagated() {
        let report = run_case("panics", |_| panic!("boom at line 3"));
        assert_eq!(
            report.outcome,
            CaseOutcome::Panicked {
                message: "boom at line 3".to_string()
            }
        );
        assert!(report.log.contains("Panic: boom at line 3"));
    }

    #[test]
    fn expected_failure_downgrades_a_failed_case() {
        let report = run_case("known", |t| {
            t.expect_failure("tracked upstream");
            t.fail();
            Ok(())
        });
        assert_eq!(
            report.outcome,
            CaseOutcome::ExpectedFailure {
                reason: "tracked upstream".to_string()
            }
        );
        assert!(report.passed());
    }

    #[test]
    fn unexpected_success_is_surfaced() {
        let report = run_case("fixed", |t| {
            t.expect_failure("should still break");
            Ok(())
        });
        assert_eq!(
            report.outcome,
            CaseOutcome::UnexpectedSuccess {
                reason: "should still break".to_string()
            }
        );
        assert!(!report.passed());
        assert!(report.log.contains("failure was expected"));
    }
}
