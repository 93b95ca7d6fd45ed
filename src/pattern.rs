//! Anchored pattern matching for error expectations.

use regex::Regex;
use thiserror::Error;

/// A match expression that failed to compile.
///
/// Reported by the error checkers with a distinct diagnostic so a broken
/// pattern is never mistaken for a genuine mismatch.
#[derive(Debug, Error)]
#[error("cannot compile match expression: {0}")]
pub struct PatternError(#[from] regex::Error);

/// Match `candidate` against `pattern`, anchored over the whole string.
///
/// The pattern is wrapped as `^(?:pattern)$` so alternations anchor as a
/// unit.
pub(crate) fn match_anchored(pattern: &str, candidate: &str) -> Result<bool, PatternError> {
    let re = Regex::new(&format!("^(?:{pattern})$"))?;
    Ok(re.is_match(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_whole_string_only() {
        assert!(match_anchored("connection .*", "connection refused").unwrap());
        assert!(!match_anchored("connection", "connection refused").unwrap());
        assert!(!match_anchored("refused", "connection refused").unwrap());
    }

    #[test]
    fn alternations_anchor_as_a_unit() {
        assert!(match_anchored("a|bc", "bc").unwrap());
        assert!(!match_anchored("a|bc", "abc").unwrap());
    }

    #[test]
    fn malformed_pattern_is_a_compile_error() {
        let err = match_anchored("(", "anything").unwrap_err();
        assert!(err.to_string().contains("cannot compile match expression"));
    }
}
