//! Two-tier value equality used by every comparison assertion.
//!
//! Assertion inputs are lowered to `serde_json::Value` and compared in two
//! tiers: a shallow fast tier decides scalar shapes outright, and composite
//! shapes (arrays, objects) fall back to a recursive structural traversal.
//! The value form is a finite tree, so cyclic references cannot occur and
//! the traversal needs no cycle guard.

use serde::Serialize;
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::fmt::Debug;

/// Capability bound for values that can appear in comparison assertions.
///
/// Blanket-implemented for every eligible type: `Serialize` provides the
/// structural view used for deep comparison, `Debug` the rendering of last
/// resort, and `'static` the concrete type identity that gates equality.
pub trait TestValue: Serialize + Debug + 'static {}

impl<T: Serialize + Debug + 'static> TestValue for T {}

/// Compare two lowered values for structural equality.
///
/// Numbers compare numerically rather than by representation, in both
/// tiers, so nesting depth cannot change a verdict.
///
/// # Example
///
/// ```
/// use attest::equal_values;
/// use serde_json::json;
///
/// assert!(equal_values(&json!({"a": [1, 2]}), &json!({"a": [1, 2]})));
/// assert!(!equal_values(&json!([1, 2]), &json!([2, 1])));
/// ```
pub fn equal_values(a: &Value, b: &Value) -> bool {
    match shallow_eq(a, b) {
        Some(decided) => decided,
        None => deep_eq(a, b),
    }
}

/// Fast tier. `None` means the pair cannot be decided without walking its
/// contents.
fn shallow_eq(a: &Value, b: &Value) -> Option<bool> {
    match (a, b) {
        (Value::Null, Value::Null) => Some(true),
        (Value::Bool(x), Value::Bool(y)) => Some(x == y),
        (Value::Number(x), Value::Number(y)) => Some(numbers_eq(x, y)),
        (Value::String(x), Value::String(y)) => Some(x == y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => None,
        // Mismatched shape kinds never compare equal.
        _ => Some(false),
    }
}

/// Deep tier: shape kind plus element-wise recursion.
fn deep_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| equal_values(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| equal_values(x, y)))
        }
        _ => false,
    }
}

/// `serde_json::Number` equality is representation-sensitive (`1` vs `1.0`);
/// compare through the widest exact view available.
fn numbers_eq(x: &serde_json::Number, y: &serde_json::Number) -> bool {
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x == y;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// Lower a test value to the dynamic value form.
///
/// Shapes the serializer cannot express (e.g. maps with non-string keys)
/// degrade to their debug rendering instead of erroring, so an
/// uncomparable value can never crash a test run.
pub(crate) fn lower<T: TestValue>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|_| Value::String(format!("{value:?}")))
}

/// `true` when both sides are the same concrete Rust type.
pub(crate) fn same_type<A: TestValue, B: TestValue>(_a: &A, _b: &B) -> bool {
    TypeId::of::<A>() == TypeId::of::<B>()
}

/// Render a value with its concrete type for diagnostics, e.g.
/// `(i32): 42`.
pub(crate) fn describe<T: TestValue>(value: &T) -> String {
    format!("({}): {}", type_name::<T>(), lower(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn scalars_decided_by_fast_tier() {
        assert!(equal_values(&json!(null), &json!(null)));
        assert!(equal_values(&json!(true), &json!(true)));
        assert!(equal_values(&json!("x"), &json!("x")));
        assert!(!equal_values(&json!("x"), &json!("y")));
        assert!(!equal_values(&json!(1), &json!(2)));
    }

    #[test]
    fn mismatched_shapes_are_never_equal() {
        assert!(!equal_values(&json!(1), &json!("1")));
        assert!(!equal_values(&json!(null), &json!(false)));
        assert!(!equal_values(&json!([1]), &json!({"0": 1})));
    }

    #[test]
    fn numbers_compare_numerically_at_any_depth() {
        assert!(equal_values(&json!(1), &json!(1.0)));
        assert!(equal_values(&json!({"n": 1}), &json!({"n": 1.0})));
        assert!(!equal_values(&json!(1), &json!(1.5)));
        assert!(equal_values(&json!(u64::MAX), &json!(u64::MAX)));
        assert!(!equal_values(&json!(-1), &json!(u64::MAX)));
    }

    #[test]
    fn composites_resolve_through_deep_tier() {
        let a = json!({"host": "db", "ports": [5432, 5433], "tags": {"env": "ci"}});
        let b = json!({"host": "db", "ports": [5432, 5433], "tags": {"env": "ci"}});
        assert!(equal_values(&a, &b));

        let c = json!({"host": "db", "ports": [5432], "tags": {"env": "ci"}});
        assert!(!equal_values(&a, &c));
    }

    #[test]
    fn object_key_sets_must_match() {
        assert!(!equal_values(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!equal_values(&json!({"a": 1, "b": 2}), &json!({"a": 1})));
    }

    #[test]
    fn unserializable_values_degrade_to_debug_rendering() {
        // Tuple keys cannot become JSON object keys.
        let mut a: BTreeMap<(i32, i32), &str> = BTreeMap::new();
        a.insert((1, 2), "corner");
        let b = a.clone();
        assert!(equal_values(&lower(&a), &lower(&b)));

        let mut c = a.clone();
        c.insert((3, 4), "other");
        assert!(!equal_values(&lower(&a), &lower(&c)));
    }

    #[test]
    fn type_identity_is_a_separate_gate() {
        assert!(same_type(&1i64, &2i64));
        assert!(!same_type(&1u32, &1i64));
        assert!(!same_type(&"s", &String::from("s")));
    }

    #[test]
    fn describe_names_the_concrete_type() {
        assert_eq!(describe(&7i32), "(i32): 7");
        assert!(describe(&String::from("hi")).ends_with(": \"hi\""));
    }
}
