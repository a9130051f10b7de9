//! Structural matching.
//!
//! Recursive partial-equality between a request's actual body/query and a
//! fixture's declared sample. The sample is a minimum set of required
//! fields: every entry it declares must match recursively, extra entries
//! in the actual value are ignored.

use serde_json::Value;

/// Subset match of `actual` against `sample`.
///
/// Composite samples (objects, arrays) require each declared key/index to
/// be present in `actual` and to match recursively; an empty composite
/// sample matches any composite actual. Scalar samples require the same
/// kind and value. Kind mismatches, including null versus composite and
/// missing keys, are simply no-match. Never errors.
pub fn structural_match(actual: &Value, sample: &Value) -> bool {
    match sample {
        Value::Object(entries) => match actual {
            Value::Object(actual_entries) => entries.iter().all(|(key, sample_value)| {
                actual_entries
                    .get(key)
                    .is_some_and(|actual_value| structural_match(actual_value, sample_value))
            }),
            Value::Array(_) => entries.is_empty(),
            _ => false,
        },
        Value::Array(entries) => match actual {
            Value::Array(actual_entries) => entries.iter().enumerate().all(|(idx, sample_value)| {
                actual_entries
                    .get(idx)
                    .is_some_and(|actual_value| structural_match(actual_value, sample_value))
            }),
            Value::Object(_) => entries.is_empty(),
            _ => false,
        },
        Value::Null => actual.is_null(),
        Value::Bool(b) => actual.as_bool() == Some(*b),
        Value::Number(n) => matches!(actual, Value::Number(m) if m == n),
        Value::String(s) => actual.as_str() == Some(s.as_str()),
    }
}

/// Specificity weight of a sample value.
///
/// Scalars and null count 1; a composite counts its own entry count plus
/// the recursive weights of its children. Used to rank multiple matching
/// fixtures: the one declaring more fields wins.
pub fn specificity(sample: &Value) -> u64 {
    match sample {
        Value::Object(entries) => {
            entries.len() as u64 + entries.values().map(specificity).sum::<u64>()
        }
        Value::Array(entries) => {
            entries.len() as u64 + entries.iter().map(specificity).sum::<u64>()
        }
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_equality() {
        assert!(structural_match(&json!("a"), &json!("a")));
        assert!(!structural_match(&json!("a"), &json!("b")));
        assert!(structural_match(&json!(2), &json!(2)));
        assert!(!structural_match(&json!(2), &json!(3)));
        assert!(structural_match(&json!(true), &json!(true)));
        assert!(structural_match(&json!(null), &json!(null)));
    }

    #[test]
    fn test_kind_mismatch_is_no_match() {
        assert!(!structural_match(&json!("2"), &json!(2)));
        assert!(!structural_match(&json!({}), &json!(null)));
        assert!(!structural_match(&json!(null), &json!({"a": 1})));
        assert!(!structural_match(&json!("x"), &json!({"a": 1})));
    }

    #[test]
    fn test_subset_match_ignores_extra_keys() {
        let actual = json!({"seriesId": "8", "mode": "2", "extra": "ignored"});
        assert!(structural_match(&actual, &json!({"mode": "2"})));
        assert!(structural_match(&actual, &json!({"mode": "2", "seriesId": "8"})));
        assert!(!structural_match(&actual, &json!({"mode": "3"})));
        assert!(!structural_match(&actual, &json!({"missing": "1"})));
    }

    #[test]
    fn test_empty_sample_matches_any_composite() {
        assert!(structural_match(&json!({"a": 1}), &json!({})));
        assert!(structural_match(&json!([1, 2]), &json!({})));
        assert!(structural_match(&json!([]), &json!([])));
        assert!(!structural_match(&json!("scalar"), &json!({})));
        assert!(!structural_match(&json!(null), &json!({})));
    }

    #[test]
    fn test_nested_match() {
        let actual = json!({"user": {"name": "John", "age": 30}, "flags": [1, 2, 3]});
        assert!(structural_match(&actual, &json!({"user": {"name": "John"}})));
        assert!(structural_match(&actual, &json!({"flags": [1]})));
        assert!(!structural_match(&actual, &json!({"user": {"name": "Jane"}})));
        assert!(!structural_match(&actual, &json!({"flags": [2]})));
    }

    #[test]
    fn test_missing_key_with_null_sample_is_no_match() {
        // A declared null requires an explicit null in the actual value.
        assert!(!structural_match(&json!({}), &json!({"gone": null})));
        assert!(structural_match(&json!({"gone": null}), &json!({"gone": null})));
    }

    #[test]
    fn test_specificity_weights() {
        assert_eq!(specificity(&json!({})), 0);
        assert_eq!(specificity(&json!(null)), 1);
        assert_eq!(specificity(&json!("x")), 1);
        assert_eq!(specificity(&json!({"mode": "2"})), 2);
        assert_eq!(specificity(&json!({"mode": "2", "seriesId": "8"})), 4);
        assert_eq!(specificity(&json!({"user": {"name": "John"}})), 3);
        assert_eq!(specificity(&json!([1, 2])), 4);
    }

    #[test]
    fn test_specificity_orders_by_declared_fields() {
        let generic = specificity(&json!({"mode": "2"}));
        let specific = specificity(&json!({"mode": "2", "seriesId": "8"}));
        assert!(specific > generic);
    }
}
