//! Parameter cascading for declarative assignment specs.
//!
//! Parameters flow from a wide scope (the assignment) into narrower ones
//! (agent, tools, session). The narrower scope wins on key collision, except
//! that a string value of the form `"$parameters.<key>"` is a reference to
//! `<key>` in the enclosing scope and is replaced by that value when present.

use serde_json::Value;
use std::collections::HashMap;

/// Free-form parameter mapping carried by specs and passed to executors.
pub type Parameters = HashMap<String, Value>;

/// Prefix marking a string parameter as a reference to the enclosing scope.
pub const TEMPLATE_PREFIX: &str = "$parameters.";

/// Return the referenced key if `value` is a `"$parameters.<key>"` template.
///
/// Only the first path segment after the prefix names the key, so
/// `"$parameters.model.name"` refers to `model`.
pub fn template_key(value: &Value) -> Option<&str> {
    let key = value
        .as_str()?
        .strip_prefix(TEMPLATE_PREFIX)?
        .split('.')
        .next()?;
    (!key.is_empty()).then_some(key)
}

/// Replace template references in `inner` with values from `outer`.
///
/// Unresolvable references are left as literal strings.
pub fn resolve_templates(outer: &Parameters, inner: &mut Parameters) {
    for value in inner.values_mut() {
        let resolved = template_key(value).and_then(|key| outer.get(key)).cloned();
        if let Some(resolved) = resolved {
            *value = resolved;
        }
    }
}

/// Merge `inner` over `outer` after resolving `inner`'s template references.
///
/// # Example
///
/// ```rust
/// use bluemarz_core::parameters::{merge_parameters, Parameters};
/// use serde_json::json;
///
/// let outer: Parameters = [("x".to_string(), json!("hello"))].into();
/// let inner: Parameters = [("y".to_string(), json!("$parameters.x"))].into();
///
/// let merged = merge_parameters(&outer, &inner);
/// assert_eq!(merged["x"], json!("hello"));
/// assert_eq!(merged["y"], json!("hello"));
/// ```
pub fn merge_parameters(outer: &Parameters, inner: &Parameters) -> Parameters {
    let mut resolved = inner.clone();
    resolve_templates(outer, &mut resolved);

    let mut merged = outer.clone();
    merged.extend(resolved);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn params(pairs: &[(&str, Value)]) -> Parameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[rstest]
    #[case(json!("$parameters.x"), Some("x"))]
    #[case(json!("$parameters.model.name"), Some("model"))]
    #[case(json!("$parameters."), None)]
    #[case(json!("parameters.x"), None)]
    #[case(json!("prefix $parameters.x"), None)]
    #[case(json!(42), None)]
    fn test_template_key(#[case] value: Value, #[case] expected: Option<&str>) {
        assert_eq!(template_key(&value), expected);
    }

    #[test]
    fn test_template_resolves_from_outer_scope() {
        let outer = params(&[("x", json!("hello"))]);
        let inner = params(&[("y", json!("$parameters.x"))]);

        let merged = merge_parameters(&outer, &inner);
        assert_eq!(merged["y"], json!("hello"));
    }

    #[test]
    fn test_missing_reference_keeps_literal() {
        let outer = params(&[("z", json!(1))]);
        let inner = params(&[("y", json!("$parameters.x"))]);

        let merged = merge_parameters(&outer, &inner);
        assert_eq!(merged["y"], json!("$parameters.x"));
        assert_eq!(merged["z"], json!(1));
    }

    #[test]
    fn test_inner_scope_wins_collisions() {
        let outer = params(&[("model", json!("gpt-4o")), ("temperature", json!(0.2))]);
        let inner = params(&[("model", json!("gpt-4o-mini"))]);

        let merged = merge_parameters(&outer, &inner);
        assert_eq!(merged["model"], json!("gpt-4o-mini"));
        assert_eq!(merged["temperature"], json!(0.2));
    }

    #[test]
    fn test_reference_keeps_non_string_types() {
        let outer = params(&[("limits", json!({"max": 3}))]);
        let inner = params(&[("limits", json!("$parameters.limits"))]);

        let merged = merge_parameters(&outer, &inner);
        assert_eq!(merged["limits"], json!({"max": 3}));
    }

    #[test]
    fn test_merge_does_not_touch_inputs() {
        let outer = params(&[("x", json!("hello"))]);
        let inner = params(&[("y", json!("$parameters.x"))]);

        let _ = merge_parameters(&outer, &inner);
        assert_eq!(inner["y"], json!("$parameters.x"));
        assert_eq!(outer.len(), 1);
    }
}
