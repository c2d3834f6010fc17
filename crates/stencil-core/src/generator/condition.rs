//! Inclusion conditions on file specs and requirements
//!
//! A condition names a boolean variable. Three spellings are accepted and
//! mean the same thing: `{{ .IncludeDocker }}`, `.IncludeDocker` and
//! `IncludeDocker`.

use crate::templates::context::{keys, RenderingContext};
use crate::templates::value::{Value, Variables};

/// Variable key a condition refers to
pub fn condition_key(condition: &str) -> &str {
    let mut key = condition.trim();
    if let Some(inner) = key
        .strip_prefix("{{")
        .and_then(|rest| rest.strip_suffix("}}"))
    {
        key = inner.trim();
    }
    key.strip_prefix('.').unwrap_or(key)
}

/// Evaluate a condition against a rendering context
pub fn evaluate(condition: &str, ctx: &RenderingContext) -> bool {
    match condition_key(condition) {
        keys::INCLUDE_DOCKER => ctx.include_docker(),
        keys::INCLUDE_TESTS => ctx.include_tests(),
        key => ctx.get_bool(key),
    }
}

/// Evaluate a condition against a bare variable map
///
/// Absent or non-boolean values are false.
pub fn evaluate_in(condition: &str, variables: &Variables) -> bool {
    variables
        .get(condition_key(condition))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// True when every condition holds; an empty list always holds
pub fn all_hold(conditions: &[String], ctx: &RenderingContext) -> bool {
    conditions.iter().all(|c| evaluate(c, ctx))
}
