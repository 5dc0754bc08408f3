//! Parameter template binding.
//!
//! A parameter whose string value is exactly `{{ name }}` is replaced by
//! the value `name` resolves to: first against prior step results, then
//! against the execution's initial metadata. Dotted names navigate into
//! result records. A placeholder that resolves to nothing passes through
//! as the original literal string - callers rely on this to hand opaque
//! `{{ ... }}` text to capabilities untouched.

use serde_json::{Map, Value};

/// Context the binder resolves placeholders against.
pub(crate) struct BindContext<'a> {
    pub results: &'a Map<String, Value>,
    pub metadata: &'a Value,
}

/// Bind a step's parameters into a concrete invocation payload.
pub(crate) fn bind_parameters(parameters: &Map<String, Value>, ctx: &BindContext<'_>) -> Value {
    let mut bound = Map::with_capacity(parameters.len());
    for (key, value) in parameters {
        bound.insert(key.clone(), bind_value(value, ctx));
    }
    Value::Object(bound)
}

fn bind_value(value: &Value, ctx: &BindContext<'_>) -> Value {
    match value {
        Value::String(s) => bind_string(s, ctx),
        Value::Array(items) => Value::Array(items.iter().map(|v| bind_value(v, ctx)).collect()),
        Value::Object(map) => {
            let mut bound = Map::with_capacity(map.len());
            for (key, inner) in map {
                bound.insert(key.clone(), bind_value(inner, ctx));
            }
            Value::Object(bound)
        }
        other => other.clone(),
    }
}

fn bind_string(raw: &str, ctx: &BindContext<'_>) -> Value {
    let name = match raw.strip_prefix("{{").and_then(|r| r.strip_suffix("}}")) {
        Some(inner) => inner.trim(),
        None => return Value::String(raw.to_string()),
    };

    match lookup(name, ctx) {
        Some(value) => value,
        None => Value::String(raw.to_string()),
    }
}

/// Resolve a dotted name against results, falling back to metadata.
fn lookup(name: &str, ctx: &BindContext<'_>) -> Option<Value> {
    if name.is_empty() {
        return None;
    }
    let mut segments = name.split('.');
    let root = segments.next()?;
    let rest: Vec<&str> = segments.collect();

    if let Some(found) = navigate(ctx.results.get(root), &rest) {
        return Some(found);
    }
    navigate(ctx.metadata.get(root), &rest)
}

fn navigate(start: Option<&Value>, segments: &[&str]) -> Option<Value> {
    let mut current = start?;
    for segment in segments {
        current = current.get(segment)?;
    }
    Some(current.clone())
}
