//! Sample normalisation before serialisation.
//!
//! Model responses are heterogeneous nested containers (lists of tuples of
//! numbers, strings, objects). Downstream loaders expect a stable schema with
//! string leaves, so responses are rewritten to nested arrays of strings with
//! the nesting shape preserved.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::{EvalHubError, Result};

/// Recursively convert every leaf of `value` to its string form, keeping
/// arrays (lists and tuples) as arrays.
///
/// String leaves are kept verbatim (no extra quoting); objects, numbers,
/// booleans and null become their compact JSON text.
pub fn sanitize(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(sanitize).collect()),
        Value::String(s) => Value::String(s.clone()),
        other => Value::String(other.to_string()),
    }
}

/// Serialise any value (tuples included) and sanitise the result.
pub fn sanitize_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    Ok(sanitize(&serde_json::to_value(value)?))
}

fn take_field(task: &str, index: usize, sample: &mut Map<String, Value>, field: &str) -> Result<Value> {
    sample
        .remove(field)
        .ok_or_else(|| EvalHubError::MissingSampleField {
            task: task.to_string(),
            index,
            field: field.to_string(),
        })
}

fn malformed_field(task: &str, index: usize, field: &str, reason: &str) -> EvalHubError {
    EvalHubError::InvalidSampleField {
        task: task.to_string(),
        index,
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

/// Rewrite one sample record into its publishable form.
///
/// - `arguments` (a list of argument tuples) becomes
///   `{"gen_args_<i>": {"arg_<j>": value}}`
/// - `resps` and `filtered_resps` are sanitised
pub fn prepare_sample(task: &str, index: usize, sample: &Value) -> Result<Value> {
    let Value::Object(fields) = sample else {
        return Err(malformed_field(task, index, "<sample>", "not an object"));
    };
    let mut fields = fields.clone();

    let Value::Array(args) = take_field(task, index, &mut fields, "arguments")? else {
        return Err(malformed_field(task, index, "arguments", "not a sequence"));
    };
    let mut gen_args = Map::new();
    for (i, arg) in args.into_iter().enumerate() {
        let parts = match arg {
            Value::Array(parts) => parts,
            single => vec![single],
        };
        let arg_map: Map<String, Value> = parts
            .into_iter()
            .enumerate()
            .map(|(j, v)| (format!("arg_{j}"), v))
            .collect();
        gen_args.insert(format!("gen_args_{i}"), Value::Object(arg_map));
    }

    let resps = take_field(task, index, &mut fields, "resps")?;
    let filtered = take_field(task, index, &mut fields, "filtered_resps")?;

    fields.insert("arguments".to_string(), Value::Object(gen_args));
    fields.insert("resps".to_string(), sanitize(&resps));
    fields.insert("filtered_resps".to_string(), sanitize(&filtered));
    Ok(Value::Object(fields))
}

/// Prepare every sample of a task and encode them as newline-delimited JSON.
pub fn encode_samples_jsonl(task: &str, samples: &[Value]) -> Result<String> {
    let mut out = String::new();
    for (i, sample) in samples.iter().enumerate() {
        let prepared = prepare_sample(task, i, sample)?;
        out.push_str(&serde_json::to_string(&prepared)?);
        out.push('\n');
    }
    Ok(out)
}
