//! Normalizes HTTP input (JSON body or multipart form) into typed request
//! records and enforces key whitelists. Ported from the original
//! `RequestValidator`.

use scout_core::{Error, Index, MetadataMap, Repository, Result};
use serde_json::Value;
use std::collections::BTreeMap;

use scout_core::search::PROTECTED_KEYS;

/// A value counts as "present" unless it is JSON `null` or the empty
/// string.
fn is_present(value: &Value) -> bool {
    !matches!(value, Value::Null) && value.as_str() != Some("")
}

/// Checks that every key in `required` is present and non-empty in
/// `body`, and that every key in `body` is either required or optional.
/// Missing/invalid keys are reported sorted, matching the original's
/// error message shape.
pub fn parse_post(body: &Value, required: &[&str], optional: &[&str]) -> Result<()> {
    let obj = body
        .as_object()
        .ok_or_else(|| Error::Validation("Request body must be a JSON object.".to_string()))?;

    let present_keys: Vec<&str> = obj
        .iter()
        .filter(|(_, v)| is_present(v))
        .map(|(k, _)| k.as_str())
        .collect();

    let mut missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|k| !present_keys.contains(k))
        .collect();
    missing.sort_unstable();

    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "Missing required fields: {}.",
            missing.join(", ")
        )));
    }

    let allowed: Vec<&str> = required.iter().chain(optional.iter()).copied().collect();
    let mut invalid: Vec<&str> = obj
        .keys()
        .map(|k| k.as_str())
        .filter(|k| !allowed.contains(k))
        .collect();
    invalid.sort_unstable();

    if !invalid.is_empty() {
        return Err(Error::Validation(format!(
            "Invalid keys: {}.",
            invalid.join(", ")
        )));
    }

    Ok(())
}

/// Resolves `index` (single name) or `indexes` (list of names) from the
/// request body into `Index` rows. `None` when absent and not required;
/// a `Validation` error listing unknown names when any are missing.
pub fn validate_indexes(
    repo: &Repository,
    body: &Value,
    required: bool,
) -> Result<Option<Vec<Index>>> {
    let names = extract_index_names(body);

    let names = match names {
        Some(names) if !names.is_empty() => names,
        _ => {
            if required {
                return Err(Error::Validation(
                    "Must provide `index` or `indexes`.".to_string(),
                ));
            }
            return Ok(None);
        }
    };

    let (found, missing) = repo.resolve_index_names(&names)?;
    if !missing.is_empty() {
        return Err(Error::Validation(format!(
            "The following indexes were not found: {}.",
            missing.join(", ")
        )));
    }
    Ok(Some(found))
}

fn extract_index_names(body: &Value) -> Option<Vec<String>> {
    if let Some(Value::String(name)) = body.get("index") {
        if !name.is_empty() {
            return Some(vec![name.clone()]);
        }
    }
    if let Some(Value::Array(items)) = body.get("indexes") {
        let names: Vec<String> = items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        return Some(names);
    }
    None
}

/// Coerces a loosely-typed metadata map (JSON scalars) into the string-only
/// `MetadataMap` the repository stores.
pub fn coerce_metadata(map: &BTreeMap<String, Value>) -> MetadataMap {
    map.iter()
        .map(|(k, v)| (k.clone(), coerce_value(v)))
        .collect()
}

fn coerce_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Extracts metadata filters from query-string parameters: every key not
/// in the reserved set, collected with all of its values.
pub fn extract_get_params(query: &str) -> BTreeMap<String, Vec<String>> {
    let mut params: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default();
        if PROTECTED_KEYS.contains(&key) {
            continue;
        }
        params
            .entry(decode_query_component(key))
            .or_default()
            .push(decode_query_component(value));
    }
    params
}

/// Minimal `application/x-www-form-urlencoded` percent-decoder (`+` means
/// space, `%XX` is a hex byte).
pub fn decode_query_component(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '+' => out.push(' '),
            '%' => {
                let hi = chars.next();
                let lo = chars.next();
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    if let Ok(byte) = u8::from_str_radix(&format!("{hi}{lo}"), 16) {
                        out.push(byte as char);
                        continue;
                    }
                }
                out.push('%');
            }
            other => out.push(other),
        }
    }
    out
}
