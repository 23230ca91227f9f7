//! Dot-path access into nested JSON config documents.
//!
//! A path such as `toc.number_sections` addresses `doc["toc"]["number_sections"]`.
//! Segments are split on every `.`; consecutive dots produce literal empty keys.

use serde_json::{Map, Value};

use crate::ConfigError;

/// Returns `true` only when every segment of `path` resolves to an object member.
pub fn exists(doc: &Value, path: &str) -> bool {
    let mut current = doc;
    for segment in path.split('.') {
        match current.as_object().and_then(|map| map.get(segment)) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

/// Reads the value at `path`, failing with `KeyNotFound` on the first missing segment.
pub fn get<'a>(doc: &'a Value, path: &str) -> Result<&'a Value, ConfigError> {
    let mut current = doc;
    for segment in path.split('.') {
        current = current
            .as_object()
            .and_then(|map| map.get(segment))
            .ok_or_else(|| ConfigError::KeyNotFound {
                path: path.to_string(),
            })?;
    }
    Ok(current)
}

/// Builds the single-branch object `{a: {b: {c: value}}}` for path `a.b.c`.
pub fn build_delta(path: &str, value: Value) -> Value {
    let mut delta = value;
    for segment in path.rsplit('.') {
        let mut map = Map::new();
        map.insert(segment.to_string(), delta);
        delta = Value::Object(map);
    }
    delta
}

/// Writes `value` at `path` in place, keeping every key that is not on the path.
///
/// Intermediate values that are not objects are replaced by empty objects.
/// A `null` value removes the leaf, mirroring how the config store treats
/// `null` in an update delta.
pub fn apply_update(doc: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };
    let mut current = ensure_object(doc);
    for segment in parents {
        let child = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        current = ensure_object(child);
    }
    if value.is_null() {
        current.remove(*leaf);
    } else {
        current.insert((*leaf).to_string(), value);
    }
}

/// Removes each fully resolving path from `doc`; unresolvable paths are skipped.
pub fn remove_keys<S: AsRef<str>>(doc: &mut Value, paths: &[S]) {
    for path in paths {
        let segments: Vec<&str> = path.as_ref().split('.').collect();
        let Some((leaf, parents)) = segments.split_last() else {
            continue;
        };
        let mut current = doc.as_object_mut();
        for segment in parents {
            current = current
                .and_then(|map| map.get_mut(*segment))
                .and_then(Value::as_object_mut);
        }
        if let Some(map) = current {
            map.remove(*leaf);
        }
    }
}

/// Recursively merges `delta` into `target` the way the notebook config store does.
///
/// Objects merge member by member, `null` members delete the key and any
/// other value overwrites.
pub fn deep_merge(target: &mut Value, delta: Value) {
    let Value::Object(delta_map) = delta else {
        *target = delta;
        return;
    };
    let target_map = ensure_object(target);
    for (key, value) in delta_map {
        match value {
            Value::Null => {
                target_map.remove(&key);
            }
            Value::Object(_) => {
                let entry = target_map
                    .entry(key)
                    .or_insert_with(|| Value::Object(Map::new()));
                deep_merge(entry, value);
            }
            other => {
                target_map.insert(key, other);
            }
        }
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}
