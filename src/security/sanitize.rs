//! Payload sanitization.
//!
//! Strips object members whose names are prototype-pollution vectors in
//! JavaScript consumers, at every nesting depth.

use serde_json::Value;

/// Member names removed from every object.
pub const FORBIDDEN_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Remove forbidden members in place. Returns how many were removed.
pub fn sanitize(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => {
            let before = map.len();
            map.retain(|key, _| !FORBIDDEN_KEYS.contains(&key.as_str()));
            let mut removed = before - map.len();
            for child in map.values_mut() {
                removed += sanitize(child);
            }
            removed
        }
        Value::Array(items) => items.iter_mut().map(sanitize).sum(),
        _ => 0,
    }
}
