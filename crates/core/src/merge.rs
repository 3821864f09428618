use serde_json::{Map, Value};

/// Recursively merge `fallback` under `preferred`.
///
/// Objects are merged key by key. For any other pair the preferred value
/// wins unless it is `null`, in which case the fallback fills in. Arrays are
/// leaves: a preferred array replaces the fallback array as a whole.
pub fn deep_merge(preferred: Value, fallback: Value) -> Value {
    match (preferred, fallback) {
        (Value::Object(preferred), Value::Object(fallback)) => {
            Value::Object(merge_maps(preferred, fallback))
        }
        (Value::Null, fallback) => fallback,
        (preferred, _) => preferred,
    }
}

/// Map-level variant of [`deep_merge`].
pub fn merge_maps(mut preferred: Map<String, Value>, fallback: Map<String, Value>) -> Map<String, Value> {
    for (key, fallback_value) in fallback {
        let merged = match preferred.remove(&key) {
            Some(value) => deep_merge(value, fallback_value),
            None => fallback_value,
        };
        preferred.insert(key, merged);
    }
    preferred
}
