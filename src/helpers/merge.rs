//! Deep merge for JSON mappings

use serde_json::Value;

/// Merge `source` into `destination`
///
/// Nested objects merge key by key; any other value in `source` replaces the
/// one in `destination`.
pub fn deep_merge(destination: &mut Value, source: Value) {
    match (destination, source) {
        (Value::Object(dest), Value::Object(src)) => {
            for (key, value) in src {
                match dest.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        dest.insert(key, value);
                    }
                }
            }
        }
        (dest, src) => *dest = src,
    }
}
