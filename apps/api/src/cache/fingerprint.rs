//! Cache keys derived from record content and style.

use serde::Serialize;
use serde_json::Value;

use crate::errors::AppError;

/// Hex characters kept from the BLAKE3 digest.
const KEY_LEN: usize = 32;

/// Computes the cache key for `data` rendered with `style`.
///
/// The data is serialized to JSON with object keys sorted at every level, so the
/// key does not depend on field or map insertion order.
pub fn fingerprint<T: Serialize>(data: &T, style: &str) -> Result<String, AppError> {
    let value = serde_json::to_value(data).map_err(|e| {
        AppError::Internal(anyhow::anyhow!("Failed to serialize record for cache key: {e}"))
    })?;

    let mut canonical = String::new();
    write_canonical(&value, &mut canonical);
    canonical.push('_');
    canonical.push_str(style);

    let digest = blake3::hash(canonical.as_bytes()).to_hex();
    Ok(digest.as_str()[..KEY_LEN].to_string())
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
