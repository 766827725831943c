//! crates/triheart_core/src/rows.rs
//!
//! Row-by-row decoding of backend lists. A row that does not decode is logged
//! and skipped; the rest of the list survives.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Decodes every row of a JSON array. Anything other than an array yields nothing.
pub(crate) fn decode_rows<T: DeserializeOwned>(data: Value, kind: &str) -> Vec<T> {
    let Value::Array(rows) = data else {
        warn!(kind, "expected a list of {}", kind);
        return Vec::new();
    };

    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| {
            serde_json::from_value(row)
                .map_err(|e| warn!(kind, index, error = %e, "skipping undecodable {} row", kind))
                .ok()
        })
        .collect()
}
