//! Row filtering for Leantime results.
//!
//! Leantime serialises PDO rows with both column names and positional indexes, so
//! every row arrives as `{"0": 12, "id": 12, "1": "fix bug", "headline": "fix bug"}`.
//! Only the named columns are kept.

use serde_json::{Map, Value as J};

pub type Row = Map<String, J>;

/// True when `key` is non-empty and made only of ASCII decimal digits.
pub fn is_numeric_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

pub fn filter_row(row: &Row) -> Row {
    row.iter()
        .filter(|(k, _)| !is_numeric_key(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Turn a JSON-RPC `result` into filtered rows.
///
/// A mapping result (PHP associative array of rows) is read as its values, ordered by
/// numeric index.
/// `null` yields no rows; entries that are not objects are skipped.
pub fn filter_rows(result: J) -> Vec<Row> {
    let items: Vec<J> = match result {
        J::Array(items) => items,
        J::Object(map) => {
            let mut entries: Vec<(String, J)> = map.into_iter().collect();
            entries.sort_by_key(|(k, _)| k.parse::<u64>().unwrap_or(u64::MAX));
            entries.into_iter().map(|(_, v)| v).collect()
        }
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| match item {
            J::Object(row) => Some(filter_row(&row)),
            _ => None,
        })
        .collect()
}
