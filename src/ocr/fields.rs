//! Keyword field extraction for generic documents.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::attendance::find_date;

static LABELLED_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(nisn|nis|kelas|semester|tahun ajaran|tanggal)\s*[:=]\s*([^\n\t|]+)")
        .unwrap()
});

/// Collect `label: value` fields and a normalized `date`.
///
/// The first occurrence of each label wins.
pub fn extract_fields(text: &str) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::new();

    for caps in LABELLED_FIELD.captures_iter(text) {
        let key = caps[1].to_lowercase().replace(' ', "_");
        let value = caps[2].trim();
        if value.is_empty() {
            continue;
        }
        fields
            .entry(key)
            .or_insert_with(|| Value::String(value.to_string()));
    }

    if let Some(date) = find_date(text) {
        fields.insert(
            "date".to_string(),
            Value::String(date.format("%Y-%m-%d").to_string()),
        );
    }

    fields
}
