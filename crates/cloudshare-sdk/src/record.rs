// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Records: open string-keyed JSON maps as returned by the API.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::error::{Result, SdkError};

/// One member of a collection (a VM, an environment, a class...) at a point in time.
pub type Record = serde_json::Map<String, Value>;

/// Human-readable identity for diagnostics: `name`, else `id`.
pub fn label(record: &Record) -> String {
    ["name", "id"]
        .iter()
        .find_map(|key| match record.get(*key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        })
        .unwrap_or_else(|| "<unnamed>".to_string())
}

/// Turn an API reply into records. An array yields one record per element,
/// a single object yields one record, `null` yields none.
pub fn records_from_value(value: Value) -> Result<Vec<Record>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(SdkError::UnexpectedResponse(format!(
                    "element {} is not an object: {}",
                    i, other
                ))),
            })
            .collect(),
        Value::Object(map) => Ok(vec![map]),
        Value::Null => Ok(Vec::new()),
        other => Err(SdkError::UnexpectedResponse(format!(
            "expected a list of records, got {}",
            other
        ))),
    }
}

/// Keep only `fields` in every record. An empty selection keeps everything.
pub fn project_fields<S: AsRef<str>>(records: &mut [Record], fields: &[S]) {
    if fields.is_empty() {
        return;
    }
    for record in records.iter_mut() {
        record.retain(|key, _| fields.iter().any(|f| f.as_ref() == key));
    }
}

/// Union of keys across all records.
pub fn available_fields(records: &[Record]) -> BTreeSet<String> {
    records
        .iter()
        .flat_map(|record| record.keys().cloned())
        .collect()
}

pub fn into_value(records: Vec<Record>) -> Value {
    Value::Array(records.into_iter().map(Value::Object).collect())
}
