// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Top-level attribute replacement between two JSON documents.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{Result, SdkError};

/// Replace every top-level attribute of `base` that `overrides` also has.
///
/// Keys present only in `overrides` are ignored; nested objects are replaced
/// whole, not merged.
pub fn merge_json(mut base: Value, overrides: &Value) -> Result<Value> {
    let overrides = overrides
        .as_object()
        .ok_or_else(|| SdkError::InvalidInput("overrides must be a JSON object".to_string()))?;
    let target = base
        .as_object_mut()
        .ok_or_else(|| SdkError::InvalidInput("base must be a JSON object".to_string()))?;

    for (key, value) in target.iter_mut() {
        if let Some(replacement) = overrides.get(key) {
            *value = replacement.clone();
        }
    }
    Ok(base)
}

/// [`merge_json`] over two files.
pub fn merge_json_files(base: &Path, overrides: &Path) -> Result<Value> {
    merge_json(read_json(base)?, &read_json(overrides)?)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .map_err(|e| SdkError::Io(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| SdkError::Serialization(format!("{}: {}", path.display(), e)))
}
