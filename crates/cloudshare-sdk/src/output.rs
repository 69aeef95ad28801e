// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Rendering of API results as JSON, tables, cards or CSV.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::{Map, Value};

use crate::error::{Result, SdkError};

/// Default table width in columns.
pub const DEFAULT_TABLE_WIDTH: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
    Card,
    Csv,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Table => "table",
            OutputFormat::Card => "card",
            OutputFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            "card" => Ok(OutputFormat::Card),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(SdkError::InvalidInput(format!(
                "unknown output format '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub format: OutputFormat,
    pub table_width: u16,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Json,
            table_width: DEFAULT_TABLE_WIDTH,
        }
    }
}

impl RenderOptions {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_table_width(mut self, table_width: u16) -> Self {
        self.table_width = table_width;
        self
    }
}

/// Render `value` in the requested format.
///
/// Objects and arrays of objects become rows; anything else is printed as a
/// single `value` cell (or plain text for scalars outside JSON).
pub fn render(value: &Value, options: &RenderOptions) -> Result<String> {
    let width = options.table_width;
    match (options.format, scalar_text(value)) {
        (OutputFormat::Json, _) => Ok(serde_json::to_string_pretty(value)?),
        (_, Some(text)) => Ok(text),
        (OutputFormat::Table, None) => Ok(render_table(&flatten_rows(value), width)),
        (OutputFormat::Card, None) => Ok(render_cards(&flatten_rows(value), width)),
        (OutputFormat::Csv, None) => render_csv(&flatten_rows(value)),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => Some(value.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Flat rows: ordered `(column, cell)` pairs per record.
type Row = Vec<(String, String)>;

fn flatten_rows(value: &Value) -> Vec<Row> {
    match value {
        Value::Array(items) => items.iter().map(flatten_record).collect(),
        other => vec![flatten_record(other)],
    }
}

fn flatten_record(value: &Value) -> Row {
    let mut row = Vec::new();
    match value {
        Value::Object(map) => flatten_into(&mut row, "", map),
        other => row.push(("value".to_string(), cell(other))),
    }
    row
}

/// Nested objects become dotted columns (`owner.name`).
fn flatten_into(row: &mut Row, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let column = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Object(nested) if !nested.is_empty() => flatten_into(row, &column, nested),
            other => row.push((column, cell(other))),
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Columns in first-seen order across all rows.
fn columns(rows: &[Row]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        for (column, _) in row {
            if !columns.contains(column) {
                columns.push(column.clone());
            }
        }
    }
    columns
}

fn lookup<'a>(row: &'a Row, column: &str) -> &'a str {
    row.iter()
        .find(|(c, _)| c == column)
        .map(|(_, v)| v.as_str())
        .unwrap_or_default()
}

fn new_table(width: u16) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(width);
    table
}

fn render_table(rows: &[Row], width: u16) -> String {
    let columns = columns(rows);
    let mut table = new_table(width);
    table.set_header(columns.clone());
    for row in rows {
        table.add_row(columns.iter().map(|c| lookup(row, c)).collect::<Vec<_>>());
    }
    table.to_string()
}

fn render_cards(rows: &[Row], width: u16) -> String {
    rows.iter()
        .map(|row| {
            let mut table = new_table(width);
            table.set_header(vec!["Field", "Value"]);
            for (column, value) in row {
                table.add_row(vec![column.as_str(), value.as_str()]);
            }
            table.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_csv(rows: &[Row]) -> Result<String> {
    let columns = columns(rows);
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&columns)?;
    for row in rows {
        writer.write_record(columns.iter().map(|c| lookup(row, c)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| SdkError::Serialization(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| SdkError::Serialization(e.to_string()))
}
