// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Class management: listing, bulk creation, cloning, status changes and cleanup.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use crate::api::ApiClient;
use crate::client::CloudShareSdk;
use crate::error::{Result, SdkError};
use crate::record::{Record, project_fields, records_from_value};
use crate::types::{ClassMatcher, ClassStatus, CreateClassOptions};

/// Format of a class `end_date`.
pub const END_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Status the API reports for classes that are already gone.
const DELETED_STATUS: &str = "deleted";

/// Parse a class `end_date`; falls back to RFC 3339 for offsets and fractions.
pub fn parse_end_date(value: &str) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value, END_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| SdkError::InvalidInput(format!("invalid end_date '{}': {}", value, e)))
}

fn class_id(record: &Record) -> Result<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| SdkError::UnexpectedResponse("class record without an id".to_string()))
}

fn class_name(record: &Record) -> &str {
    record.get("name").and_then(Value::as_str).unwrap_or_default()
}

impl<C: ApiClient> CloudShareSdk<C> {
    /// All classes, including deleted ones the API still reports.
    #[instrument(skip(self))]
    pub fn list_classes(&self) -> Result<Vec<Record>> {
        let classes = records_from_value(self.api().get("class", &[])?)?;
        if classes.is_empty() {
            info!("No classes found");
        }
        Ok(classes)
    }

    /// All classes with a 1-based `index`.
    pub fn list_classes_indexed(&self) -> Result<Vec<Record>> {
        let mut classes = self.list_classes()?;
        for (i, class) in classes.iter_mut().enumerate() {
            class.insert("index".to_string(), json!(i + 1));
        }
        Ok(classes)
    }

    #[instrument(skip(self), fields(class_id = %class_id))]
    pub fn get_class(&self, class_id: &str) -> Result<Record> {
        match self.api().get(&format!("class/{}", class_id), &[])? {
            Value::Object(class) => {
                info!("class name: {}", class_name(&class));
                Ok(class)
            }
            other => Err(SdkError::UnexpectedResponse(format!(
                "expected a class object, got {}",
                other
            ))),
        }
    }

    /// Classes whose name matches `matcher`, reduced to `fields`.
    pub fn find_classes<S: AsRef<str>>(
        &self,
        matcher: &ClassMatcher,
        fields: &[S],
    ) -> Result<Vec<Record>> {
        info!("Listing classes");
        let mut classes: Vec<Record> = self
            .list_classes()?
            .into_iter()
            .filter(|class| matcher.matches(class))
            .collect();
        project_fields(&mut classes, fields);
        Ok(classes)
    }

    /// Create `options.count` classes named `<name>-<n>`.
    #[instrument(
        skip(self, options),
        fields(blueprint_id = %options.blueprint_id, count = options.count)
    )]
    pub fn create_classes(&self, options: &CreateClassOptions) -> Result<Vec<Value>> {
        info!("Creating {} classes", options.count);
        let mut results = Vec::with_capacity(options.count as usize);
        for i in 1..=options.count {
            info!("Creating class {}", i);
            results.push(self.api().post("class", &options.payload_for(i))?);
        }
        Ok(results)
    }

    /// Clone `class_id` `count` times as `<original name><suffix><n>`.
    #[instrument(skip(self), fields(class_id = %class_id))]
    pub fn clone_class(&self, class_id: &str, name_suffix: &str, count: u32) -> Result<Vec<Value>> {
        info!("Cloning class {} {} times", class_id, count);
        let original = self.get_class(class_id)?;
        let base_name = class_name(&original).to_string();

        let mut results = Vec::with_capacity(count as usize);
        for i in 1..=count {
            let mut payload = original.clone();
            payload.insert(
                "name".to_string(),
                Value::String(format!("{}{}{}", base_name, name_suffix, i)),
            );
            results.push(self.api().post("class", &Value::Object(payload))?);
        }
        Ok(results)
    }

    /// Set `status` on every class matched by `matcher`.
    #[instrument(skip(self, matcher), fields(pattern = %matcher.pattern(), status = %status))]
    pub fn set_class_status(
        &self,
        matcher: &ClassMatcher,
        status: ClassStatus,
    ) -> Result<Vec<Value>> {
        info!("{} classes matching pattern: {}", capitalize(status.action()), matcher.pattern());

        let mut results = Vec::new();
        for class in self.list_classes()?.iter().filter(|c| matcher.matches(c)) {
            let id = class_id(class)?;
            info!("{} class {} ({})", capitalize(status.action()), id, class_name(class));
            results.push(
                self.api()
                    .put(&format!("class/{}", id), &[("status", status.as_str())])?,
            );
        }

        if results.is_empty() {
            info!("No classes found matching the pattern");
        }
        Ok(results)
    }

    /// Delete every matched class not already deleted; returns `{id, name, status}` per deletion.
    #[instrument(skip(self, matcher), fields(pattern = %matcher.pattern()))]
    pub fn delete_classes(&self, matcher: &ClassMatcher) -> Result<Vec<Record>> {
        info!("Deleting classes matching pattern: {}", matcher.pattern());

        let mut deleted = Vec::new();
        for class in self.list_classes()?.iter().filter(|c| matcher.matches(c)) {
            let id = class_id(class)?;
            let name = class_name(class);
            if class.get("status").and_then(Value::as_str) == Some(DELETED_STATUS) {
                info!("Skipping class {} ({}) - already deleted", id, name);
                continue;
            }
            info!("Deleting class {} ({})", id, name);
            self.api().delete(&format!("class/{}", id))?;
            deleted.push(deleted_summary(id, name));
        }

        if deleted.is_empty() {
            info!("No classes found matching the pattern");
        }
        Ok(deleted)
    }

    /// Classes whose `end_date` lies before `now`.
    ///
    /// Classes without an `end_date` never expire; an unparseable one is an error.
    pub fn expired_classes(&self, now: DateTime<Utc>) -> Result<Vec<Record>> {
        let mut expired = Vec::new();
        for class in self.list_classes()? {
            let Some(end_date) = class.get("end_date").and_then(Value::as_str) else {
                continue;
            };
            if parse_end_date(end_date)? < now {
                expired.push(class);
            }
        }
        Ok(expired)
    }

    /// Delete every expired class, or only report them with `dry_run`.
    #[instrument(skip(self))]
    pub fn delete_expired_classes(&self, now: DateTime<Utc>, dry_run: bool) -> Result<Vec<Record>> {
        let expired = self.expired_classes(now)?;
        if expired.is_empty() {
            info!("No expired classes found");
            return Ok(expired);
        }

        let mut summaries = Vec::with_capacity(expired.len());
        for class in &expired {
            let id = class_id(class)?;
            let name = class_name(class);
            if class.get("status").and_then(Value::as_str) == Some(DELETED_STATUS) {
                warn!("Class {} ({}) is already deleted", id, name);
                continue;
            }
            let end_date = class.get("end_date").cloned().unwrap_or(Value::Null);
            if dry_run {
                info!("Would delete class {} ({}), ended {}", id, name, end_date);
                let mut summary = Record::new();
                summary.insert("id".to_string(), json!(id));
                summary.insert("name".to_string(), json!(name));
                summary.insert("end_date".to_string(), end_date);
                summaries.push(summary);
                continue;
            }
            info!("Deleting expired class {} ({})", id, name);
            self.api().delete(&format!("class/{}", id))?;
            summaries.push(deleted_summary(id, name));
        }
        Ok(summaries)
    }
}

fn deleted_summary(id: &str, name: &str) -> Record {
    let mut summary = Record::new();
    summary.insert("id".to_string(), json!(id));
    summary.insert("name".to_string(), json!(name));
    summary.insert("status".to_string(), json!(DELETED_STATUS));
    summary
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
