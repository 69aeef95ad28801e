// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Option and selector types for SDK operations.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{Result, SdkError};
use crate::record::Record;

/// Options for creating environments from a blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEnvironmentOptions {
    /// Blueprint to build from (required).
    pub blueprint_id: String,
    /// Policy to apply.
    pub policy_id: Option<String>,
    /// Environment name; suffixed with `-<n>` when more than one is created.
    pub name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Number of environments to create.
    pub count: u32,
}

impl CreateEnvironmentOptions {
    pub fn new(blueprint_id: impl Into<String>) -> Self {
        Self {
            blueprint_id: blueprint_id.into(),
            policy_id: None,
            name: None,
            description: None,
            count: 1,
        }
    }

    pub fn with_policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Query parameters for the `index`-th (1-based) environment.
    pub fn query_for(&self, index: u32) -> Vec<(String, String)> {
        let mut query = vec![("blueprintId".to_string(), self.blueprint_id.clone())];
        if let Some(policy_id) = &self.policy_id {
            query.push(("policyId".to_string(), policy_id.clone()));
        }
        if let Some(name) = &self.name {
            let name = if self.count > 1 {
                format!("{}-{}", name, index)
            } else {
                name.clone()
            };
            query.push(("name".to_string(), name));
        }
        if let Some(description) = &self.description {
            query.push(("description".to_string(), description.clone()));
        }
        query
    }
}

/// Options for creating classes from a blueprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateClassOptions {
    /// Blueprint to build from (required).
    pub blueprint_id: String,
    /// Policy to apply.
    pub policy_id: Option<String>,
    /// Base name; every class gets `-<n>` appended.
    pub name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Number of classes to create.
    pub count: u32,
}

impl CreateClassOptions {
    pub fn new(blueprint_id: impl Into<String>) -> Self {
        Self {
            blueprint_id: blueprint_id.into(),
            policy_id: None,
            name: None,
            description: None,
            count: 1,
        }
    }

    pub fn with_policy_id(mut self, policy_id: impl Into<String>) -> Self {
        self.policy_id = Some(policy_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// JSON body for the `index`-th (1-based) class.
    pub fn payload_for(&self, index: u32) -> Value {
        let mut payload = json!({ "blueprintId": self.blueprint_id });
        if let Some(policy_id) = &self.policy_id {
            payload["policyId"] = json!(policy_id);
        }
        if let Some(name) = &self.name {
            payload["name"] = json!(format!("{}-{}", name, index));
        }
        if let Some(description) = &self.description {
            payload["description"] = json!(description);
        }
        payload
    }
}

/// Administrative status of a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    Active,
    Suspended,
}

impl ClassStatus {
    /// Value sent to the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Active => "active",
            ClassStatus::Suspended => "suspended",
        }
    }

    /// Verb used in log lines.
    pub fn action(&self) -> &'static str {
        match self {
            ClassStatus::Active => "resuming",
            ClassStatus::Suspended => "suspending",
        }
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassStatus {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(ClassStatus::Active),
            "SUSPENDED" => Ok(ClassStatus::Suspended),
            other => Err(SdkError::InvalidInput(format!(
                "unknown class status '{}', expected ACTIVE or SUSPENDED",
                other
            ))),
        }
    }
}

/// Selects classes by a regex searched in their name (or id).
#[derive(Debug, Clone)]
pub struct ClassMatcher {
    pattern: Regex,
    by_id: bool,
}

impl ClassMatcher {
    pub fn by_name(pattern: &str) -> Result<Self> {
        Self::new(pattern, false)
    }

    pub fn by_id(pattern: &str) -> Result<Self> {
        Self::new(pattern, true)
    }

    pub fn new(pattern: &str, by_id: bool) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            by_id,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Unanchored search, so `lab` matches `python-lab-3`.
    pub fn matches(&self, record: &Record) -> bool {
        let field = if self.by_id { "id" } else { "name" };
        record
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|value| self.pattern.is_match(value))
    }
}
