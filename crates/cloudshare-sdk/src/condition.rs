// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Conditions: a predicate bound to one named field of a record.
//!
//! Checks are plain data so a condition can be built, printed and tested
//! without a poller around it.

use std::fmt;

use serde_json::Value;

use crate::error::{Result, SdkError};
use crate::record::{Record, label};

/// The predicate half of a [`Condition`]. Must be pure.
#[derive(Clone)]
pub enum Check {
    /// Value equals the given JSON value.
    Equals(Value),
    /// Value differs from the given JSON value.
    NotEquals(Value),
    /// Value is JSON `null`.
    IsNull,
    /// Value is anything but JSON `null`.
    NotNull,
    /// Value equals one of the given values.
    OneOf(Vec<Value>),
    /// Named plain function, for anything the variants above cannot express.
    Custom {
        name: &'static str,
        predicate: fn(&Value) -> bool,
    },
}

impl Check {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Check::Equals(expected) => value == expected,
            Check::NotEquals(expected) => value != expected,
            Check::IsNull => value.is_null(),
            Check::NotNull => !value.is_null(),
            Check::OneOf(options) => options.iter().any(|o| o == value),
            Check::Custom { predicate, .. } => predicate(value),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Check::Equals(v) => write!(f, "== {}", v),
            Check::NotEquals(v) => write!(f, "!= {}", v),
            Check::IsNull => f.write_str("is null"),
            Check::NotNull => f.write_str("is not null"),
            Check::OneOf(options) => {
                let rendered: Vec<String> = options.iter().map(Value::to_string).collect();
                write!(f, "in [{}]", rendered.join(", "))
            }
            Check::Custom { name, .. } => write!(f, "satisfies {}", name),
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Check({})", self)
    }
}

/// `{ property, check }`. The property must exist on every record it is evaluated against.
#[derive(Debug, Clone)]
pub struct Condition {
    property: String,
    check: Check,
}

impl Condition {
    pub fn new(property: impl Into<String>, check: Check) -> Self {
        Self {
            property: property.into(),
            check,
        }
    }

    pub fn equals(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Check::Equals(value.into()))
    }

    pub fn not_equals(property: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(property, Check::NotEquals(value.into()))
    }

    pub fn is_null(property: impl Into<String>) -> Self {
        Self::new(property, Check::IsNull)
    }

    pub fn not_null(property: impl Into<String>) -> Self {
        Self::new(property, Check::NotNull)
    }

    pub fn one_of<V: Into<Value>>(
        property: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        Self::new(
            property,
            Check::OneOf(values.into_iter().map(Into::into).collect()),
        )
    }

    pub fn custom(
        property: impl Into<String>,
        name: &'static str,
        predicate: fn(&Value) -> bool,
    ) -> Self {
        Self::new(property, Check::Custom { name, predicate })
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn check(&self) -> &Check {
        &self.check
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.property, self.check)
    }
}

/// Evaluate `condition` against `record`.
///
/// A missing property is a caller error and yields `SdkError::MissingProperty`
/// rather than `false`, so it is never mistaken for "not converged yet".
pub fn evaluate(record: &Record, condition: &Condition) -> Result<bool> {
    let value = record
        .get(&condition.property)
        .ok_or_else(|| SdkError::MissingProperty {
            record: label(record),
            property: condition.property.clone(),
        })?;
    Ok(condition.check.matches(value))
}
