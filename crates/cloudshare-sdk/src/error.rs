// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for cloudshare-sdk.

use thiserror::Error;

/// Result type using SdkError.
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors that can occur when using the SDK.
///
/// A lifecycle wait that runs out of attempts is not an error; it is reported
/// as `Ok(false)` by the poller.
#[derive(Debug, Error)]
pub enum SdkError {
    /// Configuration error (missing or invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// The request never got an HTTP reply.
    #[error("connection error: {0}")]
    Connection(String),

    /// The API answered with a non-2xx status.
    #[error("api error [{status}]: {message}")]
    Api { status: u16, message: String },

    /// Unexpected response shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// A condition names a field the record does not have.
    #[error("configuration error: record {record} has no property '{property}'")]
    MissingProperty { record: String, property: String },

    /// Invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Local file access failed.
    #[error("io error: {0}")]
    Io(String),
}

impl SdkError {
    /// True for errors caused by the caller's own condition or configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, SdkError::Config(_) | SdkError::MissingProperty { .. })
    }
}

impl From<cloudshare_http::HttpError> for SdkError {
    fn from(err: cloudshare_http::HttpError) -> Self {
        SdkError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SdkError {
    fn from(err: csv::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

impl From<regex::Error> for SdkError {
    fn from(err: regex::Error) -> Self {
        SdkError::InvalidInput(err.to_string())
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        SdkError::Io(err.to_string())
    }
}
