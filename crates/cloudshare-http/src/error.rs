// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error types for cloudshare-http.

use thiserror::Error;

/// Result type using HttpError.
pub type Result<T> = std::result::Result<T, HttpError>;

/// Failures below the HTTP status line. A non-2xx reply is not an error here.
#[derive(Debug, Error)]
pub enum HttpError {
    /// DNS, TCP, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but its body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}
