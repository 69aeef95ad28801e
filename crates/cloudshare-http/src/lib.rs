// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Blocking HTTP transport for the CloudShare API.
//!
//! This crate knows how to talk to the wire and nothing else:
//! - build `https://<host>/api/v3/<path>?<query>` URLs
//! - sign requests with the `cs_sha1` authorization scheme
//! - send a request through a shared `ureq` agent and hand back status + body
//!
//! Interpreting status codes and JSON payloads is left to the caller.
//!
//! # Example
//!
//! ```no_run
//! use cloudshare_http::{
//!     HttpClient, HttpClientConfig, HttpRequest, Method, RequestSigner, api_url,
//! };
//!
//! # fn example() -> Result<(), cloudshare_http::HttpError> {
//! let client = HttpClient::new(HttpClientConfig::default());
//! let signer = RequestSigner::new("my-api-id", "my-api-key");
//!
//! let url = api_url("use.cloudshare.com", "envs", &[]);
//! let request = HttpRequest::new(Method::Get, &url)
//!     .with_header("Authorization", signer.authorization(&url));
//! let response = client.send(&request)?;
//! println!("{} {}", response.status, response.body);
//! # Ok(())
//! # }
//! ```

mod auth;
mod client;
mod error;
mod url;

pub use auth::{AUTH_SCHEME, RequestSigner};
pub use client::{HttpClient, HttpClientConfig, HttpRequest, HttpResponse, Method};
pub use error::{HttpError, Result};
pub use url::{API_PREFIX, api_url, normalize_path};
