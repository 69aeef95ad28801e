// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! CloudShare SDK
//!
//! Synchronous client for the CloudShare v3 API with a convergence poller for
//! operations that finish asynchronously on the remote side.
//!
//! # Architecture
//!
//! - [`ApiClient`] is the seam to the API: one signed request in, JSON out.
//! - [`CloudShareSdk`] wraps it with environment, catalog and class operations.
//! - [`ConvergencePoller`] snapshots a collection until every record satisfies
//!   every [`Condition`] or the attempt budget runs out.
//! - Lifecycle operations (suspend, resume, delete) send the trigger request
//!   and then hand over to the poller.
//!
//! # Example
//!
//! ```no_run
//! use cloudshare_sdk::{CloudShareSdk, LifecycleOutcome};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Credentials come from the environment or ./cloudshare.env
//! let sdk = CloudShareSdk::from_env()?;
//!
//! for env in sdk.list_environments()? {
//!     println!("{}", cloudshare_sdk::label(&env));
//! }
//!
//! match sdk.suspend_environment("EN123")? {
//!     LifecycleOutcome::Converged { attempts } => println!("suspended after {} polls", attempts),
//!     LifecycleOutcome::TimedOut { .. } => println!("still suspending"),
//! }
//! # Ok(())
//! # }
//! ```

mod api;
mod classes;
mod client;
mod condition;
mod config;
mod error;
mod lifecycle;
mod logging;
mod merge;
mod output;
mod poller;
mod record;
mod types;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, HttpApiClient};
pub use classes::{END_DATE_FORMAT, parse_end_date};
pub use client::CloudShareSdk;
pub use cloudshare_http::Method;
pub use condition::{Check, Condition, evaluate};
pub use config::{
    API_ID_VAR, API_KEY_VAR, Credentials, DEFAULT_HOSTNAME, DEFAULT_KEYFILE, SdkConfig,
};
pub use error::{Result, SdkError};
pub use lifecycle::{LifecycleOperation, LifecycleOutcome};
pub use logging::{ConsoleFormat, build_filter, init_logging};
pub use merge::{merge_json, merge_json_files};
pub use output::{DEFAULT_TABLE_WIDTH, OutputFormat, RenderOptions, render};
pub use poller::{
    ConditionFailure, ConvergencePoller, LIFECYCLE_DELAY, LIFECYCLE_MAX_ATTEMPTS, PollPolicy,
    PollReport, Sleeper, SnapshotProvider, ThreadSleeper,
};
pub use record::{Record, available_fields, into_value, label, project_fields, records_from_value};
pub use types::{ClassMatcher, ClassStatus, CreateClassOptions, CreateEnvironmentOptions};
