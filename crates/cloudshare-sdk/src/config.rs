// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the CloudShare SDK.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, SdkError};

/// Public API host.
pub const DEFAULT_HOSTNAME: &str = "use.cloudshare.com";

/// Dotenv file looked up in the working directory when nothing else supplies keys.
pub const DEFAULT_KEYFILE: &str = "cloudshare.env";

pub const API_ID_VAR: &str = "CLOUDSHARE_API_ID";
pub const API_KEY_VAR: &str = "CLOUDSHARE_API_KEY";

const MISSING_KEYS_HELP: &str = "CLOUDSHARE_API_ID and CLOUDSHARE_API_KEY not found.
Create a 'cloudshare.env' file with the following content:
    CLOUDSHARE_API_ID=<your_api_id>
    CLOUDSHARE_API_KEY=<your_api_key>
or export them as environment variables:
    export CLOUDSHARE_API_ID=<your_api_id>
    export CLOUDSHARE_API_KEY=<your_api_key>";

/// API identity used to sign requests.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_id: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_id", &self.api_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(api_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_id: api_id.into(),
            api_key: api_key.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.api_id.is_empty() && !self.api_key.is_empty()
    }

    /// Resolve keys from the process environment, then `keyfile`, then `./cloudshare.env`.
    pub fn resolve(keyfile: Option<&Path>) -> Result<Self> {
        Self::resolve_with(
            |name| std::env::var(name).ok(),
            keyfile,
            Path::new(DEFAULT_KEYFILE),
        )
    }

    /// Resolution with an injectable environment lookup and fallback file.
    ///
    /// Values already present are never overridden by a later source.
    pub fn resolve_with<F>(lookup: F, keyfile: Option<&Path>, fallback: &Path) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut api_id = lookup(API_ID_VAR).filter(|v| !v.is_empty());
        let mut api_key = lookup(API_KEY_VAR).filter(|v| !v.is_empty());

        if let Some(path) = keyfile {
            info!(path = %path.display(), "Trying to load auth keys from keyfile");
            if !path.exists() {
                return Err(SdkError::Config(format!(
                    "keyfile {} does not exist",
                    path.display()
                )));
            }
            fill_from_dotenv(path, &mut api_id, &mut api_key)?;
        }

        if (api_id.is_none() || api_key.is_none()) && fallback.exists() {
            info!(path = %fallback.display(), "Trying to load auth keys from current directory");
            fill_from_dotenv(fallback, &mut api_id, &mut api_key)?;
        }

        match (api_id, api_key) {
            (Some(api_id), Some(api_key)) => {
                info!("Auth keys loaded");
                Ok(Self { api_id, api_key })
            }
            _ => Err(SdkError::Config(MISSING_KEYS_HELP.to_string())),
        }
    }
}

fn fill_from_dotenv(
    path: &Path,
    api_id: &mut Option<String>,
    api_key: &mut Option<String>,
) -> Result<()> {
    let entries = dotenvy::from_path_iter(path)
        .map_err(|e| SdkError::Config(format!("cannot read {}: {}", path.display(), e)))?;

    for entry in entries {
        let (name, value) = entry
            .map_err(|e| SdkError::Config(format!("invalid entry in {}: {}", path.display(), e)))?;
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            API_ID_VAR if api_id.is_none() => *api_id = Some(value),
            API_KEY_VAR if api_key.is_none() => *api_key = Some(value),
            _ => {}
        }
    }
    debug!(
        path = %path.display(),
        has_id = api_id.is_some(),
        has_key = api_key.is_some(),
        "dotenv file read"
    );
    Ok(())
}

/// Configuration for the CloudShare SDK.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// API host name.
    pub hostname: String,
    /// Signing identity.
    pub credentials: Credentials,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            credentials: Credentials::default(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl SdkConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CLOUDSHARE_API_ID` / `CLOUDSHARE_API_KEY`: credentials (see [`Credentials::resolve`])
    /// - `CLOUDSHARE_HOSTNAME`: API host (default: "use.cloudshare.com")
    /// - `CLOUDSHARE_CONNECT_TIMEOUT_MS`: Connection timeout in milliseconds (default: 10000)
    /// - `CLOUDSHARE_REQUEST_TIMEOUT_MS`: Request timeout in milliseconds (default: 30000)
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Like [`SdkConfig::from_env`], with an optional dotenv keyfile for the credentials.
    pub fn load(keyfile: Option<&Path>) -> Result<Self> {
        let lookup = |name: &str| std::env::var(name).ok();
        let credentials = Credentials::resolve_with(lookup, keyfile, Path::new(DEFAULT_KEYFILE))?;
        Self::from_lookup(lookup, credentials)
    }

    /// Build from an arbitrary variable lookup; credentials are supplied separately.
    pub fn from_lookup<F>(lookup: F, credentials: Credentials) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let hostname =
            lookup("CLOUDSHARE_HOSTNAME").unwrap_or_else(|| DEFAULT_HOSTNAME.to_string());

        let connect_timeout_ms: u64 = lookup("CLOUDSHARE_CONNECT_TIMEOUT_MS")
            .unwrap_or_else(|| "10000".to_string())
            .parse()
            .map_err(|e| {
                SdkError::Config(format!("invalid CLOUDSHARE_CONNECT_TIMEOUT_MS: {}", e))
            })?;

        let request_timeout_ms: u64 = lookup("CLOUDSHARE_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|| "30000".to_string())
            .parse()
            .map_err(|e| {
                SdkError::Config(format!("invalid CLOUDSHARE_REQUEST_TIMEOUT_MS: {}", e))
            })?;

        Ok(Self {
            hostname,
            credentials,
            connect_timeout: Duration::from_millis(connect_timeout_ms),
            request_timeout: Duration::from_millis(request_timeout_ms),
        })
    }

    /// Set the API host name.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the signing identity.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the connection timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
