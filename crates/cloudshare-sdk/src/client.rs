// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! CloudShareSdk client for environments and catalog lookups.
//!
//! Lifecycle operations live in [`crate::lifecycle`], class management in
//! [`crate::classes`]; both extend [`CloudShareSdk`] with further `impl` blocks.

use serde_json::{Value, json};
use tracing::{debug, info, instrument};

use crate::api::{ApiClient, HttpApiClient};
use crate::config::SdkConfig;
use crate::error::{Result, SdkError};
use crate::poller::SnapshotProvider;
use crate::record::{Record, records_from_value};
use crate::types::CreateEnvironmentOptions;

/// High-level SDK for the CloudShare v3 API.
///
/// Generic over the [`ApiClient`] so tests can swap the signed HTTPS client
/// for a scripted one.
pub struct CloudShareSdk<C = HttpApiClient> {
    api: C,
}

impl CloudShareSdk<HttpApiClient> {
    /// Create a new SDK with the given configuration.
    pub fn new(config: &SdkConfig) -> Result<Self> {
        Ok(Self::with_client(HttpApiClient::new(config)?))
    }

    /// Create an SDK from environment variables and the default key file.
    pub fn from_env() -> Result<Self> {
        let config = SdkConfig::from_env()?;
        Self::new(&config)
    }
}

impl<C: ApiClient> CloudShareSdk<C> {
    pub fn with_client(api: C) -> Self {
        Self { api }
    }

    /// Underlying API client.
    pub fn api(&self) -> &C {
        &self.api
    }

    // =========================================================================
    // Environments
    // =========================================================================

    /// All environments visible to the account.
    #[instrument(skip(self))]
    pub fn list_environments(&self) -> Result<Vec<Record>> {
        let envs = records_from_value(self.api.get("envs", &[])?)?;
        if envs.is_empty() {
            info!("No environments found");
        }
        Ok(envs)
    }

    /// All environments, each annotated with its `status` text and a 1-based `index`.
    #[instrument(skip(self))]
    pub fn list_environments_with_status(&self) -> Result<Vec<Record>> {
        let mut envs = self.list_environments()?;
        for (i, env) in envs.iter_mut().enumerate() {
            let id = env.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
            let status = self.environment_status(&id)?;
            env.insert("status".to_string(), Value::String(status));
            env.insert("index".to_string(), json!(i + 1));
        }
        Ok(envs)
    }

    /// Summary record of one environment.
    #[instrument(skip(self), fields(env_id = %env_id))]
    pub fn get_environment(&self, env_id: &str) -> Result<Record> {
        match self.api.get(&format!("envs/{}", env_id), &[])? {
            Value::Object(env) => Ok(env),
            other => Err(SdkError::UnexpectedResponse(format!(
                "expected an environment object, got {}",
                other
            ))),
        }
    }

    /// Extended view of one environment, including its VMs.
    #[instrument(skip(self), fields(env_id = %env_id))]
    pub fn get_environment_extended(&self, env_id: &str) -> Result<Record> {
        match self
            .api
            .get("envs/actions/getextended", &[("envId", env_id)])?
        {
            Value::Object(env) => Ok(env),
            other => Err(SdkError::UnexpectedResponse(format!(
                "expected an extended environment object, got {}",
                other
            ))),
        }
    }

    /// `statusText` of an environment, e.g. "Running" or "Suspended".
    pub fn environment_status(&self, env_id: &str) -> Result<String> {
        let env = self.get_environment_extended(env_id)?;
        let status = env
            .get("statusText")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                SdkError::UnexpectedResponse(format!(
                    "environment {} has no statusText",
                    env_id
                ))
            })?
            .to_string();
        debug!(env_id = %env_id, status = %status, "Env status");
        Ok(status)
    }

    /// VM records of an environment; a fresh snapshot on every call.
    pub fn list_vms(&self, env_id: &str) -> Result<Vec<Record>> {
        let mut env = self.get_environment_extended(env_id)?;
        match env.remove("vms") {
            Some(vms @ Value::Array(_)) => records_from_value(vms),
            _ => Err(SdkError::UnexpectedResponse(format!(
                "environment {} has no vms list",
                env_id
            ))),
        }
    }

    /// Create `options.count` environments, returning each creation reply.
    #[instrument(
        skip(self, options),
        fields(blueprint_id = %options.blueprint_id, count = options.count)
    )]
    pub fn create_environments(&self, options: &CreateEnvironmentOptions) -> Result<Vec<Value>> {
        if options.count == 0 {
            return Err(SdkError::InvalidInput(
                "count must be at least 1".to_string(),
            ));
        }

        let mut results = Vec::with_capacity(options.count as usize);
        for i in 1..=options.count {
            info!("Creating environment {}", i);
            let query = options.query_for(i);
            let query: Vec<(&str, &str)> = query
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect();
            results.push(self.api.get("envs/actions/create", &query)?);
        }
        Ok(results)
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    #[instrument(skip(self))]
    pub fn list_blueprints(&self) -> Result<Vec<Record>> {
        records_from_value(self.api.get("blueprints", &[])?)
    }

    #[instrument(skip(self))]
    pub fn list_policies(&self) -> Result<Vec<Record>> {
        records_from_value(self.api.get("policies", &[])?)
    }
}

/// An SDK snapshots the VMs of the environment it is asked about.
impl<C: ApiClient> SnapshotProvider for CloudShareSdk<C> {
    fn snapshot(&self, resource_id: &str) -> Result<Vec<Record>> {
        self.list_vms(resource_id)
    }
}
