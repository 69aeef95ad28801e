// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Suspend, resume and delete: trigger the action, then wait for the VMs.
//!
//! Each operation moves through `Triggered -> Polling -> {Converged | TimedOut}`.
//! A failed trigger never starts polling; a timeout is an outcome, not an error,
//! and the trigger is never re-sent.

use std::fmt;

use tracing::{info, instrument};

use crate::api::ApiClient;
use crate::client::CloudShareSdk;
use crate::condition::Condition;
use crate::error::Result;
use crate::poller::{ConditionFailure, ConvergencePoller, PollPolicy, Sleeper, ThreadSleeper};
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleOperation {
    Suspend,
    Resume,
    Delete,
}

impl LifecycleOperation {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleOperation::Suspend => "Suspend",
            LifecycleOperation::Resume => "Resume",
            LifecycleOperation::Delete => "Delete",
        }
    }

    /// State every VM must reach, as used in log lines.
    pub fn target_state(&self) -> &'static str {
        match self {
            LifecycleOperation::Suspend => "Suspended",
            LifecycleOperation::Resume => "Running",
            LifecycleOperation::Delete => "Deleted",
        }
    }

    /// Conditions every VM must satisfy for the operation to count as done.
    pub fn conditions(&self) -> Vec<Condition> {
        match self {
            LifecycleOperation::Suspend => vec![Condition::equals("statusText", "Suspended")],
            LifecycleOperation::Resume => vec![Condition::equals("statusText", "Running")],
            LifecycleOperation::Delete => vec![Condition::is_null("internalIp")],
        }
    }

    /// Send the request that starts the operation.
    pub fn trigger<C: ApiClient>(&self, api: &C, env_id: &str) -> Result<()> {
        match self {
            LifecycleOperation::Suspend => {
                api.put("envs/actions/suspend", &[("envId", env_id)])?;
            }
            LifecycleOperation::Resume => {
                api.put("envs/actions/resume", &[("envId", env_id)])?;
            }
            LifecycleOperation::Delete => {
                api.delete(&format!("envs/{}", env_id))?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for LifecycleOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terminal state of a lifecycle operation whose trigger succeeded.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleOutcome {
    Converged {
        attempts: u32,
    },
    TimedOut {
        attempts: u32,
        last_failure: Option<ConditionFailure>,
    },
}

impl LifecycleOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, LifecycleOutcome::Converged { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            LifecycleOutcome::Converged { attempts }
            | LifecycleOutcome::TimedOut { attempts, .. } => *attempts,
        }
    }
}

impl<C: ApiClient> CloudShareSdk<C> {
    /// Suspend an environment and wait for every VM to report "Suspended".
    pub fn suspend_environment(&self, env_id: &str) -> Result<LifecycleOutcome> {
        self.run_lifecycle(
            LifecycleOperation::Suspend,
            env_id,
            PollPolicy::lifecycle(),
            ThreadSleeper,
        )
    }

    /// Resume an environment and wait for every VM to report "Running".
    pub fn resume_environment(&self, env_id: &str) -> Result<LifecycleOutcome> {
        self.run_lifecycle(
            LifecycleOperation::Resume,
            env_id,
            PollPolicy::lifecycle(),
            ThreadSleeper,
        )
    }

    /// Delete an environment and wait for every VM to drop its internal IP.
    pub fn delete_environment(&self, env_id: &str) -> Result<LifecycleOutcome> {
        self.run_lifecycle(
            LifecycleOperation::Delete,
            env_id,
            PollPolicy::lifecycle(),
            ThreadSleeper,
        )
    }

    /// Trigger `operation` on `env_id` and poll its VMs under `policy`.
    #[instrument(skip(self, policy, sleeper), fields(operation = %operation, env_id = %env_id))]
    pub fn run_lifecycle<S: Sleeper>(
        &self,
        operation: LifecycleOperation,
        env_id: &str,
        policy: PollPolicy,
        sleeper: S,
    ) -> Result<LifecycleOutcome> {
        info!("{} started", operation);
        operation.trigger(self.api(), env_id)?;

        let vms = |id: &str| -> Result<Vec<Record>> { self.list_vms(id) };
        let poller = ConvergencePoller::with_sleeper(vms, sleeper);
        let report = poller.poll_report(env_id, &operation.conditions(), policy)?;

        if report.converged {
            info!("{} completed!", operation);
            Ok(LifecycleOutcome::Converged {
                attempts: report.attempts,
            })
        } else {
            info!(
                "Timed out waiting for environment to reach {} state",
                operation.target_state()
            );
            if let Some(failure) = &report.last_failure {
                info!(
                    "Last check: {} has {} = {} (expected {})",
                    failure.record, failure.property, failure.value, failure.condition
                );
            }
            Ok(LifecycleOutcome::TimedOut {
                attempts: report.attempts,
                last_failure: report.last_failure,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::time::Duration;

    use cloudshare_http::Method;
    use serde_json::json;

    use crate::error::SdkError;
    use crate::testing::{MockApi, Reply};

    #[derive(Default)]
    struct RecordingSleeper {
        sleeps: RefCell<Vec<Duration>>,
    }

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
        }
    }

    fn vms(status: &str) -> serde_json::Value {
        json!({
            "statusText": status,
            "vms": [
                {"name": "vm1", "statusText": status, "internalIp": "10.0.0.1"},
                {"name": "vm2", "statusText": status, "internalIp": "10.0.0.2"}
            ]
        })
    }

    #[test]
    fn test_conditions_per_operation() {
        let suspend = LifecycleOperation::Suspend.conditions();
        assert_eq!(suspend.len(), 1);
        assert_eq!(suspend[0].to_string(), r#"statusText == "Suspended""#);
        assert_eq!(
            LifecycleOperation::Resume.conditions()[0].to_string(),
            r#"statusText == "Running""#
        );
        assert_eq!(
            LifecycleOperation::Delete.conditions()[0].to_string(),
            "internalIp is null"
        );
    }

    #[test]
    fn test_lifecycle_policy() {
        let policy = PollPolicy::lifecycle();
        assert_eq!(policy.delay, Duration::from_secs(6));
        assert_eq!(policy.max_attempts, 20);
    }

    #[test]
    fn test_suspend_converges() {
        let api = MockApi::new()
            .on(Method::Put, "envs/actions/suspend", json!(null))
            .on(Method::Get, "envs/actions/getextended", vms("Suspending"))
            .on(Method::Get, "envs/actions/getextended", vms("Suspended"));
        let sdk = CloudShareSdk::with_client(api);
        let sleeper = RecordingSleeper::default();

        let outcome = sdk
            .run_lifecycle(LifecycleOperation::Suspend, "EN1", PollPolicy::lifecycle(), &sleeper)
            .unwrap();

        assert_eq!(outcome, LifecycleOutcome::Converged { attempts: 2 });
        assert_eq!(*sleeper.sleeps.borrow(), vec![Duration::from_secs(6)]);

        let triggers = sdk.api().calls_to(Method::Put, "envs/actions/suspend");
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].query, vec![("envId".to_string(), "EN1".to_string())]);
    }

    #[test]
    fn test_resume_times_out() {
        let api = MockApi::new()
            .on(Method::Put, "envs/actions/resume", json!(null))
            .on(Method::Get, "envs/actions/getextended", vms("Resuming"));
        let sdk = CloudShareSdk::with_client(api);
        let sleeper = RecordingSleeper::default();
        let policy = PollPolicy::new(Duration::ZERO, 3);

        let outcome = sdk
            .run_lifecycle(LifecycleOperation::Resume, "EN1", policy, &sleeper)
            .unwrap();

        assert!(!outcome.is_converged());
        assert_eq!(outcome.attempts(), 3);
        match outcome {
            LifecycleOutcome::TimedOut { last_failure, .. } => {
                let failure = last_failure.unwrap();
                assert_eq!(failure.record, "vm1");
                assert_eq!(failure.value, json!("Resuming"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(sleeper.sleeps.borrow().len(), 2);
        assert_eq!(sdk.api().calls_to(Method::Put, "envs/actions/resume").len(), 1);
    }

    #[test]
    fn test_delete_waits_for_ips_to_clear() {
        let api = MockApi::new()
            .on(Method::Delete, "envs/EN7", json!(null))
            .on(Method::Get, "envs/actions/getextended", vms("Deleting"))
            .on(
                Method::Get,
                "envs/actions/getextended",
                json!({"vms": [
                    {"name": "vm1", "internalIp": null},
                    {"name": "vm2", "internalIp": null}
                ]}),
            );
        let sdk = CloudShareSdk::with_client(api);

        let outcome = sdk
            .run_lifecycle(
                LifecycleOperation::Delete,
                "EN7",
                PollPolicy::new(Duration::ZERO, 5),
                &RecordingSleeper::default(),
            )
            .unwrap();

        assert_eq!(outcome, LifecycleOutcome::Converged { attempts: 2 });
        assert_eq!(sdk.api().calls_to(Method::Delete, "envs/EN7").len(), 1);
    }

    #[test]
    fn test_failed_trigger_never_polls() {
        let api = MockApi::new()
            .reply(
                Method::Put,
                "envs/actions/suspend",
                Reply::Api(409, "environment is busy".to_string()),
            )
            .on(Method::Get, "envs/actions/getextended", vms("Running"));
        let sdk = CloudShareSdk::with_client(api);
        let sleeper = RecordingSleeper::default();

        let err = sdk
            .run_lifecycle(LifecycleOperation::Suspend, "EN1", PollPolicy::lifecycle(), &sleeper)
            .unwrap_err();

        assert!(matches!(err, SdkError::Api { status: 409, .. }));
        assert!(sdk.api().calls_to(Method::Get, "envs/actions/getextended").is_empty());
        assert!(sleeper.sleeps.borrow().is_empty());
    }

    #[test]
    fn test_snapshot_failure_aborts_after_trigger() {
        let api = MockApi::new()
            .on(Method::Put, "envs/actions/resume", json!(null))
            .reply(
                Method::Get,
                "envs/actions/getextended",
                Reply::Connection("connection reset".to_string()),
            );
        let sdk = CloudShareSdk::with_client(api);

        let err = sdk
            .run_lifecycle(
                LifecycleOperation::Resume,
                "EN1",
                PollPolicy::lifecycle(),
                &RecordingSleeper::default(),
            )
            .unwrap_err();
        assert!(matches!(err, SdkError::Connection(_)));
    }

    #[test]
    fn test_missing_status_is_configuration_error() {
        let api = MockApi::new()
            .on(Method::Put, "envs/actions/suspend", json!(null))
            .on(
                Method::Get,
                "envs/actions/getextended",
                json!({"vms": [{"name": "vm1", "internalIp": "10.0.0.1"}]}),
            );
        let sdk = CloudShareSdk::with_client(api);
        let sleeper = RecordingSleeper::default();

        let err = sdk
            .run_lifecycle(LifecycleOperation::Suspend, "EN1", PollPolicy::lifecycle(), &sleeper)
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(sleeper.sleeps.borrow().is_empty());
        assert_eq!(sdk.api().calls_to(Method::Get, "envs/actions/getextended").len(), 1);
    }

    #[test]
    fn test_environment_without_vms_converges_at_once() {
        let api = MockApi::new()
            .on(Method::Put, "envs/actions/suspend", json!(null))
            .on(
                Method::Get,
                "envs/actions/getextended",
                json!({"statusText": "Suspended", "vms": []}),
            );
        let sdk = CloudShareSdk::with_client(api);

        let outcome = sdk
            .run_lifecycle(
                LifecycleOperation::Suspend,
                "EN1",
                PollPolicy::lifecycle(),
                &RecordingSleeper::default(),
            )
            .unwrap();
        assert_eq!(outcome, LifecycleOutcome::Converged { attempts: 1 });
    }

    #[test]
    fn test_reply_without_vms_aborts() {
        let api = MockApi::new()
            .on(Method::Put, "envs/actions/suspend", json!(null))
            .on(
                Method::Get,
                "envs/actions/getextended",
                json!({"statusText": "Suspending"}),
            );
        let sdk = CloudShareSdk::with_client(api);
        let sleeper = RecordingSleeper::default();

        let err = sdk
            .run_lifecycle(
                LifecycleOperation::Suspend,
                "EN1",
                PollPolicy::new(Duration::ZERO, 20),
                &sleeper,
            )
            .unwrap_err();
        assert!(matches!(err, SdkError::UnexpectedResponse(_)));
        assert!(sleeper.sleeps.borrow().is_empty());
    }
}
