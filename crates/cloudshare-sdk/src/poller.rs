// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Convergence poller.
//!
//! Repeatedly snapshots a collection and checks every record against every
//! condition until all of them hold or the attempt budget runs out:
//!
//! ```text
//! attempt 1: snapshot -> evaluate -> not converged -> sleep(delay)
//! attempt 2: snapshot -> evaluate -> not converged -> sleep(delay)
//! ...
//! attempt N: snapshot -> evaluate -> not converged -> give up (no sleep)
//! ```
//!
//! Within one attempt the first failing (record, condition) pair ends the
//! evaluation; the attempt is retried anyway, so the outcome is the same as a
//! full scan. That first failure is kept in [`PollReport::last_failure`].
//!
//! Errors from the snapshot provider and missing-property errors abort the
//! poll at once. Neither is retried and no delay is spent on them.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::condition::{Condition, evaluate};
use crate::error::{Result, SdkError};
use crate::record::{Record, label};

/// Delay between lifecycle polls.
pub const LIFECYCLE_DELAY: Duration = Duration::from_secs(6);
/// Attempt budget for lifecycle polls.
pub const LIFECYCLE_MAX_ATTEMPTS: u32 = 20;

/// Source of fresh snapshots of a collection's members.
pub trait SnapshotProvider {
    fn snapshot(&self, resource_id: &str) -> Result<Vec<Record>>;
}

impl<F> SnapshotProvider for F
where
    F: Fn(&str) -> Result<Vec<Record>>,
{
    fn snapshot(&self, resource_id: &str) -> Result<Vec<Record>> {
        self(resource_id)
    }
}

/// Blocking delay between attempts.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Real-time delay on the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl<T: Sleeper + ?Sized> Sleeper for &T {
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration);
    }
}

/// Delay and attempt budget for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two attempts.
    pub delay: Duration,
    /// Maximum number of snapshots taken. Must be at least 1.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(3),
            max_attempts: 10,
        }
    }
}

impl PollPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }

    /// Budget used by suspend, resume and delete.
    pub fn lifecycle() -> Self {
        Self::new(LIFECYCLE_DELAY, LIFECYCLE_MAX_ATTEMPTS)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// The (record, condition) pair that stopped an attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionFailure {
    pub record: String,
    pub property: String,
    pub value: Value,
    pub condition: String,
}

/// Terminal result of a poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    /// Every record satisfied every condition before the budget ran out.
    pub converged: bool,
    /// Snapshots taken.
    pub attempts: u32,
    /// First failure of the last attempt; `None` when converged.
    pub last_failure: Option<ConditionFailure>,
}

/// Drives snapshot → evaluate → sleep cycles for one resource at a time.
pub struct ConvergencePoller<P, S = ThreadSleeper> {
    provider: P,
    sleeper: S,
}

impl<P: SnapshotProvider> ConvergencePoller<P> {
    pub fn new(provider: P) -> Self {
        Self::with_sleeper(provider, ThreadSleeper)
    }
}

impl<P: SnapshotProvider, S: Sleeper> ConvergencePoller<P, S> {
    pub fn with_sleeper(provider: P, sleeper: S) -> Self {
        Self { provider, sleeper }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    /// `true` once all records satisfy all conditions, `false` when the budget is spent.
    pub fn poll(
        &self,
        resource_id: &str,
        conditions: &[Condition],
        policy: PollPolicy,
    ) -> Result<bool> {
        self.poll_report(resource_id, conditions, policy)
            .map(|report| report.converged)
    }

    /// Same as [`ConvergencePoller::poll`] with attempt count and last failure.
    #[instrument(
        skip(self, conditions, policy),
        fields(resource_id = %resource_id, max_attempts = policy.max_attempts)
    )]
    pub fn poll_report(
        &self,
        resource_id: &str,
        conditions: &[Condition],
        policy: PollPolicy,
    ) -> Result<PollReport> {
        if conditions.is_empty() {
            return Err(SdkError::InvalidInput(
                "at least one condition is required".to_string(),
            ));
        }
        if policy.max_attempts == 0 {
            return Err(SdkError::InvalidInput(
                "max_attempts must be at least 1".to_string(),
            ));
        }

        let mut attempt = 0;
        let mut converged = false;
        let mut last_failure = None;

        while !converged && attempt < policy.max_attempts {
            attempt += 1;
            let snapshot = self.provider.snapshot(resource_id)?;

            match first_failure(&snapshot, conditions)? {
                None => {
                    converged = true;
                    last_failure = None;
                }
                Some(failure) => {
                    debug!(
                        attempt,
                        record = %failure.record,
                        property = %failure.property,
                        value = %failure.value,
                        "record failed condition, waiting more"
                    );
                    last_failure = Some(failure);

                    if attempt < policy.max_attempts {
                        info!(
                            "Polling status #{}, waiting {} seconds...",
                            attempt,
                            policy.delay.as_secs_f64()
                        );
                        self.sleeper.sleep(policy.delay);
                    }
                }
            }
        }

        if converged {
            debug!(attempts = attempt, "resource reached desired state");
        } else {
            debug!(attempts = attempt, "timed out waiting for resource to reach desired state");
        }

        Ok(PollReport {
            converged,
            attempts: attempt,
            last_failure,
        })
    }
}

/// First failing pair in record order, then condition order. `None` means converged;
/// an empty snapshot is vacuously converged.
fn first_failure(
    snapshot: &[Record],
    conditions: &[Condition],
) -> Result<Option<ConditionFailure>> {
    for record in snapshot {
        for condition in conditions {
            if !evaluate(record, condition)? {
                return Ok(Some(ConditionFailure {
                    record: label(record),
                    property: condition.property().to_string(),
                    value: record
                        .get(condition.property())
                        .cloned()
                        .unwrap_or(Value::Null),
                    condition: condition.to_string(),
                }));
            }
        }
    }
    Ok(None)
}
