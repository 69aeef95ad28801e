// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Convergence and lifecycle behaviour through the public API.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use cloudshare_sdk::{
    ApiClient, CloudShareSdk, Condition, ConvergencePoller, LifecycleOperation, LifecycleOutcome,
    Method, PollPolicy, Record, Result, SdkError, Sleeper,
};
use serde_json::{Value, json};

#[derive(Default)]
struct CountingSleeper {
    sleeps: Cell<u32>,
}

impl Sleeper for CountingSleeper {
    fn sleep(&self, _duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
    }
}

fn records(value: Value) -> Vec<Record> {
    cloudshare_sdk::records_from_value(value).unwrap()
}

/// Replies with the given extended-environment bodies in order, repeating the last.
struct ScriptedEnvironment {
    extended: RefCell<VecDeque<Value>>,
    requests: RefCell<Vec<(Method, String)>>,
}

impl ScriptedEnvironment {
    fn new(extended: Vec<Value>) -> Self {
        Self {
            extended: RefCell::new(extended.into()),
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl ApiClient for ScriptedEnvironment {
    fn request(
        &self,
        method: Method,
        path: &str,
        _query: &[(&str, &str)],
        _body: Option<&Value>,
    ) -> Result<Value> {
        self.requests.borrow_mut().push((method, path.to_string()));
        match (method, path) {
            (Method::Get, "envs/actions/getextended") => {
                let mut queue = self.extended.borrow_mut();
                let reply = if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                };
                reply.ok_or_else(|| SdkError::UnexpectedResponse("no script".to_string()))
            }
            (Method::Put, _) | (Method::Delete, _) => Ok(Value::Null),
            _ => Err(SdkError::Api {
                status: 404,
                message: format!("{} {}", method, path),
            }),
        }
    }
}

#[test]
fn test_closure_provider_converges_on_third_snapshot() {
    let fetches = Cell::new(0);
    let provider = |_: &str| -> Result<Vec<Record>> {
        fetches.set(fetches.get() + 1);
        let status = if fetches.get() < 3 { "Suspending" } else { "Suspended" };
        Ok(records(json!([{"statusText": status}])))
    };
    let sleeper = CountingSleeper::default();
    let poller = ConvergencePoller::with_sleeper(provider, &sleeper);

    let converged = poller
        .poll(
            "EN1",
            &[Condition::equals("statusText", "Suspended")],
            PollPolicy::new(Duration::ZERO, 3),
        )
        .unwrap();

    assert!(converged);
    assert_eq!(fetches.get(), 3);
    assert_eq!(sleeper.sleeps.get(), 2);
}

#[test]
fn test_sdk_as_snapshot_provider() {
    let api = ScriptedEnvironment::new(vec![json!({
        "vms": [{"name": "vm1", "statusText": "Running"}]
    })]);
    let sdk = CloudShareSdk::with_client(api);
    let poller = ConvergencePoller::with_sleeper(sdk, CountingSleeper::default());

    let report = poller
        .poll_report(
            "EN1",
            &[Condition::equals("statusText", "Running")],
            PollPolicy::new(Duration::ZERO, 5),
        )
        .unwrap();
    assert!(report.converged);
    assert_eq!(report.attempts, 1);
    assert_eq!(poller.sleeper().sleeps.get(), 0);
}

#[test]
fn test_resume_through_custom_client() {
    let api = ScriptedEnvironment::new(vec![
        json!({"vms": [{"name": "vm1", "statusText": "Resuming"}]}),
        json!({"vms": [{"name": "vm1", "statusText": "Running"}]}),
    ]);
    let sdk = CloudShareSdk::with_client(api);
    let sleeper = CountingSleeper::default();

    let outcome = sdk
        .run_lifecycle(
            LifecycleOperation::Resume,
            "EN5",
            PollPolicy::new(Duration::ZERO, 4),
            &sleeper,
        )
        .unwrap();

    assert_eq!(outcome, LifecycleOutcome::Converged { attempts: 2 });
    let requests = sdk.api().requests.borrow();
    assert_eq!(
        requests[0],
        (Method::Put, "envs/actions/resume".to_string())
    );
    assert_eq!(requests.len(), 3);
}

#[test]
fn test_delete_timeout_is_an_outcome() {
    let api = ScriptedEnvironment::new(vec![json!({
        "vms": [{"name": "vm1", "internalIp": "10.0.0.9"}]
    })]);
    let sdk = CloudShareSdk::with_client(api);

    let outcome = sdk
        .run_lifecycle(
            LifecycleOperation::Delete,
            "EN5",
            PollPolicy::new(Duration::ZERO, 2),
            CountingSleeper::default(),
        )
        .unwrap();

    assert!(!outcome.is_converged());
    assert_eq!(outcome.attempts(), 2);
    assert_eq!(
        sdk.api().requests.borrow()[0],
        (Method::Delete, "envs/EN5".to_string())
    );
}
