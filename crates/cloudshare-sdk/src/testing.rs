// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Scripted [`ApiClient`] for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use cloudshare_http::Method;
use serde_json::Value;

use crate::api::ApiClient;
use crate::error::{Result, SdkError};

#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Json(Value),
    Api(u16, String),
    Connection(String),
}

impl Reply {
    fn into_result(self) -> Result<Value> {
        match self {
            Reply::Json(value) => Ok(value),
            Reply::Api(status, message) => Err(SdkError::Api { status, message }),
            Reply::Connection(message) => Err(SdkError::Connection(message)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Replies are queued per (method, path); the last one repeats.
#[derive(Default)]
pub(crate) struct MockApi {
    routes: RefCell<HashMap<(Method, String), VecDeque<Reply>>>,
    pub calls: RefCell<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, reply: Value) -> Self {
        self.reply(method, path, Reply::Json(reply))
    }

    pub fn reply(self, method: Method, path: &str, reply: Reply) -> Self {
        self.routes
            .borrow_mut()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls_to(&self, method: Method, path: &str) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .cloned()
            .collect()
    }
}

impl ApiClient for MockApi {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value> {
        self.calls.borrow_mut().push(Call {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.cloned(),
        });

        let mut routes = self.routes.borrow_mut();
        let queue = routes
            .get_mut(&(method, path.to_string()))
            .ok_or_else(|| SdkError::Api {
                status: 404,
                message: format!("no route for {} {}", method, path),
            })?;

        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply
            .ok_or_else(|| SdkError::Api {
                status: 404,
                message: format!("no reply for {} {}", method, path),
            })?
            .into_result()
    }
}
