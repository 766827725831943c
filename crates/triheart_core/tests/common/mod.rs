//! A scripted in-memory backend shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use triheart_core::{BackendReply, BackendTransport, Method, Payload, PortError, PortResult};

/// One recorded request.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub path: String,
    pub method: Method,
    pub payload: Payload,
}

/// Answers each path with a fixed result; unknown paths are unreachable.
#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<HashMap<String, PortResult<BackendReply>>>,
    calls: Mutex<Vec<Call>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, path: &str, result: PortResult<BackendReply>) -> &Self {
        self.replies.lock().unwrap().insert(path.to_string(), result);
        self
    }

    pub fn ok(&self, path: &str, data: Value) -> &Self {
        self.reply(path, Ok(BackendReply::success(data)))
    }

    pub fn denied(&self, path: &str, message: Option<&str>) -> &Self {
        self.reply(path, Ok(BackendReply::denied(message)))
    }

    pub fn fail(&self, path: &str, err: PortError) -> &Self {
        self.reply(path, Err(err))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, path: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.path == path).collect()
    }
}

#[async_trait]
impl BackendTransport for StubTransport {
    async fn send(&self, path: &str, method: Method, payload: Payload) -> PortResult<BackendReply> {
        self.calls.lock().unwrap().push(Call {
            path: path.to_string(),
            method,
            payload,
        });
        self.replies
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| Err(PortError::Unreachable(format!("no route for {}", path))))
    }
}

/// The JSON body of a recorded call.
pub fn json_body(call: &Call) -> &Value {
    match &call.payload {
        Payload::Json(v) => v,
        other => panic!("expected a JSON payload, got {:?}", other),
    }
}
