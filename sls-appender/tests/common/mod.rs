//! Shared helpers for appender integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use sls_appender::AppenderOptions;
use sls_client::{ClientError, DeliveryClient, PutLogsRequest};
use sls_core::domain::event::{Level, LogEvent};
use sls_core::domain::payload::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Delivery client that records every call
///
/// The first `failures` calls are rejected with a 503 after being recorded.
#[derive(Default)]
pub struct FakeClient {
    requests: Mutex<Vec<PutLogsRequest>>,
    failures: AtomicUsize,
}

impl FakeClient {
    pub fn failing_first(failures: usize) -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            failures: AtomicUsize::new(failures),
        }
    }

    pub fn requests(&self) -> Vec<PutLogsRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn group_sizes(&self) -> Vec<usize> {
        self.requests().iter().map(PutLogsRequest::len).collect()
    }

    /// `seq` field of every delivered record, in delivery order
    pub fn delivered_seqs(&self) -> Vec<String> {
        self.requests()
            .iter()
            .flat_map(|request| request.logs.iter())
            .filter_map(|record| record.get("seq").map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl DeliveryClient for FakeClient {
    async fn put_logs(&self, request: PutLogsRequest) -> sls_client::Result<()> {
        self.requests.lock().unwrap().push(request);

        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::api_error(503, "store unavailable"));
        }
        Ok(())
    }
}

/// Options with every required field set
pub fn options() -> AppenderOptions {
    AppenderOptions::new()
        .with_credentials("test-ak", "test-sk")
        .with_endpoint("cn-hangzhou.log.aliyuncs.com")
        .with_project("demo")
        .with_logstore("app")
}

/// An event whose payload carries a `seq` field
pub fn event(seq: usize) -> LogEvent {
    event_with(json!({ "seq": seq }))
}

pub fn event_with(payload: impl Into<Value>) -> LogEvent {
    LogEvent::new("test", Level::info(), "hello", payload)
}

pub fn seqs(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| i.to_string()).collect()
}
