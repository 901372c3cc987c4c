//! Shared fakes for unit tests

use async_trait::async_trait;
use sls_client::{DeliveryClient, PutLogsRequest};
use std::sync::Mutex;

use crate::config::{AppenderOptions, Config};

/// Delivery client that records every request and always succeeds
#[derive(Default)]
pub(crate) struct RecordingClient {
    pub requests: Mutex<Vec<PutLogsRequest>>,
}

impl RecordingClient {
    pub fn group_sizes(&self) -> Vec<usize> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(PutLogsRequest::len)
            .collect()
    }
}

#[async_trait]
impl DeliveryClient for RecordingClient {
    async fn put_logs(&self, request: PutLogsRequest) -> sls_client::Result<()> {
        self.requests.lock().unwrap().push(request);
        Ok(())
    }
}

/// Options with every required field set
pub(crate) fn options() -> AppenderOptions {
    AppenderOptions::new()
        .with_credentials("ak", "sk")
        .with_endpoint("cn-hangzhou.log.aliyuncs.com")
        .with_project("demo")
        .with_logstore("app")
}

pub(crate) fn config() -> Config {
    Config::from_options(options()).unwrap()
}
