//! Dispatch service
//!
//! Hands dispatch groups to the delivery client on the runtime without
//! waiting for them. Failures end up on the diagnostic channel (`error!`)
//! and in the returned handle; they are never retried or requeued.

use futures::FutureExt;
use sls_client::DeliveryClient;
use sls_core::domain::record::BatchedRecord;
use sls_core::dto::put_logs::PutLogsRequest;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error};

use crate::config::Config;
use crate::error::{DeliveryError, DeliveryResult};

/// Sends dispatch groups to a project/logstore through a delivery client
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn DeliveryClient>,
    project: String,
    logstore: String,
    topic: Option<String>,
    runtime: Handle,
}

impl Dispatcher {
    /// Creates a dispatcher targeting the configured project and logstore
    ///
    /// # Arguments
    /// * `config` - Validated appender configuration
    /// * `client` - Delivery client used for every group
    /// * `runtime` - Runtime the delivery tasks are spawned on
    pub fn new(config: &Config, client: Arc<dyn DeliveryClient>, runtime: Handle) -> Self {
        Self {
            client,
            project: config.project.clone(),
            logstore: config.logstore.clone(),
            topic: config.topic.clone(),
            runtime,
        }
    }

    pub(crate) fn runtime(&self) -> &Handle {
        &self.runtime
    }

    /// Dispatches a group, returning `None` when the group is empty
    pub fn dispatch(&self, group: Vec<BatchedRecord>) -> Option<JoinHandle<DeliveryResult>> {
        if group.is_empty() {
            debug!("Skipping empty dispatch group");
            return None;
        }

        Some(self.spawn_delivery(group))
    }

    /// Dispatches a single record as a one-record group
    pub fn dispatch_record(&self, record: BatchedRecord) -> JoinHandle<DeliveryResult> {
        self.spawn_delivery(vec![record])
    }

    fn spawn_delivery(&self, logs: Vec<BatchedRecord>) -> JoinHandle<DeliveryResult> {
        let request = PutLogsRequest {
            project: self.project.clone(),
            logstore: self.logstore.clone(),
            topic: self.topic.clone(),
            logs,
        };
        let client = Arc::clone(&self.client);

        self.runtime.spawn(
            async move {
                let count = request.len();
                // Building the future happens inside the guard too.
                let delivery = async move { client.put_logs(request).await };

                match AssertUnwindSafe(delivery).catch_unwind().await {
                    Ok(Ok(())) => {
                        debug!("Delivered {} log(s)", count);
                        Ok(count)
                    }
                    Ok(Err(e)) => {
                        error!("send log failed: {}", e);
                        Err(DeliveryError::Client(e))
                    }
                    Err(_) => {
                        error!("send log failed: delivery client panicked");
                        Err(DeliveryError::Panicked)
                    }
                }
            }
            .in_current_span(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, RecordingClient};
    use async_trait::async_trait;
    use sls_client::ClientError;
    use sls_core::domain::record::Content;
    use std::future::Future;
    use std::pin::Pin;
    use tracing_test::traced_test;

    struct Failing;

    #[async_trait]
    impl DeliveryClient for Failing {
        async fn put_logs(&self, _request: PutLogsRequest) -> sls_client::Result<()> {
            Err(ClientError::api_error(503, "store unavailable"))
        }
    }

    struct Panicking;

    #[async_trait]
    impl DeliveryClient for Panicking {
        async fn put_logs(&self, _request: PutLogsRequest) -> sls_client::Result<()> {
            panic!("transport exploded");
        }
    }

    /// Panics while building the future, before anything is awaited
    struct PanicsOnCall;

    impl DeliveryClient for PanicsOnCall {
        fn put_logs<'life0, 'async_trait>(
            &'life0 self,
            _request: PutLogsRequest,
        ) -> Pin<Box<dyn Future<Output = sls_client::Result<()>> + Send + 'async_trait>>
        where
            'life0: 'async_trait,
            Self: 'async_trait,
        {
            panic!("rejected before delivery started");
        }
    }

    fn config() -> Config {
        Config::from_options(test_support::options().with_topic("web")).unwrap()
    }

    fn record(message: &str) -> BatchedRecord {
        BatchedRecord::new(1, vec![Content::new("_message", message)])
    }

    #[tokio::test]
    async fn test_dispatch_builds_request() {
        let client = Arc::new(RecordingClient::default());
        let dispatcher = Dispatcher::new(&config(), client.clone(), Handle::current());

        let handle = dispatcher
            .dispatch(vec![record("a"), record("b")])
            .unwrap();
        assert_eq!(handle.await.unwrap().unwrap(), 2);

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].project, "demo");
        assert_eq!(requests[0].logstore, "app");
        assert_eq!(requests[0].topic.as_deref(), Some("web"));
        assert_eq!(requests[0].logs, vec![record("a"), record("b")]);
    }

    #[tokio::test]
    async fn test_empty_group_is_not_dispatched() {
        let client = Arc::new(RecordingClient::default());
        let dispatcher = Dispatcher::new(&config(), client.clone(), Handle::current());

        assert!(dispatcher.dispatch(Vec::new()).is_none());
        tokio::task::yield_now().await;
        assert!(client.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_client_error_is_reported_not_raised() {
        let dispatcher = Dispatcher::new(&config(), Arc::new(Failing), Handle::current());

        let result = dispatcher.dispatch_record(record("a")).await.unwrap();

        assert!(matches!(
            result,
            Err(DeliveryError::Client(ClientError::ApiError { status: 503, .. }))
        ));
        assert!(logs_contain("send log failed"));
    }

    #[tokio::test]
    async fn test_client_panic_is_contained() {
        let dispatcher = Dispatcher::new(&config(), Arc::new(Panicking), Handle::current());

        let result = dispatcher.dispatch_record(record("a")).await;

        assert!(matches!(result, Ok(Err(DeliveryError::Panicked))));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_client_panic_while_building_future_is_contained() {
        let dispatcher = Dispatcher::new(&config(), Arc::new(PanicsOnCall), Handle::current());

        let result = dispatcher.dispatch_record(record("a")).await;

        assert!(matches!(result, Ok(Err(DeliveryError::Panicked))));
        assert!(logs_contain("send log failed"));
    }
}
