//! Appender
//!
//! Entry point of the crate. An [`Appender`] owns its configuration, batch
//! buffer, flush scheduler and drain hook; clones share the same state.
//!
//! ```no_run
//! use serde_json::json;
//! use sls_appender::{Appender, AppenderOptions};
//! use sls_core::domain::event::{Level, LogEvent};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let appender = Appender::connect(
//!         AppenderOptions::new()
//!             .with_credentials("access-key-id", "access-key-secret")
//!             .with_endpoint("cn-hangzhou.log.aliyuncs.com")
//!             .with_project("my-project")
//!             .with_logstore("app")
//!             .with_interval(Duration::from_secs(5)),
//!     )?;
//!
//!     let sink = appender.sink();
//!     sink(LogEvent::new("http", Level::info(), "request served", json!({"status": 200})));
//!
//!     appender.shutdown();
//!     Ok(())
//! }
//! ```

use sls_client::{DeliveryClient, SlsClient};
use sls_core::domain::event::LogEvent;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{AppenderOptions, Config};
use crate::drain::{Drain, DrainHook};
use crate::error::{DeliveryResult, SetupError};
use crate::scheduler::FlushScheduler;
use crate::serializer::{self, Discard};
use crate::service::{BatchBufferService, Dispatcher, InMemoryBatchBuffer};

/// What happened to an appended event
#[derive(Debug)]
pub enum Append {
    /// The event was dropped on purpose
    Discarded(Discard),
    /// The record waits in the buffer for the next flush tick
    Buffered,
    /// Batching is disabled; the record is being delivered on its own
    Dispatched(JoinHandle<DeliveryResult>),
}

/// Batching log appender shipping events to a logstore
#[derive(Clone)]
pub struct Appender {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    buffer: Arc<dyn BatchBufferService>,
    dispatcher: Dispatcher,
    /// Present when batching is enabled
    scheduler: Option<FlushScheduler>,
    drain: DrainHook,
}

impl Appender {
    /// Validates options and builds an appender around `client`
    ///
    /// Must be called from within a tokio runtime; use
    /// [`Appender::with_runtime`] otherwise.
    pub fn configure(
        options: AppenderOptions,
        client: Arc<dyn DeliveryClient>,
    ) -> Result<Self, SetupError> {
        let config = Config::from_options(options)?;
        let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;

        Ok(Self::with_runtime(config, client, runtime))
    }

    /// Validates options and builds an appender backed by [`SlsClient`]
    ///
    /// Credentials, endpoint, API version and timeout are taken from the
    /// same options.
    pub fn connect(options: AppenderOptions) -> Result<Self, SetupError> {
        let config = Config::from_options(options)?;
        let runtime = Handle::try_current().map_err(|_| SetupError::NoRuntime)?;
        let client = SlsClient::new(config.client_options())?;

        Ok(Self::with_runtime(config, Arc::new(client), runtime))
    }

    /// Builds an appender from a validated config on an explicit runtime
    pub fn with_runtime(config: Config, client: Arc<dyn DeliveryClient>, runtime: Handle) -> Self {
        let buffer: Arc<dyn BatchBufferService> = Arc::new(InMemoryBatchBuffer::new());
        let dispatcher = Dispatcher::new(&config, client, runtime);

        let scheduler = config.flush_interval.map(|interval| {
            FlushScheduler::new(
                interval,
                config.batch_size,
                Arc::clone(&buffer),
                dispatcher.clone(),
            )
        });

        info!(
            "Appender ready for {}/{} (batching: {})",
            config.project,
            config.logstore,
            if scheduler.is_some() { "on" } else { "off" }
        );

        Self {
            inner: Arc::new(Inner {
                config,
                buffer,
                dispatcher,
                scheduler,
                drain: DrainHook::new(),
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Number of records waiting for the next flush
    pub fn pending(&self) -> usize {
        self.inner.buffer.len()
    }

    /// Returns true once the flush scheduler has been armed
    pub fn is_armed(&self) -> bool {
        self.inner
            .scheduler
            .as_ref()
            .is_some_and(FlushScheduler::is_armed)
    }

    /// Accepts one event
    ///
    /// Never blocks on delivery and never fails: non-object payloads are
    /// discarded, delivery errors are logged by the dispatcher.
    pub fn append(&self, event: LogEvent) -> Append {
        let record = match serializer::to_record(&event, &self.inner.config.content) {
            Ok(record) => record,
            Err(discard) => return Append::Discarded(discard),
        };

        match &self.inner.scheduler {
            Some(scheduler) => {
                self.inner.buffer.push(record);
                scheduler.arm();
                Append::Buffered
            }
            None => Append::Dispatched(self.inner.dispatcher.dispatch_record(record)),
        }
    }

    /// Returns the event sink handed to the logging front-end
    pub fn sink(&self) -> impl Fn(LogEvent) + Send + Sync + 'static {
        let appender = self.clone();
        move |event| {
            let _ = appender.append(event);
        }
    }

    /// Drains the buffer as a single dispatch group
    ///
    /// Only the first call (or the final drop, whichever comes first) drains.
    /// The drain dispatch is attempted but not awaited; await the returned
    /// handle to wait for delivery.
    pub fn shutdown(&self) -> Drain {
        self.inner.drain_now()
    }

    /// Drains the buffer when the process receives ctrl-c
    ///
    /// The watcher does not keep the appender alive.
    pub fn drain_on_ctrl_c(&self) -> JoinHandle<()> {
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);

        self.inner.dispatcher.runtime().spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for ctrl-c, drain hook disabled: {}", e);
                return;
            }

            match inner.upgrade() {
                Some(inner) => {
                    inner.drain_now();
                }
                None => debug!("Appender already dropped, nothing to drain"),
            }
        })
    }
}

impl Inner {
    fn drain_now(&self) -> Drain {
        self.drain.fire(self.buffer.as_ref(), &self.dispatcher)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.drain_now();
    }
}
