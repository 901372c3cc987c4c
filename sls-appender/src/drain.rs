//! Shutdown drain
//!
//! A one-shot hook that ships whatever is still buffered as a single
//! dispatch group, ignoring the batch size. Delivery is attempted, not
//! awaited: the host decides whether to wait on the returned handle.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::error::DeliveryResult;
use crate::service::{BatchBufferService, Dispatcher};

/// Outcome of firing the drain hook
#[derive(Debug)]
pub enum Drain {
    /// The hook already ran for this appender
    AlreadyFired,
    /// Nothing was buffered
    Empty,
    /// The remaining records are being delivered
    Dispatched(JoinHandle<DeliveryResult>),
}

#[derive(Debug, Default)]
pub(crate) struct DrainHook {
    fired: AtomicBool,
}

impl DrainHook {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Fires the hook; only the first call does anything
    pub(crate) fn fire(&self, buffer: &dyn BatchBufferService, dispatcher: &Dispatcher) -> Drain {
        if self.fired.swap(true, Ordering::AcqRel) {
            return Drain::AlreadyFired;
        }

        let remaining = buffer.take();
        let count = remaining.len();
        match dispatcher.dispatch(remaining) {
            Some(handle) => {
                info!("Draining {} buffered log(s)", count);
                Drain::Dispatched(handle)
            }
            None => {
                debug!("Nothing to drain");
                Drain::Empty
            }
        }
    }
}
