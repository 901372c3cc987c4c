//! Flush scheduler
//!
//! Two states: `Idle` until the first buffered record arrives, then `Armed`
//! with a ticker task that drains the buffer every interval. There is no
//! transition back to `Idle`; the ticker stops when the scheduler is dropped.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::DeliveryResult;
use crate::service::{BatchBufferService, Dispatcher};
use sls_core::domain::record::BatchedRecord;

enum SchedulerState {
    Idle,
    Armed(JoinHandle<()>),
}

/// Periodically drains a batch buffer into dispatch groups
pub struct FlushScheduler {
    interval: Duration,
    batch_size: usize,
    buffer: Arc<dyn BatchBufferService>,
    dispatcher: Dispatcher,
    state: Mutex<SchedulerState>,
}

impl FlushScheduler {
    /// Creates an idle scheduler
    ///
    /// # Arguments
    /// * `interval` - Time between flush ticks
    /// * `batch_size` - Maximum records per dispatch group
    /// * `buffer` - Buffer drained on every tick
    /// * `dispatcher` - Receives the dispatch groups
    pub fn new(
        interval: Duration,
        batch_size: usize,
        buffer: Arc<dyn BatchBufferService>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            interval,
            batch_size,
            buffer,
            dispatcher,
            state: Mutex::new(SchedulerState::Idle),
        }
    }

    pub fn is_armed(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(PoisonError::into_inner),
            SchedulerState::Armed(_)
        )
    }

    /// Starts the ticker if it is not running yet
    ///
    /// Returns true if this call armed the scheduler. The first tick fires
    /// one full interval after arming.
    pub fn arm(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let SchedulerState::Armed(_) = *state {
            return false;
        }

        let interval = self.interval;
        let batch_size = self.batch_size;
        let buffer = Arc::clone(&self.buffer);
        let dispatcher = self.dispatcher.clone();

        let handle = self.dispatcher.runtime().spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                flush_tick(buffer.as_ref(), &dispatcher, batch_size);
            }
        });

        info!(
            "Flush scheduler armed (interval: {:?}, batch size: {})",
            interval, batch_size
        );
        *state = SchedulerState::Armed(handle);
        true
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let SchedulerState::Armed(handle) = state {
            handle.abort();
        }
    }
}

/// Runs one flush tick
///
/// Takes everything pending, splits it into groups of at most `batch_size`
/// and dispatches each group. Does nothing when the buffer is empty.
pub fn flush_tick(
    buffer: &dyn BatchBufferService,
    dispatcher: &Dispatcher,
    batch_size: usize,
) -> Vec<JoinHandle<DeliveryResult>> {
    let records = buffer.take();
    if records.is_empty() {
        debug!("No logs to flush");
        return Vec::new();
    }

    let groups = partition(records, batch_size);
    debug!("Flushing {} dispatch group(s)", groups.len());

    groups
        .into_iter()
        .filter_map(|group| dispatcher.dispatch(group))
        .collect()
}

/// Splits records into consecutive groups of at most `batch_size`
///
/// Order is preserved; only the last group may be smaller. A zero batch size
/// is treated as one.
pub fn partition(records: Vec<BatchedRecord>, batch_size: usize) -> Vec<Vec<BatchedRecord>> {
    let size = batch_size.max(1);
    let mut groups = Vec::with_capacity(records.len().div_ceil(size));
    let mut records = records.into_iter().peekable();

    while records.peek().is_some() {
        groups.push(records.by_ref().take(size).collect());
    }

    groups
}
