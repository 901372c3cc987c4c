//! Scheduler layer for the appender
//!
//! This layer drives periodic flushing of the batch buffer. The scheduler
//! is armed by the first buffered record and then ticks for as long as the
//! appender lives.

pub mod flush;

pub use flush::{FlushScheduler, flush_tick, partition};
