//! SLS Appender
//!
//! Ships structured log events to an Aliyun Log Service logstore, batching
//! them to cut down on requests.
//!
//! Architecture:
//! - Configuration: validate options once at setup
//! - Serializer: flatten each event's payload into key/value strings
//! - Services: batch buffer and dispatch to the delivery client
//! - Scheduler: periodic flush of the buffer in fixed-size groups
//! - Drain: best-effort final flush at shutdown
//!
//! Without a flush interval every event is shipped on its own as soon as it
//! arrives. With one, events are buffered and flushed every interval.

pub mod appender;
pub mod config;
mod drain;
pub mod error;
pub mod scheduler;
pub mod serializer;
pub mod service;

#[cfg(test)]
pub(crate) mod test_support;

pub use appender::{Append, Appender};
pub use config::{AppenderOptions, Config, DEFAULT_BATCH_SIZE};
pub use drain::Drain;
pub use error::{ConfigError, DeliveryError, DeliveryResult, SetupError};
pub use serializer::{CIRCULAR_PLACEHOLDER, Discard};
