//! Log event domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::payload::Value;

/// A single log event submitted to the appender
///
/// The payload is only shipped when it is an object or array; events
/// carrying a bare string or other primitive are dropped by the serializer.
#[derive(Debug, Clone)]
pub struct LogEvent {
    /// When the event was created
    pub start_time: DateTime<Utc>,
    /// Name of the logger category that produced the event
    pub category: String,
    /// Message component of the event data
    pub message: String,
    /// Structured payload component of the event data
    pub payload: Value,
    pub level: Level,
    /// Originating process id
    pub pid: u32,
}

impl LogEvent {
    /// Creates an event stamped with the current time and process id
    pub fn new(
        category: impl Into<String>,
        level: Level,
        message: impl Into<String>,
        payload: impl Into<Value>,
    ) -> Self {
        Self {
            start_time: Utc::now(),
            category: category.into(),
            message: message.into(),
            payload: payload.into(),
            level,
            pid: std::process::id(),
        }
    }

    /// Overrides the creation time
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = start_time;
        self
    }
}

/// Severity of a log event: a numeric rank plus its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub level: i32,
    pub level_str: String,
}

impl Level {
    pub fn new(level: i32, level_str: impl Into<String>) -> Self {
        Self {
            level,
            level_str: level_str.into(),
        }
    }

    pub fn trace() -> Self {
        Self::new(5000, "TRACE")
    }

    pub fn debug() -> Self {
        Self::new(10000, "DEBUG")
    }

    pub fn info() -> Self {
        Self::new(20000, "INFO")
    }

    pub fn warn() -> Self {
        Self::new(30000, "WARN")
    }

    pub fn error() -> Self {
        Self::new(40000, "ERROR")
    }

    pub fn fatal() -> Self {
        Self::new(50000, "FATAL")
    }
}
