//! Core domain types
//!
//! These types describe a log event as it enters the appender and the
//! flattened records that leave it. They are shared between the appender
//! engine and the delivery client.

pub mod event;
pub mod payload;
pub mod record;
