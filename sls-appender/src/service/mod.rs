//! Service layer
//!
//! Services hold the appender's runtime state and side effects: the batch
//! buffer records wait in, and the dispatcher that hands groups to the
//! delivery client.
//!
//! The buffer is trait-based to enable testing and alternative storage.

pub mod buffer;
pub mod dispatch;

// Re-export traits
pub use buffer::BatchBufferService;

// Re-export implementations
pub use buffer::InMemoryBatchBuffer;
pub use dispatch::Dispatcher;
