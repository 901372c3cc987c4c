//! Error types for the appender

use sls_client::ClientError;
use thiserror::Error;

/// Configuration rejected at setup time
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required options are absent or empty
    #[error("missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),
}

/// Fatal errors raised while setting up an appender
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Setup ran outside a tokio runtime and no handle was supplied
    #[error("no tokio runtime available to drive the appender")]
    NoRuntime,

    /// The bundled SLS client could not be built
    #[error("failed to create delivery client: {0}")]
    Client(#[from] ClientError),
}

/// Why a dispatch group was not delivered
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("delivery client panicked")]
    Panicked,
}

/// Outcome of one dispatch: the number of records delivered
pub type DeliveryResult = std::result::Result<usize, DeliveryError>;
