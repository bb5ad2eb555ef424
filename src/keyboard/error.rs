//! Error definitions for the keyboard subsystem

use thiserror::Error;

/// Error types for the keyboard engine
#[derive(Debug, Error)]
pub enum KeyboardError {
    /// Invalid compiled-in layout or binding data
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Channel communication failure
    #[error("Channel error: {0}")]
    ChannelError(String),

    /// Task management failure
    #[error("Task error: {0}")]
    TaskError(String),
}
