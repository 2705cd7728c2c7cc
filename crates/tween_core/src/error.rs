//! Tween error types

use thiserror::Error;

/// Errors reported by the tween engine and its configuration layer
#[derive(Error, Debug)]
pub enum TweenError {
    /// Operation was not scheduled because its duration is zero, negative, or NaN
    #[error("Operation rejected: duration must be positive, got {0}")]
    NonPositiveDuration(f64),

    /// No operation matched the given name
    #[error("Operation not found: {0}")]
    NotFound(String),

    /// Configuration value out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration file could not be read or written
    #[error("Configuration I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Unrecognized easing curve name
    #[error("Unknown easing curve: {0}")]
    UnknownEasing(String),

    /// Global engine was initialized twice
    #[error("Global tween engine already initialized")]
    AlreadyInitialized,

    /// Global engine accessed before initialization
    #[error("Global tween engine not initialized. Call init_global_engine() at startup.")]
    NotInitialized,
}

/// Result type for tween operations
pub type Result<T> = std::result::Result<T, TweenError>;
