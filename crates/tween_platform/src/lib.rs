//! Tween Platform Drivers
//!
//! Real-time clock drivers for `tween_core` engines:
//!
//! - [`ThreadClockDriver`]: a dedicated OS thread, no runtime required
//! - [`TokioClockDriver`]: a task on a tokio runtime (feature `tokio`)
//! - [`TokioExecutor`]: delivers notifications on tokio's blocking pool
//!
//! ```rust,no_run
//! use tween_core::{Operation, TweenEngine};
//! use tween_platform::ThreadClockDriver;
//!
//! let engine = TweenEngine::builder()
//!     .driver(ThreadClockDriver::new())
//!     .build()
//!     .unwrap();
//! engine.register(Operation::tween(0.0f32, 1.0, 0.25)).unwrap();
//! ```

pub mod thread;
#[cfg(feature = "tokio")]
pub mod async_driver;

pub use thread::{ThreadClockDriver, DEFAULT_REFRESH_RATE};
#[cfg(feature = "tokio")]
pub use async_driver::{TokioClockDriver, TokioExecutor};
