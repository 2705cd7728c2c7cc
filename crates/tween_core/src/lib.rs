//! Tween Core Runtime
//!
//! A tick-driven value interpolation engine:
//!
//! - **Periods**: start/end values, delay and duration, and live progress
//! - **Timing Functions**: pluggable curves, with a stock set of easings
//! - **Operations**: a period plus name, curve, and update/completion hooks
//! - **Engine**: advances operations on each tick from an external clock,
//!   starts and stops that clock as work comes and goes, and makes pauses
//!   transparent to every operation's elapsed time
//!
//! # Example
//!
//! ```rust
//! use tween_core::{Operation, TweenEngine};
//!
//! let engine = TweenEngine::new();
//! engine
//!     .register(
//!         Operation::tween(0.0f64, 100.0, 1.0)
//!             .named("fade")
//!             .on_update(|period| println!("opacity: {}", period.progress())),
//!     )
//!     .unwrap();
//!
//! engine.tick(0.0); // first sighting stamps the start time
//! engine.tick(0.5); // prints "opacity: 50"
//! engine.tick(1.0); // prints "opacity: 100" and completes
//! assert!(!engine.has_operation("fade"));
//! ```

pub mod clock;
pub mod config;
pub mod easing;
pub mod engine;
pub mod error;
pub mod executor;
pub mod global;
pub mod operation;
pub mod period;
pub mod registry;
pub mod value;

/// Time in seconds
pub type Seconds = f64;

pub use clock::{Cadence, ClockDriver, ClockKind, ManualClock, ManualDriver, MonotonicClock, TimeSource};
pub use config::EngineConfig;
pub use easing::{Easing, TimingFunction};
pub use engine::{EngineBuilder, EngineHandle, EngineStats, TickStatus, TweenEngine};
pub use error::{Result, TweenError};
pub use executor::{ExecutionContext, InlineContext, Job, JobQueue};
pub use global::{global_engine, init_global_engine, is_global_engine_initialized, try_global_engine};
pub use operation::{CompletionCallback, Operation, Phase, UpdateCallback};
pub use period::Period;
pub use registry::OperationId;
pub use value::{Color, Rect, Tweenable, Vec2};
