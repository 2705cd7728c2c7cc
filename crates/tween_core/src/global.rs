//! Process-wide engine
//!
//! Most applications drive all their tweens from one engine. It has to be
//! installed explicitly at startup:
//!
//! ```ignore
//! let engine = TweenEngine::builder().driver(my_driver).build()?;
//! tween_core::init_global_engine(engine)?;
//!
//! // Anywhere else:
//! tween_core::global_engine()?.tween(0.0f32, 1.0, 0.3, 0.0)?;
//! ```
//!
//! Engines built with [`TweenEngine::new`] or the builder stay fully
//! independent of the global one.

use crate::engine::TweenEngine;
use crate::error::{Result, TweenError};
use std::sync::OnceLock;

static GLOBAL_ENGINE: OnceLock<TweenEngine> = OnceLock::new();

/// Install the global engine (call once at startup)
pub fn init_global_engine(engine: TweenEngine) -> Result<()> {
    GLOBAL_ENGINE
        .set(engine)
        .map_err(|_| TweenError::AlreadyInitialized)?;
    tracing::debug!("global tween engine initialized");
    Ok(())
}

/// The global engine, or [`TweenError::NotInitialized`]
pub fn global_engine() -> Result<&'static TweenEngine> {
    GLOBAL_ENGINE.get().ok_or(TweenError::NotInitialized)
}

pub fn try_global_engine() -> Option<&'static TweenEngine> {
    GLOBAL_ENGINE.get()
}

pub fn is_global_engine_initialized() -> bool {
    GLOBAL_ENGINE.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The only test in this crate that touches the global slot
    #[test]
    fn test_global_engine_lifecycle() {
        assert!(!is_global_engine_initialized());
        assert!(matches!(global_engine(), Err(TweenError::NotInitialized)));

        init_global_engine(TweenEngine::new()).unwrap();
        assert!(is_global_engine_initialized());
        assert!(try_global_engine().is_some());

        let engine = global_engine().unwrap();
        engine.tween(0.0f32, 1.0, 1.0, 0.0).unwrap();
        assert!(engine.has_operations());

        assert!(matches!(
            init_global_engine(TweenEngine::new()),
            Err(TweenError::AlreadyInitialized)
        ));

        // Independent engines are unaffected
        let local = TweenEngine::new();
        assert!(!local.has_operations());
    }
}
