use parking_lot::Mutex;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tween_core::{Cadence, ClockDriver, EngineHandle, Operation, TweenEngine, TweenError};
use tween_platform::{ThreadClockDriver, TokioClockDriver, TokioExecutor};

const WAIT: Duration = Duration::from_secs(5);

fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .unwrap()
}

#[test]
fn test_thread_driver_runs_operation_to_completion() {
    let engine = TweenEngine::builder()
        .driver(ThreadClockDriver::new().with_refresh_rate(240.0))
        .build()
        .unwrap();
    assert!(!engine.is_driver_running());

    let (tx, rx) = mpsc::channel();
    let updates = Arc::new(Mutex::new(Vec::new()));
    let seen = updates.clone();
    engine
        .register(
            Operation::tween(0.0f64, 10.0, 0.05)
                .on_update(move |period| seen.lock().push(*period.progress()))
                .on_complete(move |period| {
                    let _ = tx.send(*period.progress());
                }),
        )
        .unwrap();
    assert!(engine.is_driver_running());

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), 10.0);
    assert_eq!(updates.lock().last().copied(), Some(10.0));
    assert!(!engine.has_operations());
    assert!(wait_until(|| !engine.is_driver_running()));
}

#[test]
fn test_thread_driver_fixed_interval() {
    let engine = TweenEngine::builder()
        .driver(ThreadClockDriver::new())
        .cadence(Cadence::fixed_interval(0.005))
        .build()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    engine
        .register(Operation::tween(0.0f32, 1.0, 0.02).on_complete(move |_| {
            let _ = tx.send(());
        }))
        .unwrap();

    rx.recv_timeout(WAIT).unwrap();
    assert!(engine.stats().ticks_processed >= 1);
}

#[test]
fn test_thread_driver_stops_while_paused() {
    let engine = TweenEngine::builder()
        .driver(ThreadClockDriver::new())
        .build()
        .unwrap();
    engine.tween(0.0f64, 1.0, 60.0, 0.0).unwrap();
    assert!(engine.is_driver_running());

    engine.pause();
    assert!(wait_until(|| !engine.is_driver_running()));

    engine.resume();
    assert!(engine.is_driver_running());

    engine.remove_all();
    assert!(wait_until(|| !engine.is_driver_running()));
}

#[test]
fn test_tokio_driver_runs_operation_to_completion() {
    let rt = runtime();
    let engine = TweenEngine::builder()
        .driver(TokioClockDriver::new(rt.handle().clone()).with_refresh_rate(240.0))
        .build()
        .unwrap();

    let (tx, rx) = mpsc::channel();
    engine
        .register(
            Operation::tween(0.0f64, 5.0, 0.05)
                .named("slide")
                .on_complete(move |period| {
                    let _ = tx.send(*period.progress());
                }),
        )
        .unwrap();
    assert!(engine.is_driver_running());

    assert_eq!(rx.recv_timeout(WAIT).unwrap(), 5.0);
    assert!(!engine.has_operation("slide"));
    assert!(wait_until(|| !engine.is_driver_running()));
}

#[test]
fn test_tokio_driver_restarts_for_new_work() {
    let rt = runtime();
    let engine = TweenEngine::builder()
        .driver(TokioClockDriver::new(rt.handle().clone()))
        .cadence(Cadence::fixed_interval(0.005))
        .build()
        .unwrap();

    for _ in 0..2 {
        let (tx, rx) = mpsc::channel();
        engine
            .register(Operation::tween(0.0f32, 1.0, 0.01).on_complete(move |_| {
                let _ = tx.send(());
            }))
            .unwrap();
        rx.recv_timeout(WAIT).unwrap();
        assert!(wait_until(|| !engine.is_driver_running()));
    }
    assert_eq!(engine.stats().operations_completed, 2);
}

#[test]
fn test_tokio_executor_delivers_off_thread() {
    let rt = runtime();
    let engine = TweenEngine::new();
    let caller = thread::current().id();

    let (tx, rx) = mpsc::channel();
    engine
        .register(
            Operation::tween(0.0f64, 1.0, 1.0)
                .with_context(Arc::new(TokioExecutor::new(rt.handle().clone())))
                .on_complete(move |period| {
                    let _ = tx.send((thread::current().id(), *period.progress()));
                }),
        )
        .unwrap();

    engine.tick(0.0);
    engine.tick(1.0);

    let (delivered_on, progress) = rx.recv_timeout(WAIT).unwrap();
    assert_ne!(delivered_on, caller);
    assert_eq!(progress, 1.0);
}

#[test]
fn test_out_of_range_interval_is_rejected_before_driver_start() {
    let rt = runtime();
    let result = TweenEngine::builder()
        .driver(TokioClockDriver::new(rt.handle().clone()))
        .cadence(Cadence::fixed_interval(1e20))
        .build();
    assert!(matches!(result, Err(TweenError::InvalidConfig(_))));

    let engine = TweenEngine::builder()
        .driver(TokioClockDriver::new(rt.handle().clone()))
        .build()
        .unwrap();
    assert!(engine.set_interval(1e20).is_err());
    engine.tween(0.0f64, 1.0, 60.0, 0.0).unwrap();
    assert!(engine.is_driver_running());
}

#[test]
fn test_tokio_driver_refuses_out_of_range_period() {
    let rt = runtime();
    let mut driver = TokioClockDriver::new(rt.handle().clone());
    let cadence = Cadence {
        interval: 1e20,
        ..Cadence::fixed_interval(1.0)
    };
    driver.start(&cadence, EngineHandle::detached());
    assert!(!driver.is_running());
}
