//! Tween CLI
//!
//! Runs tween scenarios against a real-time clock and prints easing curves.

mod scenario;

use anyhow::{bail, ensure, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use scenario::{DriverKind, Scenario};
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tween_core::{Easing, Operation, TweenEngine};
use tween_platform::{ThreadClockDriver, TokioClockDriver};

#[derive(Parser)]
#[command(name = "tween")]
#[command(about = "Run tween scenarios and inspect easing curves")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tweens in a scenario file in real time
    Run {
        /// Scenario file (TOML)
        scenario: PathBuf,

        /// Pause the engine this many seconds after start
        #[arg(long)]
        pause_at: Option<f64>,

        /// How long the pause lasts, in seconds
        #[arg(long, default_value = "1.0")]
        pause_for: f64,

        /// Give up after this many seconds
        #[arg(long, default_value = "30.0")]
        timeout: f64,
    },

    /// Print a sampled easing curve
    Curve {
        /// Curve name (e.g. ease-in-out-cubic)
        easing: String,

        /// Number of intervals to sample
        #[arg(long, default_value = "10")]
        steps: u32,
    },

    /// List the available curve names
    Curves,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            scenario,
            pause_at,
            pause_for,
            timeout,
        } => cmd_run(scenario, pause_at, pause_for, timeout),
        Commands::Curve { easing, steps } => cmd_curve(&easing, steps),
        Commands::Curves => cmd_curves(),
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn seconds(value: f64, what: &str) -> Result<Duration> {
    ensure!(
        value.is_finite() && value >= 0.0,
        "{what} must be a non-negative number of seconds"
    );
    Ok(Duration::from_secs_f64(value))
}

fn cmd_run(path: PathBuf, pause_at: Option<f64>, pause_for: f64, timeout: f64) -> Result<()> {
    let scenario = Scenario::load(&path)?;
    let timeout = seconds(timeout, "--timeout")?;
    let mut pending_pause = match pause_at {
        Some(at) => Some((seconds(at, "--pause-at")?, seconds(pause_for, "--pause-for")?)),
        None => None,
    };

    // Kept alive for as long as the engine runs
    let runtime = match scenario.driver {
        DriverKind::Tokio => Some(
            tokio::runtime::Builder::new_multi_thread()
                .worker_threads(1)
                .enable_time()
                .build()
                .context("Failed to start tokio runtime")?,
        ),
        DriverKind::Thread => None,
    };

    let builder = TweenEngine::builder().config(&scenario.engine);
    let builder = match &runtime {
        Some(runtime) => builder.driver(
            TokioClockDriver::new(runtime.handle().clone())
                .with_refresh_rate(scenario.refresh_rate),
        ),
        None => builder.driver(ThreadClockDriver::new().with_refresh_rate(scenario.refresh_rate)),
    };
    let engine = builder.build()?;

    info!(
        path = %path.display(),
        tweens = scenario.tweens.len(),
        driver = ?scenario.driver,
        expected = scenario.total_duration(),
        "running scenario"
    );

    let (done_tx, done_rx) = mpsc::channel::<String>();
    let started = Instant::now();

    for entry in &scenario.tweens {
        let name = entry.name.clone();
        let done_tx = done_tx.clone();
        let update_name = name.clone();
        let operation = Operation::tween(entry.from, entry.to, entry.duration)
            .named(name.clone())
            .with_delay(entry.delay)
            .with_easing(entry.easing)
            .on_update(move |period| {
                info!(tween = %update_name, value = *period.progress(), "update");
            })
            .on_complete(move |period| {
                info!(tween = %name, value = *period.progress(), "complete");
                let _ = done_tx.send(name);
            });
        engine
            .register(operation)
            .with_context(|| format!("Failed to schedule tween '{}'", entry.name))?;
    }
    drop(done_tx);

    let mut remaining = scenario.tweens.len();
    while remaining > 0 {
        let elapsed = started.elapsed();
        if elapsed >= timeout {
            bail!(
                "timed out after {:.2}s with {remaining} tween(s) still running",
                elapsed.as_secs_f64()
            );
        }

        if let Some((at, length)) = pending_pause {
            if elapsed >= at {
                info!(seconds = length.as_secs_f64(), "pausing engine");
                engine.pause();
                thread::sleep(length);
                engine.resume();
                info!("engine resumed");
                pending_pause = None;
                continue;
            }
        }

        match done_rx.recv_timeout(Duration::from_millis(10)) {
            Ok(_) => remaining -= 1,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    let stats = engine.stats();
    info!(
        elapsed = started.elapsed().as_secs_f64(),
        ticks = stats.ticks_processed,
        dropped = stats.ticks_dropped,
        completed = stats.operations_completed,
        "scenario finished"
    );
    Ok(())
}

fn cmd_curve(name: &str, steps: u32) -> Result<()> {
    let easing: Easing = name.parse()?;
    let steps = steps.max(1);

    println!("# {easing}");
    for step in 0..=steps {
        let t = step as f64 / steps as f64;
        println!("{t:.4}\t{:.6}", easing.apply(t));
    }
    Ok(())
}

fn cmd_curves() -> Result<()> {
    for name in Easing::NAMED.iter().filter_map(Easing::name) {
        println!("{name}");
    }
    Ok(())
}
