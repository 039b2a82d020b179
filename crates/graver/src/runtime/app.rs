use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use graver_core::{
    ConfigError, ControllerStats, GraverConfig, SetpointChannel, SetpointPoller,
    SimulatedSolenoid, SimulatedSource, SnapshotExchange, StopReason, StrokeController,
    ThreadSleeper, TimeBase,
};
use std::process::ExitCode;
use std::sync::{atomic::AtomicBool, atomic::Ordering, Arc};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to spawn thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("stroke controller thread panicked")]
    ControllerPanicked,
    #[error("output driver fault stopped the stroke controller")]
    OutputFault,
}

pub fn run_from_args() -> ExitCode {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return ExitCode::SUCCESS;
    }

    let _log_guard = init_tracing(config.json_logs);
    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "graver stopped with an error");
            ExitCode::FAILURE
        }
    }
}

fn load_graver_config(config: &RuntimeConfig) -> Result<GraverConfig, ConfigError> {
    let mut graver = match &config.config_path {
        Some(path) => {
            info!(path = %path.display(), "Loading controller config");
            GraverConfig::load(path)?
        }
        None => GraverConfig::default(),
    };
    if config.interruptible_cooldown {
        graver.cooldown_interruptible = true;
    }
    graver.validate()?;
    Ok(graver)
}

pub fn run(config: RuntimeConfig) -> Result<(), RuntimeError> {
    let graver_config = load_graver_config(&config)?;

    telemetry::init();

    let stop = Arc::new(AtomicBool::new(false));
    let metrics_handle = telemetry::start_metrics_server(&config.metrics_addr, &stop);

    let speed_channel = Arc::new(SetpointChannel::new());
    let power_channel = Arc::new(SetpointChannel::new());
    let exchange = Arc::new(SnapshotExchange::new());
    let timebase = TimeBase::new();

    let speed_source = if config.sweep {
        // One full sweep every ten seconds at the default sample rate.
        let period_samples = (10_000 / graver_config.sample_period_ms).max(2) as u32;
        SimulatedSource::triangle(0.0, config.speed, period_samples)
    } else {
        SimulatedSource::constant(config.speed)
    };
    let speed_poller = SetpointPoller::new(
        "speed",
        speed_source,
        Arc::clone(&speed_channel),
        graver_config.sample_period(),
    )
    .spawn(Arc::clone(&stop))?;
    let power_poller = SetpointPoller::new(
        "power",
        SimulatedSource::constant(config.power),
        Arc::clone(&power_channel),
        graver_config.sample_period(),
    )
    .spawn(Arc::clone(&stop))?;

    let solenoid = SimulatedSolenoid::new(graver_config.pwm_range);
    let coil = solenoid.probe();

    info!(
        pulse_length_ms = graver_config.pulse_length_ms,
        max_strokes_per_minute = graver_config.max_strokes_per_minute,
        max_cumulative_on_time_ms = graver_config.max_cumulative_on_time_ms,
        cooldown_ms = graver_config.cooldown_ms,
        cooldown_interruptible = graver_config.cooldown_interruptible,
        "Starting stroke controller"
    );

    let controller = StrokeController::new(
        graver_config,
        solenoid,
        ThreadSleeper,
        speed_channel,
        power_channel,
    )?
    .with_exchange(Arc::clone(&exchange), timebase)
    .start()?;

    let updater = telemetry::start_metrics_updater(Arc::clone(&exchange), coil, Arc::clone(&stop));

    info!(
        speed = config.speed,
        power = config.power,
        sweep = config.sweep,
        "graver running"
    );

    if let Some(seconds) = config.run_seconds {
        info!(seconds, "Running for limited duration");
        thread::sleep(Duration::from_secs(seconds));
        controller.terminate();
    }

    let controller = controller
        .join()
        .map_err(|_| RuntimeError::ControllerPanicked)?;
    let stats = controller.stats().clone();
    stop.store(true, Ordering::Relaxed);

    for handle in [speed_poller, power_poller, updater] {
        if handle.join().is_err() {
            warn!("worker thread panicked during shutdown");
        }
    }
    if let Some(handle) = metrics_handle {
        let _ = handle.join();
    }

    info!(
        iterations = stats.iterations,
        strokes = stats.strokes,
        idle_polls = stats.idle_polls,
        cooldowns = stats.cooldowns,
        clamped_setpoints = stats.clamped_setpoints,
        total_on_time_ms = stats.total_on_time_ms,
        stop_reason = ?stats.stop_reason,
        "Run complete"
    );
    check_stop(&stats)
}

/// A run that ended on an output fault is a failure even though every thread
/// shut down cleanly.
fn check_stop(stats: &ControllerStats) -> Result<(), RuntimeError> {
    match stats.stop_reason {
        Some(StopReason::OutputFault) => Err(RuntimeError::OutputFault),
        _ => Ok(()),
    }
}
