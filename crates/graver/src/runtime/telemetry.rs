use super::metrics::{
    init_metrics, serve_metrics, COIL_TEMP_C, COOLDOWNS, CUMULATIVE_ON_TIME_MS, OFF_TIME_MS,
    POWER, SPEED, STROKES, STROKES_PER_MINUTE, THERMAL_COOLING,
};
use graver_core::{CoilProbe, SnapshotExchange, ThermalState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::info;

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(
    addr: &Option<String>,
    stop: &Arc<AtomicBool>,
) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone(), Arc::clone(stop))
    })
}

pub fn start_metrics_updater(
    exchange: Arc<SnapshotExchange>,
    coil: CoilProbe,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last_strokes = 0u64;
        let mut last_cooldowns = 0u64;
        while !stop.load(Ordering::Relaxed) {
            let snapshot = exchange.read();
            SPEED.set(snapshot.speed);
            POWER.set(snapshot.power);
            STROKES_PER_MINUTE.set(snapshot.current_spm);
            OFF_TIME_MS.set(snapshot.off_time_ms as f64);
            CUMULATIVE_ON_TIME_MS.set(snapshot.cumulative_on_time_ms as f64);
            THERMAL_COOLING.set(match snapshot.thermal_state {
                ThermalState::Active => 0.0,
                ThermalState::Cooling => 1.0,
            });
            COIL_TEMP_C.set(coil.read_c());

            if snapshot.strokes > last_strokes {
                STROKES.inc_by(snapshot.strokes - last_strokes);
                last_strokes = snapshot.strokes;
            }
            if snapshot.cooldowns > last_cooldowns {
                COOLDOWNS.inc_by(snapshot.cooldowns - last_cooldowns);
                last_cooldowns = snapshot.cooldowns;
            }

            thread::sleep(Duration::from_millis(200));
        }
    })
}
