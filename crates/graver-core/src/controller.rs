use crate::config::{ConfigError, GraverConfig};
use crate::output::PulseOutput;
use crate::setpoint::{Clamp, Normalized, Setpoint};
use crate::sync::{ControllerSnapshot, SetpointChannel, SnapshotExchange};
use crate::thermal::{ThermalGuard, ThermalState};
use crate::timebase::{Sleeper, TimeBase};
use crate::timing::{duty_for_power, StrokeTiming};
use log::{debug, error, info, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Terminated,
    OutputFault,
}

#[derive(Clone, Default, Debug)]
pub struct ControllerStats {
    pub iterations: u64,
    pub strokes: u64,
    pub idle_polls: u64,
    pub cooldowns: u64,
    pub interrupted_cooldowns: u64,
    pub clamped_setpoints: u64,
    pub total_on_time_ms: u64,
    pub peak_cumulative_on_time_ms: u64,
    pub stop_reason: Option<StopReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// One stroke was driven; `cooled` is set when the on-time budget was
    /// spent and the full cooldown pause ran straight after it. A pause cut
    /// short by `terminate()` leaves `cooled` false and the guard `Cooling`.
    Stroked {
        duty: u16,
        off_time_ms: u64,
        cooled: bool,
    },
    /// A cooldown left unfinished by an earlier interruption was completed.
    Cooled,
    /// A pending cooldown was cut short again; no stroke was driven.
    CooldownInterrupted,
    /// Speed at or below bias; the output stayed off.
    Idle,
    /// The output reported a fault and the loop is stopping.
    Faulted,
}

/// Cloneable stop switch for a controller.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    running: Arc<AtomicBool>,
}

impl ControllerHandle {
    /// Observed once per loop iteration; never aborts a stroke in progress.
    pub fn terminate(&self) {
        self.running.store(false, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// A controller running on its own OS thread.
pub struct RunningController<O: PulseOutput, S: Sleeper> {
    handle: ControllerHandle,
    join: thread::JoinHandle<StrokeController<O, S>>,
}

impl<O: PulseOutput, S: Sleeper> RunningController<O, S> {
    pub fn handle(&self) -> ControllerHandle {
        self.handle.clone()
    }

    pub fn terminate(&self) {
        self.handle.terminate();
    }

    /// Wait for the loop to exit and take the controller back, output
    /// included.
    pub fn join(self) -> thread::Result<StrokeController<O, S>> {
        self.join.join()
    }
}

/// Drives the solenoid from the latest speed and power setpoints, with a
/// cumulative on-time budget and enforced cooldown.
pub struct StrokeController<O: PulseOutput, S: Sleeper> {
    config: GraverConfig,
    output: O,
    sleeper: S,
    speed_channel: Arc<SetpointChannel>,
    power_channel: Arc<SetpointChannel>,
    exchange: Option<Arc<SnapshotExchange>>,
    timebase: TimeBase,
    running: Arc<AtomicBool>,
    speed: Setpoint<Normalized>,
    power: Setpoint<Normalized>,
    thermal: ThermalGuard,
    last_timing: StrokeTiming,
    last_duty: u16,
    last_spm: f64,
    stats: ControllerStats,
}

impl<O: PulseOutput, S: Sleeper> StrokeController<O, S> {
    pub fn new(
        config: GraverConfig,
        mut output: O,
        sleeper: S,
        speed_channel: Arc<SetpointChannel>,
        power_channel: Arc<SetpointChannel>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        output.configure(config.pwm_frequency_hz);
        output.off();

        let thermal = ThermalGuard::new(config.max_cumulative_on_time_ms);
        let last_timing = StrokeTiming::compute(&config, 0.0);
        Ok(Self {
            config,
            output,
            sleeper,
            speed_channel,
            power_channel,
            exchange: None,
            timebase: TimeBase::new(),
            running: Arc::new(AtomicBool::new(true)),
            speed: Setpoint::ZERO,
            power: Setpoint::ZERO,
            thermal,
            last_timing,
            last_duty: 0,
            last_spm: 0.0,
            stats: ControllerStats::default(),
        })
    }

    pub fn with_exchange(mut self, exchange: Arc<SnapshotExchange>, timebase: TimeBase) -> Self {
        self.exchange = Some(exchange);
        self.timebase = timebase;
        self
    }

    pub fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            running: Arc::clone(&self.running),
        }
    }

    pub fn terminate(&self) {
        self.handle().terminate();
    }

    pub fn run(&mut self) -> ControllerStats {
        info!(
            "stroke controller started: pulse {} ms, max {} SPM, bias {}, on-time cap {} ms",
            self.config.pulse_length_ms,
            self.config.max_strokes_per_minute,
            self.config.speed_bias,
            self.config.max_cumulative_on_time_ms
        );

        while self.running.load(Ordering::Acquire) {
            if self.step() == StepOutcome::Faulted {
                break;
            }
        }

        self.shutdown();
        self.stats.clone()
    }

    /// One loop iteration: ingest setpoints, compute timing, then stroke or
    /// idle. Does not look at the running flag except inside an
    /// interruptible cooldown.
    pub fn step(&mut self) -> StepOutcome {
        self.stats.iterations += 1;

        if !self.output.is_healthy() {
            self.output.off();
            error!("output driver reported a fault; stopping stroke controller");
            self.stats.stop_reason = Some(StopReason::OutputFault);
            self.running.store(false, Ordering::Release);
            return StepOutcome::Faulted;
        }

        if self.thermal.state() == ThermalState::Cooling {
            let completed = self.cool_down();
            self.publish();
            return if completed {
                StepOutcome::Cooled
            } else {
                StepOutcome::CooldownInterrupted
            };
        }

        self.read_setpoints();

        let timing = StrokeTiming::compute(&self.config, self.speed.value());
        if timing.throttled && self.speed.value() > self.config.speed_bias {
            trace!("off time throttled to {} ms", timing.off_time_ms);
        }
        self.report_spm(timing.strokes_per_minute);
        self.last_timing = timing;

        let outcome = if self.speed.value() > self.config.speed_bias {
            self.stroke(timing)
        } else {
            self.output.off();
            self.sleeper.sleep(self.config.idle_interval());
            self.stats.idle_polls += 1;
            trace!("speed below bias");
            StepOutcome::Idle
        };

        self.publish();
        outcome
    }

    fn read_setpoints(&mut self) {
        if let Some(raw) = self.speed_channel.try_receive() {
            self.speed = self.ingest("speed", raw);
        }
        if let Some(raw) = self.power_channel.try_receive() {
            self.power = self.ingest("power", raw);
        }
    }

    fn ingest(&mut self, name: &str, raw: f64) -> Setpoint<Normalized> {
        let (setpoint, clamp) = Setpoint::new(raw).normalize();
        match clamp {
            Clamp::None => {}
            Clamp::Low { requested } | Clamp::High { requested } => {
                self.stats.clamped_setpoints += 1;
                debug!("{} setpoint {} clamped to {}", name, requested, setpoint.value());
            }
            Clamp::NotFinite => {
                self.stats.clamped_setpoints += 1;
                warn!("{} setpoint was NaN; using 0", name);
            }
        }
        debug!("{} read as {}%", name, (setpoint.value() * 100.0) as u32);
        setpoint
    }

    fn report_spm(&mut self, spm: f64) {
        if (spm - self.last_spm).abs() > self.config.spm_report_threshold {
            debug!("SPM set to {:.0}", spm);
        }
        self.last_spm = spm;
    }

    fn stroke(&mut self, timing: StrokeTiming) -> StepOutcome {
        let max = self.config.pwm_range.min(self.output.max_intensity());
        let duty = duty_for_power(self.power.value(), max);

        self.output.set_intensity(duty);
        self.sleeper.sleep(Duration::from_millis(timing.on_time_ms));
        self.output.off();
        self.sleeper.sleep(Duration::from_millis(timing.off_time_ms));

        self.last_duty = duty;
        self.stats.strokes += 1;
        self.stats.total_on_time_ms += timing.on_time_ms;

        let state = self.thermal.record_stroke(timing.on_time_ms);
        self.stats.peak_cumulative_on_time_ms = self.thermal.peak_on_time_ms();

        let cooled = state == ThermalState::Cooling && self.cool_down();
        StepOutcome::Stroked {
            duty,
            off_time_ms: timing.off_time_ms,
            cooled,
        }
    }

    /// Block with the output off for the configured cooldown. Returns false if
    /// the pause was cut short by `terminate()`.
    fn cool_down(&mut self) -> bool {
        info!(
            "{} ms cumulative on-time reached; cooling for {} ms",
            self.thermal.cumulative_on_time_ms(),
            self.config.cooldown_ms
        );
        self.output.off();
        self.publish();

        let cooldown = self.config.cooldown();
        if self.config.cooldown_interruptible {
            let slice = self.config.idle_interval().max(Duration::from_millis(1));
            let mut remaining = cooldown;
            while !remaining.is_zero() {
                if !self.running.load(Ordering::Acquire) {
                    self.stats.interrupted_cooldowns += 1;
                    warn!(
                        "cooldown interrupted with {} ms remaining",
                        remaining.as_millis()
                    );
                    return false;
                }
                let step = remaining.min(slice);
                self.sleeper.sleep(step);
                remaining -= step;
            }
        } else {
            self.sleeper.sleep(cooldown);
        }

        self.thermal.complete_cooldown();
        self.stats.cooldowns += 1;
        info!("cooling done");
        true
    }

    fn publish(&self) {
        if let Some(exchange) = &self.exchange {
            exchange.publish(ControllerSnapshot {
                timestamp_us: self.timebase.now_us(),
                iteration: self.stats.iterations,
                speed: self.speed.value(),
                power: self.power.value(),
                off_time_ms: self.last_timing.off_time_ms,
                current_spm: self.last_timing.strokes_per_minute,
                duty: self.last_duty,
                cumulative_on_time_ms: self.thermal.cumulative_on_time_ms(),
                thermal_state: self.thermal.state(),
                strokes: self.stats.strokes,
                cooldowns: self.stats.cooldowns,
            });
        }
    }

    fn shutdown(&mut self) {
        self.output.off();
        if self.stats.stop_reason.is_none() {
            self.stats.stop_reason = Some(StopReason::Terminated);
        }
        info!(
            "shutdown after {} strokes, {} cooldowns",
            self.stats.strokes, self.stats.cooldowns
        );
    }

    pub fn speed(&self) -> f64 {
        self.speed.value()
    }

    pub fn power(&self) -> f64 {
        self.power.value()
    }

    pub fn cumulative_on_time_ms(&self) -> u64 {
        self.thermal.cumulative_on_time_ms()
    }

    pub fn thermal_state(&self) -> ThermalState {
        self.thermal.state()
    }

    pub fn last_timing(&self) -> StrokeTiming {
        self.last_timing
    }

    pub fn config(&self) -> &GraverConfig {
        &self.config
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }

    pub fn stats(&self) -> &ControllerStats {
        &self.stats
    }
}

impl<O, S> StrokeController<O, S>
where
    O: PulseOutput + 'static,
    S: Sleeper + 'static,
{
    /// Run the loop on a dedicated thread.
    pub fn start(mut self) -> std::io::Result<RunningController<O, S>> {
        let handle = self.handle();
        let join = thread::Builder::new()
            .name("stroke-controller".to_string())
            .spawn(move || {
                self.run();
                self
            })?;
        Ok(RunningController { handle, join })
    }
}
