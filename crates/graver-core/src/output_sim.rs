use crate::output::PulseOutput;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Read-only view of the simulated coil temperature, shareable with
/// telemetry while the controller owns the solenoid.
#[derive(Debug, Clone)]
pub struct CoilProbe {
    bits: Arc<AtomicU64>,
}

impl CoilProbe {
    /// Temperature as of the last output transition.
    pub fn read_c(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputEvent {
    Configured(u32),
    Energized(u16),
    Off,
}

/// Host stand-in for the solenoid power stage, with a first-order coil
/// temperature model.
#[derive(Debug, Clone)]
pub struct SimulatedSolenoid {
    max_intensity: u16,
    frequency_hz: u32,
    level: u16,
    energized_at: Option<Instant>,
    energize_count: u64,
    energized_total: Duration,
    events: Option<Vec<OutputEvent>>,
    healthy: bool,

    coil_temp_c: f64,
    ambient_temp_c: f64,
    heating_rate_c_per_s: f64,
    cooling_time_constant_s: f64,
    last_thermal_update: Instant,
    probe: Arc<AtomicU64>,
}

impl SimulatedSolenoid {
    pub fn new(max_intensity: u16) -> Self {
        Self {
            max_intensity,
            frequency_hz: 0,
            level: 0,
            energized_at: None,
            energize_count: 0,
            energized_total: Duration::ZERO,
            events: None,
            healthy: true,
            coil_temp_c: 25.0,
            ambient_temp_c: 25.0,
            heating_rate_c_per_s: 40.0,
            cooling_time_constant_s: 20.0,
            last_thermal_update: Instant::now(),
            probe: Arc::new(AtomicU64::new(25f64.to_bits())),
        }
    }

    /// Keep every output transition; meant for tests and short runs.
    pub fn with_event_log(mut self) -> Self {
        self.events = Some(Vec::new());
        self
    }

    pub fn events(&self) -> &[OutputEvent] {
        self.events.as_deref().unwrap_or(&[])
    }

    pub fn level(&self) -> u16 {
        self.level
    }

    pub fn is_energized(&self) -> bool {
        self.level > 0
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }

    pub fn energize_count(&self) -> u64 {
        self.energize_count
    }

    pub fn energized_total(&self) -> Duration {
        self.energized_total
    }

    /// Simulate the power stage reporting a fault.
    pub fn inject_fault(&mut self) {
        self.healthy = false;
    }

    pub fn probe(&self) -> CoilProbe {
        CoilProbe {
            bits: Arc::clone(&self.probe),
        }
    }

    pub fn coil_temperature_c(&self) -> f64 {
        let dt = self.last_thermal_update.elapsed().as_secs_f64();
        self.relaxed_temperature(dt)
    }

    fn relaxed_temperature(&self, dt_s: f64) -> f64 {
        let decay = (-dt_s / self.cooling_time_constant_s).exp();
        self.ambient_temp_c + (self.coil_temp_c - self.ambient_temp_c) * decay
    }

    fn update_thermal(&mut self, now: Instant) {
        let dt_s = now.duration_since(self.last_thermal_update).as_secs_f64();
        self.coil_temp_c = self.relaxed_temperature(dt_s);
        if let Some(since) = self.energized_at {
            let on_s = now.duration_since(since.max(self.last_thermal_update)).as_secs_f64();
            let fraction = f64::from(self.level) / f64::from(self.max_intensity.max(1));
            self.coil_temp_c += self.heating_rate_c_per_s * fraction * on_s;
        }
        self.last_thermal_update = now;
        self.probe.store(self.coil_temp_c.to_bits(), Ordering::Relaxed);
    }

    fn record(&mut self, event: OutputEvent) {
        if let Some(events) = self.events.as_mut() {
            events.push(event);
        }
    }
}

impl PulseOutput for SimulatedSolenoid {
    fn configure(&mut self, frequency_hz: u32) {
        self.frequency_hz = frequency_hz;
        self.record(OutputEvent::Configured(frequency_hz));
    }

    fn set_intensity(&mut self, level: u16) {
        let level = level.min(self.max_intensity);
        if level == 0 {
            self.off();
            return;
        }
        let now = Instant::now();
        self.update_thermal(now);
        if self.energized_at.is_none() {
            self.energized_at = Some(now);
            self.energize_count += 1;
        }
        self.level = level;
        self.record(OutputEvent::Energized(level));
    }

    fn off(&mut self) {
        let now = Instant::now();
        self.update_thermal(now);
        if let Some(since) = self.energized_at.take() {
            self.energized_total += now.duration_since(since);
        }
        self.level = 0;
        self.record(OutputEvent::Off);
    }

    fn max_intensity(&self) -> u16 {
        self.max_intensity
    }

    fn is_healthy(&self) -> bool {
        self.healthy && self.coil_temp_c.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn records_transitions() {
        let mut sol = SimulatedSolenoid::new(1023).with_event_log();
        sol.configure(1000);
        sol.set_intensity(512);
        sol.off();
        assert_eq!(
            sol.events(),
            &[
                OutputEvent::Configured(1000),
                OutputEvent::Energized(512),
                OutputEvent::Off
            ]
        );
        assert_eq!(sol.energize_count(), 1);
        assert!(!sol.is_energized());
    }

    #[test]
    fn intensity_is_capped_at_range() {
        let mut sol = SimulatedSolenoid::new(1023);
        sol.set_intensity(u16::MAX);
        assert_eq!(sol.level(), 1023);
    }

    #[test]
    fn zero_intensity_is_off() {
        let mut sol = SimulatedSolenoid::new(1023).with_event_log();
        sol.set_intensity(0);
        assert_eq!(sol.energize_count(), 0);
        assert_eq!(sol.events(), &[OutputEvent::Off]);
    }

    #[test]
    fn energizing_heats_the_coil() {
        let mut sol = SimulatedSolenoid::new(1023);
        sol.set_intensity(1023);
        thread::sleep(Duration::from_millis(20));
        sol.off();
        assert!(sol.coil_temperature_c() > 25.0);
        assert!(sol.energized_total() >= Duration::from_millis(20));
        assert!(sol.probe().read_c() > 25.0);
    }

    #[test]
    fn fault_marks_unhealthy() {
        let mut sol = SimulatedSolenoid::new(1023);
        assert!(sol.is_healthy());
        sol.inject_fault();
        assert!(!sol.is_healthy());
    }
}
