//! Stroke timing: speed setpoint to an on/off pair for one stroke.

use crate::config::GraverConfig;

/// Longest off-time the controller will sleep for in one stroke.
pub const MAX_OFF_TIME_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeTiming {
    pub on_time_ms: u64,
    pub off_time_ms: u64,
    /// Observability only; never fed back into control.
    pub strokes_per_minute: f64,
    /// True when the duty-cycle guard lengthened the off-time.
    pub throttled: bool,
}

impl StrokeTiming {
    /// `speed` must already be normalized to `[0.0, 1.0]`.
    pub fn compute(config: &GraverConfig, speed: f64) -> Self {
        let pulse = config.pulse_length_ms;
        let requested_off = if speed > 0.0 {
            // 1000 / (spm / 60 * speed), truncated to whole milliseconds.
            let period_ms = 60_000.0 / (config.max_strokes_per_minute * speed);
            (period_ms as u64).saturating_sub(pulse).min(MAX_OFF_TIME_MS)
        } else {
            0
        };

        // Never more than 50% duty.
        let throttled = requested_off <= pulse;
        let off_time_ms = if throttled { pulse } else { requested_off };

        Self {
            on_time_ms: pulse,
            off_time_ms,
            strokes_per_minute: 60_000.0 / (off_time_ms + pulse) as f64,
            throttled,
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.on_time_ms + self.off_time_ms
    }

    pub fn duty_cycle(&self) -> f64 {
        self.on_time_ms as f64 / self.period_ms() as f64
    }
}

/// Output level for a normalized power setpoint.
pub fn duty_for_power(power: f64, max_intensity: u16) -> u16 {
    let level = (power * f64::from(max_intensity)).round();
    level.clamp(0.0, f64::from(max_intensity)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_speed_is_throttled_to_half_duty() {
        let timing = StrokeTiming::compute(&GraverConfig::default(), 1.0);
        assert_eq!(timing.off_time_ms, 15);
        assert!(timing.throttled);
        assert_eq!(timing.strokes_per_minute, 2000.0);
        assert_eq!(timing.duty_cycle(), 0.5);
    }

    #[test]
    fn zero_speed_does_not_divide_by_zero() {
        let timing = StrokeTiming::compute(&GraverConfig::default(), 0.0);
        assert_eq!(timing.off_time_ms, 15);
        assert!(timing.strokes_per_minute.is_finite());
    }

    #[test]
    fn slow_speed_lengthens_off_time() {
        // 60000 / (2500 * 0.5) = 48 ms period.
        let timing = StrokeTiming::compute(&GraverConfig::default(), 0.5);
        assert_eq!(timing.off_time_ms, 33);
        assert!(!timing.throttled);
        assert_eq!(timing.strokes_per_minute, 1250.0);
    }

    #[test]
    fn tiny_speed_caps_off_time() {
        let timing = StrokeTiming::compute(&GraverConfig::default(), f64::MIN_POSITIVE);
        assert_eq!(timing.off_time_ms, MAX_OFF_TIME_MS);
        assert!(timing.strokes_per_minute > 0.0);
    }

    #[test]
    fn duty_rounds_to_nearest_level() {
        assert_eq!(duty_for_power(0.0, 1023), 0);
        assert_eq!(duty_for_power(0.5, 1023), 512);
        assert_eq!(duty_for_power(1.0, 1023), 1023);
    }
}
