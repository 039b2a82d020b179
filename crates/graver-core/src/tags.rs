/// Prometheus name and help text for one exported value.
#[derive(Debug, Clone, Copy)]
pub struct Tag {
    pub metric: &'static str,
    pub help: &'static str,
}

pub const SPEED_SETPOINT: Tag = Tag {
    metric: "graver_speed_setpoint_ratio",
    help: "Clamped speed setpoint (0.0-1.0)",
};

pub const POWER_SETPOINT: Tag = Tag {
    metric: "graver_power_setpoint_ratio",
    help: "Clamped power setpoint (0.0-1.0)",
};

pub const STROKES_PER_MINUTE: Tag = Tag {
    metric: "graver_strokes_per_minute",
    help: "Stroke rate derived from the current timing",
};

pub const OFF_TIME_MS: Tag = Tag {
    metric: "graver_off_time_milliseconds",
    help: "De-energized time per stroke in milliseconds",
};

pub const CUMULATIVE_ON_TIME_MS: Tag = Tag {
    metric: "graver_cumulative_on_time_milliseconds",
    help: "Energized milliseconds since the last cooldown",
};

pub const THERMAL_COOLING: Tag = Tag {
    metric: "graver_thermal_cooling",
    help: "Thermal state (0=active,1=cooling)",
};

pub const COIL_TEMP_C: Tag = Tag {
    metric: "graver_coil_temperature_celsius",
    help: "Simulated solenoid coil temperature in Celsius",
};

pub const STROKES: Tag = Tag {
    metric: "graver_strokes_total",
    help: "Strokes driven",
};

pub const COOLDOWNS: Tag = Tag {
    metric: "graver_cooldowns_total",
    help: "Forced cooldown pauses",
};
