pub mod config;
pub mod controller;
pub mod output;
#[cfg(feature = "simulation")]
pub mod output_sim;
mod properties_proptest;
pub mod setpoint;
pub mod source;
pub mod sync;
pub mod tags;
pub mod thermal;
pub mod timebase;
pub mod timing;

pub use config::{ConfigError, GraverConfig};
pub use controller::{
    ControllerHandle, ControllerStats, RunningController, StepOutcome, StopReason,
    StrokeController,
};
pub use output::PulseOutput;
#[cfg(feature = "simulation")]
pub use output_sim::{CoilProbe, OutputEvent, SimulatedSolenoid};
pub use setpoint::{Clamp, Normalized, Raw, Setpoint};
pub use source::{AnalogReader, AnalogSource, SetpointPoller, SetpointSource, SimulatedSource};
pub use sync::{ControllerSnapshot, SetpointChannel, SnapshotExchange};
pub use thermal::{ThermalGuard, ThermalState};
pub use timebase::{ManualClock, Sleeper, ThreadSleeper, TimeBase};
pub use timing::StrokeTiming;
