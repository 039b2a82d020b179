mod app;
mod config;
mod logging;
mod metrics;
mod telemetry;

pub use app::run_from_args;
