//! Prometheus metrics for the stroke controller.
//!
//! Read-only: the HTTP endpoint exposes state and never accepts commands.

use graver_core::tags;
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn gauge(tag: tags::Tag) -> Gauge {
    let gauge = Gauge::new(tag.metric, tag.help).expect("static gauge definition");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("gauge registered once");
    gauge
}

fn counter(tag: tags::Tag) -> IntCounter {
    let counter = IntCounter::new(tag.metric, tag.help).expect("static counter definition");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("counter registered once");
    counter
}

// ============================================================================
// Setpoints
// ============================================================================

pub static SPEED: LazyLock<Gauge> = LazyLock::new(|| gauge(tags::SPEED_SETPOINT));

pub static POWER: LazyLock<Gauge> = LazyLock::new(|| gauge(tags::POWER_SETPOINT));

// ============================================================================
// Stroke timing
// ============================================================================

pub static STROKES_PER_MINUTE: LazyLock<Gauge> =
    LazyLock::new(|| gauge(tags::STROKES_PER_MINUTE));

pub static OFF_TIME_MS: LazyLock<Gauge> = LazyLock::new(|| gauge(tags::OFF_TIME_MS));

pub static STROKES: LazyLock<IntCounter> = LazyLock::new(|| counter(tags::STROKES));

// ============================================================================
// Thermal protection
// ============================================================================

pub static CUMULATIVE_ON_TIME_MS: LazyLock<Gauge> =
    LazyLock::new(|| gauge(tags::CUMULATIVE_ON_TIME_MS));

/// 1 while the forced cooldown is in progress
pub static THERMAL_COOLING: LazyLock<Gauge> = LazyLock::new(|| gauge(tags::THERMAL_COOLING));

pub static COOLDOWNS: LazyLock<IntCounter> = LazyLock::new(|| counter(tags::COOLDOWNS));

pub static COIL_TEMP_C: LazyLock<Gauge> = LazyLock::new(|| gauge(tags::COIL_TEMP_C));

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Start the metrics HTTP server on the given address.
/// The server thread exits once `stop` is set.
pub fn serve_metrics(bind_addr: String, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        while !stop.load(Ordering::Relaxed) {
            let request = match server.recv_timeout(Duration::from_millis(200)) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    tracing::warn!("Metrics server receive failed: {}", e);
                    continue;
                }
            };

            match request.url() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let mut buffer = Vec::new();
                    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
                        tracing::warn!("Failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                        continue;
                    }
                    let mut response = Response::from_data(buffer);
                    if let Ok(header) = Header::from_bytes(
                        &b"Content-Type"[..],
                        &b"text/plain; version=0.0.4"[..],
                    ) {
                        response = response.with_header(header);
                    }
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = SPEED.get();
    let _ = POWER.get();
    let _ = STROKES_PER_MINUTE.get();
    let _ = OFF_TIME_MS.get();
    let _ = STROKES.get();
    let _ = CUMULATIVE_ON_TIME_MS.get();
    let _ = THERMAL_COOLING.get();
    let _ = COOLDOWNS.get();
    let _ = COIL_TEMP_C.get();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_exposes_graver_metrics() {
        init_metrics();
        STROKES.inc();
        let names: Vec<String> = REGISTRY
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "graver_strokes_total"));
        assert!(names.iter().any(|n| n == "graver_coil_temperature_celsius"));
    }

    #[test]
    fn metrics_carry_help_text() {
        init_metrics();
        let families = REGISTRY.gather();
        let cooling = families
            .iter()
            .find(|family| family.get_name() == tags::THERMAL_COOLING.metric)
            .unwrap();
        assert_eq!(cooling.get_help(), tags::THERMAL_COOLING.help);
    }
}
