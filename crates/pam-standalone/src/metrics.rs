//! Prometheus metrics for the PAM control loop.

use prometheus::{
    Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

const ACTUATOR_LABELS: [&str; 3] = ["actuator", "dof", "muscle"];

fn register<T: prometheus::core::Collector + Clone + 'static>(metric: T) -> T {
    REGISTRY
        .register(Box::new(metric.clone()))
        .expect("metric names are unique");
    metric
}

// ============================================================================
// Control Loop Metrics
// ============================================================================

/// Total control loop cycles executed
pub static CYCLES_EXECUTED: LazyLock<IntCounter> = LazyLock::new(|| {
    register(
        IntCounter::new("pam_cycles_executed_total", "Total control loop cycles executed")
            .expect("valid metric"),
    )
});

/// Control loop cycles missed (a full period late)
pub static CYCLES_MISSED: LazyLock<IntCounter> = LazyLock::new(|| {
    register(
        IntCounter::new(
            "pam_cycles_missed_total",
            "Control loop cycles started at least one full period late",
        )
        .expect("valid metric"),
    )
});

/// Control loop jitter distribution in microseconds
pub static CYCLE_JITTER_US: LazyLock<Histogram> = LazyLock::new(|| {
    register(
        Histogram::with_opts(
            HistogramOpts::new(
                "pam_cycle_jitter_microseconds",
                "Control loop start lateness in microseconds",
            )
            .buckets(vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 200.0, 500.0, 1000.0]),
        )
        .expect("valid metric"),
    )
});

/// Achieved loop frequency
pub static LOOP_FREQUENCY_HZ: LazyLock<Gauge> = LazyLock::new(|| {
    register(
        Gauge::new("pam_loop_frequency_hz", "Achieved control loop frequency").expect("valid metric"),
    )
});

// ============================================================================
// Command Metrics
// ============================================================================

/// Actuator commands that reached completion
pub static COMMANDS_COMPLETED: LazyLock<IntCounter> = LazyLock::new(|| {
    register(
        IntCounter::new(
            "pam_commands_completed_total",
            "Actuator commands that reached their completion criterion",
        )
        .expect("valid metric"),
    )
});

/// Plan phases completed
pub static PHASES_COMPLETED: LazyLock<IntCounter> = LazyLock::new(|| {
    register(
        IntCounter::new("pam_phases_completed_total", "Command plan phases completed")
            .expect("valid metric"),
    )
});

/// Actuators with a pending command
pub static ACTUATORS_PENDING: LazyLock<IntGauge> = LazyLock::new(|| {
    register(
        IntGauge::new(
            "pam_actuators_pending",
            "Actuators whose command has not finished yet",
        )
        .expect("valid metric"),
    )
});

// ============================================================================
// Pressure Metrics
// ============================================================================

/// Desired pressure per actuator
pub static DESIRED_PRESSURE: LazyLock<GaugeVec> = LazyLock::new(|| {
    register(
        GaugeVec::new(
            Opts::new("pam_desired_pressure", "Interpolated desired pressure per actuator"),
            &ACTUATOR_LABELS,
        )
        .expect("valid metric"),
    )
});

/// Observed pressure per actuator
pub static OBSERVED_PRESSURE: LazyLock<GaugeVec> = LazyLock::new(|| {
    register(
        GaugeVec::new(
            Opts::new("pam_observed_pressure", "Pressure reported by the driver per actuator"),
            &ACTUATOR_LABELS,
        )
        .expect("valid metric"),
    )
});

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Render the registry in the Prometheus text format.
pub fn encode() -> Result<Vec<u8>, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => {
                    let buffer = match encode() {
                        Ok(buffer) => buffer,
                        Err(e) => {
                            tracing::warn!("Failed to encode metrics: {}", e);
                            let _ = request.respond(
                                Response::from_string("Internal Server Error")
                                    .with_status_code(500),
                            );
                            continue;
                        }
                    };
                    let mut response = Response::from_data(buffer);
                    if let Ok(header) = tiny_http::Header::from_bytes(
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
                "/ready" => {
                    // Ready once the loop has executed at least one cycle
                    if CYCLES_EXECUTED.get() > 0 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
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
    let _ = CYCLES_EXECUTED.get();
    let _ = CYCLES_MISSED.get();
    let _ = CYCLE_JITTER_US.get_sample_count();
    let _ = LOOP_FREQUENCY_HZ.get();
    let _ = COMMANDS_COMPLETED.get();
    let _ = PHASES_COMPLETED.get();
    let _ = ACTUATORS_PENDING.get();
    LazyLock::force(&DESIRED_PRESSURE);
    LazyLock::force(&OBSERVED_PRESSURE);
}
