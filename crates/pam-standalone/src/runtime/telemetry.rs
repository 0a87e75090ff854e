use crate::metrics::{
    init_metrics, serve_metrics, ACTUATORS_PENDING, COMMANDS_COMPLETED, CYCLES_EXECUTED,
    CYCLES_MISSED, CYCLE_JITTER_US, DESIRED_PRESSURE, LOOP_FREQUENCY_HZ, OBSERVED_PRESSURE,
    PHASES_COMPLETED,
};
use pam_spine::joints::{dof_of, Muscle};
use pam_spine::ObservationExchange;
use std::sync::{atomic::AtomicBool, Arc};
use std::thread;
use std::time::Duration;
use tracing::info;

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

pub fn phase_completed() {
    PHASES_COMPLETED.inc();
}

pub fn start_metrics_updater<const N: usize>(
    exchange: Arc<ObservationExchange<N>>,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    let labels: Vec<[String; 3]> = (0..N)
        .map(|actuator| {
            [
                actuator.to_string(),
                dof_of(actuator).to_string(),
                Muscle::of(actuator).as_str().to_string(),
            ]
        })
        .collect();

    thread::spawn(move || {
        let mut last_cycles = 0u64;
        let mut last_missed = 0u64;
        let mut last_completed = 0u64;
        while !stop.load(std::sync::atomic::Ordering::Relaxed) {
            let snapshot = exchange.latest();
            if snapshot.is_valid() {
                let cycles = snapshot.iteration as u64 + 1;
                CYCLES_EXECUTED.inc_by(cycles.saturating_sub(last_cycles));
                CYCLES_MISSED.inc_by(snapshot.cycles_missed.saturating_sub(last_missed));
                COMMANDS_COMPLETED
                    .inc_by(snapshot.commands_completed.saturating_sub(last_completed));
                last_cycles = last_cycles.max(cycles);
                last_missed = last_missed.max(snapshot.cycles_missed);
                last_completed = last_completed.max(snapshot.commands_completed);

                CYCLE_JITTER_US.observe(f64::from(snapshot.cycle_jitter_us));
                LOOP_FREQUENCY_HZ.set(snapshot.frequency_hz);
                ACTUATORS_PENDING.set(snapshot.finished.iter().filter(|f| !**f).count() as i64);

                for (actuator, label) in labels.iter().enumerate() {
                    let values = [label[0].as_str(), label[1].as_str(), label[2].as_str()];
                    DESIRED_PRESSURE
                        .with_label_values(&values)
                        .set(f64::from(snapshot.desired[actuator].pressure()));
                    OBSERVED_PRESSURE
                        .with_label_values(&values)
                        .set(f64::from(snapshot.observed[actuator].pressure()));
                }
            }

            thread::sleep(Duration::from_millis(200));
        }
    })
}
