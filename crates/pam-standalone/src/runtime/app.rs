use crate::error::RuntimeError;
use crate::infra::recorder::{spawn_recorder, ObservationRecorder};
use crate::plan::{CompiledPhase, Plan};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use pam_spine::{
    ControlConfig, DummyRobot, ExecutionStats, LoopExit, ObservationExchange, PamLoop,
    PressureDriver, PressureLimits, TimeBase,
};
use std::process::ExitCode;
use std::sync::{atomic::AtomicBool, Arc};
use std::thread;
use tracing::{error, info, warn};

/// Degrees of freedom of the simulated robot.
pub const NB_DOFS: usize = 4;
/// Two muscles per degree of freedom.
pub const NB_ACTUATORS: usize = 2 * NB_DOFS;

pub fn run_from_args() -> ExitCode {
    let config = match RuntimeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("Run with --help for usage.");
            return ExitCode::from(2);
        }
    };
    if config.show_help {
        RuntimeConfig::print_help();
        return ExitCode::SUCCESS;
    }

    let _log_guard = init_tracing(config.json_logs, config.log_dir.as_deref());

    match run(config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pam-standalone failed");
            ExitCode::FAILURE
        }
    }
}

pub fn run(config: RuntimeConfig) -> Result<ExecutionStats, RuntimeError> {
    // Initialize metrics
    telemetry::init();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let plan = match &config.plan_path {
        Some(path) => {
            info!(path = %path.display(), "Loading command plan");
            Plan::load(path)?
        }
        None => {
            info!("No plan given, running the demo plan");
            Plan::demo()
        }
    };
    let phases = plan.compile::<NB_ACTUATORS>()?;

    let limits = PressureLimits::new(config.min_pressure, config.max_pressure)?;
    let control_config = ControlConfig {
        limits,
        watchdog_timeout: config.watchdog,
        max_iterations: config.max_iterations,
        ..ControlConfig::default()
    }
    .with_frequency(config.frequency_hz)?;

    let exchange = Arc::new(ObservationExchange::<NB_ACTUATORS>::new());
    let timebase = TimeBase::new();
    let stop = Arc::new(AtomicBool::new(false));

    let recorder_handle = match &config.record_path {
        Some(path) => {
            let recorder = ObservationRecorder::create(path).map_err(RuntimeError::Recorder)?;
            info!(path = %path.display(), "Recording observations");
            let handle = spawn_recorder(
                recorder,
                Arc::clone(&exchange),
                timebase,
                Arc::clone(&stop),
                control_config.cycle_time,
            )
            .map_err(|source| RuntimeError::Spawn {
                name: "recorder",
                source,
            })?;
            Some(handle)
        }
        None => None,
    };

    let updater_handle =
        telemetry::start_metrics_updater(Arc::clone(&exchange), Arc::clone(&stop));

    info!(
        frequency_hz = control_config.frequency_hz(),
        actuators = NB_ACTUATORS,
        min_pressure = limits.min(),
        max_pressure = limits.max(),
        phases = phases.len(),
        "Starting PAM control loop"
    );

    let exchange_control = Arc::clone(&exchange);
    let stop_control = Arc::clone(&stop);
    let initial_pressure = config.initial_pressure;
    let response_time_s = config.response_time_ms / 1_000.0;

    let control_handle = thread::Builder::new()
        .name("pam-control".to_string())
        .spawn(move || {
            let robot = DummyRobot::<NB_ACTUATORS>::new(limits, initial_pressure)
                .with_response_time(response_time_s);
            let mut pam = PamLoop::new(robot, control_config, exchange_control, timebase);
            let exit = execute_plan(&mut pam, &phases, &stop_control);
            (exit, pam.stats().clone())
        })
        .map_err(|source| RuntimeError::Spawn {
            name: "control",
            source,
        })?;

    let joined = control_handle.join();
    stop.store(true, std::sync::atomic::Ordering::Relaxed);

    if let Some(handle) = recorder_handle {
        match handle.join() {
            Ok(Ok(written)) => info!(records = written, "Recording complete"),
            Ok(Err(e)) => warn!(error = %e, "Recorder failed"),
            Err(_) => warn!("Recorder thread panicked"),
        }
    }
    let _ = updater_handle.join();

    let (exit, stats) = joined.map_err(|_| RuntimeError::ControlThread)?;
    info!(
        exit = ?exit,
        cycles_executed = stats.cycles_executed,
        cycles_missed = stats.cycles_missed,
        max_jitter_us = stats.max_jitter_us,
        commands_issued = stats.commands_issued,
        commands_completed = stats.commands_completed,
        "Run complete"
    );

    match exit {
        LoopExit::Watchdog => Err(RuntimeError::Watchdog),
        LoopExit::DriverFault => Err(RuntimeError::DriverFault),
        _ => Ok(stats),
    }
}

/// Issue each phase to every actuator and run the loop until all of them finished.
fn execute_plan<D, const N: usize>(
    pam: &mut PamLoop<D, N>,
    phases: &[CompiledPhase<N>],
    stop: &AtomicBool,
) -> LoopExit
where
    D: PressureDriver<N>,
{
    for (index, phase) in phases.iter().enumerate() {
        info!(phase = index, criterion = ?phase.criterion, "Issuing phase");
        pam.issue_all(&phase.targets, phase.criterion);
        let exit = pam.run_until(stop, |l| l.all_idle());
        if exit != LoopExit::Done {
            warn!(phase = index, exit = ?exit, "Plan interrupted");
            return exit;
        }
        telemetry::phase_completed();
        info!(
            phase = index,
            iteration = pam.iteration().value(),
            "Phase complete"
        );
    }
    LoopExit::Done
}
