use crate::error::RuntimeError;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub plan_path: Option<PathBuf>,
    pub frequency_hz: f64,
    pub min_pressure: i32,
    pub max_pressure: i32,
    pub initial_pressure: i32,
    pub response_time_ms: f64,
    pub max_iterations: Option<u64>,
    pub watchdog: Duration,
    pub record_path: Option<PathBuf>,
    pub json_logs: bool,
    pub log_dir: Option<PathBuf>,
    pub metrics_addr: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            plan_path: None,
            frequency_hz: 1000.0,
            min_pressure: 5000,
            max_pressure: 20000,
            initial_pressure: 5000,
            response_time_ms: 0.0,
            max_iterations: None,
            watchdog: Duration::from_millis(100),
            record_path: None,
            json_logs: false,
            log_dir: None,
            metrics_addr: None,
        }
    }
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, RuntimeError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| RuntimeError::MissingValue {
            flag: flag.to_string(),
        })
}

fn parse<T: FromStr>(flag: &str, raw: &str) -> Result<T, RuntimeError> {
    raw.parse().map_err(|_| RuntimeError::InvalidArgument {
        flag: flag.to_string(),
        value: raw.to_string(),
    })
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, RuntimeError> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Result<Self, RuntimeError> {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--plan" => {
                    cfg.plan_path = Some(PathBuf::from(value(args, i, flag)?));
                    i += 1;
                }
                "--frequency" => {
                    let raw = value(args, i, flag)?;
                    let hz: f64 = parse(flag, raw)?;
                    if !hz.is_finite() || hz <= 0.0 {
                        return Err(RuntimeError::InvalidArgument {
                            flag: flag.to_string(),
                            value: raw.to_string(),
                        });
                    }
                    cfg.frequency_hz = hz;
                    i += 1;
                }
                "--min-pressure" => {
                    cfg.min_pressure = parse(flag, value(args, i, flag)?)?;
                    i += 1;
                }
                "--max-pressure" => {
                    cfg.max_pressure = parse(flag, value(args, i, flag)?)?;
                    i += 1;
                }
                "--initial-pressure" => {
                    cfg.initial_pressure = parse(flag, value(args, i, flag)?)?;
                    i += 1;
                }
                "--response-time-ms" => {
                    cfg.response_time_ms = parse(flag, value(args, i, flag)?)?;
                    i += 1;
                }
                "--max-iterations" => {
                    cfg.max_iterations = Some(parse(flag, value(args, i, flag)?)?);
                    i += 1;
                }
                "--watchdog-ms" => {
                    cfg.watchdog = Duration::from_millis(parse(flag, value(args, i, flag)?)?);
                    i += 1;
                }
                "--record" => {
                    cfg.record_path = Some(PathBuf::from(value(args, i, flag)?));
                    i += 1;
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--log-dir" => {
                    cfg.log_dir = Some(PathBuf::from(value(args, i, flag)?));
                    i += 1;
                }
                "--metrics-addr" => {
                    cfg.metrics_addr = Some(value(args, i, flag)?.to_string());
                    i += 1;
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                other => return Err(RuntimeError::UnknownArgument(other.to_string())),
            }
            i += 1;
        }
        Ok(cfg)
    }

    pub fn print_help() {
        println!(
            r#"pam-standalone - Pressure trajectory runner for pneumatic muscle robots

USAGE:
    pam-standalone [OPTIONS]

OPTIONS:
    --plan <PATH>             JSON command plan to execute [default: built-in demo]
    --frequency <HZ>          Control loop frequency [default: 1000]
    --min-pressure <P>        Lowest pressure the driver accepts [default: 5000]
    --max-pressure <P>        Highest pressure the driver accepts [default: 20000]
    --initial-pressure <P>    Pressure of every muscle at startup [default: 5000]
    --response-time-ms <MS>   First-order lag of the simulated muscles [default: 0]
    --max-iterations <N>      Stop after N control cycles
    --watchdog-ms <MS>        Abort when a cycle starts this late [default: 100]
    --record <PATH>           Record observations to a JSONL file
    --json-logs               Output logs in JSON format (for log aggregation)
    --log-dir <PATH>          Also write logs to a daily rotated file in PATH
    --metrics-addr <ADDR>     Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    -h, --help                Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                  Set log filter (e.g., RUST_LOG=debug,pam_spine=trace)

EXAMPLES:
    # Run the demo plan with metrics
    pam-standalone --metrics-addr 0.0.0.0:9090

    # Replayable run
    pam-standalone --plan plan.json --record /tmp/trajectory.jsonl
"#
        );
    }
}
