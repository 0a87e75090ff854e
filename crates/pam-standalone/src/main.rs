mod error;
mod infra;
mod metrics;
mod plan;
mod runtime;

use std::process::ExitCode;

fn main() -> ExitCode {
    runtime::run_from_args()
}
