//! Observation recording for offline plotting and replay.
//!
//! Each line of the output file is one JSON [`ObservationRecord`].

use pam_spine::{Observation, ObservationExchange, TimeBase};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationRecord {
    pub iteration: i64,
    /// Monotonic timestamp in microseconds
    pub timestamp_us: i64,
    /// Wall-clock Unix timestamp in microseconds
    pub unix_us: u64,
    pub frequency_hz: f64,
    pub observed: Vec<i32>,
    pub desired: Vec<i32>,
    pub finished: Vec<bool>,
}

impl ObservationRecord {
    pub fn from_observation<const N: usize>(observation: &Observation<N>, unix_us: u64) -> Self {
        Self {
            iteration: observation.iteration,
            timestamp_us: observation.timestamp_us,
            unix_us,
            frequency_hz: observation.frequency_hz,
            observed: observation.observed.iter().map(|p| p.pressure()).collect(),
            desired: observation.desired.iter().map(|p| p.pressure()).collect(),
            finished: observation.finished.to_vec(),
        }
    }
}

/// Writes observation records to a JSONL file, truncating any previous recording.
pub struct ObservationRecorder {
    writer: BufWriter<File>,
    last_iteration: Option<i64>,
    written: u64,
}

impl ObservationRecorder {
    pub fn create(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::with_capacity(64 * 1024, file),
            last_iteration: None,
            written: 0,
        })
    }

    /// Append `observation` unless it was already recorded or the loop has not run yet.
    /// Returns whether a line was written.
    pub fn record<const N: usize>(
        &mut self,
        observation: &Observation<N>,
        unix_us: u64,
    ) -> std::io::Result<bool> {
        if !observation.is_valid() || self.last_iteration >= Some(observation.iteration) {
            return Ok(false);
        }
        let record = ObservationRecord::from_observation(observation, unix_us);
        serde_json::to_writer(&mut self.writer, &record)?;
        self.writer.write_all(b"\n")?;
        self.last_iteration = Some(observation.iteration);
        self.written += 1;
        Ok(true)
    }

    pub fn finish(mut self) -> std::io::Result<u64> {
        self.writer.flush()?;
        Ok(self.written)
    }
}

/// Poll the exchange every `period` and record each new observation. The latest
/// observation is recorded once more after `stop` is set, so the final cycle is kept.
pub fn spawn_recorder<const N: usize>(
    mut recorder: ObservationRecorder,
    exchange: Arc<ObservationExchange<N>>,
    timebase: TimeBase,
    stop: Arc<AtomicBool>,
    period: Duration,
) -> std::io::Result<thread::JoinHandle<std::io::Result<u64>>> {
    thread::Builder::new()
        .name("pam-recorder".to_string())
        .spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                recorder.record(&exchange.latest(), timebase.unix_us())?;
                thread::sleep(period);
            }
            recorder.record(&exchange.latest(), timebase.unix_us())?;
            recorder.finish()
        })
}
