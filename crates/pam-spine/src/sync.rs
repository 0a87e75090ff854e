use crate::value::ActuatorState;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::ptr;
use std::sync::atomic::{fence, AtomicUsize, Ordering};

/// Everything the control loop knows at the end of one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<const N: usize> {
    pub iteration: i64,
    pub timestamp_us: i64,
    /// Achieved loop frequency over the last cycle.
    pub frequency_hz: f64,
    pub observed: [ActuatorState; N],
    pub desired: [ActuatorState; N],
    pub finished: [bool; N],
    pub cycle_jitter_us: u32,
    pub cycles_missed: u64,
    pub commands_completed: u64,
}

impl<const N: usize> Default for Observation<N> {
    fn default() -> Self {
        Self {
            iteration: -1,
            timestamp_us: 0,
            frequency_hz: 0.0,
            observed: [ActuatorState::default(); N],
            desired: [ActuatorState::default(); N],
            finished: [true; N],
            cycle_jitter_us: 0,
            cycles_missed: 0,
            commands_completed: 0,
        }
    }
}

impl<const N: usize> Observation<N> {
    /// False until the control loop published its first cycle.
    pub fn is_valid(&self) -> bool {
        self.iteration >= 0
    }

    pub fn all_finished(&self) -> bool {
        self.finished.iter().all(|f| *f)
    }
}

/// Seqlock slot for `Copy` payloads.
///
/// The sequence is odd while a write is in progress. Readers copy the payload as
/// possibly-uninitialised bytes and only keep the copy when the sequence was even and
/// unchanged around it. Writers claim the slot with a CAS, so concurrent writers are
/// serialised instead of interleaving.
struct SeqLock<T: Copy> {
    seq: AtomicUsize,
    data: UnsafeCell<T>,
}

// SAFETY: the payload is only handed out by value after the sequence check, and
// writers are serialised by the odd sequence value.
unsafe impl<T: Copy + Send> Sync for SeqLock<T> {}

impl<T: Copy> SeqLock<T> {
    fn new(value: T) -> Self {
        Self {
            seq: AtomicUsize::new(0),
            data: UnsafeCell::new(value),
        }
    }

    fn write(&self, value: T) {
        let seq = loop {
            let current = self.seq.load(Ordering::Relaxed);
            if current & 1 == 0
                && self
                    .seq
                    .compare_exchange_weak(
                        current,
                        current.wrapping_add(1),
                        Ordering::Acquire,
                        Ordering::Relaxed,
                    )
                    .is_ok()
            {
                break current;
            }
            std::hint::spin_loop();
        };
        fence(Ordering::Release);
        // SAFETY: the odd sequence excludes other writers; readers discard any copy
        // overlapping this write.
        unsafe {
            ptr::write_volatile(self.data.get(), value);
        }
        self.seq.store(seq.wrapping_add(2), Ordering::Release);
    }

    fn read(&self) -> T {
        loop {
            let start = self.seq.load(Ordering::Acquire);
            if start & 1 != 0 {
                std::hint::spin_loop();
                continue;
            }
            // SAFETY: read as MaybeUninit so a torn copy is never treated as a `T`.
            let copy = unsafe { ptr::read_volatile(self.data.get() as *const MaybeUninit<T>) };
            fence(Ordering::Acquire);
            if self.seq.load(Ordering::Relaxed) == start {
                // SAFETY: no write overlapped the copy, so it is a complete `T`.
                return unsafe { copy.assume_init() };
            }
        }
    }
}

/// Exchange of the latest [`Observation`] between the control thread and
/// readers such as telemetry or the recorder.
pub struct ObservationExchange<const N: usize> {
    latest: SeqLock<Observation<N>>,
}

impl<const N: usize> ObservationExchange<N> {
    pub fn new() -> Self {
        Self {
            latest: SeqLock::new(Observation::default()),
        }
    }

    /// Called by the control thread every cycle. Never waits on readers.
    pub fn publish(&self, observation: Observation<N>) {
        self.latest.write(observation);
    }

    pub fn latest(&self) -> Observation<N> {
        self.latest.read()
    }
}

impl<const N: usize> Default for ObservationExchange<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn starts_invalid_then_returns_latest() {
        let exchange = ObservationExchange::<2>::new();
        assert!(!exchange.latest().is_valid());

        for iteration in 0..5 {
            exchange.publish(Observation {
                iteration,
                ..Observation::default()
            });
        }
        let latest = exchange.latest();
        assert!(latest.is_valid());
        assert_eq!(latest.iteration, 4);
        assert!(latest.all_finished());
    }

    fn uniform(iteration: i64) -> Observation<64> {
        let value = ActuatorState::new((iteration % 100_000) as i32);
        Observation {
            iteration,
            timestamp_us: iteration,
            observed: [value; 64],
            desired: [value; 64],
            ..Observation::default()
        }
    }

    fn is_consistent(observation: &Observation<64>) -> bool {
        if !observation.is_valid() {
            return true;
        }
        let expected = ActuatorState::new((observation.iteration % 100_000) as i32);
        observation.timestamp_us == observation.iteration
            && observation.observed.iter().all(|v| *v == expected)
            && observation.desired.iter().all(|v| *v == expected)
    }

    #[test]
    fn concurrent_readers_never_see_mixed_cycles() {
        let exchange = Arc::new(ObservationExchange::<64>::new());
        let stop = Arc::new(AtomicBool::new(false));

        let writer = {
            let exchange = Arc::clone(&exchange);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut iteration = 0;
                while !stop.load(Ordering::Relaxed) {
                    exchange.publish(uniform(iteration));
                    iteration += 1;
                }
            })
        };

        let readers: Vec<_> = (0..2)
            .map(|_| {
                let exchange = Arc::clone(&exchange);
                thread::spawn(move || {
                    let mut mixed = 0;
                    let mut last = -1;
                    for _ in 0..200_000 {
                        let observation = exchange.latest();
                        if !is_consistent(&observation) {
                            mixed += 1;
                        }
                        assert!(observation.iteration >= last);
                        last = observation.iteration;
                    }
                    mixed
                })
            })
            .collect();

        let mixed: u32 = readers.into_iter().map(|r| r.join().unwrap()).sum();
        stop.store(true, Ordering::Relaxed);
        writer.join().unwrap();
        assert_eq!(mixed, 0);
    }

    #[test]
    fn concurrent_writers_are_serialised() {
        let exchange = Arc::new(ObservationExchange::<64>::new());
        let writers: Vec<_> = (0..2)
            .map(|offset| {
                let exchange = Arc::clone(&exchange);
                thread::spawn(move || {
                    for i in 0..20_000 {
                        exchange.publish(uniform(i * 2 + offset));
                        assert!(is_consistent(&exchange.latest()));
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }
        assert!(is_consistent(&exchange.latest()));
    }
}
