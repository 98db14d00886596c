//! Random-walk generator for the ambient signal (weather).

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use rand::{SeedableRng, rngs::StdRng};
use siaga_shared::{
    signal::{Jitter, SignalState},
    time::Clock,
};

use crate::domain::SignalSource;

struct GeneratorState {
    current: SignalState,
    last_update: i64,
    rng: StdRng,
}

/// Walks the shared [`SignalState`] by at most [`Jitter`] per field each tick,
/// never more often than `min_interval`.
pub struct RandomWalkSignalGenerator {
    state: Mutex<GeneratorState>,
    min_interval_ms: i64,
    jitter: Jitter,
    clock: Arc<dyn Clock>,
}

impl RandomWalkSignalGenerator {
    pub fn new(initial: SignalState, min_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(initial, min_interval, clock, StdRng::from_entropy())
    }

    /// Build with a caller-provided rng (seeded in tests)
    pub fn with_rng(
        initial: SignalState,
        min_interval: Duration,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Self {
        let last_update = clock.now_millis();
        Self {
            state: Mutex::new(GeneratorState {
                current: initial,
                last_update,
                rng,
            }),
            min_interval_ms: i64::try_from(min_interval.as_millis()).unwrap_or(i64::MAX),
            jitter: Jitter::SERVER,
            clock,
        }
    }

    pub fn last_update(&self) -> i64 {
        self.lock().last_update
    }

    fn lock(&self) -> MutexGuard<'_, GeneratorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("signal generator lock poisoned, recovering with last state");
                poisoned.into_inner()
            }
        }
    }
}

impl SignalSource for RandomWalkSignalGenerator {
    fn current(&self) -> SignalState {
        self.lock().current.clone()
    }

    fn tick(&self) -> Option<SignalState> {
        let now = self.clock.now_millis();
        let mut state = self.lock();
        if now - state.last_update < self.min_interval_ms {
            return None;
        }

        let GeneratorState { current, rng, .. } = &mut *state;
        let next = current.perturbed(&self.jitter, rng);
        state.current = next.clone();
        state.last_update = now;
        tracing::debug!(?next, "signal advanced");
        Some(next)
    }
}
