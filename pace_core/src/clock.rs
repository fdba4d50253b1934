use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

/// Monotonic time source injected into the scheduler.
///
/// `now()` returns an offset from the clock's own epoch. Only differences
/// between readings carry meaning.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic time, epoch at construction.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { epoch: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Scripted clock. Clones share the same reading, so a test can keep one
/// handle and move another into the scheduler.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(t: Duration) -> Self {
        let c = Self::new();
        c.set(t);
        c
    }

    #[inline]
    pub fn set(&self, t: Duration) {
        self.nanos.store(duration_to_nanos(t), Ordering::Relaxed);
    }

    #[inline]
    pub fn set_ms(&self, ms: u64) {
        self.set(Duration::from_millis(ms));
    }

    #[inline]
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(duration_to_nanos(by), Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }
}

fn duration_to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
