use std::time::Duration;

/// Timing state of a [`FixedRateScheduler`](crate::scheduler::FixedRateScheduler),
/// refreshed on every tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Time {
    pub elapsed_since_start: Duration,
    pub elapsed_since_last_interval: Duration,
    pub tick_delta: Duration,

    pub tick_index: u64,
    pub fire_count: u64,
    pub dropped_intervals: u64,
}

impl Time {
    pub fn new() -> Self {
        Self::default()
    }
}
