use std::time::Duration;

use anyhow::Result;

use crate::{
    clock::{Clock, MonotonicClock},
    error::{PaceError, PaceResult},
    time::Time,
};

/// Unit of work invoked by the scheduler on accepted ticks.
///
/// Plain closures only provide `call`. The lifecycle hooks are used by
/// [`FrameLoop`](crate::frame_loop::FrameLoop) and are no-ops by default.
pub trait FrameCallback {
    fn call(&mut self) -> Result<()>;

    fn on_start(&mut self) -> Result<()> {
        Ok(())
    }

    fn on_shutdown(&mut self) {}

    /// Polled by the frame loop after every tick.
    fn stop_requested(&self) -> bool {
        false
    }
}

impl<F> FrameCallback for F
where
    F: FnMut() -> Result<()>,
{
    #[inline]
    fn call(&mut self) -> Result<()> {
        self()
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TickOutcome {
    /// Tick arrived before a full interval elapsed.
    Skipped,
    /// Callback ran. `dropped` counts whole intervals that passed without a fire.
    Fired { dropped: u64 },
}

impl TickOutcome {
    #[inline]
    pub fn fired(self) -> bool {
        matches!(self, TickOutcome::Fired { .. })
    }
}

/// Rate gate between a variable-rate host tick and a fixed-rate callback.
///
/// Never sleeps: pacing comes purely from skipping ticks that arrive too
/// early. Fires at most once per tick, missed intervals are not caught up.
pub struct FixedRateScheduler<F, C = MonotonicClock> {
    target_hz: f64,
    interval: Duration,

    clock: C,
    origin: Duration,
    last_boundary: Duration,

    time: Time,
    callback: F,
}

impl<F: FrameCallback> FixedRateScheduler<F, MonotonicClock> {
    pub fn new(target_hz: f64, callback: F) -> PaceResult<Self> {
        Self::with_clock(target_hz, MonotonicClock::new(), callback)
    }
}

impl<F: FrameCallback, C: Clock> FixedRateScheduler<F, C> {
    pub fn with_clock(target_hz: f64, clock: C, callback: F) -> PaceResult<Self> {
        let interval = interval_for(target_hz)?;
        let origin = clock.now();

        Ok(Self {
            target_hz,
            interval,
            clock,
            origin,
            last_boundary: origin,
            time: Time::new(),
            callback,
        })
    }

    #[inline]
    pub fn target_hz(&self) -> f64 {
        self.target_hz
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[inline]
    pub fn time(&self) -> &Time {
        &self.time
    }

    /// Boundary of the last accepted fire, as an offset from the origin.
    #[inline]
    pub fn last_boundary(&self) -> Duration {
        self.last_boundary.saturating_sub(self.origin)
    }

    #[inline]
    pub(crate) fn callback_mut(&mut self) -> &mut F {
        &mut self.callback
    }

    /// One host frame. Errors come only from the callback and are returned as is.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        let now = self.clock.now();

        let elapsed = now.saturating_sub(self.origin);
        self.time.tick_delta = elapsed.saturating_sub(self.time.elapsed_since_start);
        self.time.elapsed_since_start = elapsed;
        self.time.tick_index += 1;

        let since = now.saturating_sub(self.last_boundary);
        self.time.elapsed_since_last_interval = since;

        if since <= self.interval {
            return Ok(TickOutcome::Skipped);
        }

        let interval_ns = self.interval.as_nanos();
        let residual = Duration::from_nanos((since.as_nanos() % interval_ns) as u64);
        self.last_boundary = now - residual;

        let whole = u64::try_from(since.as_nanos() / interval_ns).unwrap_or(u64::MAX);
        let dropped = whole.saturating_sub(1);
        if dropped > 0 {
            self.time.dropped_intervals = self.time.dropped_intervals.saturating_add(dropped);
            log::debug!(
                "host stalled: {} interval(s) dropped (gap {:.2} ms, interval {:.2} ms)",
                dropped,
                since.as_secs_f64() * 1000.0,
                self.interval.as_secs_f64() * 1000.0
            );
        }
        self.time.fire_count += 1;

        self.callback.call()?;
        Ok(TickOutcome::Fired { dropped })
    }
}

/// Interval for a target rate. Rejects rates that are not positive and
/// finite, or whose interval rounds to zero.
pub(crate) fn interval_for(target_hz: f64) -> PaceResult<Duration> {
    let invalid = || PaceError::InvalidRate { rate: target_hz };

    if !target_hz.is_finite() || target_hz <= 0.0 {
        return Err(invalid());
    }
    let interval = Duration::try_from_secs_f64(1.0 / target_hz).map_err(|_| invalid())?;
    if interval.is_zero() {
        return Err(invalid());
    }
    Ok(interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use pretty_assertions::assert_eq;
    use std::{cell::Cell, rc::Rc};

    fn counting(
        clock: &ManualClock,
        hz: f64,
    ) -> (FixedRateScheduler<impl FnMut() -> Result<()>, ManualClock>, Rc<Cell<u32>>) {
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        let sched = FixedRateScheduler::with_clock(hz, clock.clone(), move || {
            f.set(f.get() + 1);
            anyhow::Ok(())
        })
        .unwrap();
        (sched, fired)
    }

    #[test]
    fn interval_is_derived_from_rate() {
        let clock = ManualClock::new();
        let (sched, _) = counting(&clock, 5.0);
        assert_eq!(sched.interval(), Duration::from_millis(200));
        assert_eq!(sched.target_hz(), 5.0);
    }

    #[test]
    fn rejects_non_positive_and_non_finite_rates() {
        for rate in [0.0, -1.0, -0.0, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e-320] {
            let r = FixedRateScheduler::with_clock(rate, ManualClock::new(), || anyhow::Ok(()));
            assert!(
                matches!(r, Err(PaceError::InvalidRate { .. })),
                "rate {rate} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_rate_whose_interval_rounds_to_zero() {
        let r = FixedRateScheduler::with_clock(1e12, ManualClock::new(), || anyhow::Ok(()));
        assert!(matches!(r, Err(PaceError::InvalidRate { .. })));
    }

    #[test]
    fn gate_is_strictly_greater_than_interval() {
        let clock = ManualClock::new();
        let (mut sched, fired) = counting(&clock, 10.0);

        clock.set_ms(100);
        assert_eq!(sched.tick().unwrap(), TickOutcome::Skipped);
        assert_eq!(fired.get(), 0);

        clock.set_ms(101);
        assert_eq!(sched.tick().unwrap(), TickOutcome::Fired { dropped: 0 });
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn fire_keeps_residual_so_rate_does_not_drift() {
        let clock = ManualClock::new();
        let (mut sched, _) = counting(&clock, 10.0);

        clock.set_ms(130);
        assert!(sched.tick().unwrap().fired());
        // 130 mod 100 = 30, boundary lands on 100 rather than 130.
        assert_eq!(sched.last_boundary(), Duration::from_millis(100));

        clock.set_ms(201);
        assert!(sched.tick().unwrap().fired());
        assert_eq!(sched.last_boundary(), Duration::from_millis(200));
    }

    #[test]
    fn stall_fires_once_and_counts_dropped_intervals() {
        let clock = ManualClock::new();
        let (mut sched, fired) = counting(&clock, 10.0);

        clock.set_ms(350);
        assert_eq!(sched.tick().unwrap(), TickOutcome::Fired { dropped: 2 });
        assert_eq!(fired.get(), 1);
        assert_eq!(sched.time().dropped_intervals, 2);
        assert_eq!(sched.last_boundary(), Duration::from_millis(300));

        // Next tick right after the stall does not catch up.
        clock.set_ms(360);
        assert_eq!(sched.tick().unwrap(), TickOutcome::Skipped);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn tick_delta_covers_skipped_ticks_too() {
        let clock = ManualClock::new();
        let (mut sched, _) = counting(&clock, 1.0);

        clock.set_ms(16);
        sched.tick().unwrap();
        clock.set_ms(40);
        sched.tick().unwrap();

        let t = sched.time();
        assert_eq!(t.tick_index, 2);
        assert_eq!(t.tick_delta, Duration::from_millis(24));
        assert_eq!(t.elapsed_since_start, Duration::from_millis(40));
        assert_eq!(t.elapsed_since_last_interval, Duration::from_millis(40));
        assert_eq!(t.fire_count, 0);
    }

    #[test]
    fn origin_is_taken_from_clock_at_construction() {
        let clock = ManualClock::starting_at(Duration::from_secs(10));
        let (mut sched, fired) = counting(&clock, 10.0);

        clock.set(Duration::from_millis(10_050));
        assert_eq!(sched.tick().unwrap(), TickOutcome::Skipped);
        assert_eq!(sched.time().elapsed_since_start, Duration::from_millis(50));

        clock.set(Duration::from_millis(10_150));
        assert!(sched.tick().unwrap().fired());
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn callback_error_propagates_after_boundary_advance() {
        let clock = ManualClock::new();
        let mut sched = FixedRateScheduler::with_clock(10.0, clock.clone(), || -> Result<()> {
            Err(anyhow::anyhow!("gpu lost"))
        })
        .unwrap();

        clock.set_ms(150);
        let err = sched.tick().unwrap_err();
        assert_eq!(err.to_string(), "gpu lost");
        assert_eq!(sched.time().fire_count, 1);
        assert_eq!(sched.last_boundary(), Duration::from_millis(100));
    }
}
