use std::time::Duration;

use crate::time::Time;

/// Rolling host-rate / fire-rate report, measured on the scheduler's clock.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub host_fps: f32,
    pub fire_hz: f32,
    pub dt_ms: f32,

    enabled: bool,
    period: Duration,

    window_start: Duration,
    window_ticks: u64,
    window_fires: u64,
    window_dropped: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryReport {
    pub host_fps: f32,
    pub fire_hz: f32,
    pub dropped: u64,
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            host_fps: 0.0,
            fire_hz: 0.0,
            dt_ms: 0.0,
            enabled: true,
            period: Duration::from_secs(1),
            window_start: Duration::ZERO,
            window_ticks: 0,
            window_fires: 0,
            window_dropped: 0,
        }
    }

    pub fn configure(&mut self, enabled: bool, period: Duration) {
        self.enabled = enabled;
        self.period = period.max(Duration::from_millis(250));
    }

    /// Feed the scheduler state after a tick. Returns a report once per period.
    pub fn frame_tick(&mut self, time: &Time) -> Option<TelemetryReport> {
        self.dt_ms = time.tick_delta.as_secs_f32() * 1000.0;

        if !self.enabled {
            return None;
        }

        let window = time.elapsed_since_start.saturating_sub(self.window_start);
        if window < self.period {
            return None;
        }

        let secs = window.as_secs_f32().max(0.0001);
        let ticks = time.tick_index.saturating_sub(self.window_ticks);
        let fires = time.fire_count.saturating_sub(self.window_fires);
        let dropped = time.dropped_intervals.saturating_sub(self.window_dropped);

        self.host_fps = ticks as f32 / secs;
        self.fire_hz = fires as f32 / secs;

        if dropped > 0 {
            log::warn!(
                "host_fps={:.1} fire_hz={:.1} dt_ms={:.2} dropped={}",
                self.host_fps,
                self.fire_hz,
                self.dt_ms,
                dropped
            );
        } else {
            log::info!(
                "host_fps={:.1} fire_hz={:.1} dt_ms={:.2}",
                self.host_fps,
                self.fire_hz,
                self.dt_ms
            );
        }

        self.window_start = time.elapsed_since_start;
        self.window_ticks = time.tick_index;
        self.window_fires = time.fire_count;
        self.window_dropped = time.dropped_intervals;

        Some(TelemetryReport {
            host_fps: self.host_fps,
            fire_hz: self.fire_hz,
            dropped,
        })
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time_at(ms: u64, ticks: u64, fires: u64, dropped: u64) -> Time {
        Time {
            elapsed_since_start: Duration::from_millis(ms),
            tick_index: ticks,
            fire_count: fires,
            dropped_intervals: dropped,
            ..Time::default()
        }
    }

    #[test]
    fn reports_once_per_period() {
        let mut t = Telemetry::new();
        assert!(t.frame_tick(&time_at(500, 30, 2, 0)).is_none());

        let r = t.frame_tick(&time_at(1000, 60, 5, 0)).unwrap();
        assert!((r.host_fps - 60.0).abs() < 1e-3);
        assert!((r.fire_hz - 5.0).abs() < 1e-3);
        assert_eq!(r.dropped, 0);

        assert!(t.frame_tick(&time_at(1500, 90, 7, 0)).is_none());
        let r = t.frame_tick(&time_at(2000, 120, 10, 3)).unwrap();
        assert!((r.fire_hz - 5.0).abs() < 1e-3);
        assert_eq!(r.dropped, 3);
    }

    #[test]
    fn disabled_never_reports() {
        let mut t = Telemetry::new();
        t.configure(false, Duration::from_secs(1));
        assert!(t.frame_tick(&time_at(5000, 300, 25, 0)).is_none());
    }

    #[test]
    fn period_has_a_floor() {
        let mut t = Telemetry::new();
        t.configure(true, Duration::from_millis(10));
        assert!(t.frame_tick(&time_at(100, 6, 0, 0)).is_none());
        assert!(t.frame_tick(&time_at(250, 15, 1, 0)).is_some());
    }
}
