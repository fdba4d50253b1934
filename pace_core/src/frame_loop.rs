use anyhow::Result;

use crate::{
    clock::{Clock, MonotonicClock},
    config::{ErrorPolicy, PacingConfig},
    error::PaceResult,
    scheduler::{FixedRateScheduler, FrameCallback, TickOutcome},
    signals::StopToken,
    telemetry::Telemetry,
    time::Time,
};

/// Host instruction returned after every frame.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LoopControl {
    /// Request exactly one more frame.
    Continue,
    /// Do not re-arm. The loop is finished.
    Stop,
}

/// Cancellable "request next frame" loop around a [`FixedRateScheduler`].
///
/// The host calls [`FrameLoop::on_frame`] once per display frame and only
/// re-arms the next frame while it returns [`LoopControl::Continue`].
pub struct FrameLoop<F: FrameCallback, C: Clock = MonotonicClock> {
    scheduler: FixedRateScheduler<F, C>,
    stop: StopToken,
    on_error: ErrorPolicy,
    telemetry: Telemetry,

    started: bool,
    shutdown_done: bool,
    host_frames: u64,
    max_frames: Option<u64>,
    errors: u64,
}

impl<F: FrameCallback> FrameLoop<F, MonotonicClock> {
    pub fn new(cfg: &PacingConfig, callback: F) -> PaceResult<Self> {
        Self::with_clock(cfg, MonotonicClock::new(), callback)
    }
}

impl<F: FrameCallback, C: Clock> FrameLoop<F, C> {
    pub fn with_clock(cfg: &PacingConfig, clock: C, callback: F) -> PaceResult<Self> {
        let scheduler = FixedRateScheduler::with_clock(cfg.target_hz, clock, callback)?;

        let mut telemetry = Telemetry::new();
        telemetry.configure(cfg.log_stats, cfg.stats_period());

        Ok(Self {
            scheduler,
            stop: StopToken::new(),
            on_error: cfg.on_error,
            telemetry,
            started: false,
            shutdown_done: false,
            host_frames: 0,
            max_frames: None,
            errors: 0,
        })
    }

    /// Stop on its own after `n` host frames.
    pub fn with_max_frames(mut self, n: Option<u64>) -> Self {
        self.max_frames = n;
        self
    }

    /// Share an existing token, e.g. one already bound to Ctrl-C.
    pub fn with_stop_token(mut self, stop: StopToken) -> Self {
        self.stop = stop;
        self
    }

    #[inline]
    pub fn stop_token(&self) -> StopToken {
        self.stop.clone()
    }

    #[inline]
    pub fn stop(&self) {
        self.stop.request_stop();
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stop.is_stop_requested()
    }

    #[inline]
    pub fn time(&self) -> &Time {
        self.scheduler.time()
    }

    #[inline]
    pub fn host_frames(&self) -> u64 {
        self.host_frames
    }

    /// Callback failures absorbed under [`ErrorPolicy::Continue`].
    #[inline]
    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        log::info!(
            "frame loop started: target {:.2} Hz (interval {:.2} ms)",
            self.scheduler.target_hz(),
            self.scheduler.interval().as_secs_f64() * 1000.0
        );

        if let Err(e) = self.scheduler.callback_mut().on_start() {
            self.stop.request_stop();
            return Err(e);
        }
        Ok(())
    }

    /// One host frame. Never ticks once stop was requested.
    pub fn on_frame(&mut self) -> Result<LoopControl> {
        if !self.started {
            self.start()?;
        }
        if self.stop.is_stop_requested() {
            return Ok(LoopControl::Stop);
        }

        self.host_frames += 1;

        match self.scheduler.tick() {
            Ok(TickOutcome::Fired { dropped }) if dropped > 0 => {
                log::trace!("frame {} fired after stall ({dropped} dropped)", self.host_frames);
            }
            Ok(_) => {}
            Err(e) => match self.on_error {
                ErrorPolicy::Halt => {
                    log::error!("frame callback failed, halting: {e:#}");
                    self.stop.request_stop();
                    return Err(e);
                }
                ErrorPolicy::Continue => {
                    self.errors += 1;
                    log::error!("frame callback failed, continuing: {e:#}");
                }
            },
        }

        self.telemetry.frame_tick(self.scheduler.time());

        if self.scheduler.callback_mut().stop_requested() {
            log::info!("stop requested by frame callback");
            self.stop.request_stop();
        }
        if self.max_frames.is_some_and(|n| self.host_frames >= n) {
            log::info!("frame limit reached ({} host frames)", self.host_frames);
            self.stop.request_stop();
        }

        Ok(if self.stop.is_stop_requested() {
            LoopControl::Stop
        } else {
            LoopControl::Continue
        })
    }

    /// Runs the callback's shutdown hook once.
    pub fn shutdown(&mut self) {
        if self.shutdown_done {
            return;
        }
        self.shutdown_done = true;
        self.stop.request_stop();

        if self.started {
            self.scheduler.callback_mut().on_shutdown();
        }

        let t = self.scheduler.time();
        log::info!(
            "frame loop stopped: {} host frames, {} fires, {} dropped intervals",
            t.tick_index,
            t.fire_count,
            t.dropped_intervals
        );
    }
}
