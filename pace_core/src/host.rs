//! Host drivers: the "request next frame" side of the loop.
//!
//! A host calls [`FrameLoop::on_frame`] once per display frame and re-arms
//! exactly one follow-up frame while the loop answers
//! [`LoopControl::Continue`]. At most one frame is ever in flight.

use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use winit::{
    application::ApplicationHandler,
    dpi::LogicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    clock::{Clock, ManualClock},
    config::WindowConfig,
    frame_loop::{FrameLoop, LoopControl},
    scheduler::FrameCallback,
};

/// Waits out the remainder of one display frame.
pub trait FramePacer {
    fn wait_next_frame(&mut self);
}

/// Sleeps to a fixed display refresh rate. Late frames are not made up.
pub struct SleepPacer {
    period: Duration,
    next: Instant,
}

impl SleepPacer {
    pub fn new(refresh_hz: f64) -> Self {
        let period = frame_period(refresh_hz);
        Self { period, next: Instant::now() }
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FramePacer for SleepPacer {
    fn wait_next_frame(&mut self) {
        let now = Instant::now();
        self.next += self.period;
        if self.next > now {
            thread::sleep(self.next - now);
        } else {
            self.next = now;
        }
    }
}

/// Simulated display: every frame advances a [`ManualClock`] by a fixed step.
pub struct SimulatedDisplay {
    clock: ManualClock,
    step: Duration,
}

impl SimulatedDisplay {
    pub fn new(clock: ManualClock, step: Duration) -> Self {
        Self { clock, step }
    }

    pub fn at_refresh_hz(clock: ManualClock, refresh_hz: f64) -> Self {
        Self::new(clock, frame_period(refresh_hz))
    }
}

/// Display frame period, rounded to the nanosecond. Falls back to 60 Hz
/// only for rates that have no representable period.
fn frame_period(refresh_hz: f64) -> Duration {
    let nanos = (1e9 / refresh_hz).round();
    if nanos >= 1.0 && nanos < u64::MAX as f64 {
        Duration::from_nanos(nanos as u64)
    } else {
        Duration::from_nanos(16_666_667)
    }
}

impl FramePacer for SimulatedDisplay {
    #[inline]
    fn wait_next_frame(&mut self) {
        self.clock.advance(self.step);
    }
}

/// Windowless host: drives the loop from the calling thread.
pub struct HeadlessHost<P> {
    pacer: P,
}

impl<P: FramePacer> HeadlessHost<P> {
    pub fn new(pacer: P) -> Self {
        Self { pacer }
    }

    pub fn run<F: FrameCallback, C: Clock>(
        &mut self,
        frame_loop: &mut FrameLoop<F, C>,
    ) -> Result<()> {
        log::info!("headless host running");

        let result = self.drive(frame_loop);
        frame_loop.shutdown();
        result
    }

    fn drive<F: FrameCallback, C: Clock>(
        &mut self,
        frame_loop: &mut FrameLoop<F, C>,
    ) -> Result<()> {
        frame_loop.start()?;
        loop {
            match frame_loop.on_frame()? {
                LoopControl::Continue => self.pacer.wait_next_frame(),
                LoopControl::Stop => return Ok(()),
            }
        }
    }
}

/// Runs the loop on a winit window, one tick per `RedrawRequested`.
pub fn run_windowed<F: FrameCallback, C: Clock>(
    frame_loop: FrameLoop<F, C>,
    window: &WindowConfig,
    control_flow_poll: bool,
) -> Result<()> {
    let event_loop = EventLoop::new()?;
    let mut host = WindowHost::new(frame_loop, window, control_flow_poll);
    event_loop.run_app(&mut host)?;
    host.result
}

struct WindowHost<F: FrameCallback, C: Clock> {
    frame_loop: FrameLoop<F, C>,

    window: Option<Window>,
    window_id: Option<WindowId>,
    shutdown_done: bool,
    result: Result<()>,

    control_flow_poll: bool,
    window_title: String,
    window_w: u32,
    window_h: u32,
}

impl<F: FrameCallback, C: Clock> WindowHost<F, C> {
    fn new(frame_loop: FrameLoop<F, C>, cfg: &WindowConfig, control_flow_poll: bool) -> Self {
        Self {
            frame_loop,
            window: None,
            window_id: None,
            shutdown_done: false,
            result: Ok(()),
            control_flow_poll,
            window_title: cfg.title.clone(),
            window_w: cfg.width,
            window_h: cfg.height,
        }
    }

    fn fail(&mut self, el: &ActiveEventLoop, e: anyhow::Error) {
        if self.result.is_ok() {
            self.result = Err(e);
        }
        self.shutdown_once(el);
    }

    fn shutdown_once(&mut self, el: &ActiveEventLoop) {
        if self.shutdown_done {
            return;
        }
        self.shutdown_done = true;

        self.frame_loop.shutdown();
        el.exit();
    }

    fn redraw(&mut self, el: &ActiveEventLoop) {
        match self.frame_loop.on_frame() {
            Ok(LoopControl::Continue) => {
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            Ok(LoopControl::Stop) => self.shutdown_once(el),
            Err(e) => self.fail(el, e),
        }
    }
}

impl<F: FrameCallback, C: Clock> ApplicationHandler for WindowHost<F, C> {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = WindowAttributes::default()
            .with_title(self.window_title.clone())
            .with_inner_size(LogicalSize::new(self.window_w, self.window_h));

        let window = match el.create_window(attrs) {
            Ok(w) => w,
            Err(e) => {
                self.fail(el, anyhow::Error::new(e).context("failed to create window"));
                return;
            }
        };

        if let Err(e) = self.frame_loop.start() {
            self.fail(el, e);
            return;
        }

        window.request_redraw();
        self.window_id = Some(window.id());
        self.window = Some(window);
    }

    fn window_event(&mut self, el: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if Some(id) != self.window_id {
            return;
        }

        match event {
            WindowEvent::RedrawRequested => self.redraw(el),
            WindowEvent::CloseRequested => self.frame_loop.stop(),
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    self.frame_loop.stop();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, el: &ActiveEventLoop) {
        el.set_control_flow(if self.control_flow_poll {
            ControlFlow::Poll
        } else {
            ControlFlow::Wait
        });

        if self.frame_loop.is_stopped() {
            self.shutdown_once(el);
        }
    }
}
