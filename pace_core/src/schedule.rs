use anyhow::{Context, Result};

use crate::{frame::FrameContext, scheduler::FrameCallback, task::FrameTask};

/// Ordered set of frame tasks, run as a single scheduler callback.
pub struct TaskSchedule {
    tasks: Vec<Box<dyn FrameTask>>,
    /// Leading tasks whose `on_start` succeeded. Only these are shut down.
    started: usize,
    frame_index: u64,
    stop_requested: bool,
}

impl TaskSchedule {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            started: 0,
            frame_index: 0,
            stop_requested: false,
        }
    }

    pub fn add<T: FrameTask + 'static>(&mut self, t: T) {
        self.tasks.push(Box::new(t));
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for TaskSchedule {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameCallback for TaskSchedule {
    fn call(&mut self) -> Result<()> {
        self.frame_index += 1;

        let mut ctx = FrameContext {
            frame_index: self.frame_index,
            stop_requested: &mut self.stop_requested,
        };

        for t in self.tasks.iter_mut() {
            t.on_frame(&mut ctx)
                .with_context(|| format!("task '{}' failed on frame {}", t.id(), ctx.frame_index))?;
        }
        Ok(())
    }

    fn on_start(&mut self) -> Result<()> {
        for t in self.tasks.iter_mut().skip(self.started) {
            t.on_start()
                .with_context(|| format!("task '{}' failed to start", t.id()))?;
            self.started += 1;
            log::info!("task '{}' started", t.id());
        }
        Ok(())
    }

    fn on_shutdown(&mut self) {
        for t in self.tasks[..self.started].iter_mut().rev() {
            t.on_shutdown();
        }
        self.started = 0;
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested
    }
}
