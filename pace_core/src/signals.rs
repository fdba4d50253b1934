use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Cooperative stop flag shared between the frame loop and whoever wants
/// it to end (Ctrl-C handler, window close, a frame task).
///
/// Only polled between frames, never inside a tick.
#[derive(Clone, Debug, Default)]
pub struct StopToken {
    flag: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Ctrl-C requests stop. Can be installed once per process.
    pub fn install_ctrlc_handler(&self) -> anyhow::Result<()> {
        let s = self.clone();
        ctrlc::set_handler(move || s.request_stop())?;
        Ok(())
    }
}
