use anyhow::Result;

use crate::frame::FrameContext;

/// Work run on every accepted frame: a simulation step, a draw submission.
/// The pacer never looks inside.
pub trait FrameTask {
    fn id(&self) -> &'static str;

    fn on_start(&mut self) -> Result<()> {
        Ok(())
    }
    fn on_frame(&mut self, ctx: &mut FrameContext<'_>) -> Result<()>;
    fn on_shutdown(&mut self) {}
}
