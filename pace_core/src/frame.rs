/// What a [`FrameTask`](crate::task::FrameTask) sees of the current frame.
pub struct FrameContext<'a> {
    /// 1-based index of the accepted frame.
    pub frame_index: u64,
    /// Set to end the loop after this frame.
    pub stop_requested: &'a mut bool,
}

impl FrameContext<'_> {
    #[inline]
    pub fn request_stop(&mut self) {
        *self.stop_requested = true;
    }
}
