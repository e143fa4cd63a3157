use std::sync::{Arc, Mutex};

use crate::shared::frame::Frame;
use crate::shared::sync::lock;

/// Latest-frame slot shared between a capture thread and its consumers.
///
/// Publishing replaces the previous frame; readers never block the producer
/// for longer than a pointer swap.
#[derive(Clone, Default)]
pub struct VideoSink {
    current: Arc<Mutex<Option<Arc<Frame>>>>,
}

impl VideoSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: Frame) {
        *lock(&self.current) = Some(Arc::new(frame));
    }

    /// The newest frame, or `None` before the first frame has arrived.
    pub fn current_frame(&self) -> Option<Arc<Frame>> {
        lock(&self.current).clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_until_published() {
        let sink = VideoSink::new();
        assert!(sink.current_frame().is_none());
    }

    #[test]
    fn test_publish_replaces_frame_for_all_clones() {
        let sink = VideoSink::new();
        let reader = sink.clone();

        sink.publish(Frame::solid(4, 2, [1, 2, 3], 0));
        sink.publish(Frame::solid(4, 2, [1, 2, 3], 1));

        assert_eq!(reader.current_frame().unwrap().sequence(), 1);
    }
}
