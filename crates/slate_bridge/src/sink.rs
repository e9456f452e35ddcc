//! Draw-operation sinks

use std::cell::RefCell;
use std::sync::mpsc;

use tracing::trace;

use crate::ops::DrawOp;

/// Receives serialized draw operations for an external renderer.
///
/// Submission is fire-and-forget; a sink must not block and its result is
/// never consumed by graphics-context logic.
pub trait DrawOpSink {
    /// `gc` identifies the graphics context the operation belongs to
    /// ([`crate::DEVICE_SCOPE`] for device-scoped resource traffic).
    fn submit(&self, gc: u64, op: DrawOp);
}

/// Sink that forwards operations over an in-process channel.
pub struct ChannelSink {
    tx: mpsc::Sender<(u64, DrawOp)>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::Receiver<(u64, DrawOp)>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl DrawOpSink for ChannelSink {
    fn submit(&self, gc: u64, op: DrawOp) {
        trace!(gc, ?op, "bridge submit");
        // A gone receiver means the renderer detached; drops are acceptable.
        let _ = self.tx.send((gc, op));
    }
}

/// Sink that captures every operation for inspection in tests.
#[derive(Default)]
pub struct RecordingSink {
    ops: RefCell<Vec<(u64, DrawOp)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<(u64, DrawOp)> {
        self.ops.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.ops.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.ops.borrow_mut().clear();
    }
}

impl DrawOpSink for RecordingSink {
    fn submit(&self, gc: u64, op: DrawOp) {
        self.ops.borrow_mut().push((gc, op));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_sink_delivers_in_order() {
        let (sink, rx) = ChannelSink::new();
        sink.submit(1, DrawOp::DrawPoint { x: 1, y: 2 });
        sink.submit(1, DrawOp::DrawPoint { x: 3, y: 4 });
        assert_eq!(rx.recv().unwrap(), (1, DrawOp::DrawPoint { x: 1, y: 2 }));
        assert_eq!(rx.recv().unwrap(), (1, DrawOp::DrawPoint { x: 3, y: 4 }));
    }

    #[test]
    fn test_channel_sink_ignores_detached_receiver() {
        let (sink, rx) = ChannelSink::new();
        drop(rx);
        // must not panic
        sink.submit(1, DrawOp::ClipReset);
    }

    #[test]
    fn test_recording_sink_captures() {
        let sink = RecordingSink::new();
        sink.submit(7, DrawOp::Alpha(128));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.ops()[0], (7, DrawOp::Alpha(128)));
    }
}
