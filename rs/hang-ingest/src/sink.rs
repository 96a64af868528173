use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::DecodedFrame;

/// Receives decoded frames, outside of the decoder lock.
///
/// Frames arrive in strictly increasing timestamp order within a session.
/// Implementations must not block for long; the caller is the subscription's callback thread.
pub trait Sink: Send + Sync {
	fn output(&self, frame: DecodedFrame);

	/// Called when the source is deactivated; drop anything queued.
	fn clear(&self) {}
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
	fn output(&self, frame: DecodedFrame) {
		(**self).output(frame)
	}

	fn clear(&self) {
		(**self).clear()
	}
}

/// A bounded queue of frames for a consumer that polls, ex. a render loop.
///
/// When full, the oldest frame is dropped; a late frame is worth less than a fresh one.
#[derive(Debug)]
pub struct FrameQueue {
	frames: Mutex<VecDeque<DecodedFrame>>,
	capacity: usize,
}

impl FrameQueue {
	pub fn new(capacity: usize) -> Self {
		let capacity = capacity.max(1);
		Self {
			frames: Mutex::new(VecDeque::with_capacity(capacity)),
			capacity,
		}
	}

	/// The oldest queued frame.
	pub fn pop(&self) -> Option<DecodedFrame> {
		self.frames.lock().pop_front()
	}

	/// Every queued frame, oldest first.
	pub fn drain(&self) -> Vec<DecodedFrame> {
		self.frames.lock().drain(..).collect()
	}

	pub fn len(&self) -> usize {
		self.frames.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.frames.lock().is_empty()
	}

	pub fn capacity(&self) -> usize {
		self.capacity
	}
}

impl Sink for FrameQueue {
	fn output(&self, frame: DecodedFrame) {
		let mut frames = self.frames.lock();
		while frames.len() >= self.capacity {
			if let Some(old) = frames.pop_front() {
				tracing::debug!(timestamp_ns = old.timestamp_ns, "frame queue full, dropping oldest");
			}
		}
		frames.push_back(frame);
	}

	fn clear(&self) {
		self.frames.lock().clear();
	}
}
