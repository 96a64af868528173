use std::time::Instant;

use parking_lot::Mutex;

/// The first timestamp observed in a session.
#[derive(Debug, Clone, Copy)]
pub struct Baseline {
	/// The input timestamp of the first frame, in microseconds.
	pub pts_us: u64,

	/// When the first frame was output.
	pub wall: Instant,
}

#[derive(Debug, Default)]
struct State {
	baseline: Option<Baseline>,
	last_ns: u64,
}

/// Converts input timestamps to strictly increasing output timestamps.
///
/// Upstream timestamps are not trusted to be monotonic (B-frames, clock jumps, replays), while
/// consumers assume strictly increasing presentation order. Anything that would go backwards, or
/// stall, is nudged to one nanosecond past the previous output.
///
/// This has its own lock so it can be used while the decoder lock is held, without extending the
/// decoder's critical section into the sink.
#[derive(Debug, Default)]
pub struct TimestampTracker {
	state: Mutex<State>,
}

impl TimestampTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Convert a timestamp in microseconds into a monotonic timestamp in nanoseconds.
	///
	/// Outputs are strictly increasing until they reach `u64::MAX`, which takes an input above
	/// `u64::MAX / 1000` microseconds (about 584 years). From there on every output is `u64::MAX`.
	pub fn normalize(&self, pts_us: u64) -> u64 {
		let mut state = self.state.lock();
		let mut candidate = pts_us.saturating_mul(1000);

		match state.baseline {
			None => {
				state.baseline = Some(Baseline {
					pts_us,
					wall: Instant::now(),
				});
			}
			Some(_) if candidate <= state.last_ns => {
				tracing::trace!(pts_us, last_ns = state.last_ns, "non-monotonic timestamp, adjusting");
				candidate = state.last_ns.saturating_add(1);
			}
			Some(_) => {}
		}

		state.last_ns = candidate;
		candidate
	}

	/// Forget the baseline so the next timestamp starts a new session.
	pub fn reset(&self) {
		*self.state.lock() = State::default();
	}

	pub fn baseline(&self) -> Option<Baseline> {
		self.state.lock().baseline
	}

	/// The most recent output, if any since the last reset.
	pub fn last(&self) -> Option<u64> {
		let state = self.state.lock();
		state.baseline.map(|_| state.last_ns)
	}
}
