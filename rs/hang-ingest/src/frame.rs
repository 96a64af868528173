use bytes::Bytes;

/// An encoded video chunk as delivered by the subscription.
///
/// The payload is a series of `[u32 big-endian length][unit]` records for a single timestamp.
/// Dropping the chunk releases it back to the session layer.
#[derive(Debug, Clone)]
pub struct EncodedChunk {
	pub payload: Bytes,

	/// Presentation timestamp in microseconds.
	pub timestamp_us: u64,

	pub keyframe: bool,
}

impl EncodedChunk {
	pub fn new(payload: impl Into<Bytes>, timestamp_us: u64, keyframe: bool) -> Self {
		Self {
			payload: payload.into(),
			timestamp_us,
			keyframe,
		}
	}
}

/// Pixel format of frames handed to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
	/// Red, Green, Blue, Alpha; 4 bytes per pixel, packed.
	#[default]
	Rgba,
}

impl PixelFormat {
	pub fn bytes_per_pixel(&self) -> usize {
		match self {
			Self::Rgba => 4,
		}
	}
}

/// A decoded, converted and timestamped video frame.
#[derive(Clone)]
pub struct DecodedFrame {
	/// Tightly packed pixel rows; `stride * height` bytes.
	pub data: Bytes,

	pub format: PixelFormat,
	pub width: u32,
	pub height: u32,

	/// Number of bytes between rows.
	pub stride: usize,

	/// Whether the samples use the full 0-255 range.
	pub full_range: bool,

	/// Presentation timestamp in nanoseconds, strictly increasing within a session.
	pub timestamp_ns: u64,
}

impl std::fmt::Debug for DecodedFrame {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DecodedFrame")
			.field("format", &self.format)
			.field("width", &self.width)
			.field("height", &self.height)
			.field("stride", &self.stride)
			.field("size", &self.data.len())
			.field("timestamp_ns", &self.timestamp_ns)
			.finish()
	}
}
