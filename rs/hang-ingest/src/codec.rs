use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The video codecs the pipeline knows how to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
	#[display("h264")]
	H264,
	#[display("hevc")]
	Hevc,
	#[display("av1")]
	Av1,
}

impl CodecKind {
	/// Match a WebCodecs codec string (ex. `avc1.64001f`) or a bare codec name.
	///
	/// The registry prefixes (`avc1`, `hev1`, `hvc1`, `av01`) are case sensitive; the bare names are not.
	pub fn parse(codec: &str) -> Option<Self> {
		let prefix = |len: usize| codec.get(..len).unwrap_or_default();

		if codec.starts_with("avc1") || prefix(4).eq_ignore_ascii_case("h264") {
			return Some(Self::H264);
		}

		if codec.starts_with("hev1")
			|| codec.starts_with("hvc1")
			|| prefix(4).eq_ignore_ascii_case("hevc")
			|| prefix(4).eq_ignore_ascii_case("h265")
		{
			return Some(Self::Hevc);
		}

		if codec.starts_with("av01") || prefix(3).eq_ignore_ascii_case("av1") {
			return Some(Self::Av1);
		}

		None
	}

	/// Like [Self::parse], but falls back to H.264 for anything unrecognized.
	pub fn classify(codec: &str) -> Self {
		if codec.is_empty() {
			return Self::H264;
		}

		Self::parse(codec).unwrap_or_else(|| {
			tracing::warn!(%codec, "unknown codec, defaulting to h264");
			Self::H264
		})
	}
}

/// The decoder configuration for one track, as announced by the catalog.
///
/// Immutable for the lifetime of a decoder; a different descriptor means a new decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDescriptor {
	pub kind: CodecKind,

	/// The codec string as received, kept for diagnostics.
	pub codec: String,

	/// Out-of-band initialization data (ex. avcC/hvcC), passed to the decoder as extradata.
	pub description: Option<Bytes>,
}

impl CodecDescriptor {
	pub fn new(codec: &str, description: Option<Bytes>) -> Self {
		Self {
			kind: CodecKind::classify(codec),
			codec: codec.to_string(),
			description: description.filter(|description| !description.is_empty()),
		}
	}
}

impl std::fmt::Display for CodecDescriptor {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self.codec.is_empty() {
			true => write!(f, "{}", self.kind),
			false => write!(f, "{} ({})", self.codec, self.kind),
		}
	}
}
