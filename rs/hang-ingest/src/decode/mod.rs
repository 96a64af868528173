//! The decoder backend seam.
//!
//! The pipeline drives a decoding library through these traits:
//! 1. [Backend::open] a [Decoder] for a [CodecDescriptor]
//! 2. [Decoder::send] one Annex-B packet per chunk
//! 3. [Decoder::receive] until the decoder has nothing left
//! 4. Convert each [Picture] with a [Scaler] created from the first picture of a generation
//!
//! # Platform Support
//!
//! Currently uses FFmpeg (`ffmpeg` feature) for native decoding. Future plans include:
//! - iOS/macOS: VideoToolbox
//! - Windows: Media Foundation

use bytes::Bytes;

use crate::{CodecDescriptor, ConvertError, DecodeError, InitError, PixelFormat};

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;

#[cfg(test)]
pub(crate) mod mock;

/// Creates decoders; shared by every generation of a source.
pub trait Backend: Send + Sync {
	type Decoder: Decoder;

	/// Allocate and open a decoder, applying the description as initialization data.
	fn open(&self, codec: &CodecDescriptor) -> Result<Self::Decoder, InitError>;
}

/// The result of asking a decoder for output.
#[derive(Debug)]
pub enum Receive<P> {
	/// A decoded picture.
	Picture(P),

	/// Nothing ready; more input is needed.
	Again,

	/// The decoder has been flushed and will produce nothing more.
	Eof,
}

/// An opened decoder instance.
///
/// Decoders are allowed to buffer: one packet may yield zero, one or many pictures,
/// so [Self::receive] must be called until it stops returning [Receive::Picture].
pub trait Decoder: Send {
	type Picture: Picture;
	type Scaler: Scaler<Self::Picture>;

	/// Submit one packet, tagged with its timestamp in microseconds.
	fn send(&mut self, packet: &[u8], pts_us: u64) -> Result<(), DecodeError>;

	/// Pull the next decoded picture, if any.
	fn receive(&mut self) -> Result<Receive<Self::Picture>, DecodeError>;

	/// Create a converter from the picture's native layout to the output format.
	fn scaler(&self, picture: &Self::Picture, format: PixelFormat) -> Result<Self::Scaler, ConvertError>;
}

/// A decoded picture in the decoder's native pixel layout.
pub trait Picture {
	fn width(&self) -> u32;
	fn height(&self) -> u32;

	/// The timestamp reported by the decoder, in microseconds.
	fn pts(&self) -> Option<u64>;
}

/// Converts pictures of one geometry and format to packed output pixels.
pub trait Scaler<P: Picture>: Send {
	/// Whether this scaler was configured for the picture's geometry and format.
	fn fits(&self, picture: &P) -> bool;

	/// Convert into tightly packed rows of the output format.
	fn scale(&mut self, picture: &P) -> Result<Bytes, ConvertError>;
}
