use std::sync::Arc;

use crate::annexb;
use crate::decode::{Backend, Decoder, Picture, Receive, Scaler};
use crate::{
	CodecDescriptor, ConvertError, DecodeConfig, DecodeError, DecodedFrame, EncodedChunk, Error, InitError,
	PixelFormat, TimestampTracker, ValidationError,
};

/// The output of one [Pipeline::decode] call.
#[derive(Debug, Default)]
pub struct Decoded {
	/// Frames in decoder emission order.
	pub frames: Vec<DecodedFrame>,

	/// Frames dropped because they failed validation or conversion.
	pub dropped: usize,

	/// Set if draining stopped early because the decoder reported an error.
	pub error: Option<DecodeError>,
}

struct DecoderState<D: Decoder> {
	decoder: D,

	// Created from the first picture, since the format and dimensions are unknown until then.
	scaler: Option<D::Scaler>,
}

/// One decoder generation: reframes chunks, drains the decoder, converts and timestamps frames.
///
/// The pipeline is not synchronized; [crate::Source] keeps it behind the decoder lock.
pub struct Pipeline<D: Decoder> {
	codec: CodecDescriptor,
	config: DecodeConfig,
	timestamps: Arc<TimestampTracker>,

	// None once destroyed.
	state: Option<DecoderState<D>>,
}

impl<D: Decoder> Pipeline<D> {
	/// Open a decoder for the codec.
	pub fn init<B: Backend<Decoder = D>>(
		backend: &B,
		codec: CodecDescriptor,
		timestamps: Arc<TimestampTracker>,
		config: DecodeConfig,
	) -> Result<Self, InitError> {
		tracing::info!(%codec, description = codec.description.as_ref().map(|d| d.len()), "initializing video decoder");

		let decoder = backend.open(&codec)?;

		Ok(Self {
			codec,
			config,
			timestamps,
			state: Some(DecoderState { decoder, scaler: None }),
		})
	}

	pub fn codec(&self) -> &CodecDescriptor {
		&self.codec
	}

	pub fn is_destroyed(&self) -> bool {
		self.state.is_none()
	}

	/// Decode a chunk and return every frame the decoder has ready.
	///
	/// Reframe and submit failures abort the call without producing frames.
	/// Anything that goes wrong with an individual frame only drops that frame.
	pub fn decode(&mut self, chunk: &EncodedChunk) -> Result<Decoded, DecodeError> {
		let state = self.state.as_mut().ok_or(DecodeError::Destroyed)?;

		let packet = annexb::reframe(&chunk.payload).inspect_err(|err| {
			tracing::error!(%err, size = chunk.payload.len(), "failed to reframe chunk");
		})?;

		state.decoder.send(&packet, chunk.timestamp_us).inspect_err(|err| {
			tracing::error!(%err, size = packet.len(), pts = chunk.timestamp_us, "failed to submit packet");
		})?;
		drop(packet);

		let mut decoded = Decoded::default();

		// Decoders may hold several frames per packet; anything left behind piles up inside the decoder.
		loop {
			let picture = match state.decoder.receive() {
				Ok(Receive::Picture(picture)) => picture,
				Ok(Receive::Again) | Ok(Receive::Eof) => break,
				Err(err) => {
					tracing::error!(%err, pts = chunk.timestamp_us, "failed to receive frame");
					decoded.error = Some(err);
					break;
				}
			};

			match state.present(&picture, chunk.timestamp_us, &self.config, &self.timestamps) {
				Ok(frame) => decoded.frames.push(frame),
				Err(err) => {
					tracing::warn!(%err, "dropping frame");
					decoded.dropped += 1;
				}
			}
		}

		tracing::trace!(
			pts = chunk.timestamp_us,
			keyframe = chunk.keyframe,
			frames = decoded.frames.len(),
			dropped = decoded.dropped,
			"decoded chunk"
		);

		Ok(decoded)
	}

	/// Release the decoder and scaler. Safe to call more than once.
	pub fn destroy(&mut self) {
		if self.state.take().is_some() {
			tracing::debug!(codec = %self.codec, "destroyed video decoder");
		}
	}
}

impl<D: Decoder> DecoderState<D> {
	fn present(
		&mut self,
		picture: &D::Picture,
		fallback_pts: u64,
		config: &DecodeConfig,
		timestamps: &TimestampTracker,
	) -> Result<DecodedFrame, Error> {
		let (width, height) = (picture.width(), picture.height());
		if width == 0 || height == 0 || width > config.max_width || height > config.max_height {
			return Err(ValidationError::InvalidDimensions { width, height }.into());
		}

		let format = PixelFormat::Rgba;
		let scaler = self.scaler(picture, format)?;
		let data = scaler.scale(picture)?;

		let stride = width as usize * format.bytes_per_pixel();
		if data.len() != stride * height as usize {
			return Err(ConvertError::ScaleFailed(format!("unexpected output size: {}", data.len())).into());
		}

		// Prefer the decoder's timestamp; it accounts for reordering.
		let pts = picture.pts().unwrap_or(fallback_pts);
		let timestamp_ns = timestamps.normalize(pts);

		Ok(DecodedFrame {
			data,
			format,
			width,
			height,
			stride,
			full_range: true,
			timestamp_ns,
		})
	}

	fn scaler(&mut self, picture: &D::Picture, format: PixelFormat) -> Result<&mut D::Scaler, ConvertError> {
		let scaler = match self.scaler.take() {
			Some(existing) if existing.fits(picture) => existing,
			Some(_) => {
				tracing::debug!(width = picture.width(), height = picture.height(), "frame geometry changed, recreating scaler");
				self.decoder.scaler(picture, format)?
			}
			None => self.decoder.scaler(picture, format)?,
		};

		Ok(self.scaler.insert(scaler))
	}
}
