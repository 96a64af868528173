//! Software video decoding using FFmpeg.

use bytes::{BufMut, Bytes, BytesMut};
use ffmpeg::software::scaling;
use ffmpeg_next as ffmpeg;

use super::{Backend, Decoder, Picture, Receive, Scaler};
use crate::{CodecDescriptor, CodecKind, ConvertError, DecodeError, InitError, PixelFormat};

/// Opens FFmpeg software decoders for H.264, HEVC and AV1.
#[derive(Debug)]
pub struct Ffmpeg {
	_init: (),
}

impl Ffmpeg {
	pub fn new() -> Result<Self, InitError> {
		// Idempotent
		ffmpeg::init().map_err(|e| InitError::OpenFailed(format!("ffmpeg init: {}", e)))?;
		Ok(Self { _init: () })
	}
}

impl Backend for Ffmpeg {
	type Decoder = FfmpegDecoder;

	fn open(&self, codec: &CodecDescriptor) -> Result<FfmpegDecoder, InitError> {
		let id = match codec.kind {
			CodecKind::H264 => ffmpeg::codec::Id::H264,
			CodecKind::Hevc => ffmpeg::codec::Id::HEVC,
			CodecKind::Av1 => ffmpeg::codec::Id::AV1,
		};

		let found = ffmpeg::codec::decoder::find(id).ok_or(InitError::UnsupportedCodec(codec.kind))?;
		let mut context = ffmpeg::codec::context::Context::new_with_codec(found);

		// The extradata must be in place before the codec is opened.
		if let Some(description) = &codec.description {
			set_extradata(&mut context, description)?;
			tracing::debug!(size = description.len(), description = %hex::encode(description), "set codec extradata");
		}

		let decoder = context
			.decoder()
			.open_as(found)
			.and_then(|opened| opened.video())
			.map_err(|e| InitError::OpenFailed(e.to_string()))?;

		tracing::info!(%codec, decoder = found.name(), "opened ffmpeg decoder");

		Ok(FfmpegDecoder { decoder })
	}
}

fn set_extradata(context: &mut ffmpeg::codec::context::Context, data: &[u8]) -> Result<(), InitError> {
	let size = i32::try_from(data.len()).map_err(|_| InitError::OpenFailed("description too large".to_string()))?;

	// SAFETY: The buffer is allocated by av_mallocz with the padding FFmpeg requires,
	// and ownership passes to the codec context, which frees it with avcodec_free_context.
	unsafe {
		let padded = data.len() + ffmpeg::ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize;
		let extradata = ffmpeg::ffi::av_mallocz(padded) as *mut u8;
		if extradata.is_null() {
			return Err(InitError::OpenFailed("failed to allocate extradata".to_string()));
		}

		std::ptr::copy_nonoverlapping(data.as_ptr(), extradata, data.len());

		let context = context.as_mut_ptr();
		(*context).extradata = extradata;
		(*context).extradata_size = size;
	}

	Ok(())
}

/// An opened FFmpeg video decoder.
pub struct FfmpegDecoder {
	decoder: ffmpeg::decoder::Video,
}

// SAFETY: The codec context is only ever used through &mut self, and the pipeline
// keeps it behind the decoder lock.
unsafe impl Send for FfmpegDecoder {}

impl Decoder for FfmpegDecoder {
	type Picture = ffmpeg::frame::Video;
	type Scaler = FfmpegScaler;

	fn send(&mut self, packet: &[u8], pts_us: u64) -> Result<(), DecodeError> {
		let mut packet = ffmpeg::Packet::copy(packet);
		packet.set_pts(i64::try_from(pts_us).ok());

		self.decoder
			.send_packet(&packet)
			.map_err(|e| DecodeError::SubmitFailed(e.to_string()))
	}

	fn receive(&mut self) -> Result<Receive<Self::Picture>, DecodeError> {
		let mut decoded = ffmpeg::frame::Video::empty();

		match self.decoder.receive_frame(&mut decoded) {
			Ok(()) => Ok(Receive::Picture(decoded)),
			Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => Ok(Receive::Again),
			Err(ffmpeg::Error::Eof) => Ok(Receive::Eof),
			Err(e) => Err(DecodeError::DecodeFailed(e.to_string())),
		}
	}

	fn scaler(&self, picture: &Self::Picture, format: PixelFormat) -> Result<FfmpegScaler, ConvertError> {
		let output = match format {
			PixelFormat::Rgba => ffmpeg::format::Pixel::RGBA,
		};

		let flags = scaling::flag::Flags::BILINEAR
			| scaling::flag::Flags::FULL_CHR_H_INP
			| scaling::flag::Flags::FULL_CHR_H_INT;

		let context = scaling::Context::get(
			picture.format(),
			picture.width(),
			picture.height(),
			output,
			picture.width(),
			picture.height(),
			flags,
		)
		.map_err(|e| ConvertError::ContextCreateFailed(e.to_string()))?;

		tracing::debug!(
			input = ?picture.format(),
			width = picture.width(),
			height = picture.height(),
			"created scaler"
		);

		Ok(FfmpegScaler { context, format })
	}
}

impl Picture for ffmpeg::frame::Video {
	fn width(&self) -> u32 {
		ffmpeg::frame::Video::width(self)
	}

	fn height(&self) -> u32 {
		ffmpeg::frame::Video::height(self)
	}

	fn pts(&self) -> Option<u64> {
		// Frame::pts maps AV_NOPTS_VALUE to None.
		ffmpeg::frame::Frame::pts(self).and_then(|pts| u64::try_from(pts).ok())
	}
}

/// A swscale context for one input geometry and format.
pub struct FfmpegScaler {
	context: scaling::Context,
	format: PixelFormat,
}

// SAFETY: Same as FfmpegDecoder; owned by the pipeline and only used under the decoder lock.
unsafe impl Send for FfmpegScaler {}

impl Scaler<ffmpeg::frame::Video> for FfmpegScaler {
	fn fits(&self, picture: &ffmpeg::frame::Video) -> bool {
		let input = self.context.input();
		input.format == picture.format() && input.width == picture.width() && input.height == picture.height()
	}

	fn scale(&mut self, picture: &ffmpeg::frame::Video) -> Result<Bytes, ConvertError> {
		let mut converted = ffmpeg::frame::Video::empty();
		self.context
			.run(picture, &mut converted)
			.map_err(|e| ConvertError::ScaleFailed(e.to_string()))?;

		let row = converted.width() as usize * self.format.bytes_per_pixel();
		let height = converted.height() as usize;
		let stride = converted.stride(0);
		let plane = converted.data(0);

		// swscale pads each row; the sink expects them tightly packed.
		let mut packed = BytesMut::with_capacity(row * height);
		for line in 0..height {
			let start = line * stride;
			let bytes = plane
				.get(start..start + row)
				.ok_or_else(|| ConvertError::ScaleFailed("output plane too small".to_string()))?;
			packed.put_slice(bytes);
		}

		Ok(packed.freeze())
	}
}
