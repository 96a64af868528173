//! A scripted decoder for tests.
//!
//! Each unit of a chunk describes one picture the decoder will buffer:
//! `[width: u16][height: u16][flags: u8]`, followed by `[pts: u64]` when flagged, all big-endian.
//! The decoder releases buffered pictures one per [Decoder::receive] call.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;

use super::{Backend, Decoder, Picture, Receive, Scaler};
use crate::annexb::START_CODE;
use crate::{CodecDescriptor, CodecKind, ConvertError, DecodeError, EncodedChunk, InitError, PixelFormat};

/// Fail the receive call for this picture instead of returning it.
pub const FAIL_RECEIVE: u8 = 0x01;
/// Fail the conversion of this picture.
pub const FAIL_SCALE: u8 = 0x02;
/// Fail to create a scaler for this picture.
pub const FAIL_SCALER: u8 = 0x04;
/// Report end of stream instead of returning this picture.
pub const EOF: u8 = 0x08;
/// The unit carries a decoder timestamp.
pub const HAS_PTS: u8 = 0x80;

/// Description bytes the mock refuses to open with.
pub const REJECTED_DESCRIPTION: &[u8] = b"reject";

/// Counters shared between a test and every decoder the backend opens.
#[derive(Default)]
pub struct Counters {
	pub opened: AtomicUsize,
	pub live: AtomicUsize,
	pub max_live: AtomicUsize,
	pub scalers: AtomicUsize,
	pub packets: Mutex<Vec<Bytes>>,

	/// Run whenever a decoder is dropped.
	pub on_drop: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl Counters {
	pub fn opened(&self) -> usize {
		self.opened.load(Ordering::SeqCst)
	}

	pub fn live(&self) -> usize {
		self.live.load(Ordering::SeqCst)
	}

	pub fn max_live(&self) -> usize {
		self.max_live.load(Ordering::SeqCst)
	}

	pub fn scalers(&self) -> usize {
		self.scalers.load(Ordering::SeqCst)
	}
}

/// Lacks AV1, like a minimal FFmpeg build.
#[derive(Clone, Default)]
pub struct MockBackend {
	pub counters: Arc<Counters>,
}

impl Backend for MockBackend {
	type Decoder = MockDecoder;

	fn open(&self, codec: &CodecDescriptor) -> Result<MockDecoder, InitError> {
		if codec.kind == CodecKind::Av1 {
			return Err(InitError::UnsupportedCodec(codec.kind));
		}

		if codec.description.as_deref() == Some(REJECTED_DESCRIPTION) {
			return Err(InitError::OpenFailed("invalid extradata".to_string()));
		}

		self.counters.opened.fetch_add(1, Ordering::SeqCst);
		let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
		self.counters.max_live.fetch_max(live, Ordering::SeqCst);

		Ok(MockDecoder {
			counters: self.counters.clone(),
			buffered: VecDeque::new(),
		})
	}
}

#[derive(Debug, Clone, Copy)]
pub struct MockPicture {
	pub width: u32,
	pub height: u32,
	pub flags: u8,
	pub pts: Option<u64>,
}

impl Picture for MockPicture {
	fn width(&self) -> u32 {
		self.width
	}

	fn height(&self) -> u32 {
		self.height
	}

	fn pts(&self) -> Option<u64> {
		self.pts
	}
}

pub struct MockDecoder {
	counters: Arc<Counters>,
	buffered: VecDeque<MockPicture>,
}

impl MockDecoder {
	fn parse(unit: &[u8]) -> Result<MockPicture, DecodeError> {
		let malformed = || DecodeError::SubmitFailed(format!("malformed unit: {:02x?}", unit));

		let (head, pts) = match unit.len() {
			5 => (unit, None),
			13 => {
				let (head, pts) = unit.split_at(5);
				(head, Some(u64::from_be_bytes(pts.try_into().map_err(|_| malformed())?)))
			}
			_ => return Err(malformed()),
		};

		Ok(MockPicture {
			width: u16::from_be_bytes([head[0], head[1]]) as u32,
			height: u16::from_be_bytes([head[2], head[3]]) as u32,
			flags: head[4],
			pts,
		})
	}
}

impl Drop for MockDecoder {
	fn drop(&mut self) {
		if let Some(hook) = self.counters.on_drop.lock().as_ref() {
			hook();
		}
		self.counters.live.fetch_sub(1, Ordering::SeqCst);
	}
}

impl Decoder for MockDecoder {
	type Picture = MockPicture;
	type Scaler = MockScaler;

	fn send(&mut self, packet: &[u8], _pts_us: u64) -> Result<(), DecodeError> {
		self.counters.packets.lock().push(Bytes::copy_from_slice(packet));

		let mut pictures = Vec::new();
		let mut rest = packet;

		while !rest.is_empty() {
			rest = rest
				.strip_prefix(&START_CODE)
				.ok_or_else(|| DecodeError::SubmitFailed("missing start code".to_string()))?;

			let size = match rest.get(4) {
				Some(flags) if flags & HAS_PTS != 0 => 13,
				_ => 5,
			};

			let unit = rest
				.get(..size)
				.ok_or_else(|| DecodeError::SubmitFailed("short unit".to_string()))?;
			pictures.push(Self::parse(unit)?);
			rest = &rest[size..];
		}

		self.buffered.extend(pictures);
		Ok(())
	}

	fn receive(&mut self) -> Result<Receive<MockPicture>, DecodeError> {
		match self.buffered.pop_front() {
			Some(picture) if picture.flags & FAIL_RECEIVE != 0 => Err(DecodeError::DecodeFailed("scripted failure".to_string())),
			Some(picture) if picture.flags & EOF != 0 => Ok(Receive::Eof),
			Some(picture) => Ok(Receive::Picture(picture)),
			None => Ok(Receive::Again),
		}
	}

	fn scaler(&self, picture: &MockPicture, format: PixelFormat) -> Result<MockScaler, ConvertError> {
		if picture.flags & FAIL_SCALER != 0 {
			return Err(ConvertError::ContextCreateFailed("scripted failure".to_string()));
		}

		self.counters.scalers.fetch_add(1, Ordering::SeqCst);

		Ok(MockScaler {
			width: picture.width,
			height: picture.height,
			format,
		})
	}
}

pub struct MockScaler {
	width: u32,
	height: u32,
	format: PixelFormat,
}

impl Scaler<MockPicture> for MockScaler {
	fn fits(&self, picture: &MockPicture) -> bool {
		self.width == picture.width && self.height == picture.height
	}

	fn scale(&mut self, picture: &MockPicture) -> Result<Bytes, ConvertError> {
		if picture.flags & FAIL_SCALE != 0 {
			return Err(ConvertError::ScaleFailed("scripted failure".to_string()));
		}

		let size = picture.width as usize * picture.height as usize * self.format.bytes_per_pixel();
		Ok(Bytes::from(vec![0x80; size]))
	}
}

/// A unit describing one picture.
pub fn unit(width: u16, height: u16) -> Vec<u8> {
	unit_with(width, height, 0, None)
}

pub fn unit_with(width: u16, height: u16, flags: u8, pts: Option<u64>) -> Vec<u8> {
	let mut out = Vec::with_capacity(13);
	out.extend_from_slice(&width.to_be_bytes());
	out.extend_from_slice(&height.to_be_bytes());
	match pts {
		Some(pts) => {
			out.push(flags | HAS_PTS);
			out.extend_from_slice(&pts.to_be_bytes());
		}
		None => out.push(flags),
	}
	out
}

/// Wrap units into a length-prefixed chunk.
pub fn chunk(units: &[Vec<u8>], timestamp_us: u64) -> EncodedChunk {
	let mut payload = Vec::new();
	for unit in units {
		payload.extend_from_slice(&(unit.len() as u32).to_be_bytes());
		payload.extend_from_slice(unit);
	}

	EncodedChunk::new(payload, timestamp_us, false)
}
