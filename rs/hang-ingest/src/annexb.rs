//! Conversion from length-prefixed NAL units to Annex-B.
//!
//! The subscription delivers each chunk the way it is stored in MP4: a series of
//! `[u32 big-endian length][unit]` records. Decoders that are not handed an
//! `avcC`/`hvcC` record up front (and even some that are) expect start codes
//! instead, so every record is rewritten as `[00 00 00 01][unit]`.

use bytes::{BufMut, Bytes, BytesMut};

use crate::ReframeError;

/// The 4-byte Annex-B start code.
pub const START_CODE: [u8; 4] = [0, 0, 0, 1];

/// Size of the big-endian length header in front of each record.
pub const LENGTH_SIZE: usize = 4;

/// Iterate over the units of a length-prefixed chunk.
///
/// Trailing bytes too short to hold a length header are ignored; a conformant producer never
/// emits a partial trailing record.
pub struct Records<'a> {
	buf: &'a [u8],
}

impl<'a> Records<'a> {
	pub fn new(buf: &'a [u8]) -> Self {
		Self { buf }
	}
}

impl<'a> Iterator for Records<'a> {
	type Item = Result<&'a [u8], ReframeError>;

	fn next(&mut self) -> Option<Self::Item> {
		let (header, rest) = self.buf.split_first_chunk::<LENGTH_SIZE>()?;
		let declared = u32::from_be_bytes(*header) as usize;

		if declared > rest.len() {
			let remaining = rest.len();
			self.buf = &[];
			return Some(Err(ReframeError::TruncatedRecord { declared, remaining }));
		}

		let (unit, rest) = rest.split_at(declared);
		self.buf = rest;

		Some(Ok(unit))
	}
}

/// Rewrite a length-prefixed chunk as a contiguous Annex-B bitstream.
///
/// Returns a fresh buffer; no output is produced if any record is truncated.
pub fn reframe(input: &[u8]) -> Result<Bytes, ReframeError> {
	// Each 4-byte length becomes a 4-byte start code, so the input size is an upper bound.
	let mut output = BytesMut::with_capacity(input.len());

	for unit in Records::new(input) {
		let unit = unit?;
		output.put_slice(&START_CODE);
		output.put_slice(unit);
	}

	Ok(output.freeze())
}
