use std::sync::Arc;

use crate::CodecKind;

/// The chunk could not be reframed into a start-code bitstream.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReframeError {
	/// A length header declares more bytes than remain in the chunk.
	#[error("truncated record: declared {declared} bytes but only {remaining} remain")]
	TruncatedRecord { declared: usize, remaining: usize },
}

/// The decoder could not be created for a codec configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum InitError {
	#[error("unsupported codec: {0}")]
	UnsupportedCodec(CodecKind),

	#[error("failed to open decoder: {0}")]
	OpenFailed(String),
}

/// A decode call failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
	#[error("reframe failed: {0}")]
	ReframeFailed(#[from] ReframeError),

	#[error("failed to submit packet: {0}")]
	SubmitFailed(String),

	#[error("failed to receive frame: {0}")]
	DecodeFailed(String),

	#[error("decoder destroyed")]
	Destroyed,
}

/// A decoded frame could not be converted to the output pixel format.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
	#[error("failed to create scaler: {0}")]
	ContextCreateFailed(String),

	#[error("failed to scale frame: {0}")]
	ScaleFailed(String),
}

/// A decoded frame failed a sanity check before output.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
	#[error("invalid frame dimensions: {width}x{height}")]
	InvalidDimensions { width: u32, height: u32 },
}

#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
	#[error(transparent)]
	Reframe(#[from] ReframeError),

	#[error(transparent)]
	Init(#[from] InitError),

	#[error(transparent)]
	Decode(#[from] DecodeError),

	#[error(transparent)]
	Convert(#[from] ConvertError),

	#[error(transparent)]
	Validation(#[from] ValidationError),

	#[error("invalid catalog: {0}")]
	Catalog(Arc<serde_json::Error>),

	#[error("source is not active")]
	Inactive,

	#[error("no decoder configured")]
	NoDecoder,
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Error::Catalog(Arc::new(err))
	}
}

pub type Result<T> = std::result::Result<T, Error>;
