//! The subset of a hang catalog needed to configure a decoder.
//!
//! Only the video section is parsed; unknown fields (audio, priority, etc) are ignored so newer
//! catalogs keep working.

use std::collections::BTreeMap;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_with::hex::Hex;

use crate::{CodecDescriptor, Error};

#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Catalog {
	#[serde(default)]
	pub video: Option<Video>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Video {
	/// A map of track name to rendition configuration, sorted by name.
	#[serde(default)]
	pub renditions: BTreeMap<String, VideoConfig>,
}

/// Video decoder configuration based on WebCodecs VideoDecoderConfig.
///
/// Reference: <https://www.w3.org/TR/webcodecs/#video-decoder-config>
#[serde_with::serde_as]
#[serde_with::skip_serializing_none]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VideoConfig {
	// The codec, see the registry for details:
	// https://w3c.github.io/webcodecs/codec_registry.html
	pub codec: String,

	// avcC/hvcC/av1C, hex encoded.
	// If not provided, the parameter sets are in-band.
	#[serde(default)]
	#[serde_as(as = "Option<Hex>")]
	pub description: Option<Bytes>,

	#[serde(default)]
	pub coded_width: Option<u32>,

	#[serde(default)]
	pub coded_height: Option<u32>,
}

impl VideoConfig {
	pub fn descriptor(&self) -> CodecDescriptor {
		CodecDescriptor::new(&self.codec, self.description.clone())
	}
}

impl Catalog {
	pub fn from_slice(data: &[u8]) -> Result<Self, Error> {
		Ok(serde_json::from_slice(data)?)
	}

	/// The first video rendition by name, if any.
	pub fn video(&self) -> Option<(&str, &VideoConfig)> {
		let video = self.video.as_ref()?;
		video
			.renditions
			.iter()
			.next()
			.map(|(name, config)| (name.as_str(), config))
	}

	/// The decoder configuration for the first video rendition.
	///
	/// Falls back to H.264 with in-band parameter sets when the catalog has no video.
	pub fn descriptor(&self) -> CodecDescriptor {
		match self.video() {
			Some((name, config)) => {
				tracing::info!(
					track = name,
					codec = %config.codec,
					width = config.coded_width,
					height = config.coded_height,
					"selected video rendition"
				);
				config.descriptor()
			}
			None => {
				tracing::warn!("catalog has no video renditions, assuming h264");
				CodecDescriptor::new("", None)
			}
		}
	}
}

impl FromStr for Catalog {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(serde_json::from_str(s)?)
	}
}
