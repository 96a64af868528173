/// Limits applied to decoded frames.
#[derive(Clone, Debug, clap::Args, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct DecodeConfig {
	/// Drop decoded frames wider than this.
	#[arg(
		id = "max-width",
		long = "max-width",
		default_value_t = DecodeConfig::MAX_WIDTH,
		env = "HANG_INGEST_MAX_WIDTH"
	)]
	pub max_width: u32,

	/// Drop decoded frames taller than this.
	#[arg(
		id = "max-height",
		long = "max-height",
		default_value_t = DecodeConfig::MAX_HEIGHT,
		env = "HANG_INGEST_MAX_HEIGHT"
	)]
	pub max_height: u32,
}

impl DecodeConfig {
	/// 8K UHD
	pub const MAX_WIDTH: u32 = 7680;
	pub const MAX_HEIGHT: u32 = 4320;
}

impl Default for DecodeConfig {
	fn default() -> Self {
		Self {
			max_width: Self::MAX_WIDTH,
			max_height: Self::MAX_HEIGHT,
		}
	}
}

/// Configuration for a [crate::Source].
#[derive(Clone, Debug, clap::Parser, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct Config {
	#[command(flatten)]
	#[serde(default)]
	pub decode: DecodeConfig,

	/// The maximum number of frames a [crate::FrameQueue] holds before dropping the oldest.
	#[arg(
		id = "queue-capacity",
		long = "queue-capacity",
		default_value_t = Config::QUEUE_CAPACITY,
		env = "HANG_INGEST_QUEUE_CAPACITY"
	)]
	pub queue_capacity: usize,
}

impl Config {
	pub const QUEUE_CAPACITY: usize = 16;
}

impl Default for Config {
	fn default() -> Self {
		Self {
			decode: DecodeConfig::default(),
			queue_capacity: Self::QUEUE_CAPACITY,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;

	#[test]
	fn test_default_matches_cli_default() {
		let config = Config::parse_from(["test"]);
		assert_eq!(config.decode.max_width, 7680);
		assert_eq!(config.decode.max_height, 4320);
		assert_eq!(config.queue_capacity, 16);
	}

	#[test]
	fn test_cli_flags() {
		let config = Config::parse_from(["test", "--max-width", "1920", "--max-height", "1080", "--queue-capacity", "4"]);
		assert_eq!(config.decode.max_width, 1920);
		assert_eq!(config.decode.max_height, 1080);
		assert_eq!(config.queue_capacity, 4);
	}

	#[test]
	fn test_toml_partial() {
		let toml = r#"
			queue_capacity = 2

			[decode]
			max_width = 3840
		"#;

		let config: Config = toml::from_str(toml).unwrap();
		assert_eq!(config.decode.max_width, 3840);
		assert_eq!(config.decode.max_height, DecodeConfig::MAX_HEIGHT);
		assert_eq!(config.queue_capacity, 2);
	}

	#[test]
	fn test_toml_empty() {
		let config: Config = toml::from_str("").unwrap();
		assert_eq!(config.queue_capacity, Config::QUEUE_CAPACITY);
		assert_eq!(config.decode.max_width, DecodeConfig::MAX_WIDTH);
	}

	#[test]
	fn test_toml_rejects_unknown_fields() {
		assert!(toml::from_str::<Config>("max_fps = 30").is_err());
	}
}
