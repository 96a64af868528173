use serde_with::DisplayFromStr;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Tracing configuration for hosts that don't install their own subscriber.
#[serde_with::serde_as]
#[derive(Clone, Debug, clap::Parser, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct Log {
	/// The default level; `RUST_LOG` directives take precedence.
	#[arg(id = "log-level", long = "log-level", default_value = "info", env = "HANG_INGEST_LOG_LEVEL")]
	#[serde_as(as = "DisplayFromStr")]
	pub level: tracing::Level,
}

impl Default for Log {
	fn default() -> Self {
		Self {
			level: tracing::Level::INFO,
		}
	}
}

impl Log {
	pub fn new(level: tracing::Level) -> Self {
		Self { level }
	}

	/// Install a stderr subscriber. Does nothing if one is already installed.
	pub fn init(&self) {
		let filter = EnvFilter::builder()
			.with_default_directive(LevelFilter::from_level(self.level).into())
			.from_env_lossy();

		let res = tracing_subscriber::fmt()
			.with_env_filter(filter)
			.with_writer(std::io::stderr)
			.try_init();

		if let Err(err) = res {
			tracing::debug!(%err, "tracing subscriber already installed");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::Parser;

	#[test]
	fn test_default_level() {
		assert_eq!(Log::parse_from(["test"]).level, tracing::Level::INFO);
		assert_eq!(Log::default().level, tracing::Level::INFO);
	}

	#[test]
	fn test_level_flag() {
		let log = Log::parse_from(["test", "--log-level", "debug"]);
		assert_eq!(log.level, tracing::Level::DEBUG);

		assert!(Log::try_parse_from(["test", "--log-level", "loud"]).is_err());
	}

	#[test]
	fn test_level_toml() {
		let log: Log = toml::from_str(r#"level = "warn""#).unwrap();
		assert_eq!(log.level, tracing::Level::WARN);

		let encoded = toml::to_string(&Log::new(tracing::Level::TRACE)).unwrap();
		assert!(encoded.contains("TRACE"));
	}

	#[test]
	fn test_init_twice() {
		Log::new(tracing::Level::WARN).init();
		Log::default().init();
	}
}
