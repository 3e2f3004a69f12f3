//! `config.toml` loading.
//!
//! Precedence, lowest first: built-in defaults, the config file,
//! `PODIUM_BASE_URL`, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use podium_worker::Backoff;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const CONFIG_ENV: &str = "PODIUM_CONFIG";
pub const BASE_URL_ENV: &str = "PODIUM_BASE_URL";

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("reading {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("parsing {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("invalid base url {url:?}: {source}")]
	BaseUrl {
		url: String,
		#[source]
		source: url::ParseError,
	},
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// API root, including any path prefix such as `/api`.
	pub base_url: String,
	pub request_timeout_secs: u64,
	pub reconnect: ReconnectConfig,
	pub auth: AuthConfig,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			base_url: "http://localhost:8080/api".to_string(),
			request_timeout_secs: 30,
			reconnect: ReconnectConfig::default(),
			auth: AuthConfig::default(),
		}
	}
}

/// Live channel reconnect policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectConfig {
	pub base_ms: u64,
	pub max_ms: u64,
	pub max_attempts: u32,
	pub jitter: f64,
}

impl Default for ReconnectConfig {
	fn default() -> Self {
		let backoff = Backoff::default();
		Self {
			base_ms: backoff.base.as_millis() as u64,
			max_ms: backoff.max.as_millis() as u64,
			max_attempts: backoff.max_attempts,
			jitter: backoff.jitter,
		}
	}
}

impl ReconnectConfig {
	pub fn backoff(&self) -> Backoff {
		Backoff {
			base: Duration::from_millis(self.base_ms),
			max: Duration::from_millis(self.max_ms),
			max_attempts: self.max_attempts,
			jitter: self.jitter,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
	/// File name of the stored session token.
	pub key: String,
}

impl Default for AuthConfig {
	fn default() -> Self {
		Self {
			key: "session-token".to_string(),
		}
	}
}

impl Config {
	/// Loads the effective configuration.
	///
	/// An explicitly named file must exist; the default location may be absent.
	pub fn load(explicit: Option<&Path>, env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
		let named = explicit.map(Path::to_path_buf).or_else(|| env(CONFIG_ENV).map(PathBuf::from));
		let config = match named {
			Some(path) => Self::from_file(&path)?,
			None => match default_path() {
				Some(path) if path.exists() => Self::from_file(&path)?,
				_ => Self::default(),
			},
		};
		Ok(config.with_env(env))
	}

	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
			path: path.to_path_buf(),
			source,
		})?;
		let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
			path: path.to_path_buf(),
			source,
		})?;
		tracing::debug!(path = %path.display(), "config.loaded");
		Ok(config)
	}

	fn with_env(mut self, env: impl Fn(&str) -> Option<String>) -> Self {
		if let Some(url) = env(BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
			self.base_url = url;
		}
		self
	}

	pub fn base_url(&self) -> Result<Url, ConfigError> {
		Url::parse(self.base_url.trim()).map_err(|source| ConfigError::BaseUrl {
			url: self.base_url.clone(),
			source,
		})
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.request_timeout_secs)
	}
}

/// `<config dir>/podium/config.toml`.
pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("podium").join(CONFIG_FILE))
}
