use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::TokenStoreError;

/// Source of the bearer token attached to requests and stream URLs.
///
/// Consulted on every request, so a login or logout takes effect without
/// rebuilding clients.
pub trait CredentialProvider: Send + Sync + 'static {
	fn token(&self) -> Option<String>;
}

/// Fixed token, or none.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
	pub fn new(token: impl Into<String>) -> Self {
		Self(Some(token.into()))
	}

	pub const fn none() -> Self {
		Self(None)
	}
}

impl CredentialProvider for StaticToken {
	fn token(&self) -> Option<String> {
		self.0.clone()
	}
}

/// Bearer token persisted in one file under a fixed key.
#[derive(Debug, Clone)]
pub struct TokenStore {
	path: PathBuf,
}

impl TokenStore {
	/// Store at `<dir>/<key>`.
	pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
		Self {
			path: dir.as_ref().join(key),
		}
	}

	/// Store under the platform data directory (`<data_dir>/podium/<key>`).
	pub fn in_data_dir(key: &str) -> Result<Self, TokenStoreError> {
		let dir = dirs::data_dir().ok_or(TokenStoreError::NoDataDir)?;
		Ok(Self::new(dir.join("podium"), key))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reads the stored token. A missing or blank file means logged out.
	pub fn load(&self) -> Result<Option<String>, TokenStoreError> {
		match fs::read_to_string(&self.path) {
			Ok(raw) => {
				let token = raw.trim();
				Ok((!token.is_empty()).then(|| token.to_owned()))
			}
			Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
			Err(source) => Err(self.io_error(source)),
		}
	}

	pub fn save(&self, token: &str) -> Result<(), TokenStoreError> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).map_err(|source| self.io_error(source))?;
		}
		let mut file = open_private(&self.path).map_err(|source| self.io_error(source))?;
		file.write_all(token.as_bytes()).map_err(|source| self.io_error(source))?;
		tracing::debug!(path = %self.path.display(), "auth.token.saved");
		Ok(())
	}

	/// Removes the stored token. Clearing an empty store is not an error.
	pub fn clear(&self) -> Result<(), TokenStoreError> {
		match fs::remove_file(&self.path) {
			Ok(()) => {
				tracing::debug!(path = %self.path.display(), "auth.token.cleared");
				Ok(())
			}
			Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
			Err(source) => Err(self.io_error(source)),
		}
	}

	fn io_error(&self, source: io::Error) -> TokenStoreError {
		TokenStoreError::Io {
			path: self.path.clone(),
			source,
		}
	}
}

impl CredentialProvider for TokenStore {
	fn token(&self) -> Option<String> {
		self.load().unwrap_or_else(|err| {
			tracing::warn!(error = %err, "auth.token.unreadable");
			None
		})
	}
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
	use std::os::unix::fs::OpenOptionsExt;

	fs::OpenOptions::new().write(true).create(true).truncate(true).mode(0o600).open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
	fs::OpenOptions::new().write(true).create(true).truncate(true).open(path)
}
