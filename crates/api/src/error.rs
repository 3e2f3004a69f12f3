use std::path::PathBuf;

use thiserror::Error;

/// Failure of a one-shot REST request.
///
/// Carries strings rather than transport errors so it can be cloned into
/// published views.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
	#[error("network error: {0}")]
	Network(String),
	#[error("not found: {0}")]
	NotFound(String),
	#[error("server responded with status {status}")]
	ServerError { status: u16 },
	#[error("malformed payload: {0}")]
	Decode(String),
}

impl From<DecodeError> for FetchError {
	fn from(err: DecodeError) -> Self {
		Self::Decode(err.to_string())
	}
}

/// Failure of a push stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
	/// Connection or HTTP handshake did not produce an event stream.
	#[error("stream handshake failed: {0}")]
	HandshakeFailed(String),
	/// An established stream broke or was closed by the server.
	#[error("stream dropped: {0}")]
	TransportDropped(String),
	/// One frame could not be decoded. Never fatal for the stream.
	#[error("undecodable frame: {0}")]
	DecodeFailed(String),
}

impl ChannelError {
	/// Whether this error ends the stream it came from.
	pub fn is_fatal(&self) -> bool {
		!matches!(self, Self::DecodeFailed(_))
	}
}

/// Payload does not describe a valid snapshot.
#[derive(Debug, Error)]
pub enum DecodeError {
	#[error(transparent)]
	Json(#[from] serde_json::Error),
	#[error("participant {user} lists problem {index} more than once")]
	DuplicateProblem { user: String, index: u32 },
}

/// Token persistence failure.
#[derive(Debug, Error)]
pub enum TokenStoreError {
	#[error("token store {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("no data directory available for the token store")]
	NoDataDir,
}

/// Login/logout failure.
#[derive(Debug, Error)]
pub enum AuthError {
	/// The server refused the credentials.
	#[error("login rejected: {0}")]
	Rejected(String),
	#[error(transparent)]
	Request(#[from] FetchError),
	#[error(transparent)]
	Store(#[from] TokenStoreError),
}
