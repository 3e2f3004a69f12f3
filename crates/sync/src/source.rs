use async_trait::async_trait;
use podium_api::{ChannelError, ContestId, ContestMeta, FetchError, Snapshot};

/// Result of one baseline fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline<S> {
	/// Contest metadata, for feeds that fetch it.
	pub meta: Option<ContestMeta>,
	pub snapshot: S,
}

/// One-shot request for the current server state of a feed.
///
/// Single attempt; retry policy belongs to the caller. Must be safe to call
/// repeatedly.
#[async_trait]
pub trait SnapshotFetcher<S: Snapshot>: Send + Sync + 'static {
	async fn fetch(&self, contest: ContestId) -> Result<Baseline<S>, FetchError>;
}

/// Opens server-push connections scoped to one contest.
#[async_trait]
pub trait PushTransport: Send + Sync + 'static {
	/// Performs the handshake. `Ok` means the stream is open.
	async fn connect(&self, contest: ContestId) -> Result<Box<dyn PushStream>, ChannelError>;
}

/// An open push connection delivering raw payloads in server order.
#[async_trait]
pub trait PushStream: Send {
	/// Next payload. `None` when the server ended the stream.
	async fn next_frame(&mut self) -> Option<Result<String, ChannelError>>;
}
