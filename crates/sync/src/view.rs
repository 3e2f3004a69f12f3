use chrono::{DateTime, Utc};
use podium_api::{ChannelError, ContestId, ContestMeta, FetchError};
use thiserror::Error;

use crate::ChannelState;

/// Error surfaced on the view. Never blanks held data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
	#[error("could not load contest data: {0}")]
	Fetch(FetchError),
	#[error("live updates interrupted: {0}")]
	Channel(ChannelError),
	#[error("live updates unavailable after {attempts} reconnect attempts, showing last known data")]
	LiveUnavailable { attempts: u32 },
}

/// Health of the live update path for the active contest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LiveStatus {
	/// A channel is connecting or open.
	#[default]
	Active,
	/// The channel failed; attempt `attempt` is scheduled or connecting.
	Reconnecting { attempt: u32 },
	/// Reconnect attempts are exhausted for this activation.
	Unavailable,
}

/// Externally visible state of one feed.
///
/// Replaced as a whole on every change; readers hold an `Arc` to an
/// immutable value and never observe a partial update.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledView<S> {
	/// Active contest. `None` while inactive.
	pub contest: Option<ContestId>,
	pub meta: Option<ContestMeta>,
	/// Latest snapshot from either source.
	pub snapshot: Option<S>,
	/// Arrival time of `snapshot`.
	pub last_updated_at: Option<DateTime<Utc>>,
	pub channel_state: ChannelState,
	pub live: LiveStatus,
	/// True until the first fetch result or first push arrives.
	pub loading: bool,
	pub last_error: Option<SyncError>,
}

impl<S> ReconciledView<S> {
	/// View with nothing active.
	pub fn idle() -> Self {
		Self {
			contest: None,
			meta: None,
			snapshot: None,
			last_updated_at: None,
			channel_state: ChannelState::Closed,
			live: LiveStatus::Active,
			loading: false,
			last_error: None,
		}
	}

	/// Fresh view for a just-activated contest.
	pub fn activating(contest: ContestId) -> Self {
		Self {
			contest: Some(contest),
			channel_state: ChannelState::Connecting,
			loading: true,
			..Self::idle()
		}
	}

	/// Whether live data is currently flowing.
	pub fn is_live(&self) -> bool {
		self.channel_state == ChannelState::Open
	}
}

impl<S> Default for ReconciledView<S> {
	fn default() -> Self {
		Self::idle()
	}
}
