use podium_api::Snapshot;
use podium_sync::{ChannelState, LiveStatus, ReconciledView, SyncError};

/// One-line, non-blocking indicator of feed health.
///
/// The last error is appended when present, except for exhausted reconnects
/// which the main text already describes.
pub fn status_line<S: Snapshot>(view: &ReconciledView<S>) -> String {
	let mut line = if view.contest.is_none() {
		"inactive".to_string()
	} else if view.loading {
		"Loading...".to_string()
	} else {
		match view.live {
			LiveStatus::Unavailable => format!("live updates unavailable, showing last known {}", S::KIND),
			LiveStatus::Reconnecting { attempt } => format!("reconnecting (attempt {attempt})"),
			LiveStatus::Active => match view.channel_state {
				ChannelState::Open => "live".to_string(),
				ChannelState::Connecting => "connecting".to_string(),
				ChannelState::Failed | ChannelState::Closed => "offline".to_string(),
			},
		}
	};
	if let Some(err) = &view.last_error
		&& !matches!(err, SyncError::LiveUnavailable { .. })
	{
		line.push_str(" | ");
		line.push_str(&err.to_string());
	}
	line
}
