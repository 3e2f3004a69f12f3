use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use podium_api::ContestMeta;
use podium_worker::Ticker;

/// Where a contest is in its schedule relative to a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestPhase {
	Upcoming { starts_in: Duration },
	/// Includes the exact end instant.
	Running { remaining: Duration },
	Ended,
}

impl ContestPhase {
	pub fn at(start: DateTime<Utc>, duration_minutes: u32, now: DateTime<Utc>) -> Self {
		let end = start + TimeDelta::minutes(i64::from(duration_minutes));
		if now < start {
			Self::Upcoming {
				starts_in: (start - now).to_std().unwrap_or_default(),
			}
		} else if now <= end {
			Self::Running {
				remaining: (end - now).to_std().unwrap_or_default(),
			}
		} else {
			Self::Ended
		}
	}

	/// Phase of `meta`, or `None` when it has no start time or no duration.
	pub fn of(meta: &ContestMeta, now: DateTime<Utc>) -> Option<Self> {
		let start = meta.start_time.as_ref()?;
		(meta.duration > 0).then(|| Self::at(start.0, meta.duration, now))
	}

	pub fn is_ended(self) -> bool {
		self == Self::Ended
	}
}

impl fmt::Display for ContestPhase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {
			Self::Upcoming { starts_in } => write!(f, "Starts in: {}", format_time_diff(starts_in)),
			Self::Running { remaining } => write!(f, "Time left: {}", format_time_diff(remaining)),
			Self::Ended => f.write_str("Contest ended"),
		}
	}
}

/// `HH:MM:SS`, whole seconds rounded down. Hours are not wrapped at 24.
pub fn format_time_diff(diff: Duration) -> String {
	let total = diff.as_secs();
	format!("{:02}:{:02}:{:02}", total / 3600, total % 3600 / 60, total % 60)
}

/// Renders the phase on every tick until the contest has ended.
///
/// Returns the number of ticks rendered.
pub async fn run_countdown<T>(ticker: &mut T, start: DateTime<Utc>, duration_minutes: u32, mut render: impl FnMut(ContestPhase)) -> usize
where
	T: Ticker + ?Sized,
{
	let mut ticks = 0;
	loop {
		let now = ticker.tick().await;
		let phase = ContestPhase::at(start, duration_minutes, now);
		render(phase);
		ticks += 1;
		if phase.is_ended() {
			return ticks;
		}
	}
}
