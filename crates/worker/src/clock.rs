use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::time::{Interval, MissedTickBehavior};

/// Wall-clock source.
pub trait Clock: Send + Sync + 'static {
	fn now(&self) -> DateTime<Utc>;
}

/// Real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> DateTime<Utc> {
		Utc::now()
	}
}

/// Manually advanced clock for deterministic tests and replays.
#[derive(Debug, Clone)]
pub struct ManualClock {
	now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
	pub fn new(start: DateTime<Utc>) -> Self {
		Self {
			now: Arc::new(Mutex::new(start)),
		}
	}

	/// Moves the clock forward.
	pub fn advance(&self, by: Duration) {
		let delta = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::MAX);
		let mut now = self.now.lock();
		*now = now.checked_add_signed(delta).unwrap_or(*now);
	}

	pub fn set(&self, to: DateTime<Utc>) {
		*self.now.lock() = to;
	}
}

impl Clock for ManualClock {
	fn now(&self) -> DateTime<Utc> {
		*self.now.lock()
	}
}

/// Repeating scheduled-callback capability.
///
/// Each call waits for the next tick and returns the wall time it fired at.
#[async_trait]
pub trait Ticker: Send {
	async fn tick(&mut self) -> DateTime<Utc>;
}

/// [`Ticker`] driven by a Tokio interval.
pub struct IntervalTicker {
	interval: Interval,
	clock: Arc<dyn Clock>,
}

impl IntervalTicker {
	/// Creates a ticker firing immediately, then every `period`.
	pub fn new(period: Duration, clock: Arc<dyn Clock>) -> Self {
		let mut interval = tokio::time::interval(period);
		interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
		Self { interval, clock }
	}
}

impl std::fmt::Debug for IntervalTicker {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("IntervalTicker")
			.field("period", &self.interval.period())
			.finish_non_exhaustive()
	}
}

#[async_trait]
impl Ticker for IntervalTicker {
	async fn tick(&mut self) -> DateTime<Utc> {
		self.interval.tick().await;
		self.clock.now()
	}
}
