//! Standings Reconciler: the single writer of a [`ReconciledView`].
//!
//! The reconciler is a plain state machine. Callers feed it fetch results,
//! channel events and reconnect timers; it updates the published view and
//! returns the [`Effect`]s the caller must execute. It performs no I/O.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use podium_api::{ContestId, FetchError, Snapshot};
use podium_worker::{Backoff, Clock, GenerationClock};
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::watch;

use crate::{Baseline, ChannelEvent, ChannelState, LiveStatus, ReconciledView, SyncError};

/// A channel open at least this long counts as healthy when it drops.
const STABLE_CONNECTION: Duration = Duration::from_secs(30);

/// Stamp carried by a fetch issued for activation `session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
	pub session: u64,
}

/// Stamp carried by every event of one channel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelTicket {
	pub session: u64,
	pub channel: u64,
}

/// Stamp carried by a scheduled reconnect timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReconnectTicket {
	pub session: u64,
	/// 1-based reconnect attempt this timer starts.
	pub attempt: u32,
}

/// A result arrived for a generation that is no longer current.
///
/// Internal: the result was dropped without touching the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("result for a retired generation discarded")]
pub struct RaceDiscarded;

/// Work the owner of a [`Reconciler`] must perform, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
	/// Tear down the channel instance with this ticket before anything else.
	CloseChannel { ticket: ChannelTicket },
	/// Cancel everything scoped to `session` (pending timers, fetches).
	EndSession { session: u64 },
	/// Start a cancellation scope for `session`.
	BeginSession { session: u64 },
	/// Run one baseline fetch and report it through [`Reconciler::apply_fetch`].
	Fetch { contest: ContestId, ticket: FetchTicket },
	/// Open a new channel instance and report its events through
	/// [`Reconciler::apply_channel`].
	OpenChannel { contest: ContestId, ticket: ChannelTicket },
	/// Call [`Reconciler::reconnect_due`] after `delay`.
	ScheduleReconnect { ticket: ReconnectTicket, delay: Duration },
}

#[derive(Debug)]
struct Session {
	id: u64,
	contest: ContestId,
	/// Generation of the current channel instance, if one is connecting or open.
	channel: Option<u64>,
	/// Reconnects since the channel last proved healthy.
	attempts: u32,
	/// Attempt number of the armed reconnect timer.
	pending_reconnect: Option<u32>,
	/// When the current channel instance completed its handshake.
	opened_at: Option<DateTime<Utc>>,
	/// Held data may be behind the server; refetch once a channel opens.
	refetch: bool,
}

/// Merges fetch results and pushed snapshots into one published view.
pub struct Reconciler<S> {
	generations: GenerationClock,
	backoff: Backoff,
	clock: Arc<dyn Clock>,
	rng: StdRng,
	session: Option<Session>,
	view: watch::Sender<Arc<ReconciledView<S>>>,
}

impl<S> std::fmt::Debug for Reconciler<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Reconciler")
			.field("backoff", &self.backoff)
			.field("session", &self.session)
			.finish_non_exhaustive()
	}
}

impl<S: Snapshot> Reconciler<S> {
	pub fn new(backoff: Backoff, clock: Arc<dyn Clock>, rng: StdRng) -> Self {
		let (view, _) = watch::channel(Arc::new(ReconciledView::idle()));
		Self {
			generations: GenerationClock::new(),
			backoff,
			clock,
			rng,
			session: None,
			view,
		}
	}

	/// Current view.
	pub fn view(&self) -> Arc<ReconciledView<S>> {
		Arc::clone(&self.view.borrow())
	}

	/// Subscribes to view replacements.
	pub fn subscribe(&self) -> watch::Receiver<Arc<ReconciledView<S>>> {
		self.view.subscribe()
	}

	/// Active contest, if any.
	pub fn contest(&self) -> Option<ContestId> {
		self.session.as_ref().map(|session| session.contest)
	}

	/// Makes `contest` the active contest.
	///
	/// Retires the previous activation, if any, and starts a fetch and a
	/// channel concurrently. Re-activating the active contest starts over.
	pub fn activate(&mut self, contest: ContestId) -> Vec<Effect> {
		let mut effects = self.retire();

		let id = self.generations.next();
		let channel = self.generations.next();
		self.session = Some(Session {
			id,
			contest,
			channel: Some(channel),
			attempts: 0,
			pending_reconnect: None,
			opened_at: None,
			refetch: false,
		});
		self.view.send_replace(Arc::new(ReconciledView::activating(contest)));
		tracing::info!(contest = %contest, session = id, kind = S::KIND, "sync.activate");

		effects.extend([
			Effect::BeginSession { session: id },
			Effect::Fetch {
				contest,
				ticket: FetchTicket { session: id },
			},
			Effect::OpenChannel {
				contest,
				ticket: ChannelTicket { session: id, channel },
			},
		]);
		effects
	}

	/// Retires the active contest. The view returns to idle.
	pub fn deactivate(&mut self) -> Vec<Effect> {
		let effects = self.retire();
		if !effects.is_empty() {
			self.view.send_replace(Arc::new(ReconciledView::idle()));
		}
		effects
	}

	fn retire(&mut self) -> Vec<Effect> {
		let Some(old) = self.session.take() else {
			return Vec::new();
		};
		tracing::info!(contest = %old.contest, session = old.id, kind = S::KIND, "sync.deactivate");
		let mut effects = Vec::with_capacity(2);
		if let Some(channel) = old.channel {
			effects.push(Effect::CloseChannel {
				ticket: ChannelTicket { session: old.id, channel },
			});
		}
		effects.push(Effect::EndSession { session: old.id });
		effects
	}

	/// Folds one fetch result into the view.
	///
	/// Success replaces the snapshot unconditionally. Failure only records
	/// the error; held data is kept and the next channel open refetches.
	pub fn apply_fetch(&mut self, ticket: FetchTicket, result: Result<Baseline<S>, FetchError>) -> Result<(), RaceDiscarded> {
		let session = self.session.as_mut().filter(|session| session.id == ticket.session);
		let Some(session) = session else {
			tracing::debug!(session = ticket.session, kind = S::KIND, "sync.race_discarded");
			return Err(RaceDiscarded);
		};
		let contest = session.contest;
		if result.is_err() {
			session.refetch = true;
		}
		let now = self.clock.now();

		match result {
			Ok(baseline) => {
				tracing::debug!(contest = %contest, entries = baseline.snapshot.len(), "sync.fetch.applied");
				self.publish(|view| {
					if baseline.meta.is_some() {
						view.meta = baseline.meta;
					}
					view.snapshot = Some(baseline.snapshot);
					view.last_updated_at = Some(now);
					view.loading = false;
					if matches!(view.last_error, Some(SyncError::Fetch(_))) {
						view.last_error = None;
					}
				});
			}
			Err(err) => {
				tracing::warn!(contest = %contest, error = %err, "sync.fetch.failed");
				self.publish(|view| {
					view.loading = false;
					view.last_error = Some(SyncError::Fetch(err));
				});
			}
		}
		Ok(())
	}

	/// Folds one event from the channel instance stamped `ticket`.
	pub fn apply_channel(&mut self, ticket: ChannelTicket, event: ChannelEvent<S>) -> Result<Vec<Effect>, RaceDiscarded> {
		let session = self
			.session
			.as_mut()
			.filter(|session| session.id == ticket.session && session.channel == Some(ticket.channel));
		let Some(session) = session else {
			tracing::debug!(session = ticket.session, channel = ticket.channel, kind = S::KIND, "sync.race_discarded");
			return Err(RaceDiscarded);
		};
		let contest = session.contest;

		match event {
			ChannelEvent::Opened => {
				session.opened_at = Some(self.clock.now());
				let refetch = std::mem::take(&mut session.refetch);
				tracing::debug!(contest = %contest, channel = ticket.channel, state = ?ChannelState::Open, "sync.channel.state");
				self.publish(|view| {
					view.channel_state = ChannelState::Open;
					view.live = LiveStatus::Active;
					if matches!(view.last_error, Some(SyncError::Channel(_) | SyncError::LiveUnavailable { .. })) {
						view.last_error = None;
					}
				});
				if !refetch {
					return Ok(Vec::new());
				}
				// The server pushes on change only, never on subscribe.
				tracing::info!(contest = %contest, session = ticket.session, "sync.fetch.recover");
				Ok(vec![Effect::Fetch {
					contest,
					ticket: FetchTicket { session: ticket.session },
				}])
			}
			ChannelEvent::Snapshot(snapshot) => {
				session.attempts = 0;
				let now = self.clock.now();
				tracing::trace!(contest = %contest, entries = snapshot.len(), "sync.push.applied");
				self.publish(|view| {
					view.snapshot = Some(snapshot);
					view.last_updated_at = Some(now);
					view.loading = false;
				});
				Ok(Vec::new())
			}
			ChannelEvent::DecodeFailed(reason) => {
				tracing::warn!(contest = %contest, channel = ticket.channel, reason = %reason, "sync.push.dropped");
				Ok(Vec::new())
			}
			ChannelEvent::Failed(err) => {
				session.channel = None;
				session.refetch = true;
				let now = self.clock.now();
				if let Some(opened_at) = session.opened_at.take()
					&& (now - opened_at).to_std().is_ok_and(|open_for| open_for >= STABLE_CONNECTION)
				{
					session.attempts = 0;
				}
				let delay = self.backoff.delay(session.attempts, &mut self.rng);
				let attempts = session.attempts;
				tracing::info!(contest = %contest, channel = ticket.channel, error = %err, state = ?ChannelState::Failed, "sync.channel.state");

				let mut effects = vec![Effect::CloseChannel { ticket }];
				let live = match delay {
					Some(delay) => {
						let attempt = attempts + 1;
						session.attempts = attempt;
						session.pending_reconnect = Some(attempt);
						tracing::info!(contest = %contest, attempt, delay_ms = delay.as_millis() as u64, "sync.reconnect.scheduled");
						effects.push(Effect::ScheduleReconnect {
							ticket: ReconnectTicket { session: ticket.session, attempt },
							delay,
						});
						LiveStatus::Reconnecting { attempt }
					}
					None => {
						tracing::warn!(contest = %contest, attempts, "sync.reconnect.exhausted");
						LiveStatus::Unavailable
					}
				};
				self.publish(|view| {
					view.channel_state = ChannelState::Failed;
					view.live = live;
					// An unrecovered fetch failure outranks channel trouble.
					if !matches!(view.last_error, Some(SyncError::Fetch(_))) {
						view.last_error = Some(match live {
							LiveStatus::Unavailable => SyncError::LiveUnavailable { attempts },
							_ => SyncError::Channel(err),
						});
					}
				});
				Ok(effects)
			}
		}
	}

	/// Fires an armed reconnect timer: opens a fresh channel instance.
	pub fn reconnect_due(&mut self, ticket: ReconnectTicket) -> Result<Vec<Effect>, RaceDiscarded> {
		let session = self
			.session
			.as_mut()
			.filter(|session| session.id == ticket.session && session.pending_reconnect == Some(ticket.attempt) && session.channel.is_none());
		let Some(session) = session else {
			tracing::debug!(session = ticket.session, attempt = ticket.attempt, kind = S::KIND, "sync.race_discarded");
			return Err(RaceDiscarded);
		};

		let channel = self.generations.next();
		session.pending_reconnect = None;
		session.channel = Some(channel);
		let contest = session.contest;
		tracing::debug!(contest = %contest, channel, attempt = ticket.attempt, state = ?ChannelState::Connecting, "sync.channel.state");
		self.publish(|view| view.channel_state = ChannelState::Connecting);

		Ok(vec![Effect::OpenChannel {
			contest,
			ticket: ChannelTicket {
				session: ticket.session,
				channel,
			},
		}])
	}

	/// Replaces the published view with an edited copy.
	fn publish(&self, edit: impl FnOnce(&mut ReconciledView<S>)) {
		let mut next = ReconciledView::clone(&self.view.borrow());
		edit(&mut next);
		self.view.send_replace(Arc::new(next));
	}
}
