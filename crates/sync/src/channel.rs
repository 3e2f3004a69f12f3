//! Live Update Channel: one push connection for one contest.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use podium_api::{ChannelError, ContestId, Snapshot};
use podium_worker::{GenerationToken, TaskClass};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::{ChannelTicket, PushTransport};

/// Connection lifecycle of one channel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
	/// Handshake in progress.
	Connecting,
	/// Stream established and delivering.
	Open,
	/// Torn down by the owner. Terminal.
	Closed,
	/// Transport failed. Terminal for this instance; reconnecting means a new instance.
	Failed,
}

/// Inputs driving [`ChannelState`] transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelInput {
	Handshake,
	Message,
	/// Connection drop or protocol error. Undecodable frames are not transport errors.
	TransportError,
	Teardown,
}

impl ChannelState {
	/// Next state after `input`.
	pub fn next(self, input: ChannelInput) -> Self {
		match (self, input) {
			(_, ChannelInput::Teardown) => Self::Closed,
			(Self::Closed, _) => Self::Closed,
			(Self::Failed, _) => Self::Failed,
			(Self::Connecting, ChannelInput::Handshake) => Self::Open,
			(Self::Connecting | Self::Open, ChannelInput::TransportError) => Self::Failed,
			(state, ChannelInput::Handshake | ChannelInput::Message) => state,
		}
	}

	pub fn is_terminal(self) -> bool {
		matches!(self, Self::Closed | Self::Failed)
	}
}

/// Notification from a running channel to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent<S> {
	/// Handshake succeeded.
	Opened,
	/// One decoded full snapshot, in server order.
	Snapshot(S),
	/// One frame was dropped. The stream stays open.
	DecodeFailed(String),
	/// The stream is gone; the instance is now [`ChannelState::Failed`].
	Failed(ChannelError),
}

type Sink<S> = Box<dyn FnMut(ChannelEvent<S>) + Send>;

/// Delivery gate shared by the reader task and [`LiveChannel::close`].
///
/// Events are emitted while holding the lock, so once `close` has taken it
/// and cleared the sink no further event can be delivered.
struct Gate<S> {
	sink: Mutex<Option<Sink<S>>>,
	state: watch::Sender<ChannelState>,
}

impl<S> Gate<S> {
	fn transition(&self, input: ChannelInput) -> ChannelState {
		let mut next = ChannelState::Closed;
		self.state.send_modify(|state| {
			*state = state.next(input);
			next = *state;
		});
		next
	}

	/// Applies `input` and delivers `event` atomically with respect to `close`.
	fn emit(&self, input: Option<ChannelInput>, event: ChannelEvent<S>) -> bool {
		let mut sink = self.sink.lock();
		let Some(deliver) = sink.as_mut() else {
			return false;
		};
		if let Some(input) = input {
			self.transition(input);
		}
		deliver(event);
		true
	}
}

/// Handle to one running channel instance.
///
/// Dropping the handle tears the channel down.
pub struct LiveChannel {
	ticket: ChannelTicket,
	token: GenerationToken,
	state: watch::Receiver<ChannelState>,
	close: Box<dyn Fn() + Send + Sync>,
	closed: AtomicBool,
	task: JoinHandle<()>,
}

impl std::fmt::Debug for LiveChannel {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LiveChannel")
			.field("ticket", &self.ticket)
			.field("state", &*self.state.borrow())
			.finish_non_exhaustive()
	}
}

impl LiveChannel {
	/// Starts connecting to `contest` and returns immediately.
	///
	/// `sink` receives every [`ChannelEvent`] in order until the channel fails
	/// or is closed.
	pub fn open<S, F>(transport: Arc<dyn PushTransport>, contest: ContestId, ticket: ChannelTicket, token: GenerationToken, sink: F) -> Self
	where
		S: Snapshot,
		F: FnMut(ChannelEvent<S>) + Send + 'static,
	{
		let (state_tx, state) = watch::channel(ChannelState::Connecting);
		let gate = Arc::new(Gate {
			sink: Mutex::new(Some(Box::new(sink) as Sink<S>)),
			state: state_tx,
		});

		let task = podium_worker::spawn(TaskClass::Background, run::<S>(transport, contest, ticket, Arc::clone(&gate), token.clone()));
		let close = {
			let gate = Arc::clone(&gate);
			Box::new(move || {
				let mut sink = gate.sink.lock();
				sink.take();
				gate.transition(ChannelInput::Teardown);
			}) as Box<dyn Fn() + Send + Sync>
		};

		tracing::debug!(contest = %contest, channel = ticket.channel, "sync.channel.open");
		Self {
			ticket,
			token,
			state,
			close,
			closed: AtomicBool::new(false),
			task,
		}
	}

	pub fn ticket(&self) -> ChannelTicket {
		self.ticket
	}

	pub fn state(&self) -> ChannelState {
		*self.state.borrow()
	}

	/// Tears the channel down.
	///
	/// Synchronous: no event reaches the sink after this returns. Idempotent.
	pub fn close(&self) {
		if self.closed.swap(true, Ordering::AcqRel) {
			return;
		}
		self.token.cancel();
		(self.close)();
		self.task.abort();
		tracing::debug!(channel = self.ticket.channel, "sync.channel.closed");
	}
}

impl Drop for LiveChannel {
	fn drop(&mut self) {
		self.close();
	}
}

async fn run<S: Snapshot>(transport: Arc<dyn PushTransport>, contest: ContestId, ticket: ChannelTicket, gate: Arc<Gate<S>>, token: GenerationToken) {
	let connected = tokio::select! {
		biased;
		_ = token.cancelled() => return,
		res = transport.connect(contest) => res,
	};
	let mut stream = match connected {
		Ok(stream) => stream,
		Err(err) => {
			tracing::debug!(contest = %contest, channel = ticket.channel, error = %err, "sync.channel.handshake_failed");
			gate.emit(Some(ChannelInput::TransportError), ChannelEvent::Failed(err));
			return;
		}
	};
	if !gate.emit(Some(ChannelInput::Handshake), ChannelEvent::Opened) {
		return;
	}

	loop {
		let frame = tokio::select! {
			biased;
			_ = token.cancelled() => return,
			frame = stream.next_frame() => frame,
		};
		let delivered = match frame {
			Some(Ok(payload)) => match S::decode(&payload) {
				Ok(snapshot) => {
					tracing::trace!(channel = ticket.channel, kind = S::KIND, entries = snapshot.len(), "sync.channel.frame");
					gate.emit(Some(ChannelInput::Message), ChannelEvent::Snapshot(snapshot))
				}
				Err(err) => {
					tracing::warn!(contest = %contest, channel = ticket.channel, kind = S::KIND, error = %err, "sync.channel.decode_failed");
					gate.emit(None, ChannelEvent::DecodeFailed(err.to_string()))
				}
			},
			Some(Err(err)) if !err.is_fatal() => {
				tracing::warn!(contest = %contest, channel = ticket.channel, error = %err, "sync.channel.decode_failed");
				gate.emit(None, ChannelEvent::DecodeFailed(err.to_string()))
			}
			Some(Err(err)) => {
				gate.emit(Some(ChannelInput::TransportError), ChannelEvent::Failed(err));
				return;
			}
			None => {
				let err = ChannelError::TransportDropped("stream ended by server".into());
				gate.emit(Some(ChannelInput::TransportError), ChannelEvent::Failed(err));
				return;
			}
		};
		if !delivered {
			return;
		}
	}
}

#[cfg(test)]
mod tests;
