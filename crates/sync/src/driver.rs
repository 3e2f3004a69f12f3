use std::sync::Arc;

use podium_api::{ContestId, FetchError, Snapshot};
use podium_worker::{Backoff, Clock, GenerationToken, SystemClock, TaskClass};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::{Baseline, ChannelEvent, ChannelTicket, Effect, FetchTicket, LiveChannel, PushTransport, ReconciledView, Reconciler, ReconnectTicket, SnapshotFetcher};

/// Tuning for a [`LiveSync`] instance.
#[derive(Clone)]
pub struct SyncOptions {
	pub backoff: Backoff,
	/// Source of `last_updated_at` stamps.
	pub clock: Arc<dyn Clock>,
	/// Fixed seed for reconnect jitter. `None` seeds from the OS.
	pub seed: Option<u64>,
}

impl Default for SyncOptions {
	fn default() -> Self {
		Self {
			backoff: Backoff::default(),
			clock: Arc::new(SystemClock),
			seed: None,
		}
	}
}

impl std::fmt::Debug for SyncOptions {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SyncOptions")
			.field("backoff", &self.backoff)
			.field("seed", &self.seed)
			.finish_non_exhaustive()
	}
}

/// The driver task is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("live sync driver has stopped")]
pub struct SyncClosed;

enum Command {
	Activate(ContestId, oneshot::Sender<()>),
	Deactivate(oneshot::Sender<()>),
}

enum Input<S> {
	Fetched(FetchTicket, Result<Baseline<S>, FetchError>),
	Channel(ChannelTicket, ChannelEvent<S>),
	ReconnectDue(ReconnectTicket),
}

/// Handle to a running reconciler for one feed.
///
/// All state changes happen on one driver task; this handle only sends
/// commands and reads the published view. Dropping it stops the driver and
/// tears down any open channel.
pub struct LiveSync<S> {
	commands: mpsc::UnboundedSender<Command>,
	view: watch::Receiver<Arc<ReconciledView<S>>>,
	task: JoinHandle<()>,
}

impl<S> std::fmt::Debug for LiveSync<S> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LiveSync").field("running", &!self.task.is_finished()).finish_non_exhaustive()
	}
}

impl<S: Snapshot> LiveSync<S> {
	/// Starts the driver task. Nothing is fetched until [`Self::activate`].
	pub fn spawn(fetcher: Arc<dyn SnapshotFetcher<S>>, transport: Arc<dyn PushTransport>, options: SyncOptions) -> Self {
		let rng = match options.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		let reconciler = Reconciler::new(options.backoff, options.clock, rng);
		let view = reconciler.subscribe();
		let (commands, command_rx) = mpsc::unbounded_channel();
		let (inputs, input_rx) = mpsc::unbounded_channel();

		let driver = Driver {
			reconciler,
			fetcher,
			transport,
			inputs,
			session: None,
			channel: None,
		};
		let task = podium_worker::spawn(TaskClass::Interactive, driver.run(command_rx, input_rx));
		Self { commands, view, task }
	}

	/// Switches to `contest`. Resolves once the previous contest is torn down
	/// and the new activation is visible in the view.
	pub async fn activate(&self, contest: ContestId) -> Result<(), SyncClosed> {
		let (ack, done) = oneshot::channel();
		self.commands.send(Command::Activate(contest, ack)).map_err(|_| SyncClosed)?;
		done.await.map_err(|_| SyncClosed)
	}

	/// Leaves the active contest. Resolves once its channel is closed; no
	/// message from it is reflected in the view afterwards.
	pub async fn deactivate(&self) -> Result<(), SyncClosed> {
		let (ack, done) = oneshot::channel();
		self.commands.send(Command::Deactivate(ack)).map_err(|_| SyncClosed)?;
		done.await.map_err(|_| SyncClosed)
	}

	/// Current view.
	pub fn view(&self) -> Arc<ReconciledView<S>> {
		Arc::clone(&self.view.borrow())
	}

	/// Subscribes to view replacements.
	pub fn subscribe(&self) -> watch::Receiver<Arc<ReconciledView<S>>> {
		self.view.clone()
	}

	/// Stops the driver and waits for it to release its channel.
	pub async fn shutdown(self) {
		let Self { commands, task, .. } = self;
		drop(commands);
		if let Err(err) = task.await
			&& err.is_panic()
		{
			tracing::error!(error = %err, "sync.driver.panicked");
		}
	}
}

struct Driver<S: Snapshot> {
	reconciler: Reconciler<S>,
	fetcher: Arc<dyn SnapshotFetcher<S>>,
	transport: Arc<dyn PushTransport>,
	inputs: mpsc::UnboundedSender<Input<S>>,
	/// Cancellation scope of the active session.
	session: Option<GenerationToken>,
	channel: Option<LiveChannel>,
}

impl<S: Snapshot> Driver<S> {
	async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>, mut inputs: mpsc::UnboundedReceiver<Input<S>>) {
		tracing::debug!(kind = S::KIND, "sync.driver.start");
		loop {
			tokio::select! {
				biased;
				command = commands.recv() => match command {
					Some(Command::Activate(contest, ack)) => {
						let effects = self.reconciler.activate(contest);
						self.execute(effects);
						let _ = ack.send(());
					}
					Some(Command::Deactivate(ack)) => {
						let effects = self.reconciler.deactivate();
						self.execute(effects);
						let _ = ack.send(());
					}
					None => break,
				},
				Some(input) = inputs.recv() => self.apply(input),
			}
		}
		let effects = self.reconciler.deactivate();
		self.execute(effects);
		tracing::debug!(kind = S::KIND, "sync.driver.stop");
	}

	fn apply(&mut self, input: Input<S>) {
		let effects = match input {
			Input::Fetched(ticket, result) => self.reconciler.apply_fetch(ticket, result).map(|()| Vec::new()),
			Input::Channel(ticket, event) => self.reconciler.apply_channel(ticket, event),
			Input::ReconnectDue(ticket) => self.reconciler.reconnect_due(ticket),
		};
		if let Ok(effects) = effects {
			self.execute(effects);
		}
	}

	fn execute(&mut self, effects: Vec<Effect>) {
		for effect in effects {
			match effect {
				Effect::CloseChannel { ticket } => {
					if let Some(channel) = self.channel.take_if(|channel| channel.ticket() == ticket) {
						channel.close();
					}
				}
				Effect::EndSession { session } => {
					if let Some(token) = self.session.take_if(|token| token.generation() == session) {
						token.cancel();
					}
				}
				Effect::BeginSession { session } => {
					if let Some(stale) = self.session.replace(GenerationToken::root(session)) {
						stale.cancel();
					}
				}
				Effect::Fetch { contest, ticket } => self.fetch(contest, ticket),
				Effect::OpenChannel { contest, ticket } => self.open_channel(contest, ticket),
				Effect::ScheduleReconnect { ticket, delay } => {
					let Some(token) = self.session.as_ref().map(GenerationToken::child) else {
						continue;
					};
					let inputs = self.inputs.clone();
					podium_worker::spawn(TaskClass::Background, async move {
						tokio::select! {
							_ = token.cancelled() => {}
							_ = tokio::time::sleep(delay) => {
								let _ = inputs.send(Input::ReconnectDue(ticket));
							}
						}
					});
				}
			}
		}
	}

	fn fetch(&self, contest: ContestId, ticket: FetchTicket) {
		let Some(token) = self.session.as_ref().map(GenerationToken::child) else {
			return;
		};
		let fetcher = Arc::clone(&self.fetcher);
		let inputs = self.inputs.clone();
		podium_worker::spawn(TaskClass::Interactive, async move {
			let result = tokio::select! {
				_ = token.cancelled() => return,
				result = fetcher.fetch(contest) => result,
			};
			let _ = inputs.send(Input::Fetched(ticket, result));
		});
	}

	fn open_channel(&mut self, contest: ContestId, ticket: ChannelTicket) {
		let Some(token) = self.session.as_ref().map(|session| session.child_with(ticket.channel)) else {
			return;
		};
		if let Some(previous) = self.channel.take() {
			previous.close();
		}
		let inputs = self.inputs.clone();
		let channel = LiveChannel::open::<S, _>(Arc::clone(&self.transport), contest, ticket, token, move |event| {
			let _ = inputs.send(Input::Channel(ticket, event));
		});
		self.channel = Some(channel);
	}
}
