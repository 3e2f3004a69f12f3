use std::time::Duration;

use async_trait::async_trait;
use podium_api::StandingsSnapshot;
use tokio::sync::mpsc;

use super::*;
use crate::PushStream;

type Frames = mpsc::UnboundedSender<Result<String, ChannelError>>;

struct FakeStream {
	frames: mpsc::UnboundedReceiver<Result<String, ChannelError>>,
}

#[async_trait]
impl PushStream for FakeStream {
	async fn next_frame(&mut self) -> Option<Result<String, ChannelError>> {
		self.frames.recv().await
	}
}

struct FakeTransport {
	next: Mutex<Option<Result<FakeStream, ChannelError>>>,
}

impl FakeTransport {
	fn accepting() -> (Arc<Self>, Frames) {
		let (tx, frames) = mpsc::unbounded_channel();
		let transport = Arc::new(Self {
			next: Mutex::new(Some(Ok(FakeStream { frames }))),
		});
		(transport, tx)
	}

	fn refusing(err: ChannelError) -> Arc<Self> {
		Arc::new(Self {
			next: Mutex::new(Some(Err(err))),
		})
	}
}

#[async_trait]
impl PushTransport for FakeTransport {
	async fn connect(&self, _contest: ContestId) -> Result<Box<dyn PushStream>, ChannelError> {
		match self.next.lock().take() {
			Some(Ok(stream)) => Ok(Box::new(stream)),
			Some(Err(err)) => Err(err),
			None => Err(ChannelError::HandshakeFailed("no more connections".into())),
		}
	}
}

fn ticket() -> ChannelTicket {
	ChannelTicket { session: 1, channel: 2 }
}

fn open(transport: Arc<FakeTransport>) -> (LiveChannel, mpsc::UnboundedReceiver<ChannelEvent<StandingsSnapshot>>) {
	let (tx, rx) = mpsc::unbounded_channel();
	let channel = LiveChannel::open::<StandingsSnapshot, _>(transport, ContestId(7), ticket(), GenerationToken::root(2), move |event| {
		let _ = tx.send(event);
	});
	(channel, rx)
}

async fn next<S>(rx: &mut mpsc::UnboundedReceiver<ChannelEvent<S>>) -> ChannelEvent<S> {
	tokio::time::timeout(Duration::from_secs(5), rx.recv())
		.await
		.expect("channel event")
		.expect("sink alive")
}

fn row_json(user: u32) -> String {
	format!(r#"[{{"user_id":{user},"rank":1,"solved":1,"penalty":0,"problems":[]}}]"#)
}

#[test]
fn transitions() {
	use ChannelInput::*;
	use ChannelState::*;

	assert_eq!(Connecting.next(Handshake), Open);
	assert_eq!(Open.next(Message), Open);
	assert_eq!(Open.next(Handshake), Open);
	assert_eq!(Connecting.next(TransportError), Failed);
	assert_eq!(Open.next(TransportError), Failed);
	for state in [Connecting, Open, Failed, Closed] {
		assert_eq!(state.next(Teardown), Closed);
	}
	assert_eq!(Failed.next(Handshake), Failed);
	assert_eq!(Failed.next(Message), Failed);
	assert_eq!(Closed.next(Handshake), Closed);
	assert_eq!(Closed.next(TransportError), Closed);
	assert!(Failed.is_terminal() && Closed.is_terminal());
	assert!(!Open.is_terminal());
}

#[tokio::test]
async fn delivers_snapshots_in_order_and_survives_bad_frames() {
	let (transport, frames) = FakeTransport::accepting();
	let (channel, mut rx) = open(transport);

	assert_eq!(next(&mut rx).await, ChannelEvent::Opened);
	assert_eq!(channel.state(), ChannelState::Open);

	frames.send(Ok(row_json(1))).unwrap();
	frames.send(Ok("{garbage".into())).unwrap();
	frames.send(Ok(row_json(2))).unwrap();

	let ChannelEvent::Snapshot(first) = next(&mut rx).await else {
		panic!("expected snapshot");
	};
	assert_eq!(first.rows[0].user.0, "1");
	assert!(matches!(next(&mut rx).await, ChannelEvent::DecodeFailed(_)));
	assert_eq!(channel.state(), ChannelState::Open);
	let ChannelEvent::Snapshot(second) = next(&mut rx).await else {
		panic!("expected snapshot");
	};
	assert_eq!(second.rows[0].user.0, "2");
	assert_eq!(channel.state(), ChannelState::Open);
}

#[tokio::test]
async fn server_closing_the_stream_fails_the_channel() {
	let (transport, frames) = FakeTransport::accepting();
	let (channel, mut rx) = open(transport);
	assert_eq!(next(&mut rx).await, ChannelEvent::Opened);

	drop(frames);
	assert!(matches!(next(&mut rx).await, ChannelEvent::Failed(ChannelError::TransportDropped(_))));
	assert_eq!(channel.state(), ChannelState::Failed);
}

#[tokio::test]
async fn transport_error_fails_the_channel() {
	let (transport, frames) = FakeTransport::accepting();
	let (channel, mut rx) = open(transport);
	assert_eq!(next(&mut rx).await, ChannelEvent::Opened);

	frames.send(Err(ChannelError::TransportDropped("reset".into()))).unwrap();
	assert_eq!(next(&mut rx).await, ChannelEvent::Failed(ChannelError::TransportDropped("reset".into())));
	assert_eq!(channel.state(), ChannelState::Failed);
}

#[tokio::test]
async fn handshake_failure_fails_from_connecting() {
	let transport = FakeTransport::refusing(ChannelError::HandshakeFailed("401".into()));
	let (channel, mut rx) = open(transport);
	assert_eq!(next(&mut rx).await, ChannelEvent::Failed(ChannelError::HandshakeFailed("401".into())));
	assert_eq!(channel.state(), ChannelState::Failed);
}

#[tokio::test]
async fn nothing_is_delivered_after_close() {
	let (transport, frames) = FakeTransport::accepting();
	let (channel, mut rx) = open(transport);
	assert_eq!(next(&mut rx).await, ChannelEvent::Opened);

	channel.close();
	assert_eq!(channel.state(), ChannelState::Closed);

	let _ = frames.send(Ok(row_json(3)));
	tokio::task::yield_now().await;
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(rx.try_recv().is_err());

	channel.close();
	assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn close_while_connecting_reports_closed() {
	let (transport, _frames) = FakeTransport::accepting();
	let (channel, mut rx) = open(transport);
	channel.close();
	assert_eq!(channel.state(), ChannelState::Closed);
	tokio::time::sleep(Duration::from_millis(20)).await;
	assert!(rx.try_recv().is_err());
}
