use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::ChannelError;
use crate::sse::{EventDecoder, SseEvent};

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, String>> + Send>>;

/// Server-sent events read from a long-lived response body.
pub struct EventStream {
	bytes: ByteStream,
	decoder: EventDecoder,
	pending: VecDeque<SseEvent>,
}

impl EventStream {
	/// Wraps any byte stream, e.g. an HTTP body.
	pub fn from_byte_stream<S, E>(stream: S) -> Self
	where
		S: Stream<Item = Result<Bytes, E>> + Send + 'static,
		E: fmt::Display,
	{
		Self {
			bytes: Box::pin(stream.map(|chunk| chunk.map_err(|err| err.to_string()))),
			decoder: EventDecoder::new(),
			pending: VecDeque::new(),
		}
	}

	pub(crate) fn from_response(response: reqwest::Response) -> Self {
		Self::from_byte_stream(response.bytes_stream())
	}

	/// Next dispatched event.
	///
	/// `None` means the server ended the stream cleanly; a read failure yields
	/// [`ChannelError::TransportDropped`]. Either way the stream is finished.
	pub async fn next_event(&mut self) -> Option<Result<SseEvent, ChannelError>> {
		loop {
			if let Some(event) = self.pending.pop_front() {
				return Some(Ok(event));
			}
			match self.bytes.next().await? {
				Ok(chunk) => self.pending.extend(self.decoder.feed(&chunk)),
				Err(err) => return Some(Err(ChannelError::TransportDropped(err))),
			}
		}
	}
}

impl fmt::Debug for EventStream {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventStream")
			.field("pending", &self.pending.len())
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn chunks(parts: Vec<Result<&'static str, &'static str>>) -> EventStream {
		EventStream::from_byte_stream(futures::stream::iter(
			parts.into_iter().map(|part| part.map(|text| Bytes::from_static(text.as_bytes()))),
		))
	}

	#[tokio::test]
	async fn yields_events_then_end() {
		let mut stream = chunks(vec![Ok("data: 1\n\ndata: "), Ok("2\n\n")]);
		assert_eq!(stream.next_event().await.unwrap().unwrap().data, "1");
		assert_eq!(stream.next_event().await.unwrap().unwrap().data, "2");
		assert!(stream.next_event().await.is_none());
	}

	#[tokio::test]
	async fn read_error_is_transport_drop() {
		let mut stream = chunks(vec![Ok("data: 1\n\n"), Err("reset by peer")]);
		assert!(stream.next_event().await.unwrap().is_ok());
		assert_eq!(
			stream.next_event().await.unwrap(),
			Err(ChannelError::TransportDropped("reset by peer".into()))
		);
	}
}
