//! Incremental `text/event-stream` decoding.
//!
//! Bytes arrive in arbitrary chunks; [`EventDecoder::feed`] returns every event
//! completed by the chunk, in order. Lines end with `\n`, `\r\n` or `\r`, and a
//! blank line dispatches the buffered event.

/// Event type used when the server does not name one.
pub const DEFAULT_EVENT: &str = "message";

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
	pub event: String,
	pub data: String,
	/// Last event id seen on the stream when this event was dispatched.
	pub id: Option<String>,
}

impl SseEvent {
	/// Whether this is an unnamed (`message`) event.
	pub fn is_message(&self) -> bool {
		self.event == DEFAULT_EVENT
	}
}

/// Stateful line-protocol decoder for one stream.
#[derive(Debug, Default)]
pub struct EventDecoder {
	line: Vec<u8>,
	skip_lf: bool,
	event: Option<String>,
	data: String,
	has_data: bool,
	last_id: Option<String>,
}

impl EventDecoder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Feeds one chunk and returns the events it completed.
	pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
		let mut out = Vec::new();
		for &byte in chunk {
			if self.skip_lf {
				self.skip_lf = false;
				if byte == b'\n' {
					continue;
				}
			}
			match byte {
				b'\n' => self.end_line(&mut out),
				b'\r' => {
					self.skip_lf = true;
					self.end_line(&mut out);
				}
				_ => self.line.push(byte),
			}
		}
		out
	}

	fn end_line(&mut self, out: &mut Vec<SseEvent>) {
		let line = std::mem::take(&mut self.line);
		if line.is_empty() {
			if let Some(event) = self.dispatch() {
				out.push(event);
			}
			return;
		}
		if line[0] == b':' {
			return;
		}
		let line = String::from_utf8_lossy(&line);
		let (field, value) = match line.split_once(':') {
			Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
			None => (&*line, ""),
		};
		match field {
			"event" => self.event = Some(value.to_owned()),
			"data" => {
				self.data.push_str(value);
				self.data.push('\n');
				self.has_data = true;
			}
			"id" if !value.contains('\0') => self.last_id = Some(value.to_owned()),
			_ => {}
		}
	}

	fn dispatch(&mut self) -> Option<SseEvent> {
		let event = self.event.take();
		if !self.has_data {
			self.data.clear();
			return None;
		}
		self.has_data = false;
		let mut data = std::mem::take(&mut self.data);
		if data.ends_with('\n') {
			data.pop();
		}
		Some(SseEvent {
			event: event.filter(|name| !name.is_empty()).unwrap_or_else(|| DEFAULT_EVENT.to_owned()),
			data,
			id: self.last_id.clone(),
		})
	}
}
