//! Full-screen frames for the live views.

use std::future::Future;
use std::io::{self, Write};
use std::sync::Arc;

use crossterm::cursor::{MoveTo, MoveToColumn};
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use podium_api::{ContestId, Snapshot};
use podium_render::status_line;
use podium_sync::ReconciledView;
use tokio::sync::watch;

const UPDATED_FORMAT: &str = "%H:%M:%S";

/// Header, status and body of one view.
///
/// The body is only rendered once a snapshot is held; the status line
/// covers loading and failures without blanking earlier data.
pub fn frame<S: Snapshot>(contest: ContestId, view: &ReconciledView<S>, body: impl Fn(&S) -> String) -> String {
	let title = view
		.meta
		.as_ref()
		.map(|meta| meta.display_name())
		.unwrap_or_else(|| format!("Contest {contest}"));
	let mut out = format!("{title}  [{}]", status_line(view));
	if let Some(at) = view.last_updated_at {
		out.push_str(&format!("  updated {}", at.format(UPDATED_FORMAT)));
	}
	out.push_str("\n\n");
	if let Some(snapshot) = &view.snapshot {
		out.push_str(&body(snapshot));
	}
	out
}

/// Clears the terminal and writes `text` from the top-left corner.
pub fn redraw(text: &str) -> io::Result<()> {
	let mut stdout = io::stdout().lock();
	execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
	stdout.write_all(text.as_bytes())?;
	stdout.flush()
}

/// Draws the current view, then again on every replacement, until
/// `interrupt` resolves or the publisher goes away.
///
/// `interrupt` is polled across iterations, so a signal raised while a
/// frame is being drawn still ends the loop. Returns the number of frames.
pub async fn redraw_until<S, F>(
	views: &mut watch::Receiver<Arc<ReconciledView<S>>>,
	interrupt: F,
	mut draw: impl FnMut(&ReconciledView<S>) -> io::Result<()>,
) -> io::Result<usize>
where
	F: Future,
{
	tokio::pin!(interrupt);
	let mut frames = 0;
	loop {
		let view = Arc::clone(&views.borrow_and_update());
		draw(&view)?;
		frames += 1;
		tokio::select! {
			biased;
			_ = &mut interrupt => break,
			changed = views.changed() => if changed.is_err() { break },
		}
	}
	Ok(frames)
}

/// Replaces the current terminal line with `text`.
pub fn overwrite_line(text: &str) -> io::Result<()> {
	let mut stdout = io::stdout().lock();
	execute!(stdout, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
	stdout.write_all(text.as_bytes())?;
	stdout.flush()
}
