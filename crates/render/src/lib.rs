//! Read-only projections of a [`ReconciledView`](podium_sync::ReconciledView)
//! into terminal text.
//!
//! Nothing here mutates a view; every function takes the published value
//! and returns plain strings or small display models.

mod countdown;
mod standings;
mod status;
mod submissions;
mod table;

pub use countdown::{ContestPhase, format_time_diff, run_countdown};
pub use standings::{Cell, StandingsLine, StandingsTable};
pub use status::status_line;
pub use submissions::{NO_SUBMISSIONS, SubmissionLine, render_submissions};
pub use table::{Align, TextTable};
