//! Keeps a local view of one contest feed consistent with the server.
//!
//! Two producers feed one [`Reconciler`]: a one-shot [`SnapshotFetcher`]
//! (baseline and error recovery) and a [`LiveChannel`] reading full snapshots
//! pushed over a long-lived stream. Every successful arrival replaces the
//! held snapshot as a whole; the last arrival wins regardless of source.
//!
//! Results are stamped with the activation and channel generation they were
//! requested under and are discarded at apply time once that generation is
//! retired, so a slow response for contest A never lands in the view of
//! contest B.
//!
//! [`LiveSync`] runs the reconciler on a single task and executes its
//! effects (fetches, channel opens/closes, reconnect timers).

mod channel;
mod driver;
mod http;
mod reconciler;
mod source;
mod view;

pub use channel::{ChannelEvent, ChannelInput, ChannelState, LiveChannel};
pub use driver::{LiveSync, SyncClosed, SyncOptions};
pub use http::{Feed, HttpTransport, StandingsFetcher, SubmissionsFetcher};
pub use reconciler::{ChannelTicket, Effect, FetchTicket, RaceDiscarded, Reconciler, ReconnectTicket};
pub use source::{Baseline, PushStream, PushTransport, SnapshotFetcher};
pub use view::{LiveStatus, ReconciledView, SyncError};
