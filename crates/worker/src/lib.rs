//! Shared task primitives for the podium client.
//!
//! Everything here is transport-agnostic: spawning with a [`TaskClass`] tag,
//! generation-scoped cancellation used as a race guard, reconnect [`Backoff`],
//! and injectable time sources ([`Clock`], [`Ticker`]).

mod backoff;
mod class;
mod clock;
mod spawn;
mod token;

pub use backoff::Backoff;
pub use class::TaskClass;
pub use clock::{Clock, IntervalTicker, ManualClock, SystemClock, Ticker};
pub use spawn::spawn;
pub use token::{GenerationClock, GenerationToken};
