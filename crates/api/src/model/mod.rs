//! Wire types of the contest platform.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::DecodeError;

mod contest;
mod standings;
mod submission;
mod user;

pub use contest::{ContestId, ContestMeta, Problem};
pub use standings::{ParticipantRow, ProblemResult, StandingsSnapshot, UserKey, Verdict};
pub use submission::{Submission, SubmissionList};
pub use user::{LoginResponse, Role, User};
pub(crate) use user::LoginRequest;

/// Full, server-authoritative payload of one push feed.
///
/// A decoded value always replaces the previous one as a whole.
pub trait Snapshot: Clone + fmt::Debug + PartialEq + Send + Sync + 'static {
	/// Short name used in logs.
	const KIND: &'static str;

	/// Decodes one event payload.
	fn decode(payload: &str) -> Result<Self, DecodeError>;

	/// Number of entries, for logging.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Treats an explicit `null` like a missing field.
///
/// The server encodes empty collections as `null`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de> + Default,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
