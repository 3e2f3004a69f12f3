//! Client side of the contest platform HTTP API.
//!
//! - [`ApiClient`]: REST calls (`/contests`, `/standings`, `/submissions`, auth)
//!   with the bearer token taken from an injected [`CredentialProvider`].
//! - [`model`]: wire types. Push payloads implement [`Snapshot`], a full
//!   replacement decoded from one event's `data` field.
//! - [`sse`] and [`EventStream`]: incremental `text/event-stream` decoding over
//!   a long-lived HTTP response.

mod auth;
mod client;
mod error;
pub mod model;
pub mod sse;
mod stream;
mod time;

pub use auth::{CredentialProvider, StaticToken, TokenStore};
pub use client::ApiClient;
pub use error::{AuthError, ChannelError, DecodeError, FetchError, TokenStoreError};
pub use model::{
	ContestId, ContestMeta, LoginResponse, ParticipantRow, Problem, ProblemResult, Role, Snapshot, StandingsSnapshot, Submission,
	SubmissionList, User, UserKey, Verdict,
};
pub use stream::EventStream;
pub use time::Timestamp;
