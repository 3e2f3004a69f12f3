//! [`SnapshotFetcher`] and [`PushTransport`] over the platform HTTP API.

use async_trait::async_trait;
use podium_api::{ApiClient, ChannelError, ContestId, EventStream, FetchError, StandingsSnapshot, SubmissionList};

use crate::{Baseline, PushStream, PushTransport, SnapshotFetcher};

/// Which live view a fetcher/transport pair serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
	/// Contest standings table.
	Standings,
	/// Every submission in the contest.
	ContestSubmissions,
	/// The caller's own submissions in the contest.
	MyContestSubmissions,
}

impl Feed {
	/// Push endpoint path, relative to the API base.
	pub fn stream_path(self, contest: ContestId) -> String {
		match self {
			Self::Standings => format!("contests/standings/sse/{contest}"),
			Self::ContestSubmissions => format!("contests/{contest}/sse"),
			Self::MyContestSubmissions => format!("contests/{contest}/sse/my"),
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Standings => "standings",
			Self::ContestSubmissions => "submissions",
			Self::MyContestSubmissions => "my-submissions",
		}
	}
}

/// Baseline for [`Feed::Standings`]: the table and contest metadata,
/// requested concurrently.
#[derive(Debug, Clone)]
pub struct StandingsFetcher {
	api: ApiClient,
}

impl StandingsFetcher {
	pub fn new(api: ApiClient) -> Self {
		Self { api }
	}
}

#[async_trait]
impl SnapshotFetcher<StandingsSnapshot> for StandingsFetcher {
	async fn fetch(&self, contest: ContestId) -> Result<Baseline<StandingsSnapshot>, FetchError> {
		let (meta, snapshot) = tokio::try_join!(self.api.contest(contest), self.api.standings(contest))?;
		Ok(Baseline {
			meta: Some(meta),
			snapshot,
		})
	}
}

/// Baseline for the submission feeds.
#[derive(Debug, Clone)]
pub struct SubmissionsFetcher {
	api: ApiClient,
	mine: bool,
}

impl SubmissionsFetcher {
	/// `mine` restricts the list to the authenticated user.
	pub fn new(api: ApiClient, mine: bool) -> Self {
		Self { api, mine }
	}
}

#[async_trait]
impl SnapshotFetcher<SubmissionList> for SubmissionsFetcher {
	async fn fetch(&self, contest: ContestId) -> Result<Baseline<SubmissionList>, FetchError> {
		let snapshot = if self.mine {
			self.api.my_contest_submissions(contest).await?
		} else {
			self.api.contest_submissions(contest).await?
		};
		Ok(Baseline { meta: None, snapshot })
	}
}

/// Opens `text/event-stream` connections for one [`Feed`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
	api: ApiClient,
	feed: Feed,
}

impl HttpTransport {
	pub fn new(api: ApiClient, feed: Feed) -> Self {
		Self { api, feed }
	}
}

#[async_trait]
impl PushTransport for HttpTransport {
	async fn connect(&self, contest: ContestId) -> Result<Box<dyn PushStream>, ChannelError> {
		let stream = self.api.open_stream(&self.feed.stream_path(contest)).await?;
		tracing::debug!(contest = %contest, feed = self.feed.as_str(), "sync.transport.connected");
		Ok(Box::new(stream))
	}
}

#[async_trait]
impl PushStream for EventStream {
	async fn next_frame(&mut self) -> Option<Result<String, ChannelError>> {
		loop {
			match self.next_event().await? {
				Ok(event) if event.is_message() => return Some(Ok(event.data)),
				Ok(event) => tracing::trace!(event = %event.event, "sync.transport.skipped"),
				Err(err) => return Some(Err(err)),
			}
		}
	}
}
