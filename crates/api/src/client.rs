//! REST client for the contest platform.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::model::LoginRequest;
use crate::{
	AuthError, ChannelError, ContestId, ContestMeta, CredentialProvider, EventStream, FetchError, LoginResponse, Snapshot,
	StandingsSnapshot, SubmissionList, User,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Query parameter carrying the token on stream URLs.
const STREAM_TOKEN_PARAM: &str = "q";

/// Client for `<base>/...` endpoints.
///
/// Cheap to clone; clones share the connection pool and credential provider.
#[derive(Clone)]
pub struct ApiClient {
	http: Client,
	base: Url,
	credentials: Arc<dyn CredentialProvider>,
	timeout: Duration,
}

impl fmt::Debug for ApiClient {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ApiClient")
			.field("base", &self.base.as_str())
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

impl ApiClient {
	/// Creates a client for `base` (e.g. `https://judge.example/api`).
	///
	/// `timeout` bounds each REST call; push streams are only bounded by
	/// the connect timeout.
	pub fn new(base: Url, credentials: Arc<dyn CredentialProvider>, timeout: Duration) -> Result<Self, FetchError> {
		let http = Client::builder()
			.connect_timeout(CONNECT_TIMEOUT)
			.build()
			.map_err(|e| FetchError::Network(e.to_string()))?;
		Ok(Self {
			http,
			base,
			credentials,
			timeout,
		})
	}

	pub fn base(&self) -> &Url {
		&self.base
	}

	/// Resolves `path` below the base URL, keeping the base's own path.
	pub fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
		let joined = format!("{}/{}", self.base.as_str().trim_end_matches('/'), path.trim_start_matches('/'));
		Url::parse(&joined).map_err(|e| FetchError::Network(format!("invalid url {joined}: {e}")))
	}

	/// Stream URL for `path` with the token passed as `?q=`.
	pub fn stream_url(&self, path: &str) -> Result<Url, FetchError> {
		let mut url = self.endpoint(path)?;
		let token = self.credentials.token().unwrap_or_default();
		url.query_pairs_mut().append_pair(STREAM_TOKEN_PARAM, &token);
		Ok(url)
	}

	fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
		match self.credentials.token() {
			Some(token) => builder.header(AUTHORIZATION, format!("Bearer {token}")),
			None => builder,
		}
	}

	async fn send(&self, builder: RequestBuilder, url: &Url) -> Result<Response, FetchError> {
		let response = self
			.authorized(builder)
			.timeout(self.timeout)
			.send()
			.await
			.map_err(|e| FetchError::Network(e.to_string()))?;
		let status = response.status();
		if status.is_success() {
			return Ok(response);
		}
		tracing::debug!(url = %url, status = status.as_u16(), "api.request.failed");
		Err(classify_status(status, url))
	}

	async fn get_text(&self, path: &str) -> Result<String, FetchError> {
		let url = self.endpoint(path)?;
		let response = self.send(self.http.get(url.clone()), &url).await?;
		response.text().await.map_err(|e| FetchError::Network(e.to_string()))
	}

	async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FetchError> {
		let body = self.get_text(path).await?;
		serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
	}

	async fn get_snapshot<S: Snapshot>(&self, path: &str) -> Result<S, FetchError> {
		let body = self.get_text(path).await?;
		Ok(S::decode(&body)?)
	}

	/// `GET /contests`.
	pub async fn contests(&self) -> Result<Vec<ContestMeta>, FetchError> {
		let contests: Option<Vec<ContestMeta>> = self.get_json("contests").await?;
		Ok(contests.unwrap_or_default())
	}

	/// `GET /contests/upcomming` (sic, server spelling).
	pub async fn upcoming_contests(&self) -> Result<Vec<ContestMeta>, FetchError> {
		let contests: Option<Vec<ContestMeta>> = self.get_json("contests/upcomming").await?;
		Ok(contests.unwrap_or_default())
	}

	/// `GET /contests/{id}`: metadata with embedded problems.
	pub async fn contest(&self, id: ContestId) -> Result<ContestMeta, FetchError> {
		self.get_json(&format!("contests/{id}")).await
	}

	/// `GET /contests/{id}/standings`.
	pub async fn standings(&self, id: ContestId) -> Result<StandingsSnapshot, FetchError> {
		self.get_snapshot(&format!("contests/{id}/standings")).await
	}

	/// `GET /contests/{id}/submissions`.
	pub async fn contest_submissions(&self, id: ContestId) -> Result<SubmissionList, FetchError> {
		self.get_snapshot(&format!("contests/{id}/submissions")).await
	}

	/// `GET /contests/{id}/submissions/my`.
	pub async fn my_contest_submissions(&self, id: ContestId) -> Result<SubmissionList, FetchError> {
		self.get_snapshot(&format!("contests/{id}/submissions/my")).await
	}

	/// `GET /me`.
	pub async fn me(&self) -> Result<User, FetchError> {
		self.get_json("me").await
	}

	/// `POST /login`. The caller decides where to keep the returned token.
	pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, AuthError> {
		let url = self.endpoint("login")?;
		let response = self
			.http
			.post(url.clone())
			.json(&LoginRequest { email, password })
			.timeout(self.timeout)
			.send()
			.await
			.map_err(|e| FetchError::Network(e.to_string()))?;

		let status = response.status();
		let body = response.text().await.map_err(|e| FetchError::Network(e.to_string()))?;
		if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
			return Err(AuthError::Rejected(server_message(&body).unwrap_or_else(|| status.to_string())));
		}
		if !status.is_success() {
			return Err(classify_status(status, &url).into());
		}
		serde_json::from_str(&body).map_err(|e| AuthError::Request(FetchError::Decode(e.to_string())))
	}

	/// `GET /logout`. The server keeps no session; this only informs it.
	pub async fn logout(&self) -> Result<(), FetchError> {
		self.get_text("logout").await.map(drop)
	}

	/// Opens a push stream at `path`.
	pub async fn open_stream(&self, path: &str) -> Result<EventStream, ChannelError> {
		let url = self.stream_url(path).map_err(|e| ChannelError::HandshakeFailed(e.to_string()))?;
		let response = self
			.http
			.get(url)
			.header(ACCEPT, "text/event-stream")
			.header(CACHE_CONTROL, "no-cache")
			.send()
			.await
			.map_err(|e| ChannelError::HandshakeFailed(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			return Err(ChannelError::HandshakeFailed(format!("status {status}")));
		}
		let content_type = response
			.headers()
			.get(CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.unwrap_or_default();
		if !content_type.starts_with("text/event-stream") {
			return Err(ChannelError::HandshakeFailed(format!("unexpected content type {content_type:?}")));
		}
		tracing::debug!(path, "api.stream.open");
		Ok(EventStream::from_response(response))
	}
}

fn classify_status(status: StatusCode, url: &Url) -> FetchError {
	if status == StatusCode::NOT_FOUND {
		FetchError::NotFound(url.path().to_owned())
	} else {
		FetchError::ServerError { status: status.as_u16() }
	}
}

/// Extracts `message` or `error` from a JSON error body.
fn server_message(body: &str) -> Option<String> {
	let value: serde_json::Value = serde_json::from_str(body).ok()?;
	["message", "error"]
		.iter()
		.find_map(|key| value.get(key).and_then(|v| v.as_str()).map(str::to_owned))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::StaticToken;

	fn client(base: &str, token: Option<&str>) -> ApiClient {
		let credentials: Arc<dyn CredentialProvider> = match token {
			Some(token) => Arc::new(StaticToken::new(token)),
			None => Arc::new(StaticToken::none()),
		};
		ApiClient::new(Url::parse(base).unwrap(), credentials, Duration::from_secs(5)).unwrap()
	}

	#[test]
	fn endpoints_keep_base_path() {
		let api = client("http://judge.local/api/", None);
		assert_eq!(api.endpoint("contests/7").unwrap().as_str(), "http://judge.local/api/contests/7");
		assert_eq!(api.endpoint("/me").unwrap().as_str(), "http://judge.local/api/me");
	}

	#[test]
	fn stream_url_carries_token_as_query() {
		let api = client("http://judge.local/api", Some("a b"));
		assert_eq!(
			api.stream_url("contests/standings/sse/7").unwrap().as_str(),
			"http://judge.local/api/contests/standings/sse/7?q=a+b"
		);
	}

	#[test]
	fn error_bodies_yield_messages() {
		assert_eq!(server_message(r#"{"message":"User not found"}"#).as_deref(), Some("User not found"));
		assert_eq!(server_message(r#"{"error":"Invalid token"}"#).as_deref(), Some("Invalid token"));
		assert_eq!(server_message("oops"), None);
	}
}
