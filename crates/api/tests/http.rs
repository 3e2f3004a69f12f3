//! Client behaviour against a scripted local HTTP server.

use std::sync::Arc;
use std::time::Duration;

use podium_api::{ApiClient, AuthError, ChannelError, ContestId, CredentialProvider, FetchError, StaticToken};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Serves exactly one canned response and returns the raw request it received.
async fn serve_once(response: String) -> (Url, JoinHandle<String>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	let handle = tokio::spawn(async move {
		let (mut socket, _) = listener.accept().await.unwrap();
		let request = read_request(&mut socket).await;
		socket.write_all(response.as_bytes()).await.unwrap();
		socket.shutdown().await.ok();
		request
	});
	(Url::parse(&format!("http://{addr}/api")).unwrap(), handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
	let mut raw = Vec::new();
	let mut buf = [0u8; 1024];
	loop {
		let n = socket.read(&mut buf).await.unwrap();
		if n == 0 {
			break;
		}
		raw.extend_from_slice(&buf[..n]);
		let text = String::from_utf8_lossy(&raw);
		if let Some(head_end) = text.find("\r\n\r\n") {
			let body_len = text[..head_end]
				.lines()
				.find_map(|line| {
					let (name, value) = line.split_once(':')?;
					name.eq_ignore_ascii_case("content-length").then(|| value.trim().parse::<usize>().ok())?
				})
				.unwrap_or(0);
			if raw.len() >= head_end + 4 + body_len {
				break;
			}
		}
	}
	String::from_utf8_lossy(&raw).into_owned()
}

fn json_response(status: &str, body: &str) -> String {
	format!(
		"HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
		body.len()
	)
}

fn client(base: Url, token: Option<&str>) -> ApiClient {
	let credentials: Arc<dyn CredentialProvider> = match token {
		Some(token) => Arc::new(StaticToken::new(token)),
		None => Arc::new(StaticToken::none()),
	};
	ApiClient::new(base, credentials, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn standings_request_carries_bearer_token() {
	let body = r#"[{"rank":1,"user_id":1,"user_name":"ann","solved":1,"penalty":12,"problems":[{"problem_number":0,"status":"+","count":1}]}]"#;
	let (base, server) = serve_once(json_response("200 OK", body)).await;

	let standings = client(base, Some("tok")).standings(ContestId(7)).await.unwrap();
	assert_eq!(standings.rows.len(), 1);
	assert_eq!(standings.rows[0].penalty, 12);

	let request = server.await.unwrap();
	assert!(request.starts_with("GET /api/contests/7/standings "), "{request}");
	assert!(request.to_ascii_lowercase().contains("authorization: bearer tok"), "{request}");
}

#[tokio::test]
async fn missing_contest_is_not_found() {
	let (base, _server) = serve_once(json_response("404 Not Found", r#"{"error":"no"}"#)).await;
	let err = client(base, None).contest(ContestId(9)).await.unwrap_err();
	assert_eq!(err, FetchError::NotFound("/api/contests/9".into()));
}

#[tokio::test]
async fn server_failure_keeps_status() {
	let (base, _server) = serve_once(json_response("500 Internal Server Error", r#"{"error":"Failed"}"#)).await;
	let err = client(base, None).standings(ContestId(1)).await.unwrap_err();
	assert_eq!(err, FetchError::ServerError { status: 500 });
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
	let (base, _server) = serve_once(json_response("200 OK", r#"{"rows":"nope"}"#)).await;
	let err = client(base, None).standings(ContestId(1)).await.unwrap_err();
	assert!(matches!(err, FetchError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn refused_connection_is_network_error() {
	let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	drop(listener);
	let base = Url::parse(&format!("http://{addr}/api")).unwrap();
	let err = client(base, None).me().await.unwrap_err();
	assert!(matches!(err, FetchError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn login_returns_token_and_rejections_carry_server_message() {
	let (base, server) = serve_once(json_response(
		"200 OK",
		r#"{"id":1,"name":"Ann","email":"a@x","role":"user","token":"jwt"}"#,
	))
	.await;
	let login = client(base, None).login("a@x", "pw").await.unwrap();
	assert_eq!(login.token, "jwt");
	let request = server.await.unwrap();
	assert!(request.starts_with("POST /api/login "), "{request}");
	assert!(request.contains(r#""email":"a@x""#), "{request}");

	let (base, _server) = serve_once(json_response("400 Bad Request", r#"{"message":"Incorrect password"}"#)).await;
	let err = client(base, None).login("a@x", "bad").await.unwrap_err();
	assert!(matches!(err, AuthError::Rejected(ref msg) if msg == "Incorrect password"), "{err:?}");
}

#[tokio::test]
async fn event_stream_delivers_frames_until_close() {
	let response = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncache-control: no-cache\r\nconnection: close\r\n\r\ndata: [1]\n\n: ping\n\ndata: [2]\n\n".to_owned();
	let (base, server) = serve_once(response).await;

	let mut stream = client(base, Some("tok")).open_stream("contests/standings/sse/7").await.unwrap();
	assert_eq!(stream.next_event().await.unwrap().unwrap().data, "[1]");
	assert_eq!(stream.next_event().await.unwrap().unwrap().data, "[2]");
	assert!(stream.next_event().await.is_none());

	let request = server.await.unwrap();
	assert!(request.starts_with("GET /api/contests/standings/sse/7?q=tok "), "{request}");
}

#[tokio::test]
async fn non_stream_response_fails_handshake() {
	let (base, _server) = serve_once(json_response("200 OK", "[]")).await;
	let err = client(base.clone(), None).open_stream("contests/1/sse").await.unwrap_err();
	assert!(matches!(err, ChannelError::HandshakeFailed(_)), "{err:?}");

	let (base, _server) = serve_once(json_response("401 Unauthorized", r#"{"error":"Token is required"}"#)).await;
	let err = client(base, None).open_stream("contests/1/sse").await.unwrap_err();
	assert!(matches!(err, ChannelError::HandshakeFailed(_)), "{err:?}");
}
