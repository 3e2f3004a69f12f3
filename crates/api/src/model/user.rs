use serde::{Deserialize, Serialize};

/// Account role as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
	#[default]
	User,
	Admin,
}

/// Authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: u64,
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub role: Role,
}

/// Body of a successful `POST /login`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
	#[serde(flatten)]
	pub user: User,
	pub token: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
	pub email: &'a str,
	pub password: &'a str,
}
