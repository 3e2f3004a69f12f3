use serde::{Deserialize, Deserializer, Serialize};

use super::{Snapshot, null_as_default};
use crate::{DecodeError, Timestamp};

/// Status string the judge writes for an accepted submission.
pub const STATUS_PASS: &str = "PASS";

/// One judged (or pending) submission with its problem title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
	pub id: u64,
	#[serde(default)]
	pub user_id: u64,
	#[serde(default)]
	pub user_name: String,
	#[serde(default)]
	pub problem_id: u64,
	#[serde(default)]
	pub problem_title: String,
	#[serde(default)]
	pub language: String,
	#[serde(default)]
	pub source_code: String,
	#[serde(default)]
	pub status: String,
	#[serde(default)]
	pub message: String,
	#[serde(default)]
	pub created_at: Option<Timestamp>,
}

impl Submission {
	pub fn is_accepted(&self) -> bool {
		self.status == STATUS_PASS
	}
}

/// Full submission list of one contest feed, newest first as sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SubmissionList {
	pub items: Vec<Submission>,
}

impl<'de> Deserialize<'de> for SubmissionList {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		Ok(Self {
			items: null_as_default(deserializer)?,
		})
	}
}

impl Snapshot for SubmissionList {
	const KIND: &'static str = "submissions";

	fn decode(payload: &str) -> Result<Self, DecodeError> {
		Ok(serde_json::from_str(payload)?)
	}

	fn len(&self) -> usize {
		self.items.len()
	}
}
