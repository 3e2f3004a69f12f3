use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::Timestamp;

/// Identifier of one contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContestId(pub u64);

impl fmt::Display for ContestId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

impl FromStr for ContestId {
	type Err = ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse().map(Self)
	}
}

/// Contest metadata with its embedded problem list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestMeta {
	pub id: ContestId,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub start_time: Option<Timestamp>,
	/// Length in minutes.
	#[serde(default)]
	pub duration: u32,
	#[serde(default, deserialize_with = "null_as_default")]
	pub problems: Vec<Problem>,
	#[serde(default)]
	pub created_at: Option<Timestamp>,
}

impl ContestMeta {
	/// Title, or the numeric id when the title is blank.
	pub fn display_name(&self) -> String {
		if self.title.trim().is_empty() { self.id.to_string() } else { self.title.clone() }
	}
}

/// One problem of a contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
	pub id: u64,
	#[serde(default)]
	pub title: String,
	#[serde(default)]
	pub contest_id: Option<ContestId>,
	#[serde(default)]
	pub statement: String,
	/// Position within the contest as numbered by the server.
	#[serde(default)]
	pub problem_number: u32,
	#[serde(default)]
	pub created_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn decodes_contest_with_null_problems() {
		let meta: ContestMeta =
			serde_json::from_str(r#"{"id":7,"title":"Cup","start_time":"2025-06-01 10:00","duration":120,"problems":null}"#).unwrap();
		assert_eq!(meta.id, ContestId(7));
		assert_eq!(meta.duration, 120);
		assert!(meta.problems.is_empty());
		assert_eq!(meta.display_name(), "Cup");
	}

	#[test]
	fn blank_title_falls_back_to_id() {
		let meta: ContestMeta = serde_json::from_str(r#"{"id":3,"title":"  "}"#).unwrap();
		assert_eq!(meta.display_name(), "3");
	}

	#[test]
	fn contest_id_parses_from_cli_text() {
		assert_eq!(" 42 ".parse::<ContestId>(), Ok(ContestId(42)));
		assert!("abc".parse::<ContestId>().is_err());
	}
}
