use std::collections::HashSet;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Snapshot, null_as_default};
use crate::DecodeError;

/// Unique key of one participant.
///
/// The server sends numeric ids; string ids are accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UserKey(pub String);

impl fmt::Display for UserKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for UserKey {
	fn from(value: &str) -> Self {
		Self(value.to_owned())
	}
}

impl<'de> Deserialize<'de> for UserKey {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct KeyVisitor;

		impl Visitor<'_> for KeyVisitor {
			type Value = UserKey;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a user id (number or string)")
			}

			fn visit_u64<E: de::Error>(self, value: u64) -> Result<UserKey, E> {
				Ok(UserKey(value.to_string()))
			}

			fn visit_i64<E: de::Error>(self, value: i64) -> Result<UserKey, E> {
				Ok(UserKey(value.to_string()))
			}

			fn visit_str<E: de::Error>(self, value: &str) -> Result<UserKey, E> {
				Ok(UserKey(value.to_owned()))
			}
		}

		deserializer.deserialize_any(KeyVisitor)
	}
}

/// Outcome of one participant on one problem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Verdict {
	Accepted,
	Rejected,
	#[default]
	Unattempted,
}

impl Verdict {
	/// Server marker: `+`, `-` or empty.
	pub const fn marker(self) -> &'static str {
		match self {
			Self::Accepted => "+",
			Self::Rejected => "-",
			Self::Unattempted => "",
		}
	}
}

impl Serialize for Verdict {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(self.marker())
	}
}

impl<'de> Deserialize<'de> for Verdict {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let raw = Option::<String>::deserialize(deserializer)?;
		match raw.as_deref().map(str::trim) {
			None | Some("") => Ok(Self::Unattempted),
			Some("+") => Ok(Self::Accepted),
			Some("-") => Ok(Self::Rejected),
			Some(word) if word.eq_ignore_ascii_case("accepted") => Ok(Self::Accepted),
			Some(word) if word.eq_ignore_ascii_case("rejected") => Ok(Self::Rejected),
			Some(word) if word.eq_ignore_ascii_case("unattempted") => Ok(Self::Unattempted),
			Some(other) => Err(de::Error::unknown_variant(other, &["+", "-", "", "accepted", "rejected", "unattempted"])),
		}
	}
}

/// Per-problem cell of a participant row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemResult {
	/// 0-based problem index as numbered by the server.
	#[serde(rename = "problem_number", alias = "idx")]
	pub index: u32,
	#[serde(rename = "status", alias = "verdict", default)]
	pub verdict: Verdict,
	#[serde(rename = "count", alias = "attempts", default)]
	pub attempts: u32,
}

impl ProblemResult {
	/// Whether the participant submitted anything for this problem.
	pub fn is_attempted(&self) -> bool {
		matches!(self.verdict, Verdict::Accepted | Verdict::Rejected)
	}
}

/// One competitor in a standings table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRow {
	#[serde(rename = "user_id", alias = "user")]
	pub user: UserKey,
	#[serde(rename = "user_name", alias = "name", default)]
	pub display_name: String,
	/// Server-assigned rank. Ties are kept as sent.
	#[serde(default)]
	pub rank: u32,
	#[serde(default)]
	pub solved: u32,
	#[serde(default)]
	pub penalty: u64,
	#[serde(default, deserialize_with = "null_as_default")]
	pub problems: Vec<ProblemResult>,
}

impl ParticipantRow {
	/// Result for problem `index`, if the server sent one.
	pub fn problem(&self, index: u32) -> Option<&ProblemResult> {
		self.problems.iter().find(|p| p.index == index)
	}

	/// Display name, or the user key when the name is missing.
	pub fn label(&self) -> &str {
		if self.display_name.is_empty() { &self.user.0 } else { &self.display_name }
	}

	fn check_unique_problems(&self) -> Result<(), DecodeError> {
		let mut seen = HashSet::with_capacity(self.problems.len());
		for problem in &self.problems {
			if !seen.insert(problem.index) {
				return Err(DecodeError::DuplicateProblem {
					user: self.user.0.clone(),
					index: problem.index,
				});
			}
		}
		Ok(())
	}
}

/// Full standings table in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StandingsSnapshot {
	pub rows: Vec<ParticipantRow>,
}

impl StandingsSnapshot {
	/// Builds a snapshot after checking row invariants.
	pub fn new(rows: Vec<ParticipantRow>) -> Result<Self, DecodeError> {
		for row in &rows {
			row.check_unique_problems()?;
		}
		Ok(Self { rows })
	}

	/// Number of problem columns: highest observed index plus one.
	///
	/// Derived from the rows, never from contest metadata, so unscored
	/// placeholder problems do not add columns.
	pub fn column_count(&self) -> u32 {
		self.rows
			.iter()
			.flat_map(|row| row.problems.iter().map(|p| p.index))
			.max()
			.map_or(0, |max| max.saturating_add(1))
	}

	pub fn row(&self, user: &UserKey) -> Option<&ParticipantRow> {
		self.rows.iter().find(|row| &row.user == user)
	}
}

impl<'de> Deserialize<'de> for StandingsSnapshot {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let rows: Vec<ParticipantRow> = null_as_default(deserializer)?;
		Self::new(rows).map_err(de::Error::custom)
	}
}

impl Snapshot for StandingsSnapshot {
	const KIND: &'static str = "standings";

	fn decode(payload: &str) -> Result<Self, DecodeError> {
		let rows: Option<Vec<ParticipantRow>> = serde_json::from_str(payload)?;
		Self::new(rows.unwrap_or_default())
	}

	fn len(&self) -> usize {
		self.rows.len()
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn decodes_server_wire_format() {
		let payload = r#"[
			{"rank":1,"user_id":4,"user_name":"ann","solved":1,"penalty":300,
			 "problems":[{"problem_number":0,"status":"+","count":2},{"problem_number":1,"status":"-","count":1},{"problem_number":2,"status":"","count":0}]}
		]"#;
		let snapshot = StandingsSnapshot::decode(payload).unwrap();
		let row = &snapshot.rows[0];
		assert_eq!(row.user, UserKey::from("4"));
		assert_eq!(row.label(), "ann");
		assert_eq!(row.problem(0).map(|p| (p.verdict, p.attempts)), Some((Verdict::Accepted, 2)));
		assert_eq!(row.problem(1).map(|p| p.verdict), Some(Verdict::Rejected));
		assert_eq!(row.problem(2).map(ProblemResult::is_attempted), Some(false));
		assert_eq!(snapshot.column_count(), 3);
	}

	#[test]
	fn decodes_descriptive_aliases() {
		let payload = r#"[{"user":"u1","rank":1,"solved":2,"penalty":10,
			"problems":[{"idx":0,"verdict":"accepted","attempts":1},{"idx":1,"verdict":"accepted","attempts":2}]}]"#;
		let snapshot = StandingsSnapshot::decode(payload).unwrap();
		assert_eq!(snapshot.len(), 1);
		assert_eq!(snapshot.rows[0].label(), "u1");
		assert_eq!(snapshot.rows[0].solved, 2);
		assert_eq!(snapshot.column_count(), 2);
	}

	#[test]
	fn null_payload_and_null_problems_are_empty() {
		assert!(StandingsSnapshot::decode("null").unwrap().is_empty());
		let snapshot = StandingsSnapshot::decode(r#"[{"user_id":1,"rank":1,"solved":0,"penalty":0,"problems":null}]"#).unwrap();
		assert!(snapshot.rows[0].problems.is_empty());
		assert_eq!(snapshot.column_count(), 0);
	}

	#[test]
	fn duplicate_problem_index_is_rejected() {
		let payload = r#"[{"user_id":9,"rank":1,"solved":0,"penalty":0,
			"problems":[{"problem_number":0,"status":"-","count":1},{"problem_number":0,"status":"+","count":1}]}]"#;
		let err = StandingsSnapshot::decode(payload).unwrap_err();
		assert!(matches!(err, DecodeError::DuplicateProblem { ref user, index: 0 } if user == "9"));
		assert!(serde_json::from_str::<StandingsSnapshot>(payload).is_err());
	}

	#[test]
	fn tied_ranks_are_preserved() {
		let payload = r#"[{"user_id":1,"rank":1,"solved":1,"penalty":5},{"user_id":2,"rank":1,"solved":1,"penalty":5},{"user_id":3,"rank":3,"solved":0,"penalty":0}]"#;
		let ranks: Vec<u32> = StandingsSnapshot::decode(payload).unwrap().rows.iter().map(|r| r.rank).collect();
		assert_eq!(ranks, vec![1, 1, 3]);
	}

	#[test]
	fn unknown_verdict_is_a_decode_error() {
		let payload = r#"[{"user_id":1,"rank":1,"problems":[{"problem_number":0,"status":"?","count":1}]}]"#;
		assert!(StandingsSnapshot::decode(payload).is_err());
		assert!(StandingsSnapshot::decode("{not json").is_err());
	}

	#[test]
	fn verdict_round_trips_through_server_markers() {
		let row = ParticipantRow {
			user: "7".into(),
			display_name: "x".into(),
			rank: 2,
			solved: 1,
			penalty: 60,
			problems: vec![ProblemResult {
				index: 0,
				verdict: Verdict::Accepted,
				attempts: 1,
			}],
		};
		let json = serde_json::to_value(&row).unwrap();
		assert_eq!(json["problems"][0]["status"], "+");
		assert_eq!(json["problems"][0]["problem_number"], 0);
	}
}
