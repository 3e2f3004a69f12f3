use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Naive layouts the server may emit besides RFC 3339. Interpreted as UTC.
const NAIVE_LAYOUTS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

/// Server timestamp accepting every layout the platform writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
	/// Parses RFC 3339 or one of the naive layouts.
	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();
		if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
			return Some(Self(parsed.with_timezone(&Utc)));
		}
		for layout in NAIVE_LAYOUTS {
			if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, layout) {
				return Some(Self(parsed.and_utc()));
			}
		}
		NaiveDate::parse_from_str(raw, "%Y-%m-%d")
			.ok()
			.and_then(|date| date.and_hms_opt(0, 0, 0))
			.map(|midnight| Self(midnight.and_utc()))
	}

	pub const fn as_datetime(&self) -> DateTime<Utc> {
		self.0
	}
}

impl From<DateTime<Utc>> for Timestamp {
	fn from(value: DateTime<Utc>) -> Self {
		Self(value)
	}
}

impl fmt::Display for Timestamp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.to_rfc3339_opts(SecondsFormat::Secs, true))
	}
}

impl Serialize for Timestamp {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		struct TimestampVisitor;

		impl Visitor<'_> for TimestampVisitor {
			type Value = Timestamp;

			fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str("a timestamp string")
			}

			fn visit_str<E: de::Error>(self, value: &str) -> Result<Timestamp, E> {
				Timestamp::parse(value).ok_or_else(|| E::custom(format!("unable to parse time: {value}")))
			}
		}

		deserializer.deserialize_str(TimestampVisitor)
	}
}

#[cfg(test)]
mod tests {
	use chrono::TimeZone;

	use super::*;

	fn at(h: u32, m: u32, s: u32) -> Timestamp {
		Timestamp(Utc.with_ymd_and_hms(2025, 6, 1, h, m, s).unwrap())
	}

	#[test]
	fn parses_every_server_layout() {
		assert_eq!(Timestamp::parse("2025-06-01T10:20:30Z"), Some(at(10, 20, 30)));
		assert_eq!(Timestamp::parse("2025-06-01T12:20:30+02:00"), Some(at(10, 20, 30)));
		assert_eq!(
			Timestamp::parse("2025-06-01T10:20:30.250Z").map(|t| t.0.timestamp_millis() % 1000),
			Some(250)
		);
		assert_eq!(Timestamp::parse("2025-06-01T10:20:30"), Some(at(10, 20, 30)));
		assert_eq!(Timestamp::parse("2025-06-01T10:20"), Some(at(10, 20, 0)));
		assert_eq!(Timestamp::parse("2025-06-01 10:20:30"), Some(at(10, 20, 30)));
		assert_eq!(Timestamp::parse("2025-06-01 10:20"), Some(at(10, 20, 0)));
		assert_eq!(Timestamp::parse("2025-06-01"), Some(at(0, 0, 0)));
	}

	#[test]
	fn rejects_garbage() {
		assert_eq!(Timestamp::parse("yesterday"), None);
		assert!(serde_json::from_str::<Timestamp>("\"01/06/2025\"").is_err());
	}

	#[test]
	fn serializes_as_rfc3339() {
		let json = serde_json::to_string(&at(9, 0, 0)).unwrap();
		assert_eq!(json, "\"2025-06-01T09:00:00Z\"");
	}
}
