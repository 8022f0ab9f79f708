//! JSON payloads.
//!
//! Chat messages travel as JSON in STOMP frame bodies and in directory
//! history responses; directory lookups return JSON user records. The backend
//! is lenient about representation, so decoding is too:
//!
//! - ids may arrive as numbers or numeric strings
//! - timestamps may arrive as RFC 3339 text, `YYYY-MM-DD HH:MM:SS` text, or
//!   epoch milliseconds
//! - unknown fields are ignored

mod chat;
mod directory;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

pub use chat::ChatPayload;
pub use directory::UserRecord;

use crate::UserId;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(UserId),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TimestampRepr {
    Millis(i64),
    Text(String),
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

fn user_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UserId, D::Error> {
    match IdRepr::deserialize(deserializer)? {
        IdRepr::Number(id) => Ok(id),
        IdRepr::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("user id is not numeric: {text:?}"))),
    }
}

fn timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<TimestampRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(TimestampRepr::Millis(millis)) => DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("timestamp out of range: {millis}"))),
        Some(TimestampRepr::Text(text)) => parse_timestamp(&text)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognised timestamp: {text:?}"))),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| naive.and_utc())
}

/// Millisecond RFC 3339, matching what browsers emit for `Date` in JSON.
fn serialize_timestamp<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(at) => serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parses_supported_timestamp_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).single();

        assert_eq!(parse_timestamp("2024-05-01T10:30:00Z"), expected);
        assert_eq!(parse_timestamp("2024-05-01T12:30:00+02:00"), expected);
        assert_eq!(parse_timestamp("2024-05-01 10:30:00"), expected);
        assert_eq!(parse_timestamp("2024-05-01T10:30:00.000"), expected);
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
