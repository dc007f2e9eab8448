//! Serde codec for the optional `createdOn` field.
//!
//! Accepts RFC 3339 strings and zone-less local date-times such as
//! `2025-01-01T00:00:00.123`, which are read as UTC. Always writes RFC 3339
//! with a `Z` suffix.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serializer};

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

pub fn serialize<S: Serializer>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        None => serializer.serialize_none(),
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| parse(&s).map_err(de::Error::custom)).transpose()
}

/// Parse a timestamp in either accepted form.
pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, LOCAL_FORMAT).map(|naive| naive.and_utc()))
}
