//! Timestamps as the database stores them: milliseconds since the epoch.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

fn to_millis(time: &DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

fn time_from_millis(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

/// A timestamp the server fills in when unset.
///
/// An unset value serializes to the `{".sv": "timestamp"}` placeholder, so
/// writing it stores the server's clock. Reading it back yields the stored
/// milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerTimestamp(pub Option<DateTime<Utc>>);

impl ServerTimestamp {
    /// The server placeholder.
    pub fn server() -> Self {
        Self(None)
    }

    pub fn at(time: DateTime<Utc>) -> Self {
        Self(Some(time))
    }

    pub fn is_unset(&self) -> bool {
        self.0.is_none()
    }
}

impl Serialize for ServerTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(time) => serializer.serialize_i64(to_millis(time)),
            None => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(".sv", "timestamp")?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for ServerTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self(Time::deserialize(deserializer)?.0))
    }
}

/// A client-side timestamp stored as milliseconds since the epoch.
///
/// `null` decodes to an unset time, which encodes back to `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time(pub Option<DateTime<Utc>>);

impl Time {
    pub fn now() -> Self {
        Self(Some(Utc::now()))
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(time_from_millis(ms))
    }

    pub fn millis(&self) -> Option<i64> {
        self.0.as_ref().map(to_millis)
    }
}

impl From<DateTime<Utc>> for Time {
    fn from(time: DateTime<Utc>) -> Self {
        Self(Some(time))
    }
}

impl Serialize for Time {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(time) => serializer.serialize_i64(to_millis(time)),
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Time {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<i64>::deserialize(deserializer)? {
            Some(ms) => time_from_millis(ms)
                .map(|time| Self(Some(time)))
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {}", ms))),
            None => Ok(Self(None)),
        }
    }
}
