//! Second-resolution timestamps used for transaction expiration.

use crate::error::{WriteApiError, WriteApiResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

const FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Seconds since the Unix epoch, rendered as `2018-01-01T00:00:00` (UTC).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimePointSec(u32);

impl TimePointSec {
    /// Creates a timestamp from seconds since the epoch.
    pub const fn new(secs: u32) -> Self {
        Self(secs)
    }

    /// Returns seconds since the epoch.
    pub fn secs(&self) -> u32 {
        self.0
    }

    /// Returns this timestamp moved forward by `seconds`, saturating.
    #[must_use]
    pub fn plus_seconds(self, seconds: u64) -> Self {
        let secs = u64::from(self.0).saturating_add(seconds);
        Self(u32::try_from(secs).unwrap_or(u32::MAX))
    }

    /// Parses the chain's ISO-8601 form. Fractional seconds and a trailing
    /// `Z` are accepted and dropped.
    pub fn parse(text: &str) -> WriteApiResult<Self> {
        let trimmed = text.trim_end_matches('Z');
        let trimmed = trimmed.split('.').next().unwrap_or(trimmed);
        let parsed = PrimitiveDateTime::parse(trimmed, FORMAT)
            .map_err(|e| WriteApiError::validation(format!("invalid time '{text}': {e}")))?;
        let secs = u32::try_from(parsed.assume_utc().unix_timestamp())
            .map_err(|_| WriteApiError::validation(format!("time '{text}' is out of range")))?;
        Ok(Self(secs))
    }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = OffsetDateTime::from_unix_timestamp(i64::from(self.0))
            .map_err(|_| fmt::Error)?
            .format(FORMAT)
            .map_err(|_| fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl fmt::Debug for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePointSec({self})")
    }
}

impl FromStr for TimePointSec {
    type Err = WriteApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimePointSec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            serializer.serialize_u32(self.0)
        }
    }
}

impl<'de> Deserialize<'de> for TimePointSec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::parse(&s).map_err(serde::de::Error::custom)
        } else {
            Ok(Self(u32::deserialize(deserializer)?))
        }
    }
}
