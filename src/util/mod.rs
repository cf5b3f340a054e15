//! Utilities. OBVIOUSLY.

use chrono::{DateTime, Months, Utc};
use serde_derive::{Deserialize, Serialize};
use std::ops::Deref;
use std::str::FromStr;

pub mod ser;
pub mod sign;
#[cfg(test)]
pub(crate) mod test;

/// Allows an object to hand out a copy of itself with all private data removed.
pub trait Public: Clone {
    /// Strip the private data from an object, returning only public data.
    fn strip_private(&self) -> Self;

    /// Returns whether or not this object has private data.
    fn has_private(&self) -> bool;
}

/// A library-local representation of a time.
///
/// Wrapping the chrono type lets us control serialization in one place, and
/// anything that takes a `Timestamp` also takes a
/// [DateTime<Utc>](chrono::DateTime) via `From/Into`. The underlying value is
/// always available through deref.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a new Timestamp from the current date/time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Milliseconds since the unix epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Add a number of whole years to this timestamp, returning `None` if the
    /// result doesn't fit.
    pub fn add_years(&self, years: u32) -> Option<Self> {
        self.0.checked_add_months(Months::new(years.checked_mul(12)?)).map(Self)
    }
}

impl Deref for Timestamp {
    type Target = DateTime<Utc>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(date: DateTime<Utc>) -> Self {
        Self(date)
    }
}

impl FromStr for Timestamp {
    type Err = chrono::format::ParseError;
    fn from_str(s: &str) -> std::result::Result<Timestamp, Self::Err> {
        let datetime: DateTime<Utc> = s.parse()?;
        Ok(Timestamp(datetime))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
