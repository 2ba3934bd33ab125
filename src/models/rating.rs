//! Toy rating value object
//!
//! Ratings are bounded integers rendered in a human-readable form,
//! e.g. `"4 из 5"`. The textual form is the only serialized representation;
//! JSON payloads carry the rating as that string, never as a bare number.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::RatingError;

/// Highest rating a comment can carry
pub const MAX_RATING: i32 = 5;

/// Connector word between the value and the maximum
const CONNECTOR: &str = "из";

/// A comment rating, rendered as `"<value> из 5"`
///
/// Decoding checks the token shape and the upper bound only. Values below
/// zero are accepted; see the decoding tests which pin this behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Rating(i32);

impl Rating {
    /// Wrap a raw rating value
    pub fn new(value: i32) -> Self {
        Self(value)
    }

    /// The raw integer value
    pub fn value(&self) -> i32 {
        self.0
    }
}

impl From<i32> for Rating {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0, CONNECTOR, MAX_RATING)
    }
}

impl FromStr for Rating {
    type Err = RatingError;

    /// Parse the canonical `"<value> из 5"` form
    ///
    /// Fails with [`RatingError::InvalidFormat`] unless the input is exactly
    /// three space-separated tokens, the middle token is the connector word,
    /// and the first token is an integer not exceeding [`MAX_RATING`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(' ').collect();

        if parts.len() != 3 || parts[1] != CONNECTOR {
            return Err(RatingError::InvalidFormat);
        }

        let value: i32 = parts[0].parse().map_err(|_| RatingError::InvalidFormat)?;

        if value > MAX_RATING {
            return Err(RatingError::InvalidFormat);
        }

        Ok(Rating(value))
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}
