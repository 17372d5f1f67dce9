//! Internal implementation of record identifiers.

use crate::{UuidError, UuidResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

/// Re-exported for convenience.
pub use ::uuid::Uuid;

/// Canonical record identifier (32 lowercase hex characters, no hyphens).
///
/// Once constructed the contained UUID is known to be valid, and its string form is always
/// the canonical one. Identifiers are assigned by the entity store when a record is created
/// and never change afterwards.
///
/// # Construction
/// - [`RecordId::new`] generates a fresh random identifier.
/// - [`RecordId::parse`] validates an externally supplied identifier.
///
/// # Ordering
/// Identifiers order by their UUID value. Stores use this to give listings a stable order;
/// the order carries no meaning beyond that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId(Uuid);

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordId {
    /// Generates a new random (version 4) identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be in canonical form.
    ///
    /// This does **not** normalise other common UUID forms (hyphenated, uppercase).
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> UuidResult<Self> {
        if !Self::is_canonical(input) {
            return Err(UuidError::InvalidInput(format!(
                "record id must be 32 lowercase hex characters without hyphens, got: '{}'",
                input
            )));
        }

        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| UuidError::InvalidInput(e.to_string()))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, only `0-9` and `a-f`.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/<id>/` where `s1`/`s2` are derived from this identifier.
    ///
    /// - `s1` is the first two hex characters
    /// - `s2` is the next two hex characters
    /// - the full identifier forms the leaf directory
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2).join(&canonical)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = UuidError;

    /// Equivalent to [`RecordId::parse`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}
