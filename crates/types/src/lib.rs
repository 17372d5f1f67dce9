//! Validated text types shared by the clinic crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input was not a plausible email address
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns `Err(TextError::Empty)` if the input is empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// An email address with a minimal shape check.
///
/// Accepts `local@domain` where both parts are non-empty, the domain contains a dot that is
/// neither its first nor last character, and no whitespace appears anywhere. Deliverability is
/// not checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and trims an email address.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::InvalidEmail`] when the
    /// address does not have the `local@domain.tld` shape.
    pub fn parse(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }

        let invalid = || TextError::InvalidEmail(trimmed.to_owned());

        if trimmed.chars().any(char::is_whitespace) {
            return Err(invalid());
        }

        let (local, domain) = trimmed.split_once('@').ok_or_else(invalid)?;
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(invalid());
        }

        match domain.find('.') {
            Some(pos) if pos > 0 && !domain.ends_with('.') => Ok(Self(trimmed.to_owned())),
            _ => Err(invalid()),
        }
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl serde::Serialize for EmailAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for EmailAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        EmailAddress::parse(&s).map_err(serde::de::Error::custom)
    }
}
