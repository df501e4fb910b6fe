//! The canonical admission-decision type.
//!
//! The admin API is inconsistent about how it encodes decisions:
//! `/admin/rate-status` uses a JSON boolean (`ai_allowed`), while
//! `/admin/logs` uses the string `"true"` (anything else means blocked).
//! Both wire shapes deserialize into [`Outcome`] via the [`bool_repr`] and
//! [`string_repr`] adapters so downstream code only ever sees one type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The rate limiter's decision for a request or a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The request was admitted (or the user is currently admitted).
    Allowed,
    /// The request was rejected (or the user is currently rate-limited).
    Blocked,
}

impl Outcome {
    /// Map a wire boolean onto an outcome.
    pub fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Allowed
        } else {
            Self::Blocked
        }
    }

    /// True for [`Outcome::Allowed`].
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// The boolean the `/admin/rate-status` endpoint would report.
    pub fn as_bool(self) -> bool {
        self.is_allowed()
    }

    /// Lowercase label for display and export.
    pub fn label(self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::Blocked => "blocked",
        }
    }
}

impl From<bool> for Outcome {
    fn from(allowed: bool) -> Self {
        Self::from_bool(allowed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Serde adapter for the boolean wire form used by `/admin/rate-status`.
///
/// Use with `#[serde(with = "outcome::bool_repr")]`.
pub mod bool_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Outcome;

    pub fn serialize<S>(outcome: &Outcome, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bool(outcome.is_allowed())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Outcome, D::Error>
    where
        D: Deserializer<'de>,
    {
        bool::deserialize(deserializer).map(Outcome::from_bool)
    }
}

/// Serde adapter for the string wire form used by `/admin/logs`.
///
/// The literal `"true"` means allowed; any other string means blocked.
/// Use with `#[serde(with = "outcome::string_repr")]`.
pub mod string_repr {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::Outcome;

    pub fn serialize<S>(outcome: &Outcome, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(if outcome.is_allowed() { "true" } else { "false" })
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Outcome, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Outcome::from_bool(raw == "true"))
    }
}
