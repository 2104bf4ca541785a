//! Anonymous session identity.
//!
//! A session id is the only credential in the system: it is minted for a
//! browser on its first request, carried in a cookie, and stamped onto every
//! post that browser creates.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};
use uuid::Uuid;

/// An opaque pseudo-identity derived from a cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
  /// Mint a fresh, unguessable session id.
  pub fn generate() -> Self { Self(Uuid::new_v4().hyphenated().to_string()) }

  /// Accept a cookie value as a session id if it is well formed.
  ///
  /// Anything that does not parse as a UUID is rejected so a tampered or
  /// truncated cookie falls back to a fresh identity. Accepted ids are
  /// normalised to lowercase hyphenated form.
  pub fn parse(raw: &str) -> Option<Self> {
    let id = Uuid::try_parse(raw.trim()).ok()?;
    Some(Self(id.hyphenated().to_string()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Deserialises through [`SessionId::parse`].
impl<'de> Deserialize<'de> for SessionId {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Self::parse(&raw).ok_or_else(|| de::Error::custom("session id must be a UUID"))
  }
}
