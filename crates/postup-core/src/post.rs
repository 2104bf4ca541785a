//! Post types: time-bounded activity invitations at a location.
//!
//! A post is written once and never edited. It stops being visible when its
//! active window elapses, but the row itself stays in storage until the
//! owning session deletes it.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{geo::Coordinates, session::SessionId};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Surrogate key assigned by the store.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PostId(pub i64);

impl fmt::Display for PostId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

// ─── Duration ────────────────────────────────────────────────────────────────

/// How long a post stays active, in whole hours. Always within 1–24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Hours(u8);

impl Hours {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 24;

  pub fn new(hours: i64) -> Option<Self> {
    if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&hours) {
      Some(Self(hours as u8))
    } else {
      None
    }
  }

  pub fn get(self) -> u8 { self.0 }

  pub fn as_duration(self) -> Duration { Duration::hours(i64::from(self.0)) }
}

// ─── Enrichment ──────────────────────────────────────────────────────────────

/// Human-readable place names derived from a post's coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceNames {
  pub neighborhood: Option<String>,
  pub locality:     Option<String>,
  pub district:     Option<String>,
}

impl PlaceNames {
  pub fn is_empty(&self) -> bool {
    self.neighborhood.is_none() && self.locality.is_none() && self.district.is_none()
  }

  /// `None` when no name survived, so callers only ever see populated
  /// enrichment.
  pub fn non_empty(self) -> Option<Self> {
    if self.is_empty() { None } else { Some(self) }
  }
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// A persisted post.
///
/// The owning session is deliberately not serialisable: it is the deletion
/// credential and must never reach other clients.
#[derive(Debug, Clone)]
pub struct Post {
  pub id:          PostId,
  pub name:        String,
  pub activity:    String,
  pub location:    String,
  pub coordinates: Coordinates,
  pub hours:       Hours,
  pub place:       Option<PlaceNames>,
  /// Server-assigned; never changes after insert.
  pub created_at:  DateTime<Utc>,
  /// Opens the active window. Equal to `created_at` at creation.
  pub start_time:  DateTime<Utc>,
  pub owner:       SessionId,
}

impl Post {
  /// The instant the active window closes.
  pub fn expires_at(&self) -> DateTime<Utc> { self.start_time + self.hours.as_duration() }

  /// `true` while `now` falls inside `[start_time, start_time + hours)`.
  pub fn is_active_at(&self, now: DateTime<Utc>) -> bool { now < self.expires_at() }

  pub fn is_owned_by(&self, session: &SessionId) -> bool { &self.owner == session }
}

/// Input to [`crate::store::PostStore::insert_post`].
/// Timestamps and the id are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewPost {
  pub name:        String,
  pub activity:    String,
  pub location:    String,
  pub coordinates: Coordinates,
  pub hours:       Hours,
  pub place:       Option<PlaceNames>,
  pub owner:       SessionId,
}
