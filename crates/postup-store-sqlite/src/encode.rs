//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings with microsecond
//! precision and a `Z` suffix, so lexicographic order in SQL matches
//! chronological order.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use postup_core::{
  geo::Coordinates,
  post::{Hours, PlaceNames, Post, PostId},
  session::SessionId,
  subscription::{PushKeys, Subscription},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Drop sub-microsecond precision so an in-memory value equals its stored
/// form.
pub fn truncate_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
  dt.with_nanosecond(dt.nanosecond() / 1_000 * 1_000).unwrap_or(dt)
}

// ─── SessionId ───────────────────────────────────────────────────────────────

pub fn decode_session(s: &str) -> Result<SessionId> {
  SessionId::parse(s).ok_or_else(|| Error::CorruptRow(format!("invalid session id: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching the field order of [`RawPost`].
pub const POST_COLUMNS: &str = "id, name, activity, location, latitude, longitude, hours,
   neighborhood, locality, district, created_at, start_time, session_id";

/// Raw values read directly from a `posts` row.
pub struct RawPost {
  pub id:           i64,
  pub name:         String,
  pub activity:     String,
  pub location:     String,
  pub latitude:     f64,
  pub longitude:    f64,
  pub hours:        i64,
  pub neighborhood: Option<String>,
  pub locality:     Option<String>,
  pub district:     Option<String>,
  pub created_at:   String,
  pub start_time:   String,
  pub session_id:   String,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      name:         row.get(1)?,
      activity:     row.get(2)?,
      location:     row.get(3)?,
      latitude:     row.get(4)?,
      longitude:    row.get(5)?,
      hours:        row.get(6)?,
      neighborhood: row.get(7)?,
      locality:     row.get(8)?,
      district:     row.get(9)?,
      created_at:   row.get(10)?,
      start_time:   row.get(11)?,
      session_id:   row.get(12)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    let coordinates = Coordinates::new(self.latitude, self.longitude).map_err(|e| {
      Error::CorruptRow(format!("post {}: {}", self.id, e.message()))
    })?;
    let hours = Hours::new(self.hours).ok_or_else(|| {
      Error::CorruptRow(format!("post {}: hours out of range: {}", self.id, self.hours))
    })?;
    let place = PlaceNames {
      neighborhood: self.neighborhood,
      locality:     self.locality,
      district:     self.district,
    }
    .non_empty();

    Ok(Post {
      id: PostId(self.id),
      name: self.name,
      activity: self.activity,
      location: self.location,
      coordinates,
      hours,
      place,
      created_at: decode_dt(&self.created_at)?,
      start_time: decode_dt(&self.start_time)?,
      owner: decode_session(&self.session_id)?,
    })
  }
}

/// Column list matching the field order of [`RawSubscription`].
pub const SUBSCRIPTION_COLUMNS: &str =
  "endpoint, p256dh, auth, session_id, created_at, updated_at";

/// Raw strings read directly from a `notification_subscriptions` row.
pub struct RawSubscription {
  pub endpoint:   String,
  pub p256dh:     String,
  pub auth:       String,
  pub session_id: Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      endpoint:   row.get(0)?,
      p256dh:     row.get(1)?,
      auth:       row.get(2)?,
      session_id: row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      endpoint:   self.endpoint,
      keys:       PushKeys { p256dh: self.p256dh, auth: self.auth },
      session_id: self.session_id.as_deref().map(decode_session).transpose()?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
