//! [`SqliteStore`], the SQLite implementation of the postup store traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;

use postup_core::{
  post::{NewPost, Post, PostId},
  store::{PostStore, SubscriptionStore},
  subscription::{NewSubscription, Subscription},
};

use crate::{
  Result,
  encode::{
    POST_COLUMNS, RawPost, RawSubscription, SUBSCRIPTION_COLUMNS, encode_dt,
    truncate_micros,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A postup store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── PostStore impl ──────────────────────────────────────────────────────────

impl PostStore for SqliteStore {
  type Error = crate::Error;

  async fn insert_post(&self, input: NewPost, at: DateTime<Utc>) -> Result<Post> {
    let at = truncate_micros(at);
    let at_str = encode_dt(at);
    let expires_str = encode_dt(at + input.hours.as_duration());
    let place = input.place.clone().unwrap_or_default();

    let name = input.name.clone();
    let activity = input.activity.clone();
    let location = input.location.clone();
    let latitude = input.coordinates.latitude;
    let longitude = input.coordinates.longitude;
    let hours = i64::from(input.hours.get());
    let session = input.owner.as_str().to_owned();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO posts (
             name, activity, location, latitude, longitude, hours,
             neighborhood, locality, district,
             created_at, start_time, expires_at, session_id
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10, ?11, ?12)",
          rusqlite::params![
            name,
            activity,
            location,
            latitude,
            longitude,
            hours,
            place.neighborhood,
            place.locality,
            place.district,
            at_str,
            expires_str,
            session,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Post {
      id:          PostId(id),
      name:        input.name,
      activity:    input.activity,
      location:    input.location,
      coordinates: input.coordinates,
      hours:       input.hours,
      place:       input.place.and_then(|p| p.non_empty()),
      created_at:  at,
      start_time:  at,
      owner:       input.owner,
    })
  }

  async fn get_post(&self, id: PostId) -> Result<Option<Post>> {
    let raw: Option<RawPost> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
              rusqlite::params![id.0],
              RawPost::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPost::into_post).transpose()
  }

  async fn delete_post(&self, id: PostId) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM posts WHERE id = ?1", rusqlite::params![id.0])?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn active_posts(&self, now: DateTime<Utc>) -> Result<Vec<Post>> {
    let now_str = encode_dt(now);

    let raws: Vec<RawPost> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {POST_COLUMNS} FROM posts
           WHERE expires_at > ?1
           ORDER BY created_at DESC, id DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![now_str], RawPost::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPost::into_post).collect()
  }
}

// ─── SubscriptionStore impl ──────────────────────────────────────────────────

impl SubscriptionStore for SqliteStore {
  type Error = crate::Error;

  async fn upsert_subscription(&self, input: NewSubscription) -> Result<Subscription> {
    let now_str = encode_dt(Utc::now());
    let session = input.session_id.map(|s| s.as_str().to_owned());

    let raw: RawSubscription = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          &format!(
            "INSERT INTO notification_subscriptions
               (endpoint, p256dh, auth, session_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(endpoint) DO UPDATE SET
               p256dh     = excluded.p256dh,
               auth       = excluded.auth,
               session_id = excluded.session_id,
               updated_at = excluded.updated_at
             RETURNING {SUBSCRIPTION_COLUMNS}"
          ),
          rusqlite::params![input.endpoint, input.keys.p256dh, input.keys.auth, session, now_str],
          RawSubscription::from_row,
        )?)
      })
      .await?;

    raw.into_subscription()
  }

  async fn delete_subscription<'a>(&'a self, endpoint: &'a str) -> Result<bool> {
    let endpoint = endpoint.to_owned();
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM notification_subscriptions WHERE endpoint = ?1",
          rusqlite::params![endpoint],
        )?)
      })
      .await?;
    Ok(deleted > 0)
  }

  async fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
    let raws: Vec<RawSubscription> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SUBSCRIPTION_COLUMNS} FROM notification_subscriptions ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map([], RawSubscription::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubscription::into_subscription).collect()
  }
}
