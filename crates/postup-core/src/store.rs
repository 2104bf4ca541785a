//! Storage and collaborator traits.
//!
//! [`PostStore`] and [`SubscriptionStore`] are implemented by storage
//! backends (e.g. `postup-store-sqlite`); [`Geocoder`] and [`Notifier`] by the
//! enrichment and push crates. The operations in [`crate::posts`] and
//! [`crate::visibility`] depend only on these abstractions.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  geo::Coordinates,
  notification::Notification,
  post::{NewPost, PlaceNames, Post, PostId},
  subscription::{NewSubscription, Subscription},
};

// ─── Posts ───────────────────────────────────────────────────────────────────

/// Durable post records.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait PostStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a post whose `created_at` and `start_time` are both `at`.
  fn insert_post(
    &self,
    input: NewPost,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Post, Self::Error>> + Send + '_;

  /// Retrieve a post by id, expired or not. Returns `None` if absent.
  fn get_post(
    &self,
    id: PostId,
  ) -> impl Future<Output = Result<Option<Post>, Self::Error>> + Send + '_;

  /// Delete a post unconditionally. Returns `false` if nothing was deleted.
  fn delete_post(
    &self,
    id: PostId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every post whose active window is still open at `now`, newest first.
  ///
  /// Backends may return a superset; callers re-check the window.
  fn active_posts(
    &self,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Post>, Self::Error>> + Send + '_;
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

/// Push endpoint registrations, keyed by endpoint URL.
pub trait SubscriptionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert, or replace the keys and session of an existing endpoint.
  fn upsert_subscription(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Remove an endpoint. Returns `false` if it was not registered.
  fn delete_subscription<'a>(
    &'a self,
    endpoint: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn list_subscriptions(
    &self,
  ) -> impl Future<Output = Result<Vec<Subscription>, Self::Error>> + Send + '_;
}

// ─── Collaborators ───────────────────────────────────────────────────────────

/// Reverse geocoding: coordinates to place names.
pub trait Geocoder: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// `Ok(None)` when the service knows nothing about `at` or is not
  /// configured.
  fn reverse(
    &self,
    at: Coordinates,
  ) -> impl Future<Output = Result<Option<PlaceNames>, Self::Error>> + Send + '_;
}

/// Hands a notification off for background delivery.
///
/// Implementations must return immediately and must not fail the caller.
pub trait Notifier: Send + Sync {
  fn broadcast(&self, notification: Notification);
}
