//! The active-post visibility query.
//!
//! A post is visible to an observer when both hold:
//!
//! 1. its active window is still open: `now < start_time + hours`, and
//! 2. it lies within [`VISIBILITY_RADIUS_MILES`] of the observer.
//!
//! Expiry is lazy. Nothing is deleted here; expired rows are simply filtered
//! out on every read.

use chrono::{DateTime, Utc};

use crate::{Error, Result, geo::Coordinates, post::Post, store::PostStore};

/// Fixed search radius around the observer.
pub const VISIBILITY_RADIUS_MILES: f64 = 200.0;

/// The visibility predicate for a single post.
pub fn is_visible(post: &Post, observer: &Coordinates, now: DateTime<Utc>) -> bool {
  post.is_active_at(now)
    && observer.distance_miles(&post.coordinates) <= VISIBILITY_RADIUS_MILES
}

/// Keep the visible posts and order them newest first, ties broken by the
/// higher id.
pub fn select_visible(
  posts: impl IntoIterator<Item = Post>,
  observer: &Coordinates,
  now: DateTime<Utc>,
) -> Vec<Post> {
  let mut visible: Vec<Post> = posts
    .into_iter()
    .filter(|p| is_visible(p, observer, now))
    .collect();
  visible.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
  visible
}

/// All posts visible from `observer` at `now`.
pub async fn active_posts_near<S>(
  store: &S,
  observer: Coordinates,
  now: DateTime<Utc>,
) -> Result<Vec<Post>>
where
  S: PostStore,
{
  let candidates = store.active_posts(now).await.map_err(Error::storage)?;
  Ok(select_visible(candidates, &observer, now))
}
