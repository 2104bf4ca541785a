//! In-memory collaborators for unit tests.

use std::{
  convert::Infallible,
  sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
  geo::Coordinates,
  notification::Notification,
  post::{NewPost, PlaceNames, Post, PostId},
  store::{Geocoder, Notifier, PostStore},
};

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<(i64, Vec<Post>)>,
}

impl MemoryStore {
  fn lock(&self) -> MutexGuard<'_, (i64, Vec<Post>)> { self.inner.lock().unwrap() }

  pub fn is_empty(&self) -> bool { self.lock().1.is_empty() }
}

impl PostStore for MemoryStore {
  type Error = Infallible;

  async fn insert_post(&self, input: NewPost, at: DateTime<Utc>) -> Result<Post, Infallible> {
    let mut inner = self.lock();
    inner.0 += 1;
    let post = Post {
      id:          PostId(inner.0),
      name:        input.name,
      activity:    input.activity,
      location:    input.location,
      coordinates: input.coordinates,
      hours:       input.hours,
      place:       input.place,
      created_at:  at,
      start_time:  at,
      owner:       input.owner,
    };
    inner.1.push(post.clone());
    Ok(post)
  }

  async fn get_post(&self, id: PostId) -> Result<Option<Post>, Infallible> {
    Ok(self.lock().1.iter().find(|p| p.id == id).cloned())
  }

  async fn delete_post(&self, id: PostId) -> Result<bool, Infallible> {
    let mut inner = self.lock();
    let before = inner.1.len();
    inner.1.retain(|p| p.id != id);
    Ok(inner.1.len() != before)
  }

  async fn active_posts(&self, now: DateTime<Utc>) -> Result<Vec<Post>, Infallible> {
    Ok(self.lock().1.iter().filter(|p| p.is_active_at(now)).cloned().collect())
  }
}

#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<Notification>>);

impl RecordingNotifier {
  pub fn sent(&self) -> Vec<Notification> { self.0.lock().unwrap().clone() }
}

impl Notifier for RecordingNotifier {
  fn broadcast(&self, notification: Notification) { self.0.lock().unwrap().push(notification); }
}

pub struct FixedGeocoder(pub Option<PlaceNames>);

impl Geocoder for FixedGeocoder {
  type Error = Infallible;

  async fn reverse(&self, _: Coordinates) -> Result<Option<PlaceNames>, Infallible> {
    Ok(self.0.clone())
  }
}

#[derive(Debug, Error)]
#[error("geocoder unavailable")]
pub struct Unavailable;

pub struct FailingGeocoder;

impl Geocoder for FailingGeocoder {
  type Error = Unavailable;

  async fn reverse(&self, _: Coordinates) -> Result<Option<PlaceNames>, Unavailable> {
    Err(Unavailable)
  }
}
