//! The push notification announced when a post is created.

use serde::{Deserialize, Serialize};

use crate::post::Post;

/// A push message as the service worker consumes it: `{"title","body","url"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub title: String,
  pub body:  String,
  /// Opened when the notification is clicked.
  pub url:   String,
}

impl Notification {
  pub fn new(
    title: impl Into<String>,
    body: impl Into<String>,
    url: impl Into<String>,
  ) -> Self {
    Self { title: title.into(), body: body.into(), url: url.into() }
  }

  /// The announcement for a freshly created post.
  pub fn post_created(post: &Post, url: impl Into<String>) -> Self {
    Self::new(
      format!("{} posted up!", post.name),
      format!("{} @ {}", post.activity, post.location),
      url,
    )
  }

  /// Serialise as the JSON push payload.
  pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> { serde_json::to_vec(self) }
}
