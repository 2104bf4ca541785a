//! Error types for `postup-push`.

use thiserror::Error;

/// A failure that aborts a whole fan-out before any delivery is attempted.
#[derive(Debug, Error)]
pub enum Error {
  #[error("subscription store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("payload encoding error: {0}")]
  Payload(#[from] serde_json::Error),

  #[error("invalid VAPID key: {0}")]
  InvalidKey(String),

  #[error("push client error: {0}")]
  Client(#[from] web_push::WebPushError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Outcome of a single failed delivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
  /// The push service says the endpoint no longer exists (404 / 410). The
  /// subscription should be dropped.
  #[error("endpoint gone")]
  Gone,

  /// Anything else; the subscription is kept.
  #[error("delivery failed: {0}")]
  Transient(String),
}
