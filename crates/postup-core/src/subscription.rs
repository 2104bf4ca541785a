//! Push subscription registrations, keyed by endpoint URL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::SessionId;

/// The two keys a browser hands out with a push subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushKeys {
  /// Client public key (P-256, base64url).
  pub p256dh: String,
  /// Client auth secret (base64url).
  pub auth:   String,
}

/// A stored push endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
  /// Unique; acts as the primary key.
  pub endpoint:   String,
  pub keys:       PushKeys,
  pub session_id: Option<SessionId>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::SubscriptionStore::upsert_subscription`].
#[derive(Debug, Clone)]
pub struct NewSubscription {
  pub endpoint:   String,
  pub keys:       PushKeys,
  pub session_id: Option<SessionId>,
}

/// A subscription payload exactly as the browser's `PushSubscription.toJSON()`
/// produces it; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubscriptionForm {
  pub endpoint: Option<String>,
  pub keys:     Option<KeysForm>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysForm {
  pub p256dh: Option<String>,
  pub auth:   Option<String>,
}

impl SubscriptionForm {
  /// Returns `None` if the endpoint or either key is missing or blank.
  pub fn into_new(self, session_id: Option<SessionId>) -> Option<NewSubscription> {
    let endpoint = non_blank(self.endpoint)?;
    let keys = self.keys?;
    Some(NewSubscription {
      endpoint,
      keys: PushKeys { p256dh: non_blank(keys.p256dh)?, auth: non_blank(keys.auth)? },
      session_id,
    })
  }
}

fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}
