//! Runtime configuration, deserialised from `config.toml` and `POSTUP_*`
//! environment variables.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  pub session:    SessionConfig,
  pub push:       PushConfig,
  pub geocoding:  GeocodingConfig,
  pub location:   LocationConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       3000,
      store_path: PathBuf::from("~/.local/share/postup/postup.db"),
      session:    SessionConfig::default(),
      push:       PushConfig::default(),
      geocoding:  GeocodingConfig::default(),
      location:   LocationConfig::default(),
    }
  }
}

/// The anonymous-session cookie.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
  pub cookie_name:  String,
  pub max_age_days: i64,
  /// Set the `Secure` attribute; enable behind HTTPS.
  pub secure:       bool,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self { cookie_name: "postup_session".to_string(), max_age_days: 365, secure: false }
  }
}

/// Web Push. Notifications are only sent when both keys are present.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PushConfig {
  /// base64url uncompressed P-256 point, handed to browsers.
  pub public_key:       Option<String>,
  /// PEM file holding the matching private key.
  pub private_key_path: Option<PathBuf>,
  /// VAPID `sub` claim, e.g. `mailto:admin@example.com`.
  pub contact:          Option<String>,
  pub ttl_seconds:      u32,
  /// Opened when a notification is clicked.
  pub notification_url: String,
}

impl Default for PushConfig {
  fn default() -> Self {
    Self {
      public_key:       None,
      private_key_path: None,
      contact:          None,
      ttl_seconds:      24 * 60 * 60,
      notification_url: "/".to_string(),
    }
  }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocodingConfig {
  /// Without a token posts are stored without place names.
  pub mapbox_token: Option<String>,
  pub base_url:     String,
}

impl Default for GeocodingConfig {
  fn default() -> Self {
    Self { mapbox_token: None, base_url: postup_geo::reverse::DEFAULT_BASE_URL.to_string() }
  }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LocationConfig {
  pub lookup_url: String,
}

impl Default for LocationConfig {
  fn default() -> Self {
    Self { lookup_url: postup_geo::locate::DEFAULT_LOOKUP_URL.to_string() }
  }
}
