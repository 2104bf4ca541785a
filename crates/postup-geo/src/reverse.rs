//! Reverse geocoding through the Mapbox Geocoding API (v6).
//!
//! `GET {base_url}/search/geocode/v6/reverse?longitude=..&latitude=..&access_token=..`
//!
//! Only the first feature's `properties.context` is read; its
//! `neighborhood`, `locality` and `district` entries become
//! [`PlaceNames`].

use std::time::Duration;

use postup_core::{geo::Coordinates, post::PlaceNames, store::Geocoder};
use reqwest::Client;
use serde::Deserialize;

use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://api.mapbox.com";

/// Mapbox reverse geocoder. Without an access token it answers every lookup
/// with `Ok(None)` and never touches the network.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct MapboxGeocoder {
  client:       Client,
  base_url:     String,
  access_token: Option<String>,
}

impl MapboxGeocoder {
  pub fn new(base_url: impl Into<String>, access_token: Option<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
      access_token: access_token.filter(|t| !t.trim().is_empty()),
    })
  }

  pub fn is_configured(&self) -> bool { self.access_token.is_some() }

  fn url(&self) -> String {
    format!("{}/search/geocode/v6/reverse", self.base_url.trim_end_matches('/'))
  }
}

impl Geocoder for MapboxGeocoder {
  type Error = crate::Error;

  async fn reverse(&self, at: Coordinates) -> Result<Option<PlaceNames>> {
    let Some(token) = &self.access_token else {
      return Ok(None);
    };

    let body = self
      .client
      .get(self.url())
      .query(&[
        ("longitude", at.longitude.to_string()),
        ("latitude", at.latitude.to_string()),
        ("access_token", token.clone()),
      ])
      .send()
      .await?
      .error_for_status()?
      .text()
      .await?;

    let place = parse_reverse(&body)?;
    tracing::debug!(?place, "reverse geocoded");
    Ok(place)
  }
}

// ─── Response shape ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FeatureCollection {
  #[serde(default)]
  features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
  #[serde(default)]
  properties: Properties,
}

#[derive(Debug, Default, Deserialize)]
struct Properties {
  #[serde(default)]
  context: Context,
}

#[derive(Debug, Default, Deserialize)]
struct Context {
  neighborhood: Option<Named>,
  locality:     Option<Named>,
  district:     Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
  name: Option<String>,
}

fn name_of(entry: Option<Named>) -> Option<String> {
  entry
    .and_then(|n| n.name)
    .map(|n| n.trim().to_owned())
    .filter(|n| !n.is_empty())
}

/// Extract place names from a reverse-geocoding response body.
pub fn parse_reverse(body: &str) -> Result<Option<PlaceNames>> {
  let collection: FeatureCollection = serde_json::from_str(body)?;
  let Some(feature) = collection.features.into_iter().next() else {
    return Ok(None);
  };
  let context = feature.properties.context;

  Ok(
    PlaceNames {
      neighborhood: name_of(context.neighborhood),
      locality:     name_of(context.locality),
      district:     name_of(context.district),
    }
    .non_empty(),
  )
}
