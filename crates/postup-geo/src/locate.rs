//! Observer location from a client IP address, via ip-api.com.
//!
//! Loopback addresses (local development) resolve to Los Angeles; anything
//! that cannot be resolved falls back to London.

use std::{net::IpAddr, time::Duration};

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Result;

pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com";

/// Where an observer is assumed to be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObserverLocation {
  pub latitude:  f64,
  pub longitude: f64,
  pub city:      Option<String>,
  pub country:   Option<String>,
}

impl ObserverLocation {
  pub fn los_angeles() -> Self {
    Self {
      latitude:  34.0522,
      longitude: -118.2437,
      city:      Some("Los Angeles".into()),
      country:   Some("USA".into()),
    }
  }

  pub fn london() -> Self {
    Self {
      latitude:  51.505,
      longitude: -0.09,
      city:      Some("London".into()),
      country:   Some("UK".into()),
    }
  }
}

/// `true` for addresses that identify the local machine.
pub fn is_local(ip: IpAddr) -> bool {
  match ip {
    IpAddr::V4(v4) => v4.is_loopback() || v4.is_unspecified(),
    IpAddr::V6(v6) => {
      v6.is_loopback()
        || v6.is_unspecified()
        || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
    }
  }
}

/// IP geolocation client. Cheap to clone.
#[derive(Clone)]
pub struct IpLocator {
  client:     Client,
  lookup_url: String,
}

impl IpLocator {
  pub fn new(lookup_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
    Ok(Self { client, lookup_url: lookup_url.into() })
  }

  /// Best guess at where `ip` is. Never fails.
  pub async fn locate(&self, ip: Option<IpAddr>) -> ObserverLocation {
    let Some(ip) = ip else {
      return ObserverLocation::london();
    };
    if is_local(ip) {
      return ObserverLocation::los_angeles();
    }

    match self.lookup(ip).await {
      Ok(Some(location)) => location,
      Ok(None) => ObserverLocation::london(),
      Err(e) => {
        tracing::warn!(error = %e, %ip, "ip geolocation failed");
        ObserverLocation::london()
      }
    }
  }

  async fn lookup(&self, ip: IpAddr) -> Result<Option<ObserverLocation>> {
    let url = format!("{}/json/{ip}", self.lookup_url.trim_end_matches('/'));
    let body = self
      .client
      .get(url)
      .query(&[("fields", "status,message,lat,lon,city,country")])
      .send()
      .await?
      .text()
      .await?;
    parse_lookup(&body)
  }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
  status:  String,
  message: Option<String>,
  lat:     Option<f64>,
  lon:     Option<f64>,
  city:    Option<String>,
  country: Option<String>,
}

/// Interpret an ip-api.com response body. `Ok(None)` for a failed lookup.
pub fn parse_lookup(body: &str) -> Result<Option<ObserverLocation>> {
  let resp: LookupResponse = serde_json::from_str(body)?;
  if resp.status != "success" {
    tracing::debug!(message = ?resp.message, "ip lookup unsuccessful");
    return Ok(None);
  }
  Ok(match (resp.lat, resp.lon) {
    (Some(latitude), Some(longitude)) => Some(ObserverLocation {
      latitude,
      longitude,
      city: resp.city,
      country: resp.country,
    }),
    _ => None,
  })
}
