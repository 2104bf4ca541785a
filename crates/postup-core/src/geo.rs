//! Coordinates and great-circle distance.

use serde::Serialize;

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Both halves are always present together; construction through
/// [`Coordinates::new`] guarantees they are finite and in range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
  pub latitude:  f64,
  pub longitude: f64,
}

/// Why a latitude/longitude pair was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateError {
  Latitude,
  Longitude,
}

impl CoordinateError {
  pub fn message(self) -> &'static str {
    match self {
      Self::Latitude => "latitude must be between -90 and 90",
      Self::Longitude => "longitude must be between -180 and 180",
    }
  }
}

impl Coordinates {
  pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
      return Err(CoordinateError::Latitude);
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
      return Err(CoordinateError::Longitude);
    }
    Ok(Self { latitude, longitude })
  }

  /// Great-circle distance to `other` in miles, by the spherical law of
  /// cosines.
  pub fn distance_miles(&self, other: &Coordinates) -> f64 {
    let phi1 = self.latitude.to_radians();
    let phi2 = other.latitude.to_radians();
    let delta_lambda = (other.longitude - self.longitude).to_radians();

    let cosine = phi1.sin() * phi2.sin()
      + phi1.cos() * phi2.cos() * delta_lambda.cos();

    // Rounding can push the cosine a hair past 1 for identical points.
    EARTH_RADIUS_MILES * cosine.clamp(-1.0, 1.0).acos()
  }
}
