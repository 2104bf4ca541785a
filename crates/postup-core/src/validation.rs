//! Validation of the create-post form.
//!
//! The payload is a JSON object whose fields are loosely typed: numbers may
//! arrive as JSON numbers or as numeric strings. Every field is checked and
//! all failures are reported together, keyed by field name.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  geo::{CoordinateError, Coordinates},
  post::Hours,
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Field name → human-readable message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
  pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
    self.0.entry(field).or_insert_with(|| message.into());
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn get(&self, field: &str) -> Option<&str> { self.0.get(field).map(String::as_str) }

  pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ { self.0.keys().copied() }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, message) in &self.0 {
      if !first {
        f.write_str("; ")?;
      }
      write!(f, "{field}: {message}")?;
      first = false;
    }
    Ok(())
  }
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// The raw create-post payload. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
  pub name:      Option<Value>,
  pub activity:  Option<Value>,
  pub location:  Option<Value>,
  pub latitude:  Option<Value>,
  pub longitude: Option<Value>,
  pub hours:     Option<Value>,
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
  pub name:        String,
  pub activity:    String,
  pub location:    String,
  pub coordinates: Coordinates,
  pub hours:       Hours,
}

impl PostForm {
  pub fn validate(&self) -> Result<PostDraft, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let name = required_text(&mut errors, "name", self.name.as_ref());
    let activity = required_text(&mut errors, "activity", self.activity.as_ref());
    let location = required_text(&mut errors, "location", self.location.as_ref());
    let latitude = required_number(&mut errors, "latitude", self.latitude.as_ref());
    let longitude = required_number(&mut errors, "longitude", self.longitude.as_ref());
    let hours = required_hours(&mut errors, self.hours.as_ref());

    let coordinates = match (latitude, longitude) {
      (Some(lat), Some(lon)) => match Coordinates::new(lat, lon) {
        Ok(c) => Some(c),
        Err(e @ CoordinateError::Latitude) => {
          errors.add("latitude", e.message());
          None
        }
        Err(e @ CoordinateError::Longitude) => {
          errors.add("longitude", e.message());
          None
        }
      },
      _ => None,
    };

    match (name, activity, location, coordinates, hours) {
      (Some(name), Some(activity), Some(location), Some(coordinates), Some(hours))
        if errors.is_empty() =>
      {
        Ok(PostDraft { name, activity, location, coordinates, hours })
      }
      _ => Err(errors),
    }
  }
}

// ─── Field helpers ───────────────────────────────────────────────────────────

fn required_text(
  errors: &mut ValidationErrors,
  field: &'static str,
  value: Option<&Value>,
) -> Option<String> {
  match value {
    Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
    Some(Value::String(_)) | Some(Value::Null) | None => {
      errors.add(field, format!("{field} is required"));
      None
    }
    Some(_) => {
      errors.add(field, format!("{field} must be text"));
      None
    }
  }
}

fn number_of(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  }
}

fn required_number(
  errors: &mut ValidationErrors,
  field: &'static str,
  value: Option<&Value>,
) -> Option<f64> {
  match value {
    None | Some(Value::Null) => {
      errors.add(field, format!("{field} is required"));
      None
    }
    Some(Value::String(s)) if s.trim().is_empty() => {
      errors.add(field, format!("{field} is required"));
      None
    }
    Some(v) => match number_of(v) {
      Some(n) => Some(n),
      None => {
        errors.add(field, format!("{field} must be a number"));
        None
      }
    },
  }
}

fn required_hours(errors: &mut ValidationErrors, value: Option<&Value>) -> Option<Hours> {
  let n = required_number(errors, "hours", value)?;
  if n.fract() != 0.0 {
    errors.add("hours", "hours must be a whole number");
    return None;
  }
  let hours = Hours::new(n as i64);
  if hours.is_none() {
    errors.add(
      "hours",
      format!("hours must be between {} and {}", Hours::MIN, Hours::MAX),
    );
  }
  hours
}
