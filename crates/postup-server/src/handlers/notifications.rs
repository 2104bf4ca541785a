//! `/api/notifications/*`: push subscription management.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use postup_core::{
  store::{PostStore, SubscriptionStore},
  subscription::SubscriptionForm,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{AppState, error::ApiError, session::Session};

/// `POST /api/notifications/subscribe`
///
/// Registers the browser's push endpoint, replacing the keys if the endpoint
/// is already known.
pub async fn subscribe<S>(
  State(state): State<AppState<S>>,
  Session(session): Session,
  form: Result<Json<SubscriptionForm>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore + SubscriptionStore + Clone + 'static,
{
  let invalid = || ApiError::BadRequest("Invalid subscription data".into());
  let Json(form) = form.map_err(|_| invalid())?;
  let input = form
    .into_new(Some(session))
    .ok_or_else(invalid)?;

  let endpoint = input.endpoint.clone();
  state
    .store
    .upsert_subscription(input)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(%endpoint, "push subscription saved");
  Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Default, Deserialize)]
pub struct UnsubscribeBody {
  pub endpoint: Option<String>,
}

/// `POST /api/notifications/unsubscribe`. Unknown endpoints are not an error.
pub async fn unsubscribe<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<UnsubscribeBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: PostStore + SubscriptionStore + Clone + 'static,
{
  let Json(body) = body?;
  let endpoint = body
    .endpoint
    .map(|e| e.trim().to_owned())
    .filter(|e| !e.is_empty())
    .ok_or_else(|| ApiError::BadRequest("endpoint is required".into()))?;

  let removed = state
    .store
    .delete_subscription(&endpoint)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(%endpoint, removed, "push subscription removed");
  Ok(Json(json!({ "success": true })))
}

/// `GET /api/notifications/vapid-public-key`
pub async fn public_key<S>(State(state): State<AppState<S>>) -> Result<Json<Value>, ApiError>
where
  S: PostStore + SubscriptionStore + Clone + 'static,
{
  let key = state
    .config
    .push
    .public_key
    .as_deref()
    .filter(|k| !k.trim().is_empty())
    .ok_or(ApiError::Unconfigured("VAPID public key not configured"))?;

  Ok(Json(json!({ "publicKey": key })))
}
