//! `/api/posts`: list, create, delete.

use axum::{
  Json,
  extract::{Path, Query, State, rejection::JsonRejection},
  http::StatusCode,
};
use chrono::{DateTime, Utc};
use postup_core::{
  geo::Coordinates,
  post::{Post, PostId},
  posts::{create_post, delete_post},
  session::SessionId,
  store::{PostStore, SubscriptionStore},
  validation::PostForm,
  visibility::active_posts_near,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, session::Session};

// ─── Wire types ──────────────────────────────────────────────────────────────

/// A post as one particular viewer sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
  pub id:             PostId,
  pub name:           String,
  pub activity:       String,
  pub location:       String,
  pub latitude:       f64,
  pub longitude:      f64,
  pub hours:          u8,
  pub neighborhood:   Option<String>,
  pub locality:       Option<String>,
  pub district:       Option<String>,
  pub created_at:     DateTime<Utc>,
  pub start_time:     DateTime<Utc>,
  pub expires_at:     DateTime<Utc>,
  pub distance_miles: f64,
  /// Whether the viewer's session created the post and may delete it.
  pub is_mine:        bool,
}

impl PostView {
  pub fn new(post: Post, observer: &Coordinates, viewer: &SessionId) -> Self {
    let place = post.place.clone().unwrap_or_default();
    Self {
      id:             post.id,
      latitude:       post.coordinates.latitude,
      longitude:      post.coordinates.longitude,
      hours:          post.hours.get(),
      neighborhood:   place.neighborhood,
      locality:       place.locality,
      district:       place.district,
      created_at:     post.created_at,
      start_time:     post.start_time,
      expires_at:     post.expires_at(),
      distance_miles: observer.distance_miles(&post.coordinates),
      is_mine:        post.is_owned_by(viewer),
      name:           post.name,
      activity:       post.activity,
      location:       post.location,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct PostList {
  pub posts: Vec<PostView>,
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub post:  PostView,
  pub posts: Vec<PostView>,
}

/// Optional observer position in the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ObserverQuery {
  pub latitude:  Option<f64>,
  pub longitude: Option<f64>,
}

impl ObserverQuery {
  /// `Ok(None)` when neither half is given. Half a pair is an error.
  fn coordinates(&self) -> Result<Option<Coordinates>, ApiError> {
    match (self.latitude, self.longitude) {
      (None, None) => Ok(None),
      (Some(latitude), Some(longitude)) => Coordinates::new(latitude, longitude)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(e.message().into())),
      _ => Err(ApiError::BadRequest("latitude and longitude must be given together".into())),
    }
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn visible_from<S>(
  store: &S,
  observer: Coordinates,
  viewer: &SessionId,
) -> Result<Vec<PostView>, ApiError>
where
  S: PostStore,
{
  let posts = active_posts_near(store, observer, Utc::now()).await?;
  Ok(
    posts
      .into_iter()
      .map(|post| PostView::new(post, &observer, viewer))
      .collect(),
  )
}

/// `GET /api/posts?latitude=&longitude=`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Session(session): Session,
  Query(query): Query<ObserverQuery>,
) -> Result<Json<PostList>, ApiError>
where
  S: PostStore + SubscriptionStore + Clone + 'static,
{
  let observer = query
    .coordinates()?
    .ok_or_else(|| ApiError::BadRequest("latitude and longitude are required".into()))?;

  let posts = visible_from(&*state.store, observer, &session).await?;
  Ok(Json(PostList { posts }))
}

/// `POST /api/posts`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Session(session): Session,
  form: Result<Json<PostForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>), ApiError>
where
  S: PostStore + SubscriptionStore + Clone + 'static,
{
  let Json(form) = form?;
  let post = create_post(
    &*state.store,
    &*state.geocoder,
    &state.broadcaster,
    session.clone(),
    &form,
    &state.config.push.notification_url,
  )
  .await?;

  let observer = post.coordinates;
  let posts = visible_from(&*state.store, observer, &session).await?;
  let post = PostView::new(post, &observer, &session);

  Ok((StatusCode::CREATED, Json(Created { post, posts })))
}

/// `DELETE /api/posts/{id}[?latitude=&longitude=]`
///
/// Answers with the refreshed list, seen from the given coordinates or, when
/// none are given, from where the deleted post was.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Session(session): Session,
  Path(raw_id): Path<String>,
  Query(query): Query<ObserverQuery>,
) -> Result<Json<PostList>, ApiError>
where
  S: PostStore + SubscriptionStore + Clone + 'static,
{
  let id = raw_id
    .trim()
    .parse::<i64>()
    .map(PostId)
    .map_err(|_| ApiError::BadRequest(format!("invalid post id: {raw_id:?}")))?;
  let observer = query.coordinates()?;

  let deleted = delete_post(&*state.store, id, &session).await?;

  let observer = observer.unwrap_or(deleted.coordinates);
  let posts = visible_from(&*state.store, observer, &session).await?;
  Ok(Json(PostList { posts }))
}
