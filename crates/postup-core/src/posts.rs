//! Post mutations: create and delete.

use chrono::Utc;

use crate::{
  Error, Result,
  notification::Notification,
  post::{NewPost, Post, PostId},
  session::SessionId,
  store::{Geocoder, Notifier, PostStore},
  validation::PostForm,
};

/// Validate `form`, enrich it with place names, persist it for `owner`, and
/// announce it.
///
/// Geocoding is best-effort: a failure is logged and the post is stored
/// without place names. The announcement is handed to `notifier` only after
/// the insert succeeds and its outcome never reaches the caller.
pub async fn create_post<S, G, N>(
  store: &S,
  geocoder: &G,
  notifier: &N,
  owner: SessionId,
  form: &PostForm,
  notification_url: &str,
) -> Result<Post>
where
  S: PostStore,
  G: Geocoder,
  N: Notifier,
{
  let draft = form.validate()?;

  let place = match geocoder.reverse(draft.coordinates).await {
    Ok(place) => place.and_then(|p| p.non_empty()),
    Err(e) => {
      tracing::warn!(error = %e, "reverse geocoding failed; storing post without place names");
      None
    }
  };

  let input = NewPost {
    name: draft.name,
    activity: draft.activity,
    location: draft.location,
    coordinates: draft.coordinates,
    hours: draft.hours,
    place,
    owner,
  };

  let post = store.insert_post(input, Utc::now()).await.map_err(Error::storage)?;
  tracing::info!(post_id = %post.id, hours = post.hours.get(), "post created");

  notifier.broadcast(Notification::post_created(&post, notification_url));
  Ok(post)
}

/// Delete `id` on behalf of `caller`, returning the removed post.
///
/// Only the owning session may delete; expiry does not matter.
pub async fn delete_post<S>(store: &S, id: PostId, caller: &SessionId) -> Result<Post>
where
  S: PostStore,
{
  let post = store
    .get_post(id)
    .await
    .map_err(Error::storage)?
    .ok_or(Error::PostNotFound(id))?;

  if !post.is_owned_by(caller) {
    return Err(Error::Forbidden(id));
  }

  // A concurrent delete may have won the race since the read above.
  if !store.delete_post(id).await.map_err(Error::storage)? {
    return Err(Error::PostNotFound(id));
  }

  tracing::info!(post_id = %id, "post deleted");
  Ok(post)
}
