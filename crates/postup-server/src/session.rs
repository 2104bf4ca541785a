//! Anonymous sessions carried in a cookie.
//!
//! [`resolve`] runs in front of every route. It reads the session cookie,
//! and when the cookie is missing or does not hold a well-formed id it mints
//! a fresh [`SessionId`] and sets the cookie on the response. Handlers read
//! the resolved id with the [`Session`] extractor.
//!
//! The id is both the visitor's identity and their credential for deleting
//! their own posts; it is never sent back in a response body.

use std::{convert::Infallible, sync::Arc};

use axum::{
  extract::{FromRequestParts, Request, State},
  http::request::Parts,
  middleware::Next,
  response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use postup_core::session::SessionId;

use crate::config::SessionConfig;

/// How the session cookie is named and stamped.
#[derive(Debug, Clone)]
pub struct SessionCookie {
  name:    String,
  max_age: time::Duration,
  secure:  bool,
}

impl SessionCookie {
  pub fn from_config(cfg: &SessionConfig) -> Self {
    Self {
      name:    cfg.cookie_name.clone(),
      max_age: time::Duration::days(cfg.max_age_days),
      secure:  cfg.secure,
    }
  }

  /// The session carried by `jar`, if any. Malformed values are ignored.
  pub fn read(&self, jar: &CookieJar) -> Option<SessionId> {
    jar.get(&self.name).and_then(|c| SessionId::parse(c.value()))
  }

  pub fn build(&self, id: &SessionId) -> Cookie<'static> {
    Cookie::build((self.name.clone(), id.to_string()))
      .path("/")
      .http_only(true)
      .same_site(SameSite::Lax)
      .secure(self.secure)
      .max_age(self.max_age)
      .build()
  }
}

/// Middleware: attach a [`SessionId`] to every request, issuing one if needed.
pub async fn resolve(
  State(cookie): State<Arc<SessionCookie>>,
  jar: CookieJar,
  mut req: Request,
  next: Next,
) -> Response {
  match cookie.read(&jar) {
    Some(id) => {
      req.extensions_mut().insert(id);
      next.run(req).await
    }
    None => {
      let id = SessionId::generate();
      tracing::debug!(session = %id, "issuing new session");
      req.extensions_mut().insert(id.clone());
      let response = next.run(req).await;
      (jar.add(cookie.build(&id)), response).into_response()
    }
  }
}

/// The caller's session, as resolved by [`resolve`].
#[derive(Debug, Clone)]
pub struct Session(pub SessionId);

impl<S> FromRequestParts<S> for Session
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    match parts.extensions.get::<SessionId>() {
      Some(id) => Ok(Session(id.clone())),
      None => {
        // Only reachable for routes mounted outside the session layer.
        tracing::warn!("no session resolved for request; using a throwaway id");
        Ok(Session(SessionId::generate()))
      }
    }
  }
}
