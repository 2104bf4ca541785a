//! HTTP layer for postup.
//!
//! Exposes an axum [`Router`] serving the JSON API under `/api`, backed by
//! any store implementing both [`PostStore`] and [`SubscriptionStore`].
//! Every route runs behind the anonymous-session middleware in [`session`].

pub mod config;
pub mod error;
pub mod handlers;
pub mod keys;
pub mod session;

pub use config::ServerConfig;
pub use error::ApiError;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{delete, get, post},
};
use postup_core::store::{PostStore, SubscriptionStore};
use postup_geo::{IpLocator, MapboxGeocoder};
use postup_push::Broadcaster;
use tower_http::trace::TraceLayer;

use handlers::{location, notifications, posts};
use session::SessionCookie;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: PostStore + SubscriptionStore> {
  pub store:       Arc<S>,
  pub geocoder:    Arc<MapboxGeocoder>,
  pub locator:     Arc<IpLocator>,
  /// Queue for new-post notifications; disabled when push is not configured.
  pub broadcaster: Broadcaster,
  pub config:      Arc<ServerConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PostStore + SubscriptionStore + Clone + 'static,
{
  let cookie = Arc::new(SessionCookie::from_config(&state.config.session));

  Router::new()
    .route("/api/posts",                         get(posts::list::<S>).post(posts::create::<S>))
    .route("/api/posts/{id}",                    delete(posts::remove::<S>))
    .route("/api/notifications/subscribe",       post(notifications::subscribe::<S>))
    .route("/api/notifications/unsubscribe",     post(notifications::unsubscribe::<S>))
    .route("/api/notifications/vapid-public-key", get(notifications::public_key::<S>))
    .route("/api/location",                      get(location::locate::<S>))
    .layer(middleware::from_fn_with_state(cookie, session::resolve))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::{
    sync::Mutex,
    time::Duration,
  };

  use axum::{
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
  };
  use postup_core::{session::SessionId, subscription::Subscription};
  use postup_geo::{ObserverLocation, reverse::DEFAULT_BASE_URL};
  use postup_push::{DeliveryError, PushTransport};
  use postup_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tokio::sync::Notify;
  use tower::ServiceExt as _;

  use super::*;

  async fn make_state(public_key: Option<&str>) -> AppState<SqliteStore> {
    let mut config = ServerConfig::default();
    config.push.public_key = public_key.map(str::to_owned);
    AppState {
      store:       Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      geocoder:    Arc::new(MapboxGeocoder::new(DEFAULT_BASE_URL, None).unwrap()),
      locator:     Arc::new(IpLocator::new("http://unreachable.invalid").unwrap()),
      broadcaster: Broadcaster::disabled(),
      config:      Arc::new(config),
    }
  }

  struct Reply {
    status:  StatusCode,
    headers: HeaderMap,
    body:    Value,
  }

  impl Reply {
    /// The `name=value` pair of the session cookie set on this response.
    fn session_cookie(&self) -> Option<String> {
      self
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("postup_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_owned)
    }
  }

  async fn send(app: &Router, req: Request<Body>) -> Reply {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply { status, headers, body }
  }

  fn get_req(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
      builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
  }

  fn json_req(method: &str, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
      .method(method)
      .uri(uri)
      .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
      builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
  }

  fn delete_req(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::delete(uri);
    if let Some(cookie) = cookie {
      builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
  }

  fn post_body(hours: i64) -> Value {
    json!({
      "name": "Sam",
      "activity": "Pickup soccer",
      "location": "Echo Park",
      "latitude": 34.05,
      "longitude": -118.25,
      "hours": hours,
    })
  }

  const LA_QUERY: &str = "/api/posts?latitude=34.0522&longitude=-118.2437";

  /// Obtain a session cookie by making a throwaway request.
  async fn new_session(app: &Router) -> String {
    send(app, get_req(LA_QUERY, None)).await.session_cookie().unwrap()
  }

  // ─── Sessions ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn first_request_issues_session_cookie() {
    let app = router(make_state(None).await);

    let reply = send(&app, get_req(LA_QUERY, None)).await;
    assert_eq!(reply.status, StatusCode::OK);

    let set_cookie = reply.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"), "{set_cookie}");
    assert!(set_cookie.contains("SameSite=Lax"), "{set_cookie}");
    assert!(set_cookie.contains("Path=/"), "{set_cookie}");

    let cookie = reply.session_cookie().unwrap();
    let value = cookie.trim_start_matches("postup_session=");
    assert!(SessionId::parse(value).is_some());

    let again = send(&app, get_req(LA_QUERY, Some(&cookie))).await;
    assert_eq!(again.status, StatusCode::OK);
    assert!(again.session_cookie().is_none());
  }

  #[tokio::test]
  async fn forged_cookie_is_replaced() {
    let app = router(make_state(None).await);
    let reply = send(&app, get_req(LA_QUERY, Some("postup_session=not-a-session"))).await;
    let cookie = reply.session_cookie().unwrap();
    assert_ne!(cookie, "postup_session=not-a-session");
  }

  // ─── Posts ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn list_requires_valid_coordinates() {
    let app = router(make_state(None).await);
    for uri in [
      "/api/posts",
      "/api/posts?latitude=34.05",
      "/api/posts?latitude=91&longitude=0",
      "/api/posts?latitude=0&longitude=-181",
      "/api/posts?latitude=abc&longitude=0",
    ] {
      let reply = send(&app, get_req(uri, None)).await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST, "{uri}");
    }
  }

  #[tokio::test]
  async fn create_then_list_from_both_sides_of_the_world() {
    let app = router(make_state(None).await);
    let owner = new_session(&app).await;

    let created = send(&app, json_req("POST", "/api/posts", Some(&owner), post_body(2))).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["post"]["name"], "Sam");
    assert_eq!(created.body["post"]["hours"], 2);
    assert_eq!(created.body["post"]["isMine"], true);
    assert_eq!(created.body["post"]["neighborhood"], Value::Null);
    assert!(created.body["post"].get("sessionId").is_none());
    assert_eq!(created.body["posts"].as_array().unwrap().len(), 1);

    let id = created.body["post"]["id"].clone();

    let mine = send(&app, get_req(LA_QUERY, Some(&owner))).await;
    assert_eq!(mine.body["posts"][0]["id"], id);
    assert_eq!(mine.body["posts"][0]["isMine"], true);
    assert!(mine.body["posts"][0]["distanceMiles"].as_f64().unwrap() < 1.0);

    let stranger = new_session(&app).await;
    let theirs = send(&app, get_req(LA_QUERY, Some(&stranger))).await;
    assert_eq!(theirs.body["posts"][0]["isMine"], false);

    let london = send(&app, get_req("/api/posts?latitude=51.505&longitude=-0.09", None)).await;
    assert_eq!(london.body["posts"], json!([]));
  }

  #[tokio::test]
  async fn invalid_posts_are_rejected_field_by_field() {
    let app = router(make_state(None).await);

    for (hours, message) in [(0, "hours must be between 1 and 24"), (25, "hours must be between 1 and 24")] {
      let reply = send(&app, json_req("POST", "/api/posts", None, post_body(hours))).await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST);
      assert_eq!(reply.body["error"], "validation failed");
      assert_eq!(reply.body["fields"]["hours"], message);
    }

    let mut blank_name = post_body(3);
    blank_name["name"] = json!("   ");
    let reply = send(&app, json_req("POST", "/api/posts", None, blank_name)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["fields"]["name"].is_string());

    let listed = send(&app, get_req(LA_QUERY, None)).await;
    assert_eq!(listed.body["posts"], json!([]));
  }

  #[tokio::test]
  async fn unreadable_bodies_get_a_json_error() {
    let app = router(make_state(None).await);

    let urlencoded = Request::post("/api/posts")
      .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
      .body(Body::from("name=Sam&hours=2"))
      .unwrap();
    let reply = send(&app, urlencoded).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["error"].is_string());

    let truncated = Request::post("/api/posts")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(r#"{"name": "Sam""#))
      .unwrap();
    let reply = send(&app, truncated).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body["error"].is_string());

    let not_json = Request::post("/api/notifications/subscribe")
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from("endpoint=x"))
      .unwrap();
    let reply = send(&app, not_json).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["error"], "Invalid subscription data");
  }

  #[tokio::test]
  async fn only_the_owner_can_delete() {
    let app = router(make_state(None).await);
    let owner = new_session(&app).await;
    let stranger = new_session(&app).await;

    let created = send(&app, json_req("POST", "/api/posts", Some(&owner), post_body(3))).await;
    let id = created.body["post"]["id"].as_i64().unwrap();
    let uri = format!("/api/posts/{id}");

    let forbidden = send(&app, delete_req(&uri, Some(&stranger))).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(send(&app, get_req(LA_QUERY, None)).await.body["posts"].as_array().unwrap().len(), 1);

    let deleted = send(&app, delete_req(&uri, Some(&owner))).await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["posts"], json!([]));

    let again = send(&app, delete_req(&uri, Some(&owner))).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn delete_edge_cases() {
    let app = router(make_state(None).await);
    let owner = new_session(&app).await;

    let malformed = send(&app, delete_req("/api/posts/not-a-number", Some(&owner))).await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);

    let missing = send(&app, delete_req("/api/posts/4242", Some(&owner))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    // The refreshed list is seen from the coordinates given, if any.
    let keep = send(&app, json_req("POST", "/api/posts", Some(&owner), post_body(3))).await;
    let gone = send(&app, json_req("POST", "/api/posts", Some(&owner), post_body(3))).await;
    let uri = format!(
      "/api/posts/{}?latitude=51.505&longitude=-0.09",
      gone.body["post"]["id"].as_i64().unwrap()
    );
    let reply = send(&app, delete_req(&uri, Some(&owner))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["posts"], json!([]));

    let remaining = send(&app, get_req(LA_QUERY, None)).await;
    assert_eq!(remaining.body["posts"][0]["id"], keep.body["post"]["id"]);
  }

  // ─── Notifications ─────────────────────────────────────────────────────────

  fn subscription_body(p256dh: &str) -> Value {
    json!({
      "endpoint": "https://push.example/device-1",
      "keys": { "p256dh": p256dh, "auth": "auth-secret" },
    })
  }

  #[tokio::test]
  async fn subscribe_upserts_by_endpoint() {
    let state = make_state(None).await;
    let store = Arc::clone(&state.store);
    let app = router(state);
    let cookie = new_session(&app).await;

    for key in ["key-1", "key-2"] {
      let reply = send(
        &app,
        json_req("POST", "/api/notifications/subscribe", Some(&cookie), subscription_body(key)),
      )
      .await;
      assert_eq!(reply.status, StatusCode::OK);
      assert_eq!(reply.body, json!({ "success": true }));
    }

    let all = store.list_subscriptions().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].keys.p256dh, "key-2");
    let session = SessionId::parse(cookie.trim_start_matches("postup_session=")).unwrap();
    assert_eq!(all[0].session_id, Some(session));
  }

  #[tokio::test]
  async fn incomplete_subscription_is_rejected() {
    let state = make_state(None).await;
    let store = Arc::clone(&state.store);
    let app = router(state);

    for body in [
      json!({ "endpoint": "https://push.example/x" }),
      json!({ "endpoint": "https://push.example/x", "keys": { "p256dh": "k" } }),
      json!({ "keys": { "p256dh": "k", "auth": "a" } }),
      json!({}),
    ] {
      let reply = send(&app, json_req("POST", "/api/notifications/subscribe", None, body)).await;
      assert_eq!(reply.status, StatusCode::BAD_REQUEST);
      assert_eq!(reply.body["error"], "Invalid subscription data");
    }
    assert!(store.list_subscriptions().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn unsubscribe_is_idempotent() {
    let state = make_state(None).await;
    let store = Arc::clone(&state.store);
    let app = router(state);

    send(&app, json_req("POST", "/api/notifications/subscribe", None, subscription_body("k"))).await;

    for _ in 0..2 {
      let reply = send(
        &app,
        json_req(
          "POST",
          "/api/notifications/unsubscribe",
          None,
          json!({ "endpoint": "https://push.example/device-1" }),
        ),
      )
      .await;
      assert_eq!(reply.status, StatusCode::OK);
      assert_eq!(reply.body, json!({ "success": true }));
    }
    assert!(store.list_subscriptions().await.unwrap().is_empty());

    let missing = send(&app, json_req("POST", "/api/notifications/unsubscribe", None, json!({}))).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn public_key_endpoint() {
    let app = router(make_state(None).await);
    let reply = send(&app, get_req("/api/notifications/vapid-public-key", None)).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(reply.body["error"].is_string());

    let app = router(make_state(Some("BPublicKey")).await);
    let reply = send(&app, get_req("/api/notifications/vapid-public-key", None)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, json!({ "publicKey": "BPublicKey" }));
  }

  #[derive(Default)]
  struct RecordingTransport {
    sent:      Mutex<Vec<(String, Vec<u8>)>>,
    delivered: Notify,
  }

  impl PushTransport for RecordingTransport {
    async fn deliver<'a>(
      &'a self,
      subscription: &'a Subscription,
      payload: &'a [u8],
    ) -> Result<(), DeliveryError> {
      self
        .sent
        .lock()
        .unwrap()
        .push((subscription.endpoint.clone(), payload.to_vec()));
      self.delivered.notify_one();
      Ok(())
    }
  }

  #[tokio::test]
  async fn new_post_is_pushed_to_subscribers() {
    let mut state = make_state(None).await;
    let transport = Arc::new(RecordingTransport::default());
    let (broadcaster, _worker) = Broadcaster::spawn(Arc::clone(&state.store), Arc::clone(&transport));
    state.broadcaster = broadcaster;
    let app = router(state);

    send(&app, json_req("POST", "/api/notifications/subscribe", None, subscription_body("k"))).await;
    let created = send(&app, json_req("POST", "/api/posts", None, post_body(2))).await;
    assert_eq!(created.status, StatusCode::CREATED);

    tokio::time::timeout(Duration::from_secs(5), transport.delivered.notified())
      .await
      .expect("push delivered");

    let sent = transport.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "https://push.example/device-1");
    let payload: Value = serde_json::from_slice(&sent[0].1).unwrap();
    assert_eq!(
      payload,
      json!({ "title": "Sam posted up!", "body": "Pickup soccer @ Echo Park", "url": "/" })
    );
  }

  // ─── Location ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn location_defaults() {
    let app = router(make_state(None).await);

    let unknown = send(&app, get_req("/api/location", None)).await;
    assert_eq!(unknown.status, StatusCode::OK);
    assert_eq!(unknown.body, serde_json::to_value(ObserverLocation::london()).unwrap());

    let local = Request::get("/api/location")
      .header("x-forwarded-for", "127.0.0.1")
      .body(Body::empty())
      .unwrap();
    let local = send(&app, local).await;
    assert_eq!(local.body, serde_json::to_value(ObserverLocation::los_angeles()).unwrap());
  }
}
