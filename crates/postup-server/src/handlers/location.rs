//! `GET /api/location`: a best guess at where the caller is.

use std::net::{IpAddr, SocketAddr};

use axum::{
  Json,
  extract::{ConnectInfo, Request, State},
  http::HeaderMap,
};
use postup_core::store::{PostStore, SubscriptionStore};
use postup_geo::ObserverLocation;

use crate::AppState;

pub async fn locate<S>(
  State(state): State<AppState<S>>,
  req: Request,
) -> Json<ObserverLocation>
where
  S: PostStore + SubscriptionStore + Clone + 'static,
{
  // Absent when the server is not run with connect info (e.g. in tests).
  let peer = req
    .extensions()
    .get::<ConnectInfo<SocketAddr>>()
    .map(|ConnectInfo(addr)| addr.ip());
  let ip = client_ip(req.headers(), peer);
  Json(state.locator.locate(ip).await)
}

/// First `X-Forwarded-For` entry if it parses, else the socket peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> Option<IpAddr> {
  headers
    .get("x-forwarded-for")
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.split(',').next())
    .and_then(|first| first.trim().parse().ok())
    .or(peer)
}
