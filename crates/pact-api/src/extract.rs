//! Request extractors for the acting user and the caller's address.
//!
//! Identity is established upstream; the gateway forwards the authenticated
//! user id in the `x-user-id` header.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
  extract::{ConnectInfo, FromRequestParts},
  http::{HeaderMap, request::Parts},
};
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// The authenticated user performing the request.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Uuid);

/// Parse the acting user from headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
  headers
    .get(USER_ID_HEADER)
    .and_then(|v| v.to_str().ok())
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .map(Actor)
    .ok_or(ApiError::Unauthorized)
}

impl<S> FromRequestParts<S> for Actor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    actor_from_headers(&parts.headers)
  }
}

/// Best-effort client address recorded with a signature: the first
/// `X-Forwarded-For` hop, then the socket peer, then `"unknown"`.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S> FromRequestParts<S> for ClientIp
where
  S: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let forwarded = parts
      .headers
      .get(FORWARDED_FOR_HEADER)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| s.split(',').next())
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned);

    let ip = forwarded
      .or_else(|| {
        parts
          .extensions
          .get::<ConnectInfo<SocketAddr>>()
          .map(|ConnectInfo(addr)| addr.ip().to_string())
      })
      .unwrap_or_else(|| "unknown".to_owned());

    Ok(ClientIp(ip))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;

  use super::*;

  async fn parts(req: Request<()>) -> Parts { req.into_parts().0 }

  #[tokio::test]
  async fn actor_from_valid_header() {
    let id = Uuid::new_v4();
    let mut p = parts(
      Request::builder()
        .header(USER_ID_HEADER, id.to_string())
        .body(())
        .unwrap(),
    )
    .await;
    let Actor(actor) = Actor::from_request_parts(&mut p, &()).await.unwrap();
    assert_eq!(actor, id);
  }

  #[tokio::test]
  async fn missing_or_malformed_actor_is_unauthorized() {
    let mut p = parts(Request::builder().body(()).unwrap()).await;
    assert!(matches!(
      Actor::from_request_parts(&mut p, &()).await,
      Err(ApiError::Unauthorized)
    ));

    let mut p = parts(
      Request::builder()
        .header(USER_ID_HEADER, "not-a-uuid")
        .body(())
        .unwrap(),
    )
    .await;
    assert!(matches!(
      Actor::from_request_parts(&mut p, &()).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn client_ip_prefers_first_forwarded_hop() {
    let mut p = parts(
      Request::builder()
        .header(FORWARDED_FOR_HEADER, "203.0.113.5, 10.0.0.1")
        .body(())
        .unwrap(),
    )
    .await;
    let ClientIp(ip) = ClientIp::from_request_parts(&mut p, &()).await.unwrap();
    assert_eq!(ip, "203.0.113.5");
  }

  #[tokio::test]
  async fn client_ip_falls_back_to_peer_then_unknown() {
    let mut req = Request::builder().body(()).unwrap();
    req
      .extensions_mut()
      .insert(ConnectInfo(SocketAddr::from(([198, 51, 100, 7], 4000))));
    let mut p = parts(req).await;
    let ClientIp(ip) = ClientIp::from_request_parts(&mut p, &()).await.unwrap();
    assert_eq!(ip, "198.51.100.7");

    let mut p = parts(Request::builder().body(()).unwrap()).await;
    let ClientIp(ip) = ClientIp::from_request_parts(&mut p, &()).await.unwrap();
    assert_eq!(ip, "unknown");
  }
}
