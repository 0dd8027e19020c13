//! JSON REST API for Pact agreements.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`service::Backend`]. Authentication happens upstream; the acting user
//! arrives in the `x-user-id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let service = AgreementService::new(store, notifier, renderer);
//! axum::serve(listener, pact_api::router(service)).await?;
//! ```

pub mod agreements;
pub mod error;
pub mod extract;
pub mod notify;
pub mod service;

#[cfg(test)]
pub(crate) mod test_helpers;

use axum::{
  Router,
  routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use service::{AgreementService, Backend};

/// Build the agreement API router.
pub fn router<S: Backend>(service: AgreementService<S>) -> Router {
  Router::new()
    .route(
      "/agreements",
      get(agreements::list::<S>).post(agreements::create::<S>),
    )
    .route("/agreements/request", post(agreements::request::<S>))
    .route(
      "/agreements/{id}",
      get(agreements::get_one::<S>).patch(agreements::patch::<S>),
    )
    .route("/agreements/{id}/verify", get(agreements::verify::<S>))
    .route("/agreements/{id}/document", get(agreements::document::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(service)
}
