//! Error types for `pact-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::agreement::{Action, AgreementStatus};

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("unknown listing type: {0:?}")]
  UnknownListingType(String),

  #[error("agreement not found: {0}")]
  AgreementNotFound(Uuid),

  #[error("listing not found: {0}")]
  ListingNotFound(Uuid),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("user {user_id} is not a party to agreement {agreement_id}")]
  Forbidden { agreement_id: Uuid, user_id: Uuid },

  #[error("user {user_id} does not own listing {listing_id}")]
  NotListingOwner { listing_id: Uuid, user_id: Uuid },

  #[error("cannot {action} an agreement in status {from}")]
  InvalidTransition { from: AgreementStatus, action: Action },

  #[error("user {user_id} has already signed agreement {agreement_id}")]
  AlreadySigned { agreement_id: Uuid, user_id: Uuid },

  #[error("agreement {0} is not sealed and cannot be rendered")]
  NotRenderable(Uuid),

  #[error("sealing failed: {0}")]
  SealFailed(String),

  #[error("rendering failed: {0}")]
  RenderFailed(String),

  #[error("notification failed: {0}")]
  NotificationFailed(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Client-facing classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  NotFound,
  Forbidden,
  InvalidTransition,
  AlreadySigned,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) | Self::UnknownListingType(_) => ErrorKind::Validation,
      Self::AgreementNotFound(_)
      | Self::ListingNotFound(_)
      | Self::UserNotFound(_) => ErrorKind::NotFound,
      Self::Forbidden { .. } | Self::NotListingOwner { .. } => ErrorKind::Forbidden,
      Self::InvalidTransition { .. } | Self::NotRenderable(_) => {
        ErrorKind::InvalidTransition
      }
      Self::AlreadySigned { .. } => ErrorKind::AlreadySigned,
      Self::SealFailed(_)
      | Self::RenderFailed(_)
      | Self::NotificationFailed(_)
      | Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
