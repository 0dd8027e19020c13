//! Read-only views of the marketplace collaborators: listings and user
//! profiles. Both are owned outside this subsystem; Pact only looks them up.

use std::{future::Future, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, store::DomainError};

// ─── Listings ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListingKind {
  /// Accommodation offered to a guest.
  Stay,
  /// Seasonal work offered to a worker.
  Job,
}

impl ListingKind {
  /// Parse a stored or user-supplied kind, rejecting anything unrecognised.
  pub fn parse(s: &str) -> Result<Self> {
    Self::from_str(s).map_err(|_| Error::UnknownListingType(s.to_owned()))
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
  pub id:          Uuid,
  pub kind:        ListingKind,
  pub title:       String,
  /// Free-text city/region line.
  pub location:    String,
  /// Rate per month for stays, per week for jobs.
  pub price:       f64,
  pub description: String,
  /// The owning host or employer.
  pub user_id:     Uuid,
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id:    Uuid,
  pub name:  String,
  pub email: String,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Lookup of listings by id.
pub trait ListingDirectory: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  /// Returns `None` if the listing does not exist.
  fn get_listing(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Listing>, Self::Error>> + Send + '_;
}

/// Lookup of user profiles by id.
pub trait UserDirectory: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  /// Returns `None` if the user does not exist.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_known_kinds() {
    assert_eq!(ListingKind::parse("stay").unwrap(), ListingKind::Stay);
    assert_eq!(ListingKind::parse("job").unwrap(), ListingKind::Job);
  }

  #[test]
  fn rejects_unknown_kind() {
    assert!(matches!(
      ListingKind::parse("boat"),
      Err(Error::UnknownListingType(k)) if k == "boat"
    ));
  }
}
