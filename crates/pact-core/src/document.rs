//! The read-only projection handed to a document renderer, and the renderer
//! seam itself.
//!
//! A projection can only be built from a sealed agreement, so a renderer is
//! never given content that could still change.

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Error, Result,
  agreement::{Agreement, AgreementStatus, Clause, PartyRole, Signature},
  directory::{Listing, ListingKind, UserProfile},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSummary {
  pub id:       Uuid,
  pub kind:     ListingKind,
  pub title:    String,
  pub location: String,
  pub price:    f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartySummary {
  pub user_id: Uuid,
  pub role:    PartyRole,
  pub name:    String,
  pub email:   String,
}

/// Everything a renderer needs, frozen at the time of the request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentProjection {
  pub agreement_id: Uuid,
  pub status:       AgreementStatus,
  pub listing:      ListingSummary,
  pub host:         PartySummary,
  pub guest:        PartySummary,
  pub country_code: String,
  pub start_date:   Option<NaiveDate>,
  pub end_date:     Option<NaiveDate>,
  pub preamble:     String,
  /// Sorted by `order`.
  pub clauses:      Vec<Clause>,
  /// Sorted by `signed_at`.
  pub signatures:   Vec<Signature>,
  pub hash:         String,
  pub finalized_at: DateTime<Utc>,
}

impl DocumentProjection {
  /// Build the projection. Fails with [`Error::NotRenderable`] unless the
  /// agreement has been sealed.
  pub fn build(
    agreement: &Agreement,
    listing: &Listing,
    host: &UserProfile,
    guest: &UserProfile,
  ) -> Result<Self> {
    let (Some(hash), Some(finalized_at)) =
      (agreement.hash.clone(), agreement.finalized_at)
    else {
      return Err(Error::NotRenderable(agreement.id));
    };

    let mut clauses = agreement.clauses.clone();
    clauses.sort_by_key(|c| c.order);
    let mut signatures = agreement.signatures.clone();
    signatures.sort_by_key(|s| s.signed_at);

    let party = |role: PartyRole, profile: &UserProfile| PartySummary {
      user_id: agreement.party_id(role),
      role,
      name: profile.name.clone(),
      email: profile.email.clone(),
    };

    Ok(Self {
      agreement_id: agreement.id,
      status: agreement.status,
      listing: ListingSummary {
        id:       listing.id,
        kind:     listing.kind,
        title:    listing.title.clone(),
        location: listing.location.clone(),
        price:    listing.price,
      },
      host: party(PartyRole::Host, host),
      guest: party(PartyRole::Guest, guest),
      country_code: agreement.country_code.clone(),
      start_date: agreement.start_date,
      end_date: agreement.end_date,
      preamble: agreement.preamble.clone(),
      clauses,
      signatures,
      hash,
      finalized_at,
    })
  }

  /// The role `user_id` plays in this agreement, if it is a party.
  pub fn signer_role(&self, user_id: Uuid) -> Option<PartyRole> {
    if user_id == self.host.user_id {
      Some(PartyRole::Host)
    } else if user_id == self.guest.user_id {
      Some(PartyRole::Guest)
    } else {
      None
    }
  }
}

/// A rendered artifact, produced on demand and never persisted.
#[derive(Debug, Clone)]
pub struct Document {
  pub media_type: &'static str,
  pub file_name:  String,
  pub pages:      usize,
  pub body:       Bytes,
}

/// Turns a projection into a downloadable artifact. Implementations are
/// stateless and must not touch the agreement.
pub trait DocumentRenderer: Send + Sync {
  fn render(&self, projection: &DocumentProjection) -> Result<Document>;
}
