//! The agreement entity: a bilateral stay or work contract between the host
//! of a listing and a guest.
//!
//! An agreement is mutated only through the functions in
//! [`crate::lifecycle`]; storage backends load it, apply one of those pure
//! transitions, and persist the result atomically.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

/// Current wall-clock time, truncated to microseconds so that timestamps
/// survive a round-trip through text storage unchanged.
pub fn timestamp_now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
  EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AgreementStatus {
  /// Host-created, not yet offered to the guest. Clauses are editable.
  Draft,
  /// Waiting on the host's signature.
  PendingHost,
  /// Waiting on the guest's signature.
  PendingGuest,
  /// Both parties signed; the agreement is sealed.
  FullySigned,
  Active,
  Completed,
  Cancelled,
  Disputed,
}

impl AgreementStatus {
  /// Statuses from which no further transition is permitted.
  pub fn is_terminal(self) -> bool {
    matches!(self, Self::Completed | Self::Cancelled | Self::Disputed)
  }

  /// Statuses in which a party may still add a signature.
  pub fn is_signable(self) -> bool {
    matches!(self, Self::Draft | Self::PendingHost | Self::PendingGuest)
  }

  /// Post-signing lifecycle table. Signing transitions are handled by
  /// [`crate::lifecycle::next_status_on_sign`] and are not listed here.
  pub fn can_transition_to(self, next: Self) -> bool {
    use AgreementStatus::*;
    match (self, next) {
      (Draft | PendingHost | PendingGuest | FullySigned | Active, Cancelled) => true,
      (FullySigned, Active) => true,
      (Active, Completed) => true,
      (FullySigned | Active, Disputed) => true,
      _ => false,
    }
  }
}

/// The operation being attempted; carried by
/// [`Error::InvalidTransition`](crate::Error::InvalidTransition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  Sign,
  Edit,
  Cancel,
  Activate,
  Complete,
  Dispute,
  Render,
  Transition,
}

// ─── Parties ─────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PartyRole {
  Host,
  Guest,
}

impl PartyRole {
  pub fn other(self) -> Self {
    match self {
      Self::Host => Self::Guest,
      Self::Guest => Self::Host,
    }
  }
}

// ─── Content ─────────────────────────────────────────────────────────────────

/// One titled, ordered section of agreement text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clause {
  pub title:   String,
  pub content: String,
  /// Display and print position; unique within an agreement.
  pub order:   u32,
}

/// An attributable, timestamped consent record. Not a cryptographic
/// signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signature {
  pub user_id:    Uuid,
  /// Display name resolved from the identity directory at signing time.
  pub name:       String,
  pub signed_at:  DateTime<Utc>,
  pub ip_address: String,
}

/// Input to a signing action. `signed_at` is always set by the state machine.
#[derive(Debug, Clone)]
pub struct SignatureInput {
  pub user_id:    Uuid,
  pub name:       String,
  pub ip_address: String,
}

impl SignatureInput {
  pub fn into_signature(self, at: DateTime<Utc>) -> Signature {
    Signature {
      user_id:    self.user_id,
      name:       self.name,
      signed_at:  at,
      ip_address: self.ip_address,
    }
  }
}

// ─── Agreement ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
  pub id:           Uuid,
  pub listing_id:   Uuid,
  pub host_id:      Uuid,
  pub guest_id:     Uuid,
  pub preamble:     String,
  /// Always kept sorted by `order`.
  pub clauses:      Vec<Clause>,
  pub start_date:   Option<NaiveDate>,
  pub end_date:     Option<NaiveDate>,
  pub status:       AgreementStatus,
  pub signatures:   Vec<Signature>,
  /// Hex SHA-256 over the sealed content; `None` until both parties signed.
  pub hash:         Option<String>,
  pub finalized_at: Option<DateTime<Utc>>,
  /// Governing-law hint (ISO 3166-1 alpha-2).
  pub country_code: String,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Agreement {
  pub fn role_of(&self, user_id: Uuid) -> Option<PartyRole> {
    if user_id == self.host_id {
      Some(PartyRole::Host)
    } else if user_id == self.guest_id {
      Some(PartyRole::Guest)
    } else {
      None
    }
  }

  pub fn party_id(&self, role: PartyRole) -> Uuid {
    match role {
      PartyRole::Host => self.host_id,
      PartyRole::Guest => self.guest_id,
    }
  }

  /// The other party's id, or `None` if `user_id` is not a party.
  pub fn counterparty_of(&self, user_id: Uuid) -> Option<Uuid> {
    self.role_of(user_id).map(|r| self.party_id(r.other()))
  }

  pub fn has_signed(&self, user_id: Uuid) -> bool {
    self.signatures.iter().any(|s| s.user_id == user_id)
  }

  pub fn signature_of(&self, role: PartyRole) -> Option<&Signature> {
    let id = self.party_id(role);
    self.signatures.iter().find(|s| s.user_id == id)
  }

  pub fn is_sealed(&self) -> bool { self.hash.is_some() }

  /// Return `Forbidden` unless `user_id` is the host or the guest.
  pub fn require_party(&self, user_id: Uuid) -> Result<PartyRole> {
    self.role_of(user_id).ok_or(Error::Forbidden {
      agreement_id: self.id,
      user_id,
    })
  }
}

// ─── Creation ────────────────────────────────────────────────────────────────

/// How an agreement came into being; decides its initial status.
#[derive(Debug, Clone)]
pub enum Origin {
  /// The host drafted it directly. Starts in `DRAFT`.
  HostDraft,
  /// The guest requested it against the host's listing. The request itself
  /// is recorded as the guest's signature; starts in `PENDING_HOST`.
  GuestRequest(SignatureInput),
}

/// Input to [`crate::store::AgreementStore::create`].
#[derive(Debug, Clone)]
pub struct NewAgreement {
  pub listing_id:   Uuid,
  pub host_id:      Uuid,
  pub guest_id:     Uuid,
  pub preamble:     String,
  pub clauses:      Vec<Clause>,
  pub start_date:   Option<NaiveDate>,
  pub end_date:     Option<NaiveDate>,
  pub country_code: String,
  pub origin:       Origin,
}

impl NewAgreement {
  /// Check every creation invariant without building anything.
  pub fn validate(&self) -> Result<()> {
    if self.host_id == self.guest_id {
      return Err(Error::Validation(
        "host and guest must be different users".into(),
      ));
    }
    validate_clauses(&self.clauses)?;
    validate_dates(self.start_date, self.end_date)?;
    normalize_country_code(&self.country_code)?;
    if let Origin::GuestRequest(sig) = &self.origin
      && sig.user_id != self.guest_id
    {
      return Err(Error::Validation(
        "a request must be signed by the guest".into(),
      ));
    }
    Ok(())
  }

  /// Validate and build the persisted form with a fresh id.
  pub fn into_agreement(self, at: DateTime<Utc>) -> Result<Agreement> {
    self.validate()?;
    let country_code = normalize_country_code(&self.country_code)?;

    let (status, signatures) = match self.origin {
      Origin::HostDraft => (AgreementStatus::Draft, Vec::new()),
      Origin::GuestRequest(sig) => {
        (AgreementStatus::PendingHost, vec![sig.into_signature(at)])
      }
    };

    let mut clauses = self.clauses;
    clauses.sort_by_key(|c| c.order);

    Ok(Agreement {
      id: Uuid::new_v4(),
      listing_id: self.listing_id,
      host_id: self.host_id,
      guest_id: self.guest_id,
      preamble: self.preamble,
      clauses,
      start_date: self.start_date,
      end_date: self.end_date,
      status,
      signatures,
      hash: None,
      finalized_at: None,
      country_code,
      created_at: at,
      updated_at: at,
    })
  }
}

/// Changes a host may make while the agreement is still a `DRAFT`.
/// `None` leaves the field as it is.
#[derive(Debug, Clone, Default)]
pub struct DraftEdit {
  pub preamble:   Option<String>,
  pub clauses:    Option<Vec<Clause>>,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

// ─── Validation helpers ──────────────────────────────────────────────────────

pub fn validate_clauses(clauses: &[Clause]) -> Result<()> {
  let mut seen = HashSet::with_capacity(clauses.len());
  for clause in clauses {
    if clause.title.trim().is_empty() {
      return Err(Error::Validation(format!(
        "clause {} has an empty title",
        clause.order
      )));
    }
    if !seen.insert(clause.order) {
      return Err(Error::Validation(format!(
        "duplicate clause order {}",
        clause.order
      )));
    }
  }
  Ok(())
}

pub fn validate_dates(
  start: Option<NaiveDate>,
  end: Option<NaiveDate>,
) -> Result<()> {
  if let (Some(start), Some(end)) = (start, end)
    && end < start
  {
    return Err(Error::Validation(format!(
      "end date {end} precedes start date {start}"
    )));
  }
  Ok(())
}

/// Accepts two ASCII letters in any case and returns them upper-cased.
pub fn normalize_country_code(code: &str) -> Result<String> {
  let code = code.trim();
  if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
    return Err(Error::Validation(format!(
      "country code must be two letters, got {code:?}"
    )));
  }
  Ok(code.to_ascii_uppercase())
}
