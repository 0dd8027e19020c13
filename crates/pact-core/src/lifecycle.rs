//! The agreement state machine.
//!
//! Every function here is pure: it takes the current agreement and returns
//! the next version, or an error leaving the input untouched. Storage
//! backends call them inside a single transaction so that the read, the
//! transition and the write happen as one unit.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result,
  agreement::{
    Action, Agreement, AgreementStatus, DraftEdit, PartyRole, SignatureInput,
    validate_clauses, validate_dates,
  },
  seal,
};

// ─── Signing ─────────────────────────────────────────────────────────────────

/// The transition table for a signature.
///
/// `other_signed` reports whether the counterparty's signature is already
/// present. Returns `None` when `signer` may not sign from `current`.
pub fn next_status_on_sign(
  current: AgreementStatus,
  signer: PartyRole,
  other_signed: bool,
) -> Option<AgreementStatus> {
  use AgreementStatus::*;
  match (current, signer) {
    // Only the host can move a draft forward.
    (Draft, PartyRole::Host) => {
      Some(if other_signed { FullySigned } else { PendingGuest })
    }
    (PendingHost, PartyRole::Host) => {
      Some(if other_signed { FullySigned } else { PendingGuest })
    }
    (PendingGuest, PartyRole::Guest) => {
      Some(if other_signed { FullySigned } else { PendingHost })
    }
    _ => None,
  }
}

/// The result of a successful signing action.
#[derive(Debug, Clone)]
pub struct Signed {
  pub agreement: Agreement,
  pub previous:  AgreementStatus,
  pub role:      PartyRole,
  /// `true` when this signature completed the pair and sealed the agreement.
  pub sealed:    bool,
}

/// Record `input` as a signature and advance the status, sealing the
/// agreement when both parties have signed.
pub fn sign(
  agreement: &Agreement,
  input: SignatureInput,
  at: DateTime<Utc>,
) -> Result<Signed> {
  let role = agreement.require_party(input.user_id)?;
  let previous = agreement.status;

  if !previous.is_signable() {
    return Err(Error::InvalidTransition { from: previous, action: Action::Sign });
  }
  if agreement.has_signed(input.user_id) {
    return Err(Error::AlreadySigned {
      agreement_id: agreement.id,
      user_id:      input.user_id,
    });
  }

  let other_signed = agreement.has_signed(agreement.party_id(role.other()));
  let next = next_status_on_sign(previous, role, other_signed).ok_or(
    Error::InvalidTransition { from: previous, action: Action::Sign },
  )?;

  let mut updated = agreement.clone();
  updated.signatures.push(input.into_signature(at));
  updated.status = next;
  updated.updated_at = at;

  let sealed = next == AgreementStatus::FullySigned;
  if sealed {
    seal::seal(&mut updated, at)?;
  }

  Ok(Signed { agreement: updated, previous, role, sealed })
}

// ─── Draft editing ───────────────────────────────────────────────────────────

/// Apply a host's edit to a `DRAFT`.
pub fn edit_draft(
  agreement: &Agreement,
  by: Uuid,
  edit: DraftEdit,
  at: DateTime<Utc>,
) -> Result<Agreement> {
  let role = agreement.require_party(by)?;
  if role != PartyRole::Host {
    return Err(Error::Forbidden { agreement_id: agreement.id, user_id: by });
  }
  if agreement.status != AgreementStatus::Draft {
    return Err(Error::InvalidTransition {
      from:   agreement.status,
      action: Action::Edit,
    });
  }

  let mut updated = agreement.clone();
  if let Some(preamble) = edit.preamble {
    updated.preamble = preamble;
  }
  if let Some(mut clauses) = edit.clauses {
    validate_clauses(&clauses)?;
    clauses.sort_by_key(|c| c.order);
    updated.clauses = clauses;
  }
  if edit.start_date.is_some() {
    updated.start_date = edit.start_date;
  }
  if edit.end_date.is_some() {
    updated.end_date = edit.end_date;
  }
  validate_dates(updated.start_date, updated.end_date)?;
  updated.updated_at = at;
  Ok(updated)
}

// ─── Post-signing lifecycle ──────────────────────────────────────────────────

/// An explicit status change requested by a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
  /// Either party, from any non-terminal status.
  Cancel,
  /// Host, `FULLY_SIGNED → ACTIVE`.
  Activate,
  /// Host, `ACTIVE → COMPLETED`.
  Complete,
  /// Either party, `FULLY_SIGNED | ACTIVE → DISPUTED`.
  Dispute,
}

impl LifecycleAction {
  pub fn target(self) -> AgreementStatus {
    match self {
      Self::Cancel => AgreementStatus::Cancelled,
      Self::Activate => AgreementStatus::Active,
      Self::Complete => AgreementStatus::Completed,
      Self::Dispute => AgreementStatus::Disputed,
    }
  }

  pub fn action(self) -> Action {
    match self {
      Self::Cancel => Action::Cancel,
      Self::Activate => Action::Activate,
      Self::Complete => Action::Complete,
      Self::Dispute => Action::Dispute,
    }
  }

  fn host_only(self) -> bool { matches!(self, Self::Activate | Self::Complete) }
}

/// Apply a party-initiated lifecycle action.
pub fn apply_action(
  agreement: &Agreement,
  by: Uuid,
  action: LifecycleAction,
  at: DateTime<Utc>,
) -> Result<Agreement> {
  let role = agreement.require_party(by)?;
  if action.host_only() && role != PartyRole::Host {
    return Err(Error::Forbidden { agreement_id: agreement.id, user_id: by });
  }
  if !agreement.status.can_transition_to(action.target()) {
    return Err(Error::InvalidTransition {
      from:   agreement.status,
      action: action.action(),
    });
  }

  let mut updated = agreement.clone();
  updated.status = action.target();
  updated.updated_at = at;
  Ok(updated)
}

/// Outcome of [`transition_if`].
#[derive(Debug, Clone)]
pub enum Transition {
  Applied(Agreement),
  /// The agreement was already in the target status; nothing changed.
  AlreadyApplied(Agreement),
}

impl Transition {
  pub fn agreement(&self) -> &Agreement {
    match self {
      Self::Applied(a) | Self::AlreadyApplied(a) => a,
    }
  }

  pub fn into_agreement(self) -> Agreement {
    match self {
      Self::Applied(a) | Self::AlreadyApplied(a) => a,
    }
  }

  pub fn was_applied(&self) -> bool { matches!(self, Self::Applied(_)) }
}

/// Move to `next` only if the agreement is still in `expected`. Repeating the
/// call after it succeeded is a no-op, which makes it safe for periodic
/// sweeps.
pub fn transition_if(
  agreement: &Agreement,
  expected: AgreementStatus,
  next: AgreementStatus,
  at: DateTime<Utc>,
) -> Result<Transition> {
  if agreement.status == next {
    return Ok(Transition::AlreadyApplied(agreement.clone()));
  }
  if agreement.status != expected || !expected.can_transition_to(next) {
    return Err(Error::InvalidTransition {
      from:   agreement.status,
      action: Action::Transition,
    });
  }

  let mut updated = agreement.clone();
  updated.status = next;
  updated.updated_at = at;
  Ok(Transition::Applied(updated))
}
