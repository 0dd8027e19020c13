//! The `AgreementStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `pact-store-sqlite`).
//! Every mutating method must run its read, its [`crate::lifecycle`]
//! transition and its write as one atomic unit per agreement.

use std::future::Future;

use serde::Deserialize;
use uuid::Uuid;

use crate::{
  agreement::{Agreement, AgreementStatus, DraftEdit, NewAgreement, SignatureInput},
  lifecycle::{LifecycleAction, Signed, Transition},
};

// ─── Query type ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleFilter {
  Host,
  Guest,
}

/// Parameters for [`AgreementStore::list_for_user`].
#[derive(Debug, Clone)]
pub struct AgreementQuery {
  pub user_id: Uuid,
  /// Restrict to agreements where the user is the host or the guest.
  pub role:    Option<RoleFilter>,
  pub status:  Option<AgreementStatus>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

impl AgreementQuery {
  pub fn for_user(user_id: Uuid) -> Self {
    Self { user_id, role: None, status: None, limit: None, offset: None }
  }
}

// ─── Domain errors ───────────────────────────────────────────────────────────

/// Access to the domain error wrapped inside a backend error, so that upper
/// layers can classify failures without knowing the backend.
pub trait DomainError {
  fn domain(&self) -> Option<&crate::Error>;
}

impl DomainError for crate::Error {
  fn domain(&self) -> Option<&crate::Error> { Some(self) }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the persisted agreement rows.
///
/// The store exclusively owns mutation of `status`, `signatures` and `hash`.
pub trait AgreementStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  /// Validate and persist a new agreement. Nothing is written if validation
  /// fails.
  fn create(
    &self,
    input: NewAgreement,
  ) -> impl Future<Output = Result<Agreement, Self::Error>> + Send + '_;

  /// Retrieve an agreement by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Agreement>, Self::Error>> + Send + '_;

  /// Agreements where `query.user_id` is a party, most recently updated
  /// first.
  fn list_for_user<'a>(
    &'a self,
    query: &'a AgreementQuery,
  ) -> impl Future<Output = Result<Vec<Agreement>, Self::Error>> + Send + 'a;

  /// All agreements currently in `status`; used by the lifecycle sweep.
  fn list_by_status(
    &self,
    status: AgreementStatus,
  ) -> impl Future<Output = Result<Vec<Agreement>, Self::Error>> + Send + '_;

  /// Record a signature and advance the status, sealing when both parties
  /// have signed. Serialised per agreement: concurrent calls never both
  /// observe the same prior state.
  fn sign(
    &self,
    id: Uuid,
    input: SignatureInput,
  ) -> impl Future<Output = Result<Signed, Self::Error>> + Send + '_;

  /// Replace draft content. Host only, `DRAFT` only.
  fn edit_draft(
    &self,
    id: Uuid,
    by: Uuid,
    edit: DraftEdit,
  ) -> impl Future<Output = Result<Agreement, Self::Error>> + Send + '_;

  /// Apply a party-initiated lifecycle action (cancel, activate, complete,
  /// dispute).
  fn apply_action(
    &self,
    id: Uuid,
    by: Uuid,
    action: LifecycleAction,
  ) -> impl Future<Output = Result<Agreement, Self::Error>> + Send + '_;

  /// Cancel on behalf of either party.
  fn cancel(
    &self,
    id: Uuid,
    by: Uuid,
  ) -> impl Future<Output = Result<Agreement, Self::Error>> + Send + '_ {
    self.apply_action(id, by, LifecycleAction::Cancel)
  }

  /// Move to `next` only if still in `expected`; a repeat call is a no-op.
  fn transition_if(
    &self,
    id: Uuid,
    expected: AgreementStatus,
    next: AgreementStatus,
  ) -> impl Future<Output = Result<Transition, Self::Error>> + Send + '_;
}
