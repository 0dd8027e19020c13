//! [`AgreementService`], the layer between the HTTP handlers and the store.
//!
//! It resolves listings and profiles, fills in composed clauses, limits every
//! read to the two parties, and fires notifications once a change has been
//! committed. A failed notification is logged and never undoes the change.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use pact_core::{
  Error, ErrorKind,
  agreement::{
    Agreement, AgreementStatus, Clause, DraftEdit, NewAgreement, Origin,
    SignatureInput,
  },
  composer::{self, PartyNames},
  directory::{Listing, ListingDirectory, UserDirectory, UserProfile},
  document::{Document, DocumentProjection, DocumentRenderer},
  lifecycle::{LifecycleAction, Transition},
  notify::{Notification, NotificationEvent, Notifier},
  seal,
  store::{AgreementQuery, AgreementStore, DomainError, RoleFilter},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Everything the API needs from a storage backend.
pub trait Backend: AgreementStore + ListingDirectory + UserDirectory + 'static {}

impl<T> Backend for T where T: AgreementStore + ListingDirectory + UserDirectory + 'static {}

// ─── Inputs and outputs ──────────────────────────────────────────────────────

/// Body of `POST /agreements` and `POST /agreements/request`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgreement {
  pub listing_id:      Uuid,
  pub counterparty_id: Uuid,
  /// Composed from the listing when omitted.
  pub preamble:        Option<String>,
  /// Composed from the listing when omitted.
  pub clauses:         Option<Vec<Clause>>,
  pub start_date:      Option<NaiveDate>,
  pub end_date:        Option<NaiveDate>,
  pub country_code:    String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListFilter {
  pub role:   Option<RoleFilter>,
  pub status: Option<AgreementStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// Result of recomputing an agreement's integrity hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
  pub sealed:   bool,
  /// `true` only when sealed and the stored hash matches the content.
  pub valid:    bool,
  pub hash:     Option<String>,
  pub computed: String,
}

/// Counts from one lifecycle sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
  pub activated: usize,
  pub completed: usize,
  /// Changed concurrently by someone else; nothing to do.
  pub skipped:   usize,
  pub failed:    usize,
}

// ─── Service ─────────────────────────────────────────────────────────────────

pub struct AgreementService<S> {
  store:            Arc<S>,
  notifier:         Arc<dyn Notifier>,
  renderer:         Arc<dyn DocumentRenderer>,
  activate_on_seal: bool,
}

impl<S> Clone for AgreementService<S> {
  fn clone(&self) -> Self {
    Self {
      store:            Arc::clone(&self.store),
      notifier:         Arc::clone(&self.notifier),
      renderer:         Arc::clone(&self.renderer),
      activate_on_seal: self.activate_on_seal,
    }
  }
}

impl<S: Backend> AgreementService<S> {
  pub fn new(
    store: Arc<S>,
    notifier: Arc<dyn Notifier>,
    renderer: Arc<dyn DocumentRenderer>,
  ) -> Self {
    Self { store, notifier, renderer, activate_on_seal: false }
  }

  /// Move a freshly sealed agreement straight to `ACTIVE` when its start
  /// date is absent or already reached.
  pub fn with_activate_on_seal(mut self, enabled: bool) -> Self {
    self.activate_on_seal = enabled;
    self
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  // ── Creation ──

  /// Host-initiated creation. The actor must own the listing; the agreement
  /// starts in `DRAFT`.
  pub async fn create_draft(
    &self,
    actor: Uuid,
    input: CreateAgreement,
  ) -> Result<Agreement> {
    let listing = self.listing(input.listing_id).await?;
    if listing.user_id != actor {
      return Err(
        Error::NotListingOwner { listing_id: listing.id, user_id: actor }.into(),
      );
    }

    let guest_id = input.counterparty_id;
    let agreement = self.create(&listing, actor, guest_id, input, None).await?;

    tracing::info!(
      agreement_id = %agreement.id,
      user_id = %actor,
      status = %agreement.status,
      "agreement drafted"
    );
    self.notify(guest_id, NotificationEvent::AgreementCreated, &agreement);
    Ok(agreement)
  }

  /// Guest-initiated request against the counterparty's listing. The request
  /// is recorded as the guest's signature; the agreement starts in
  /// `PENDING_HOST`.
  pub async fn request(
    &self,
    actor: Uuid,
    input: CreateAgreement,
    ip_address: String,
  ) -> Result<Agreement> {
    let listing = self.listing(input.listing_id).await?;
    if listing.user_id != input.counterparty_id {
      return Err(
        Error::Validation("counterpartyId must be the owner of the listing".into())
          .into(),
      );
    }

    let host_id = input.counterparty_id;
    let agreement = self
      .create(&listing, host_id, actor, input, Some(ip_address))
      .await?;

    tracing::info!(
      agreement_id = %agreement.id,
      user_id = %actor,
      status = %agreement.status,
      "agreement requested"
    );
    self.notify(host_id, NotificationEvent::AgreementRequested, &agreement);
    Ok(agreement)
  }

  async fn create(
    &self,
    listing: &Listing,
    host_id: Uuid,
    guest_id: Uuid,
    input: CreateAgreement,
    request_ip: Option<String>,
  ) -> Result<Agreement> {
    if host_id == guest_id {
      return Err(
        Error::Validation("host and guest must be different users".into()).into(),
      );
    }
    let host = self.user(host_id).await?;
    let guest = self.user(guest_id).await?;

    let (preamble, clauses) = match (input.preamble, input.clauses) {
      (Some(preamble), Some(clauses)) => (preamble, clauses),
      (preamble, clauses) => {
        let composed = composer::compose(listing, PartyNames {
          host:  &host.name,
          guest: &guest.name,
        })?;
        (
          preamble.unwrap_or(composed.preamble),
          clauses.unwrap_or(composed.clauses),
        )
      }
    };

    let origin = match request_ip {
      None => Origin::HostDraft,
      Some(ip_address) => Origin::GuestRequest(SignatureInput {
        user_id: guest.id,
        name: guest.name,
        ip_address,
      }),
    };

    self
      .store
      .create(NewAgreement {
        listing_id: listing.id,
        host_id,
        guest_id,
        preamble,
        clauses,
        start_date: input.start_date,
        end_date: input.end_date,
        country_code: input.country_code,
        origin,
      })
      .await
      .map_err(ApiError::store)
  }

  // ── Reads ──

  /// Fetch an agreement the actor is a party to.
  pub async fn get(&self, actor: Uuid, id: Uuid) -> Result<Agreement> {
    let agreement = self
      .store
      .get(id)
      .await
      .map_err(ApiError::store)?
      .ok_or(Error::AgreementNotFound(id))?;
    agreement.require_party(actor)?;
    Ok(agreement)
  }

  pub async fn list(&self, actor: Uuid, filter: ListFilter) -> Result<Vec<Agreement>> {
    let query = AgreementQuery {
      user_id: actor,
      role:    filter.role,
      status:  filter.status,
      limit:   filter.limit,
      offset:  filter.offset,
    };
    self.store.list_for_user(&query).await.map_err(ApiError::store)
  }

  // ── Signing ──

  /// Record the actor's signature, sealing the agreement when it completes
  /// the pair.
  pub async fn sign(&self, actor: Uuid, id: Uuid, ip_address: String) -> Result<Agreement> {
    // Outsiders get Forbidden before their profile is looked up.
    self.get(actor, id).await?;
    let profile = self.user(actor).await?;

    let input = SignatureInput { user_id: actor, name: profile.name, ip_address };
    let signed = self.store.sign(id, input).await.map_err(|e| {
      if let Some(Error::SealFailed(reason)) = e.domain() {
        tracing::error!(
          agreement_id = %id,
          user_id = %actor,
          %reason,
          "sealing failed, signature rolled back"
        );
      }
      ApiError::store(e)
    })?;

    let mut agreement = signed.agreement;
    tracing::info!(
      agreement_id = %id,
      user_id = %actor,
      role = %signed.role,
      from = %signed.previous,
      status = %agreement.status,
      "agreement signed"
    );

    if !signed.sealed {
      let other = agreement.party_id(signed.role.other());
      self.notify(other, NotificationEvent::AgreementSigned, &agreement);
      return Ok(agreement);
    }

    tracing::info!(agreement_id = %id, hash = ?agreement.hash, "agreement sealed");
    for party in [agreement.host_id, agreement.guest_id] {
      self.notify(party, NotificationEvent::AgreementSealed, &agreement);
    }

    if self.activate_on_seal && starts_by(&agreement, today()) {
      match self
        .store
        .transition_if(id, AgreementStatus::FullySigned, AgreementStatus::Active)
        .await
      {
        Ok(transition) => {
          if transition.was_applied() {
            tracing::info!(agreement_id = %id, status = %AgreementStatus::Active, "agreement activated on seal");
          }
          agreement = transition.into_agreement();
        }
        // The seal is committed; activation can be retried by the sweep.
        Err(e) => tracing::warn!(agreement_id = %id, error = %e, "activation after sealing failed"),
      }
    }

    Ok(agreement)
  }

  // ── Lifecycle ──

  pub async fn cancel(&self, actor: Uuid, id: Uuid) -> Result<Agreement> {
    self.lifecycle(actor, id, LifecycleAction::Cancel).await
  }

  /// Apply an explicit status change requested by a party.
  pub async fn lifecycle(
    &self,
    actor: Uuid,
    id: Uuid,
    action: LifecycleAction,
  ) -> Result<Agreement> {
    let result = match action {
      LifecycleAction::Cancel => self.store.cancel(id, actor).await,
      other => self.store.apply_action(id, actor, other).await,
    };
    let agreement = result.map_err(ApiError::store)?;

    tracing::info!(
      agreement_id = %id,
      user_id = %actor,
      action = %action.action(),
      status = %agreement.status,
      "agreement status changed"
    );
    let event = match action {
      LifecycleAction::Cancel => NotificationEvent::AgreementCancelled,
      _ => NotificationEvent::AgreementStatusChanged,
    };
    if let Some(other) = agreement.counterparty_of(actor) {
      self.notify(other, event, &agreement);
    }
    Ok(agreement)
  }

  /// Replace draft content. Host only, `DRAFT` only.
  pub async fn edit(&self, actor: Uuid, id: Uuid, edit: DraftEdit) -> Result<Agreement> {
    let agreement = self
      .store
      .edit_draft(id, actor, edit)
      .await
      .map_err(ApiError::store)?;
    tracing::info!(agreement_id = %id, user_id = %actor, "draft edited");
    Ok(agreement)
  }

  // ── Integrity and documents ──

  /// Recompute the integrity hash and compare it with the stored one.
  pub async fn verify(&self, actor: Uuid, id: Uuid) -> Result<Verification> {
    let agreement = self.get(actor, id).await?;
    let computed = seal::compute_hash(&agreement)?;
    let valid = agreement.hash.as_deref() == Some(computed.as_str());
    if agreement.is_sealed() && !valid {
      tracing::warn!(agreement_id = %id, "stored hash does not match content");
    }
    Ok(Verification {
      sealed: agreement.is_sealed(),
      valid,
      hash: agreement.hash,
      computed,
    })
  }

  /// Render the downloadable document for a sealed agreement.
  pub async fn document(&self, actor: Uuid, id: Uuid) -> Result<Document> {
    let agreement = self.get(actor, id).await?;
    if !agreement.is_sealed() {
      return Err(Error::NotRenderable(id).into());
    }

    let listing = self.listing(agreement.listing_id).await?;
    let host = self.user(agreement.host_id).await?;
    let guest = self.user(agreement.guest_id).await?;
    let projection = DocumentProjection::build(&agreement, &listing, &host, &guest)?;

    self.renderer.render(&projection).map_err(|e| {
      tracing::error!(agreement_id = %id, error = %e, "rendering failed");
      ApiError::from(e)
    })
  }

  // ── Sweep ──

  /// Activate sealed agreements whose start date has arrived and complete
  /// active ones whose end date has passed. Safe to run repeatedly.
  pub async fn sweep(&self, today: NaiveDate) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    let sealed = self
      .store
      .list_by_status(AgreementStatus::FullySigned)
      .await
      .map_err(ApiError::store)?;
    for agreement in sealed.iter().filter(|a| starts_by(a, today)) {
      self
        .advance(agreement, AgreementStatus::FullySigned, AgreementStatus::Active, &mut report)
        .await;
    }

    let active = self
      .store
      .list_by_status(AgreementStatus::Active)
      .await
      .map_err(ApiError::store)?;
    for agreement in active.iter().filter(|a| a.end_date.is_some_and(|end| end < today)) {
      self
        .advance(agreement, AgreementStatus::Active, AgreementStatus::Completed, &mut report)
        .await;
    }

    tracing::info!(
      %today,
      activated = report.activated,
      completed = report.completed,
      skipped = report.skipped,
      failed = report.failed,
      "lifecycle sweep finished"
    );
    Ok(report)
  }

  async fn advance(
    &self,
    agreement: &Agreement,
    from: AgreementStatus,
    to: AgreementStatus,
    report: &mut SweepReport,
  ) {
    match self.store.transition_if(agreement.id, from, to).await {
      Ok(Transition::Applied(updated)) => {
        match to {
          AgreementStatus::Active => report.activated += 1,
          _ => report.completed += 1,
        }
        tracing::info!(agreement_id = %updated.id, %from, status = %to, "agreement advanced by sweep");
        for party in [updated.host_id, updated.guest_id] {
          self.notify(party, NotificationEvent::AgreementStatusChanged, &updated);
        }
      }
      Ok(Transition::AlreadyApplied(_)) => report.skipped += 1,
      Err(e) if e.domain().map(Error::kind) == Some(ErrorKind::InvalidTransition) => {
        report.skipped += 1;
      }
      Err(e) => {
        report.failed += 1;
        tracing::warn!(agreement_id = %agreement.id, error = %e, "sweep transition failed");
      }
    }
  }

  // ── Helpers ──

  async fn listing(&self, id: Uuid) -> Result<Listing> {
    self
      .store
      .get_listing(id)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Domain(Error::ListingNotFound(id)))
  }

  async fn user(&self, id: Uuid) -> Result<UserProfile> {
    self
      .store
      .get_user(id)
      .await
      .map_err(ApiError::store)?
      .ok_or(ApiError::Domain(Error::UserNotFound(id)))
  }

  fn notify(&self, user_id: Uuid, event: NotificationEvent, agreement: &Agreement) {
    let payload = json!({
      "agreementId": agreement.id,
      "listingId": agreement.listing_id,
      "status": agreement.status,
    });
    if let Err(e) = self.notifier.notify(Notification { user_id, event, payload }) {
      tracing::warn!(
        %user_id,
        %event,
        agreement_id = %agreement.id,
        error = %e,
        "notification not delivered"
      );
    }
  }
}

fn today() -> NaiveDate { Utc::now().date_naive() }

/// Whether the agreement's period has begun by `today`. No start date means
/// it applies immediately.
fn starts_by(agreement: &Agreement, today: NaiveDate) -> bool {
  agreement.start_date.is_none_or(|start| start <= today)
}
