//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use pact_core::{
  Error as CoreError,
  agreement::{AgreementStatus, Clause, DraftEdit, NewAgreement, Origin, SignatureInput},
  directory::{Listing, ListingDirectory, ListingKind, UserDirectory, UserProfile},
  lifecycle::LifecycleAction,
  seal,
  store::{AgreementQuery, AgreementStore, RoleFilter},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

const HOST: Uuid = Uuid::from_u128(0x100);
const GUEST: Uuid = Uuid::from_u128(0x200);
const OTHER: Uuid = Uuid::from_u128(0x300);

fn clauses() -> Vec<Clause> {
  vec![
    Clause { title: "Rate".into(), content: "650 per month".into(), order: 1 },
    Clause { title: "Rules".into(), content: "Quiet after 22:00".into(), order: 2 },
  ]
}

fn new_agreement(host: Uuid, guest: Uuid, origin: Origin) -> NewAgreement {
  NewAgreement {
    listing_id: Uuid::from_u128(0x900),
    host_id: host,
    guest_id: guest,
    preamble: "This Stay Agreement".into(),
    clauses: clauses(),
    start_date: NaiveDate::from_ymd_opt(2026, 11, 1),
    end_date: NaiveDate::from_ymd_opt(2027, 2, 28),
    country_code: "nz".into(),
    origin,
  }
}

fn sig(user_id: Uuid) -> SignatureInput {
  SignatureInput {
    user_id,
    name: format!("user {}", user_id.as_u128()),
    ip_address: "203.0.113.5".into(),
  }
}

fn core_err(e: &Error) -> &CoreError {
  match e {
    Error::Core(c) => c,
    other => panic!("expected a domain error, got {other}"),
  }
}

// ─── Create / get ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_round_trip() {
  let s = store().await;
  let created = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();
  assert_eq!(created.status, AgreementStatus::Draft);
  assert_eq!(created.country_code, "NZ");

  let fetched = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched.id, created.id);
  assert_eq!(fetched.clauses, created.clauses);
  assert_eq!(fetched.start_date, created.start_date);
  assert_eq!(fetched.created_at, created.created_at);
  assert!(fetched.hash.is_none());
  assert!(fetched.finalized_at.is_none());
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_creation_writes_nothing() {
  let s = store().await;
  let err = s
    .create(new_agreement(HOST, HOST, Origin::HostDraft))
    .await
    .unwrap_err();
  assert!(matches!(core_err(&err), CoreError::Validation(_)));

  let listed = s.list_for_user(&AgreementQuery::for_user(HOST)).await.unwrap();
  assert!(listed.is_empty());
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn list_for_user_filters_by_role_and_status() {
  let s = store().await;
  let as_host = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();
  let as_guest = s
    .create(new_agreement(OTHER, HOST, Origin::HostDraft))
    .await
    .unwrap();
  s.create(new_agreement(OTHER, GUEST, Origin::HostDraft))
    .await
    .unwrap();

  let all = s.list_for_user(&AgreementQuery::for_user(HOST)).await.unwrap();
  assert_eq!(all.len(), 2);

  let mut q = AgreementQuery::for_user(HOST);
  q.role = Some(RoleFilter::Host);
  let hosted = s.list_for_user(&q).await.unwrap();
  assert_eq!(hosted.len(), 1);
  assert_eq!(hosted[0].id, as_host.id);

  q.role = Some(RoleFilter::Guest);
  let guested = s.list_for_user(&q).await.unwrap();
  assert_eq!(guested.len(), 1);
  assert_eq!(guested[0].id, as_guest.id);

  s.sign(as_host.id, sig(HOST)).await.unwrap();
  let mut q = AgreementQuery::for_user(HOST);
  q.status = Some(AgreementStatus::PendingGuest);
  let pending = s.list_for_user(&q).await.unwrap();
  assert_eq!(pending.len(), 1);
  assert_eq!(pending[0].id, as_host.id);
}

#[tokio::test]
async fn list_for_user_is_most_recent_first() {
  let s = store().await;
  let first = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();
  let second = s
    .create(new_agreement(HOST, OTHER, Origin::HostDraft))
    .await
    .unwrap();

  let listed = s.list_for_user(&AgreementQuery::for_user(HOST)).await.unwrap();
  assert_eq!(listed[0].id, second.id);

  // Touching the older agreement moves it to the front.
  s.sign(first.id, sig(HOST)).await.unwrap();
  let listed = s.list_for_user(&AgreementQuery::for_user(HOST)).await.unwrap();
  assert_eq!(listed[0].id, first.id);
}

// ─── Signing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn host_draft_signing_flow_seals() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();

  let after_host = s.sign(a.id, sig(HOST)).await.unwrap();
  assert_eq!(after_host.agreement.status, AgreementStatus::PendingGuest);
  assert!(!after_host.sealed);

  let after_guest = s.sign(a.id, sig(GUEST)).await.unwrap();
  assert_eq!(after_guest.agreement.status, AgreementStatus::FullySigned);
  assert!(after_guest.sealed);

  let stored = s.get(a.id).await.unwrap().unwrap();
  assert_eq!(stored.hash, after_guest.agreement.hash);
  assert_eq!(stored.finalized_at, after_guest.agreement.finalized_at);
  assert!(seal::verify(&stored), "seal must survive a storage round-trip");
}

#[tokio::test]
async fn guest_request_is_sealed_by_host_signature() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::GuestRequest(sig(GUEST))))
    .await
    .unwrap();
  assert_eq!(a.status, AgreementStatus::PendingHost);

  let signed = s.sign(a.id, sig(HOST)).await.unwrap();
  assert_eq!(signed.agreement.status, AgreementStatus::FullySigned);
  assert!(signed.sealed);
}

#[tokio::test]
async fn signing_twice_is_rejected_and_leaves_signatures_unchanged() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();
  s.sign(a.id, sig(HOST)).await.unwrap();

  let err = s.sign(a.id, sig(HOST)).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::AlreadySigned { .. }));

  let stored = s.get(a.id).await.unwrap().unwrap();
  assert_eq!(stored.signatures.len(), 1);
  assert_eq!(stored.status, AgreementStatus::PendingGuest);
}

#[tokio::test]
async fn non_party_signature_is_forbidden_without_state_change() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::GuestRequest(sig(GUEST))))
    .await
    .unwrap();

  let err = s.sign(a.id, sig(OTHER)).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::Forbidden { .. }));

  let stored = s.get(a.id).await.unwrap().unwrap();
  assert_eq!(stored.status, AgreementStatus::PendingHost);
  assert_eq!(stored.signatures.len(), 1);
}

#[tokio::test]
async fn signing_unknown_agreement_is_not_found() {
  let s = store().await;
  let err = s.sign(Uuid::new_v4(), sig(HOST)).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::AgreementNotFound(_)));
}

#[tokio::test]
async fn concurrent_signing_seals_exactly_once() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();
  s.sign(a.id, sig(HOST)).await.unwrap();

  let attempts: Vec<_> = (0..8)
    .map(|_| {
      let s = s.clone();
      tokio::spawn(async move { s.sign(a.id, sig(GUEST)).await })
    })
    .collect();

  let mut sealed = 0;
  let mut hashes = Vec::new();
  for handle in attempts {
    match handle.await.unwrap() {
      Ok(signed) => {
        assert!(signed.sealed);
        sealed += 1;
        hashes.push(signed.agreement.hash.clone());
      }
      Err(e) => assert!(matches!(
        core_err(&e),
        CoreError::AlreadySigned { .. } | CoreError::InvalidTransition { .. }
      )),
    }
  }
  assert_eq!(sealed, 1);

  let stored = s.get(a.id).await.unwrap().unwrap();
  assert_eq!(stored.signatures.len(), 2);
  assert_eq!(Some(stored.hash.clone()), hashes.pop());
}

#[tokio::test]
async fn concurrent_host_and_guest_signatures_do_not_double_count() {
  let s = store().await;
  // Both parties race on a fresh request where the guest already signed.
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::GuestRequest(sig(GUEST))))
    .await
    .unwrap();

  let (h, g) = tokio::join!(s.sign(a.id, sig(HOST)), s.sign(a.id, sig(GUEST)));
  assert!(h.is_ok());
  assert!(g.is_err());

  let stored = s.get(a.id).await.unwrap().unwrap();
  assert_eq!(stored.status, AgreementStatus::FullySigned);
  assert_eq!(stored.signatures.len(), 2);
}

// ─── Sealed immutability ─────────────────────────────────────────────────────

#[tokio::test]
async fn sealed_content_cannot_be_rewritten_in_place() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::GuestRequest(sig(GUEST))))
    .await
    .unwrap();
  s.sign(a.id, sig(HOST)).await.unwrap();

  let id = a.id.hyphenated().to_string();
  let result = s
    .conn
    .call(move |conn| {
      Ok(conn.execute(
        "UPDATE agreements SET preamble = 'rewritten' WHERE agreement_id = ?1",
        rusqlite::params![id],
      ))
    })
    .await
    .unwrap();
  assert!(result.is_err(), "trigger should reject the edit");

  let stored = s.get(a.id).await.unwrap().unwrap();
  assert!(seal::verify(&stored));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn cancel_then_cancel_again_is_invalid() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();

  let cancelled = s.cancel(a.id, GUEST).await.unwrap();
  assert_eq!(cancelled.status, AgreementStatus::Cancelled);

  let err = s.cancel(a.id, HOST).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::InvalidTransition { .. }));
}

#[tokio::test]
async fn cancel_by_stranger_is_forbidden() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();
  let err = s.cancel(a.id, OTHER).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::Forbidden { .. }));
}

#[tokio::test]
async fn completed_agreement_cannot_be_cancelled() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::GuestRequest(sig(GUEST))))
    .await
    .unwrap();
  s.sign(a.id, sig(HOST)).await.unwrap();
  s.apply_action(a.id, HOST, LifecycleAction::Activate).await.unwrap();
  let done = s
    .apply_action(a.id, HOST, LifecycleAction::Complete)
    .await
    .unwrap();
  assert_eq!(done.status, AgreementStatus::Completed);

  let err = s.cancel(a.id, GUEST).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::InvalidTransition { .. }));

  let stored = s.get(a.id).await.unwrap().unwrap();
  assert!(seal::verify(&stored), "status changes keep the seal valid");
}

#[tokio::test]
async fn transition_if_is_idempotent_in_storage() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::GuestRequest(sig(GUEST))))
    .await
    .unwrap();
  s.sign(a.id, sig(HOST)).await.unwrap();

  let first = s
    .transition_if(a.id, AgreementStatus::FullySigned, AgreementStatus::Active)
    .await
    .unwrap();
  assert!(first.was_applied());

  let second = s
    .transition_if(a.id, AgreementStatus::FullySigned, AgreementStatus::Active)
    .await
    .unwrap();
  assert!(!second.was_applied());

  let active = s.list_by_status(AgreementStatus::Active).await.unwrap();
  assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn draft_edit_persists_and_is_blocked_after_signing() {
  let s = store().await;
  let a = s
    .create(new_agreement(HOST, GUEST, Origin::HostDraft))
    .await
    .unwrap();

  let edit = DraftEdit {
    preamble: Some("Revised preamble".into()),
    clauses:  Some(vec![Clause {
      title:   "Rate".into(),
      content: "700 per month".into(),
      order:   1,
    }]),
    ..Default::default()
  };
  s.edit_draft(a.id, HOST, edit.clone()).await.unwrap();
  let stored = s.get(a.id).await.unwrap().unwrap();
  assert_eq!(stored.preamble, "Revised preamble");
  assert_eq!(stored.clauses.len(), 1);

  s.sign(a.id, sig(HOST)).await.unwrap();
  let err = s.edit_draft(a.id, HOST, edit).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::InvalidTransition { .. }));
}

// ─── Directories ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn directories_return_seeded_rows() {
  let s = store().await;
  let user = UserProfile {
    id:    HOST,
    name:  "Aroha Ngata".into(),
    email: "aroha@example.com".into(),
  };
  let listing = Listing {
    id:          Uuid::from_u128(0x900),
    kind:        ListingKind::Stay,
    title:       "Cabin".into(),
    location:    "Wanaka".into(),
    price:       650.0,
    description: String::new(),
    user_id:     HOST,
  };
  s.put_user(&user).await.unwrap();
  s.put_listing(&listing).await.unwrap();

  let u = s.get_user(HOST).await.unwrap().unwrap();
  assert_eq!(u.name, "Aroha Ngata");
  let l = s.get_listing(listing.id).await.unwrap().unwrap();
  assert_eq!(l.kind, ListingKind::Stay);
  assert_eq!(l.price, 650.0);

  assert!(s.get_user(GUEST).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_listing_kind_is_rejected_on_read() {
  let s = store().await;
  let id = Uuid::from_u128(0x901);
  let id_str = id.hyphenated().to_string();
  let host_str = HOST.hyphenated().to_string();
  s.conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO listings (listing_id, kind, title, location, price, user_id)
         VALUES (?1, 'boat', 'Houseboat', 'Lyon', 80.0, ?2)",
        rusqlite::params![id_str, host_str],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let err = s.get_listing(id).await.unwrap_err();
  assert!(matches!(core_err(&err), CoreError::UnknownListingType(_)));
}
