//! Shared fixtures for the service and router tests.

use std::sync::Arc;

use chrono::NaiveDate;
use pact_core::{
  directory::{Listing, ListingKind, UserProfile},
  notify::Notification,
};
use pact_document::TextRenderer;
use pact_store_sqlite::SqliteStore;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{
  notify::ChannelNotifier,
  service::{AgreementService, CreateAgreement},
};

pub(crate) const HOST: Uuid = Uuid::from_u128(0x10);
pub(crate) const GUEST: Uuid = Uuid::from_u128(0x20);
pub(crate) const STRANGER: Uuid = Uuid::from_u128(0x30);
pub(crate) const LISTING: Uuid = Uuid::from_u128(0x90);

pub(crate) struct Fixture {
  pub service:       AgreementService<SqliteStore>,
  /// Held so that the queue stays open; tests may read from it.
  pub notifications: mpsc::Receiver<Notification>,
}

pub(crate) async fn fixture() -> Fixture { fixture_with(false, 64).await }

/// A service over a seeded in-memory store: three users and one stay
/// listing at 650 per month owned by [`HOST`].
pub(crate) async fn fixture_with(activate_on_seal: bool, queue: usize) -> Fixture {
  let store = SqliteStore::open_in_memory().await.unwrap();

  for (id, name) in [(HOST, "Aroha Ngata"), (GUEST, "Lukas Weber"), (STRANGER, "Mallory")] {
    store
      .put_user(&UserProfile {
        id,
        name: name.into(),
        email: format!("{}@example.com", name.split(' ').next().unwrap().to_lowercase()),
      })
      .await
      .unwrap();
  }
  store
    .put_listing(&Listing {
      id:          LISTING,
      kind:        ListingKind::Stay,
      title:       "Cabin near the lake".into(),
      location:    "Queenstown, Otago".into(),
      price:       650.0,
      description: "Two rooms, shared kitchen.".into(),
      user_id:     HOST,
    })
    .await
    .unwrap();

  let (notifier, notifications) = ChannelNotifier::channel(queue);
  let service = AgreementService::new(
    Arc::new(store),
    Arc::new(notifier),
    Arc::new(TextRenderer::default()),
  )
  .with_activate_on_seal(activate_on_seal);

  Fixture { service, notifications }
}

/// Creation input for [`LISTING`] with `counterparty`, clauses composed.
pub(crate) fn create_input(counterparty: Uuid) -> CreateAgreement {
  CreateAgreement {
    listing_id:      LISTING,
    counterparty_id: counterparty,
    preamble:        None,
    clauses:         None,
    start_date:      NaiveDate::from_ymd_opt(2026, 11, 1),
    end_date:        NaiveDate::from_ymd_opt(2027, 2, 28),
    country_code:    "nz".into(),
  }
}
