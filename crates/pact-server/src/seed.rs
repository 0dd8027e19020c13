//! Directory seeding from a JSON file.
//!
//! ```json
//! {
//!   "users":    [{ "id": "...", "name": "Aroha Ngata", "email": "aroha@example.com" }],
//!   "listings": [{ "id": "...", "kind": "stay", "title": "...", "location": "...",
//!                  "price": 650.0, "description": "...", "userId": "..." }]
//! }
//! ```

use std::path::Path;

use anyhow::Context as _;
use pact_core::directory::{Listing, UserProfile};
use pact_store_sqlite::SqliteStore;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
  pub users:    Vec<UserProfile>,
  pub listings: Vec<Listing>,
}

impl Seed {
  pub fn parse(json: &str) -> anyhow::Result<Self> {
    serde_json::from_str(json).context("malformed seed file")
  }

  /// Upsert every user, then every listing. Returns the counts written.
  pub async fn apply(&self, store: &SqliteStore) -> anyhow::Result<(usize, usize)> {
    for user in &self.users {
      store
        .put_user(user)
        .await
        .with_context(|| format!("failed to store user {}", user.id))?;
    }
    for listing in &self.listings {
      store
        .put_listing(listing)
        .await
        .with_context(|| format!("failed to store listing {}", listing.id))?;
    }
    Ok((self.users.len(), self.listings.len()))
  }
}

/// Read and apply the seed file at `path`.
pub async fn load(store: &SqliteStore, path: &Path) -> anyhow::Result<(usize, usize)> {
  let raw = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  Seed::parse(&raw)?.apply(store).await
}

#[cfg(test)]
mod tests {
  use pact_core::directory::{ListingDirectory, ListingKind, UserDirectory};
  use uuid::Uuid;

  use super::*;

  const SEED: &str = r#"{
    "users": [
      { "id": "00000000-0000-0000-0000-000000000010", "name": "Aroha Ngata", "email": "aroha@example.com" }
    ],
    "listings": [
      {
        "id": "00000000-0000-0000-0000-000000000090",
        "kind": "job",
        "title": "Fruit picking",
        "location": "Hawke's Bay",
        "price": 720.0,
        "description": "Seasonal harvest work.",
        "userId": "00000000-0000-0000-0000-000000000010"
      }
    ]
  }"#;

  #[tokio::test]
  async fn seed_populates_directories() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let counts = Seed::parse(SEED).unwrap().apply(&store).await.unwrap();
    assert_eq!(counts, (1, 1));

    let user = store.get_user(Uuid::from_u128(0x10)).await.unwrap().unwrap();
    assert_eq!(user.name, "Aroha Ngata");

    let listing = store.get_listing(Uuid::from_u128(0x90)).await.unwrap().unwrap();
    assert_eq!(listing.kind, ListingKind::Job);
    assert_eq!(listing.user_id, user.id);
  }

  #[tokio::test]
  async fn reseeding_updates_in_place() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    Seed::parse(SEED).unwrap().apply(&store).await.unwrap();

    let renamed = SEED.replace("Aroha Ngata", "Aroha Ngata-Smith");
    Seed::parse(&renamed).unwrap().apply(&store).await.unwrap();

    let user = store.get_user(Uuid::from_u128(0x10)).await.unwrap().unwrap();
    assert_eq!(user.name, "Aroha Ngata-Smith");
  }

  #[test]
  fn unknown_listing_kind_is_rejected() {
    let bad = SEED.replace("\"job\"", "\"boat\"");
    assert!(Seed::parse(&bad).is_err());
  }

  #[test]
  fn empty_seed_is_allowed() {
    let seed = Seed::parse("{}").unwrap();
    assert!(seed.users.is_empty() && seed.listings.is_empty());
  }
}
