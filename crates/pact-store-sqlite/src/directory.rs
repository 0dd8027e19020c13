//! Listing and user lookups backed by the mirror tables in the same database.
//!
//! Pact never edits these rows during normal operation; the `put_*` methods
//! exist for seeding and for the marketplace's sync job.

use pact_core::directory::{Listing, ListingDirectory, UserDirectory, UserProfile};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Result, SqliteStore,
  encode::{RawListing, RawUser, encode_uuid},
};

impl SqliteStore {
  /// Insert or replace a user profile.
  pub async fn put_user(&self, user: &UserProfile) -> Result<()> {
    let id_str = encode_uuid(user.id);
    let name   = user.name.clone();
    let email  = user.email.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, name, email) VALUES (?1, ?2, ?3)
           ON CONFLICT (user_id) DO UPDATE SET name = ?2, email = ?3",
          rusqlite::params![id_str, name, email],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert or replace a listing.
  pub async fn put_listing(&self, listing: &Listing) -> Result<()> {
    let id_str      = encode_uuid(listing.id);
    let kind        = listing.kind.as_ref().to_owned();
    let title       = listing.title.clone();
    let location    = listing.location.clone();
    let price       = listing.price;
    let description = listing.description.clone();
    let user_str    = encode_uuid(listing.user_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO listings
             (listing_id, kind, title, location, price, description, user_id)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
           ON CONFLICT (listing_id) DO UPDATE SET
             kind = ?2, title = ?3, location = ?4, price = ?5,
             description = ?6, user_id = ?7",
          rusqlite::params![
            id_str,
            kind,
            title,
            location,
            price,
            description,
            user_str
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl ListingDirectory for SqliteStore {
  type Error = crate::Error;

  async fn get_listing(&self, id: Uuid) -> Result<Option<Listing>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawListing> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT listing_id, kind, title, location, price, description, user_id
             FROM listings WHERE listing_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawListing {
                listing_id:  row.get(0)?,
                kind:        row.get(1)?,
                title:       row.get(2)?,
                location:    row.get(3)?,
                price:       row.get(4)?,
                description: row.get(5)?,
                user_id:     row.get(6)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawListing::into_listing).transpose()
  }
}

impl UserDirectory for SqliteStore {
  type Error = crate::Error;

  async fn get_user(&self, id: Uuid) -> Result<Option<UserProfile>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, name, email FROM users WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawUser {
                user_id: row.get(0)?,
                name:    row.get(1)?,
                email:   row.get(2)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_profile).transpose()
  }
}
