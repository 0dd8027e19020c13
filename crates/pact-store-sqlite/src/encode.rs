//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings with a fixed microsecond width so
//! that they sort lexicographically. Clauses and signatures are stored as
//! compact JSON arrays. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use pact_core::{
  agreement::{Agreement, AgreementStatus, Clause, Signature},
  directory::{Listing, ListingKind, UserProfile},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── AgreementStatus ─────────────────────────────────────────────────────────

pub fn encode_status(s: AgreementStatus) -> &'static str {
  match s {
    AgreementStatus::Draft => "DRAFT",
    AgreementStatus::PendingHost => "PENDING_HOST",
    AgreementStatus::PendingGuest => "PENDING_GUEST",
    AgreementStatus::FullySigned => "FULLY_SIGNED",
    AgreementStatus::Active => "ACTIVE",
    AgreementStatus::Completed => "COMPLETED",
    AgreementStatus::Cancelled => "CANCELLED",
    AgreementStatus::Disputed => "DISPUTED",
  }
}

pub fn decode_status(s: &str) -> Result<AgreementStatus> {
  AgreementStatus::from_str(s).map_err(|_| Error::Decode {
    column: "status",
    value:  s.to_owned(),
  })
}

// ─── Structured lists ────────────────────────────────────────────────────────

pub fn encode_clauses(clauses: &[Clause]) -> Result<String> {
  Ok(serde_json::to_string(clauses)?)
}

pub fn decode_clauses(s: &str) -> Result<Vec<Clause>> {
  let mut clauses: Vec<Clause> = serde_json::from_str(s)?;
  clauses.sort_by_key(|c| c.order);
  Ok(clauses)
}

pub fn encode_signatures(signatures: &[Signature]) -> Result<String> {
  Ok(serde_json::to_string(signatures)?)
}

pub fn decode_signatures(s: &str) -> Result<Vec<Signature>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const AGREEMENT_COLUMNS: &str = "agreement_id, listing_id, host_id, guest_id, \
   preamble, clauses, start_date, end_date, status, signatures, hash, \
   finalized_at, country_code, created_at, updated_at";

/// Raw strings read directly from, or about to be written to, an
/// `agreements` row.
pub struct RawAgreement {
  pub agreement_id: String,
  pub listing_id:   String,
  pub host_id:      String,
  pub guest_id:     String,
  pub preamble:     String,
  pub clauses:      String,
  pub start_date:   Option<String>,
  pub end_date:     Option<String>,
  pub status:       String,
  pub signatures:   String,
  pub hash:         Option<String>,
  pub finalized_at: Option<String>,
  pub country_code: String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawAgreement {
  /// Read a row selected with [`AGREEMENT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      agreement_id: row.get(0)?,
      listing_id:   row.get(1)?,
      host_id:      row.get(2)?,
      guest_id:     row.get(3)?,
      preamble:     row.get(4)?,
      clauses:      row.get(5)?,
      start_date:   row.get(6)?,
      end_date:     row.get(7)?,
      status:       row.get(8)?,
      signatures:   row.get(9)?,
      hash:         row.get(10)?,
      finalized_at: row.get(11)?,
      country_code: row.get(12)?,
      created_at:   row.get(13)?,
      updated_at:   row.get(14)?,
    })
  }

  pub fn from_agreement(a: &Agreement) -> Result<Self> {
    Ok(Self {
      agreement_id: encode_uuid(a.id),
      listing_id:   encode_uuid(a.listing_id),
      host_id:      encode_uuid(a.host_id),
      guest_id:     encode_uuid(a.guest_id),
      preamble:     a.preamble.clone(),
      clauses:      encode_clauses(&a.clauses)?,
      start_date:   a.start_date.map(encode_date),
      end_date:     a.end_date.map(encode_date),
      status:       encode_status(a.status).to_owned(),
      signatures:   encode_signatures(&a.signatures)?,
      hash:         a.hash.clone(),
      finalized_at: a.finalized_at.map(encode_dt),
      country_code: a.country_code.clone(),
      created_at:   encode_dt(a.created_at),
      updated_at:   encode_dt(a.updated_at),
    })
  }

  pub fn into_agreement(self) -> Result<Agreement> {
    Ok(Agreement {
      id:           decode_uuid(&self.agreement_id)?,
      listing_id:   decode_uuid(&self.listing_id)?,
      host_id:      decode_uuid(&self.host_id)?,
      guest_id:     decode_uuid(&self.guest_id)?,
      preamble:     self.preamble,
      clauses:      decode_clauses(&self.clauses)?,
      start_date:   self.start_date.as_deref().map(decode_date).transpose()?,
      end_date:     self.end_date.as_deref().map(decode_date).transpose()?,
      status:       decode_status(&self.status)?,
      signatures:   decode_signatures(&self.signatures)?,
      hash:         self.hash,
      finalized_at: self.finalized_at.as_deref().map(decode_dt).transpose()?,
      country_code: self.country_code,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `listings` row.
pub struct RawListing {
  pub listing_id:  String,
  pub kind:        String,
  pub title:       String,
  pub location:    String,
  pub price:       f64,
  pub description: String,
  pub user_id:     String,
}

impl RawListing {
  pub fn into_listing(self) -> Result<Listing> {
    Ok(Listing {
      id:          decode_uuid(&self.listing_id)?,
      kind:        ListingKind::parse(&self.kind)?,
      title:       self.title,
      location:    self.location,
      price:       self.price,
      description: self.description,
      user_id:     decode_uuid(&self.user_id)?,
    })
  }
}

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id: String,
  pub name:    String,
  pub email:   String,
}

impl RawUser {
  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      id:    decode_uuid(&self.user_id)?,
      name:  self.name,
      email: self.email,
    })
  }
}
