//! Integrity sealing.
//!
//! The seal is a SHA-256 digest over a canonical JSON serialisation of the
//! agreement's content and signatures. Field order is fixed by the struct
//! below, clauses are ordered by `order` and signatures by
//! `(signed_at, user_id)`, so the digest is independent of how the
//! agreement was loaded.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  Error, Result,
  agreement::{Agreement, Clause, PartyRole},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SealContent<'a> {
  preamble:   &'a str,
  clauses:    Vec<&'a Clause>,
  host_id:    Uuid,
  guest_id:   Uuid,
  start_date: Option<NaiveDate>,
  end_date:   Option<NaiveDate>,
  signatures: Vec<SealSignature<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SealSignature<'a> {
  user_id:    Uuid,
  name:       &'a str,
  signed_at:  String,
  ip_address: &'a str,
}

fn canonical_timestamp(ts: DateTime<Utc>) -> String {
  ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// The exact bytes the digest is computed over.
pub fn canonical_bytes(agreement: &Agreement) -> Result<Vec<u8>> {
  let mut clauses: Vec<&Clause> = agreement.clauses.iter().collect();
  clauses.sort_by_key(|c| c.order);

  let mut signatures: Vec<SealSignature<'_>> = agreement
    .signatures
    .iter()
    .map(|s| SealSignature {
      user_id:    s.user_id,
      name:       &s.name,
      signed_at:  canonical_timestamp(s.signed_at),
      ip_address: &s.ip_address,
    })
    .collect();
  signatures.sort_by(|a, b| {
    (a.signed_at.as_str(), a.user_id).cmp(&(b.signed_at.as_str(), b.user_id))
  });

  let content = SealContent {
    preamble: &agreement.preamble,
    clauses,
    host_id: agreement.host_id,
    guest_id: agreement.guest_id,
    start_date: agreement.start_date,
    end_date: agreement.end_date,
    signatures,
  };
  Ok(serde_json::to_vec(&content)?)
}

/// Recompute the digest from the agreement's current fields.
pub fn compute_hash(agreement: &Agreement) -> Result<String> {
  let bytes = canonical_bytes(agreement)?;
  Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Stamp `hash` and `finalized_at`. Fails if the agreement is already sealed
/// or either party's signature is missing.
pub fn seal(agreement: &mut Agreement, at: DateTime<Utc>) -> Result<()> {
  if agreement.is_sealed() || agreement.finalized_at.is_some() {
    return Err(Error::SealFailed(format!(
      "agreement {} is already sealed",
      agreement.id
    )));
  }
  for role in [PartyRole::Host, PartyRole::Guest] {
    if agreement.signature_of(role).is_none() {
      return Err(Error::SealFailed(format!(
        "agreement {} is missing the {role} signature",
        agreement.id
      )));
    }
  }
  if agreement.signatures.len() != 2 {
    return Err(Error::SealFailed(format!(
      "agreement {} has {} signatures",
      agreement.id,
      agreement.signatures.len()
    )));
  }

  agreement.hash = Some(compute_hash(agreement)?);
  agreement.finalized_at = Some(at);
  Ok(())
}

/// `true` if the agreement carries a hash that matches its current content.
/// Unsealed agreements never verify.
pub fn verify(agreement: &Agreement) -> bool {
  match (&agreement.hash, compute_hash(agreement)) {
    (Some(stored), Ok(computed)) => *stored == computed,
    _ => false,
  }
}
