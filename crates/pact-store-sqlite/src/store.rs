//! [`SqliteStore`], the SQLite implementation of [`AgreementStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use pact_core::{
  agreement::{
    Agreement, AgreementStatus, DraftEdit, NewAgreement, SignatureInput,
    timestamp_now,
  },
  lifecycle::{self, LifecycleAction, Signed, Transition},
  store::{AgreementQuery, AgreementStore, RoleFilter},
};
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{AGREEMENT_COLUMNS, RawAgreement, encode_status, encode_uuid},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Pact agreement store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted, and every
/// clone shares the same database thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, mostly for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Load one agreement, apply `f` and persist its result, all inside one
  /// `IMMEDIATE` transaction. `f` returns `None` when nothing needs writing.
  async fn mutate<T, F>(&self, id: Uuid, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Agreement, DateTime<Utc>) -> pact_core::Result<(Option<Agreement>, T)>
      + Send
      + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(mutate_in_tx(conn, id, f)))
      .await?
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn select_agreement(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawAgreement>> {
  conn
    .query_row(
      &format!("SELECT {AGREEMENT_COLUMNS} FROM agreements WHERE agreement_id = ?1"),
      rusqlite::params![id_str],
      RawAgreement::from_row,
    )
    .optional()
}

fn insert_agreement(
  conn: &rusqlite::Connection,
  row: &RawAgreement,
) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT INTO agreements ({AGREEMENT_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    ),
    rusqlite::params![
      row.agreement_id,
      row.listing_id,
      row.host_id,
      row.guest_id,
      row.preamble,
      row.clauses,
      row.start_date,
      row.end_date,
      row.status,
      row.signatures,
      row.hash,
      row.finalized_at,
      row.country_code,
      row.created_at,
      row.updated_at,
    ],
  )?;
  Ok(())
}

/// Write `next` over `current`, guarded on the row still holding `current`'s
/// status and timestamp. Returns the number of rows changed.
fn write_agreement(
  conn: &rusqlite::Connection,
  current: &Agreement,
  next: &Agreement,
) -> Result<usize> {
  let before = RawAgreement::from_agreement(current)?;
  let row = RawAgreement::from_agreement(next)?;

  // Sealed content is frozen; only the status may move.
  let changed = if current.is_sealed() {
    conn.execute(
      "UPDATE agreements SET status = ?1, updated_at = ?2
       WHERE agreement_id = ?3 AND status = ?4 AND updated_at = ?5",
      rusqlite::params![
        row.status,
        row.updated_at,
        row.agreement_id,
        before.status,
        before.updated_at,
      ],
    )?
  } else {
    conn.execute(
      "UPDATE agreements SET
         preamble = ?1, clauses = ?2, start_date = ?3, end_date = ?4,
         status = ?5, signatures = ?6, hash = ?7, finalized_at = ?8,
         updated_at = ?9
       WHERE agreement_id = ?10 AND status = ?11 AND updated_at = ?12",
      rusqlite::params![
        row.preamble,
        row.clauses,
        row.start_date,
        row.end_date,
        row.status,
        row.signatures,
        row.hash,
        row.finalized_at,
        row.updated_at,
        row.agreement_id,
        before.status,
        before.updated_at,
      ],
    )?
  };
  Ok(changed)
}

fn mutate_in_tx<T, F>(conn: &mut rusqlite::Connection, id: Uuid, f: F) -> Result<T>
where
  F: FnOnce(&Agreement, DateTime<Utc>) -> pact_core::Result<(Option<Agreement>, T)>,
{
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

  let current = select_agreement(&tx, &encode_uuid(id))?
    .ok_or(pact_core::Error::AgreementNotFound(id))?
    .into_agreement()?;

  // Dropping `tx` on any error below rolls the transaction back.
  let (next, value) = f(&current, timestamp_now())?;
  if let Some(next) = next {
    if write_agreement(&tx, &current, &next)? != 1 {
      return Err(Error::Conflict(id));
    }
    tx.commit()?;
  }
  Ok(value)
}

// ─── AgreementStore impl ─────────────────────────────────────────────────────

impl AgreementStore for SqliteStore {
  type Error = Error;

  async fn create(&self, input: NewAgreement) -> Result<Agreement> {
    let agreement = input.into_agreement(timestamp_now())?;
    let row = RawAgreement::from_agreement(&agreement)?;

    self
      .conn
      .call(move |conn| {
        insert_agreement(conn, &row)?;
        Ok(())
      })
      .await?;

    Ok(agreement)
  }

  async fn get(&self, id: Uuid) -> Result<Option<Agreement>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAgreement> = self
      .conn
      .call(move |conn| Ok(select_agreement(conn, &id_str)?))
      .await?;

    raw.map(RawAgreement::into_agreement).transpose()
  }

  async fn list_for_user(&self, query: &AgreementQuery) -> Result<Vec<Agreement>> {
    let user_str   = encode_uuid(query.user_id);
    let role_str   = query.role.map(|r| match r {
      RoleFilter::Host => "host",
      RoleFilter::Guest => "guest",
    });
    let status_str = query.status.map(encode_status);
    let limit_val  = query.limit.map(|l| l as i64).unwrap_or(-1);
    let offset_val = query.offset.unwrap_or(0) as i64;

    let raws: Vec<RawAgreement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AGREEMENT_COLUMNS} FROM agreements
           WHERE ((?2 IS NULL AND (host_id = ?1 OR guest_id = ?1))
               OR (?2 = 'host'  AND host_id  = ?1)
               OR (?2 = 'guest' AND guest_id = ?1))
             AND (?3 IS NULL OR status = ?3)
           ORDER BY updated_at DESC, created_at DESC
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_str, role_str, status_str, limit_val, offset_val],
            RawAgreement::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAgreement::into_agreement).collect()
  }

  async fn list_by_status(&self, status: AgreementStatus) -> Result<Vec<Agreement>> {
    let status_str = encode_status(status);

    let raws: Vec<RawAgreement> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {AGREEMENT_COLUMNS} FROM agreements WHERE status = ?1
           ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![status_str], RawAgreement::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAgreement::into_agreement).collect()
  }

  async fn sign(&self, id: Uuid, input: SignatureInput) -> Result<Signed> {
    self
      .mutate(id, move |current, now| {
        let signed = lifecycle::sign(current, input, now)?;
        Ok((Some(signed.agreement.clone()), signed))
      })
      .await
  }

  async fn edit_draft(&self, id: Uuid, by: Uuid, edit: DraftEdit) -> Result<Agreement> {
    self
      .mutate(id, move |current, now| {
        let edited = lifecycle::edit_draft(current, by, edit, now)?;
        Ok((Some(edited.clone()), edited))
      })
      .await
  }

  async fn apply_action(
    &self,
    id: Uuid,
    by: Uuid,
    action: LifecycleAction,
  ) -> Result<Agreement> {
    self
      .mutate(id, move |current, now| {
        let next = lifecycle::apply_action(current, by, action, now)?;
        Ok((Some(next.clone()), next))
      })
      .await
  }

  async fn transition_if(
    &self,
    id: Uuid,
    expected: AgreementStatus,
    next: AgreementStatus,
  ) -> Result<Transition> {
    self
      .mutate(id, move |current, now| {
        let transition = lifecycle::transition_if(current, expected, next, now)?;
        let write = match &transition {
          Transition::Applied(a) => Some(a.clone()),
          Transition::AlreadyApplied(_) => None,
        };
        Ok((write, transition))
      })
      .await
  }
}
