//! Handlers for `/agreements` endpoints.
//!
//! Every route requires the `x-user-id` header and only serves agreements the
//! caller is a party to.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/agreements` | Host drafts against own listing; 201, `DRAFT` |
//! | `POST`  | `/agreements/request` | Guest requests against a host's listing; 201, `PENDING_HOST` |
//! | `GET`   | `/agreements` | Optional `role=host\|guest`, `status`, `limit`, `offset` |
//! | `GET`   | `/agreements/{id}` | |
//! | `PATCH` | `/agreements/{id}` | Body `{"action": "sign"\|"cancel"\|"edit"\|"activate"\|"complete"\|"dispute"}` |
//! | `GET`   | `/agreements/{id}/verify` | Recomputes the integrity hash |
//! | `GET`   | `/agreements/{id}/document` | Text attachment, sealed agreements only |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, QueryRejection},
  },
  http::{StatusCode, header},
  response::IntoResponse,
};
use chrono::NaiveDate;
use pact_core::{
  agreement::{Agreement, AgreementStatus, Clause, DraftEdit},
  lifecycle::LifecycleAction,
  store::RoleFilter,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  error::ApiError,
  extract::{Actor, ClientIp},
  service::{AgreementService, Backend, CreateAgreement, ListFilter, Verification},
};

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /agreements`
pub async fn create<S: Backend>(
  State(service): State<AgreementService<S>>,
  Actor(actor): Actor,
  body: Result<Json<CreateAgreement>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = body?;
  let agreement = service.create_draft(actor, input).await?;
  Ok((StatusCode::CREATED, Json(agreement)))
}

/// `POST /agreements/request`
pub async fn request<S: Backend>(
  State(service): State<AgreementService<S>>,
  Actor(actor): Actor,
  ClientIp(ip): ClientIp,
  body: Result<Json<CreateAgreement>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(input) = body?;
  let agreement = service.request(actor, input, ip).await?;
  Ok((StatusCode::CREATED, Json(agreement)))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub role:   Option<RoleFilter>,
  pub status: Option<AgreementStatus>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

/// `GET /agreements[?role=host|guest][&status=...][&limit=...][&offset=...]`
pub async fn list<S: Backend>(
  State(service): State<AgreementService<S>>,
  Actor(actor): Actor,
  params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Agreement>>, ApiError> {
  let Query(params) = params?;
  let filter = ListFilter {
    role:   params.role,
    status: params.status,
    limit:  params.limit,
    offset: params.offset,
  };
  Ok(Json(service.list(actor, filter).await?))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /agreements/{id}`
pub async fn get_one<S: Backend>(
  State(service): State<AgreementService<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Agreement>, ApiError> {
  Ok(Json(service.get(actor, id).await?))
}

// ─── Actions ─────────────────────────────────────────────────────────────────

/// Fields accepted by `{"action": "edit"}`; omitted fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditBody {
  pub preamble:   Option<String>,
  pub clauses:    Option<Vec<Clause>>,
  pub start_date: Option<NaiveDate>,
  pub end_date:   Option<NaiveDate>,
}

impl From<EditBody> for DraftEdit {
  fn from(b: EditBody) -> Self {
    DraftEdit {
      preamble:   b.preamble,
      clauses:    b.clauses,
      start_date: b.start_date,
      end_date:   b.end_date,
    }
  }
}

/// JSON body accepted by `PATCH /agreements/{id}`.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PatchBody {
  Sign,
  Cancel,
  Edit(EditBody),
  Activate,
  Complete,
  Dispute,
}

/// `PATCH /agreements/{id}`
pub async fn patch<S: Backend>(
  State(service): State<AgreementService<S>>,
  Actor(actor): Actor,
  ClientIp(ip): ClientIp,
  Path(id): Path<Uuid>,
  body: Result<Json<PatchBody>, JsonRejection>,
) -> Result<Json<Agreement>, ApiError> {
  let Json(body) = body?;
  let agreement = match body {
    PatchBody::Sign => service.sign(actor, id, ip).await?,
    PatchBody::Cancel => service.cancel(actor, id).await?,
    PatchBody::Edit(edit) => service.edit(actor, id, edit.into()).await?,
    PatchBody::Activate => {
      service.lifecycle(actor, id, LifecycleAction::Activate).await?
    }
    PatchBody::Complete => {
      service.lifecycle(actor, id, LifecycleAction::Complete).await?
    }
    PatchBody::Dispute => {
      service.lifecycle(actor, id, LifecycleAction::Dispute).await?
    }
  };
  Ok(Json(agreement))
}

// ─── Integrity and documents ─────────────────────────────────────────────────

/// `GET /agreements/{id}/verify`
pub async fn verify<S: Backend>(
  State(service): State<AgreementService<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Verification>, ApiError> {
  Ok(Json(service.verify(actor, id).await?))
}

/// `GET /agreements/{id}/document`
pub async fn document<S: Backend>(
  State(service): State<AgreementService<S>>,
  Actor(actor): Actor,
  Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
  let doc = service.document(actor, id).await?;
  Ok((
    [
      (header::CONTENT_TYPE, doc.media_type.to_owned()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{}\"", doc.file_name),
      ),
    ],
    doc.body,
  ))
}
