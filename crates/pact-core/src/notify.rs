//! Notifications to the other party after a committed state change.
//!
//! Delivery is fire-and-forget: a [`Notifier`] must not block, and callers
//! log a failed delivery instead of propagating it.

use serde::Serialize;
use strum::{AsRefStr, Display};
use uuid::Uuid;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationEvent {
  AgreementCreated,
  AgreementRequested,
  AgreementSigned,
  AgreementSealed,
  AgreementCancelled,
  AgreementStatusChanged,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
  pub user_id: Uuid,
  pub event:   NotificationEvent,
  pub payload: serde_json::Value,
}

pub trait Notifier: Send + Sync {
  /// Hand `notification` off for delivery without waiting for it.
  fn notify(&self, notification: Notification) -> Result<()>;
}
