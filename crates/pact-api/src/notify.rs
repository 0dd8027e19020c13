//! In-process notification queue.
//!
//! [`ChannelNotifier`] hands notifications to a bounded channel with
//! `try_send`, so a slow consumer can never stall a signing request. A full
//! queue drops the notification and reports it to the caller for logging.

use pact_core::{
  Error,
  notify::{Notification, Notifier},
};
use tokio::{
  sync::mpsc::{self, error::TrySendError},
  task::JoinHandle,
};

#[derive(Clone)]
pub struct ChannelNotifier {
  tx: mpsc::Sender<Notification>,
}

impl ChannelNotifier {
  /// A notifier plus the receiving end of its queue.
  pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<Notification>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (Self { tx }, rx)
  }

  /// A notifier whose queue is drained by a background task that logs each
  /// delivery. Must be called from within a Tokio runtime.
  pub fn spawn(buffer: usize) -> (Self, JoinHandle<()>) {
    let (notifier, mut rx) = Self::channel(buffer);
    let handle = tokio::spawn(async move {
      while let Some(n) = rx.recv().await {
        tracing::info!(
          user_id = %n.user_id,
          event = %n.event,
          payload = %n.payload,
          "notification delivered"
        );
      }
    });
    (notifier, handle)
  }
}

impl Notifier for ChannelNotifier {
  fn notify(&self, notification: Notification) -> pact_core::Result<()> {
    self.tx.try_send(notification).map_err(|e| match e {
      TrySendError::Full(n) => Error::NotificationFailed(format!(
        "queue full, dropped {} for {}",
        n.event, n.user_id
      )),
      TrySendError::Closed(n) => Error::NotificationFailed(format!(
        "queue closed, dropped {} for {}",
        n.event, n.user_id
      )),
    })
  }
}

#[cfg(test)]
mod tests {
  use pact_core::notify::NotificationEvent;
  use serde_json::json;
  use uuid::Uuid;

  use super::*;

  fn note() -> Notification {
    Notification {
      user_id: Uuid::from_u128(1),
      event:   NotificationEvent::AgreementSigned,
      payload: json!({ "agreementId": Uuid::from_u128(9) }),
    }
  }

  #[tokio::test]
  async fn delivers_in_order() {
    let (notifier, mut rx) = ChannelNotifier::channel(4);
    notifier.notify(note()).unwrap();
    let mut second = note();
    second.event = NotificationEvent::AgreementSealed;
    notifier.notify(second).unwrap();

    assert_eq!(rx.recv().await.unwrap().event, NotificationEvent::AgreementSigned);
    assert_eq!(rx.recv().await.unwrap().event, NotificationEvent::AgreementSealed);
  }

  #[tokio::test]
  async fn full_queue_fails_without_blocking() {
    let (notifier, _rx) = ChannelNotifier::channel(1);
    notifier.notify(note()).unwrap();
    assert!(matches!(
      notifier.notify(note()),
      Err(Error::NotificationFailed(_))
    ));
  }

  #[tokio::test]
  async fn closed_queue_fails() {
    let (notifier, rx) = ChannelNotifier::channel(1);
    drop(rx);
    assert!(notifier.notify(note()).is_err());
  }
}
