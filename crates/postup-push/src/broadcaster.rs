//! Fire-and-forget handoff from request handlers to the fan-out worker.

use std::sync::Arc;

use postup_core::{
  notification::Notification,
  store::{Notifier, SubscriptionStore},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{fanout::fan_out, transport::PushTransport};

/// Queue side of the broadcast worker.
///
/// [`Notifier::broadcast`] only enqueues, so it never blocks or fails the
/// caller. Cheap to clone.
#[derive(Clone)]
pub struct Broadcaster {
  tx: Option<mpsc::UnboundedSender<Notification>>,
}

impl Broadcaster {
  /// A broadcaster that drops every notification; used when push is not
  /// configured.
  pub fn disabled() -> Self { Self { tx: None } }

  /// Start the worker task and return the queue handle.
  ///
  /// Each queued notification is fanned out in its own task, so a slow
  /// broadcast does not hold up the next one. The worker exits once every
  /// handle has been dropped.
  pub fn spawn<S, T>(store: Arc<S>, transport: Arc<T>) -> (Self, JoinHandle<()>)
  where
    S: SubscriptionStore + 'static,
    T: PushTransport,
  {
    let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();

    let worker = tokio::spawn(async move {
      while let Some(notification) = rx.recv().await {
        let store = Arc::clone(&store);
        let transport = Arc::clone(&transport);

        tokio::spawn(async move {
          match fan_out(store, transport, &notification).await {
            Ok(report) => tracing::info!(
              title = %notification.title,
              delivered = report.delivered,
              pruned = report.pruned,
              failed = report.failed,
              "broadcast settled"
            ),
            Err(e) => tracing::error!(error = %e, "broadcast aborted"),
          }
        });
      }
      tracing::debug!("broadcast queue closed");
    });

    (Self { tx: Some(tx) }, worker)
  }

  pub fn is_enabled(&self) -> bool { self.tx.is_some() }
}

impl Notifier for Broadcaster {
  fn broadcast(&self, notification: Notification) {
    match &self.tx {
      Some(tx) => {
        if tx.send(notification).is_err() {
          tracing::warn!("broadcast worker has stopped; notification dropped");
        }
      }
      None => tracing::debug!(title = %notification.title, "push disabled; notification dropped"),
    }
  }
}
