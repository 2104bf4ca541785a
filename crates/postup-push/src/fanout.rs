//! One broadcast: deliver a notification to every subscription.

use std::sync::Arc;

use postup_core::{notification::Notification, store::SubscriptionStore};
use tokio::task::JoinSet;

use crate::{DeliveryError, Error, Result, transport::PushTransport};

/// What happened to each subscription during one fan-out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanOutReport {
  pub delivered: usize,
  /// Endpoints reported gone and removed from the store.
  pub pruned:    usize,
  /// Transient failures, and gone endpoints that could not be removed.
  pub failed:    usize,
}

enum Outcome {
  Delivered,
  Pruned,
  Failed,
}

/// Deliver `notification` to every stored subscription concurrently and wait
/// for all attempts to settle.
///
/// A single failed delivery never aborts the others. Only failing to load the
/// subscription list or to encode the payload is an error.
pub async fn fan_out<S, T>(
  store: Arc<S>,
  transport: Arc<T>,
  notification: &Notification,
) -> Result<FanOutReport>
where
  S: SubscriptionStore + 'static,
  T: PushTransport,
{
  let payload: Arc<[u8]> = notification.to_payload()?.into();
  let subscriptions = store
    .list_subscriptions()
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  let mut attempts = JoinSet::new();
  for subscription in subscriptions {
    let store = Arc::clone(&store);
    let transport = Arc::clone(&transport);
    let payload = Arc::clone(&payload);

    attempts.spawn(async move {
      match transport.deliver(&subscription, &payload).await {
        Ok(()) => Outcome::Delivered,
        Err(DeliveryError::Gone) => {
          match store.delete_subscription(&subscription.endpoint).await {
            Ok(_) => {
              tracing::info!(endpoint = %subscription.endpoint, "pruned gone subscription");
              Outcome::Pruned
            }
            Err(e) => {
              tracing::error!(
                error = %e,
                endpoint = %subscription.endpoint,
                "failed to prune gone subscription"
              );
              Outcome::Failed
            }
          }
        }
        Err(DeliveryError::Transient(reason)) => {
          tracing::warn!(endpoint = %subscription.endpoint, %reason, "push delivery failed");
          Outcome::Failed
        }
      }
    });
  }

  let mut report = FanOutReport::default();
  while let Some(joined) = attempts.join_next().await {
    match joined {
      Ok(Outcome::Delivered) => report.delivered += 1,
      Ok(Outcome::Pruned) => report.pruned += 1,
      Ok(Outcome::Failed) => report.failed += 1,
      Err(e) => {
        tracing::error!(error = %e, "push delivery task panicked");
        report.failed += 1;
      }
    }
  }
  Ok(report)
}
