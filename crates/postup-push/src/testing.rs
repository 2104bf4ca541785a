//! Test doubles: a scripted [`PushTransport`] and a store that refuses deletes.

use std::{collections::HashMap, sync::Mutex};

use postup_core::{
  store::SubscriptionStore,
  subscription::{NewSubscription, Subscription},
};
use postup_store_sqlite::SqliteStore;

use crate::{DeliveryError, transport::PushTransport};

/// Succeeds for every endpoint except those given a scripted failure, and
/// records what it was asked to deliver.
#[derive(Default)]
pub struct ScriptedTransport {
  failures:  HashMap<String, DeliveryError>,
  attempted: Mutex<Vec<String>>,
  payload:   Mutex<Vec<u8>>,
}

impl ScriptedTransport {
  pub fn fail(mut self, endpoint: &str, err: DeliveryError) -> Self {
    self.failures.insert(endpoint.to_owned(), err);
    self
  }

  pub fn attempted(&self) -> Vec<String> { self.attempted.lock().unwrap().clone() }

  pub fn last_payload(&self) -> Vec<u8> { self.payload.lock().unwrap().clone() }
}

impl PushTransport for ScriptedTransport {
  async fn deliver<'a>(
    &'a self,
    subscription: &'a Subscription,
    payload: &'a [u8],
  ) -> Result<(), DeliveryError> {
    self.attempted.lock().unwrap().push(subscription.endpoint.clone());
    *self.payload.lock().unwrap() = payload.to_vec();
    match self.failures.get(&subscription.endpoint) {
      Some(err) => Err(err.clone()),
      None => Ok(()),
    }
  }
}

/// Delegates to SQLite but fails every delete.
pub struct UndeletableStore(pub SqliteStore);

impl SubscriptionStore for UndeletableStore {
  type Error = postup_store_sqlite::Error;

  async fn upsert_subscription(
    &self,
    input: NewSubscription,
  ) -> Result<Subscription, Self::Error> {
    self.0.upsert_subscription(input).await
  }

  async fn delete_subscription<'a>(&'a self, _endpoint: &'a str) -> Result<bool, Self::Error> {
    Err(postup_store_sqlite::Error::CorruptRow("deletes are disabled".into()))
  }

  async fn list_subscriptions(&self) -> Result<Vec<Subscription>, Self::Error> {
    self.0.list_subscriptions().await
  }
}
