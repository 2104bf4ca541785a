//! Push delivery transports.
//!
//! [`PushTransport`] is the seam between the fan-out and the network.
//! [`WebPushTransport`] speaks the Web Push protocol: payloads are encrypted
//! with `aes128gcm` and requests are signed with the server's VAPID key.

use std::future::Future;

use base64::{
  Engine as _, alphabet,
  engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use postup_core::subscription::Subscription;
use web_push::{
  ContentEncoding, IsahcWebPushClient, PartialVapidSignatureBuilder, SubscriptionInfo,
  VapidSignatureBuilder, WebPushClient, WebPushError, WebPushMessageBuilder,
};

use crate::{DeliveryError, Error, Result};

/// Delivers one encrypted payload to one subscription.
pub trait PushTransport: Send + Sync + 'static {
  fn deliver<'a>(
    &'a self,
    subscription: &'a Subscription,
    payload: &'a [u8],
  ) -> impl Future<Output = Result<(), DeliveryError>> + Send + 'a;
}

// ─── VAPID configuration ─────────────────────────────────────────────────────

/// base64url, padding optional (browsers and key tools disagree).
const BASE64_URL_LENIENT: GeneralPurpose = GeneralPurpose::new(
  &alphabet::URL_SAFE,
  GeneralPurposeConfig::new()
    .with_encode_padding(false)
    .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The server's push identity, built once at startup.
#[derive(Clone)]
pub struct VapidConfig {
  /// Uncompressed P-256 public key, base64url. Served to browsers.
  pub public_key:      String,
  /// The matching private key, PEM encoded (PKCS#8 or SEC1).
  pub private_key_pem: String,
  /// `sub` claim, e.g. `mailto:admin@example.com`.
  pub contact:         Option<String>,
  /// Seconds the push service may hold an undelivered message.
  pub ttl:             u32,
}

impl VapidConfig {
  /// Check that the public key decodes to a 65-byte uncompressed point.
  pub fn validate_public_key(&self) -> Result<()> {
    let bytes = BASE64_URL_LENIENT
      .decode(self.public_key.trim())
      .map_err(|e| Error::InvalidKey(e.to_string()))?;
    if bytes.len() != 65 || bytes[0] != 0x04 {
      return Err(Error::InvalidKey(format!(
        "expected a 65-byte uncompressed P-256 point, got {} bytes",
        bytes.len()
      )));
    }
    Ok(())
  }
}

// ─── Web Push ────────────────────────────────────────────────────────────────

pub struct WebPushTransport {
  client: IsahcWebPushClient,
  /// The parsed private key; bound to each subscription at send time.
  signer: PartialVapidSignatureBuilder,
  vapid:  VapidConfig,
}

impl WebPushTransport {
  /// Fails if the private key PEM does not parse.
  pub fn new(vapid: VapidConfig) -> Result<Self> {
    let signer = VapidSignatureBuilder::from_pem_no_sub(vapid.private_key_pem.as_bytes())
      .map_err(|e| Error::InvalidKey(format!("private key: {e}")))?;
    let client = IsahcWebPushClient::new()?;
    Ok(Self { client, signer, vapid })
  }

  async fn send(&self, subscription: &Subscription, payload: &[u8]) -> Result<(), WebPushError> {
    let info = SubscriptionInfo::new(
      subscription.endpoint.as_str(),
      subscription.keys.p256dh.as_str(),
      subscription.keys.auth.as_str(),
    );

    let mut signature = self.signer.clone().add_sub_info(&info);
    if let Some(contact) = &self.vapid.contact {
      signature.add_claim("sub", contact.as_str());
    }
    let signature = signature.build()?;

    let mut builder = WebPushMessageBuilder::new(&info);
    builder.set_ttl(self.vapid.ttl);
    builder.set_payload(ContentEncoding::Aes128Gcm, payload);
    builder.set_vapid_signature(signature);
    let message = builder.build()?;

    self.client.send(message).await
  }
}

/// Map a web-push failure onto the prune/keep decision.
fn classify(err: WebPushError) -> DeliveryError {
  match err {
    WebPushError::EndpointNotValid | WebPushError::EndpointNotFound => DeliveryError::Gone,
    other => DeliveryError::Transient(other.to_string()),
  }
}

impl PushTransport for WebPushTransport {
  async fn deliver<'a>(
    &'a self,
    subscription: &'a Subscription,
    payload: &'a [u8],
  ) -> Result<(), DeliveryError> {
    self.send(subscription, payload).await.map_err(classify)
  }
}
