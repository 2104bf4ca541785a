//! VAPID key generation for `--generate-vapid-keys`.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use p256::{
  SecretKey,
  elliptic_curve::sec1::ToEncodedPoint,
  pkcs8::{EncodePrivateKey, LineEnding},
};
use rand_core::OsRng;

/// A fresh server identity for Web Push.
pub struct VapidKeyPair {
  /// Uncompressed SEC1 point, base64url without padding.
  pub public_key:      String,
  /// PKCS#8 PEM.
  pub private_key_pem: String,
}

pub fn generate_vapid_keys() -> Result<VapidKeyPair, p256::pkcs8::Error> {
  let secret = SecretKey::random(&mut OsRng);
  let pem = secret.to_pkcs8_pem(LineEnding::LF)?;
  let point = secret.public_key().to_encoded_point(false);

  Ok(VapidKeyPair {
    public_key:      URL_SAFE_NO_PAD.encode(point.as_bytes()),
    private_key_pem: pem.as_str().to_owned(),
  })
}
