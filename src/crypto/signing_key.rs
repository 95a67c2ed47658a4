use hmac::{Hmac, Mac};

use sha2::Sha256;

use secrecy::Secret;

/// Server-held HMAC-SHA256 key, loaded once from settings at startup
#[derive(Clone)]
pub struct SigningKey(Hmac<Sha256>);

impl SigningKey {
    pub fn new(key: &Secret<String>) -> anyhow::Result<Self> {
        use secrecy::ExposeSecret;

        let hmac = Hmac::new_from_slice(key.expose_secret().as_bytes())?;

        Ok(Self(hmac))
    }

    /// Compute the MAC over a message
    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        self.0
            .clone()
            .chain_update(msg)
            .finalize()
            .into_bytes()
            .to_vec()
    }

    /// Check a MAC over a message in constant time
    pub fn verify(&self, msg: &[u8], signature: &[u8]) -> bool {
        self.0.clone().chain_update(msg).verify_slice(signature).is_ok()
    }
}
