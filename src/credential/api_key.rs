use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;

const TAG_LABEL: &[u8] = b"chirpy.webhook.api-key";

/// Compares presented webhook keys against the deployment key without
/// short-circuiting on the first differing byte.
///
/// Both keys are run through HMAC-SHA256 and the resulting tags are compared
/// with `verify_slice`, which is constant time.
pub struct ApiKeyVerifier {
    expected_tag: Option<Vec<u8>>,
}

impl ApiKeyVerifier {
    /// An empty configured key disables the verifier: every key is rejected.
    pub fn new(configured_key: &str) -> Self {
        let expected_tag = if configured_key.is_empty() {
            None
        } else {
            Self::tag(configured_key)
        };
        ApiKeyVerifier { expected_tag }
    }

    pub fn verify(&self, presented_key: &str) -> bool {
        let Some(expected) = self.expected_tag.as_deref() else {
            return false;
        };
        match Hmac::<Sha256>::new_from_slice(presented_key.as_bytes()) {
            Ok(mut mac) => {
                mac.update(TAG_LABEL);
                mac.verify_slice(expected).is_ok()
            }
            Err(_) => false,
        }
    }

    fn tag(key: &str) -> Option<Vec<u8>> {
        let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).ok()?;
        mac.update(TAG_LABEL);
        Some(mac.finalize().into_bytes().to_vec())
    }
}
