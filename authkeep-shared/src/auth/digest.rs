/// Hash-at-rest digests for refresh credentials
///
/// Refresh tokens are never stored in plaintext. The credential store is keyed
/// by the hex-encoded SHA-256 digest of the raw token value, which is
/// deterministic so a presented token can be looked up again.
///
/// # Example
///
/// ```
/// use authkeep_shared::auth::digest::hash_token;
///
/// let digest = hash_token("eyJhbGciOiJIUzI1NiJ9.payload.signature");
/// assert_eq!(digest.len(), 64);
/// ```

use sha2::{Digest, Sha256};

/// Hashes a raw token value with SHA-256
///
/// Returns 64 lowercase hex characters.
pub fn hash_token(raw_value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_value.as_bytes());
    hex::encode(hasher.finalize())
}

/// Shortened digest for log fields
pub fn digest_prefix(digest: &str) -> &str {
    &digest[..digest.len().min(12)]
}
