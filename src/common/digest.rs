//! SHA256 digest utilities for content-addressed registry objects
//!
//! Manifests and blobs fetched by digest are immutable; these helpers decide
//! which references are digests and whether a body really matches one.

use sha2::Digest;

/// Utilities for working with SHA256 digests in registry context
pub struct DigestUtils;

impl DigestUtils {
    /// Compute SHA256 digest from byte data
    pub fn compute_sha256(data: &[u8]) -> String {
        let mut hasher = sha2::Sha256::new();
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Compute full Docker digest (with sha256: prefix) from byte data
    pub fn compute_docker_digest(data: &[u8]) -> String {
        format!("sha256:{}", Self::compute_sha256(data))
    }

    /// Lower-case hex run of at least one character
    pub fn is_lower_hex(value: &str) -> bool {
        !value.is_empty() && value.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// True when the reference is literally `sha256:<hex>`
    pub fn is_sha256_reference(reference: &str) -> bool {
        reference
            .strip_prefix("sha256:")
            .map(Self::is_lower_hex)
            .unwrap_or(false)
    }

    /// Check a body against a `sha256:<hex>` digest
    pub fn matches(data: &[u8], digest: &str) -> bool {
        match digest.strip_prefix("sha256:") {
            Some(expected) => Self::compute_sha256(data) == expected,
            None => false,
        }
    }
}
