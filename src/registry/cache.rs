//! Content-addressed response cache
//!
//! Only `…/blobs/sha256:<hex>` and `…/manifests/sha256:<hex>` URLs are
//! cached. The key is that suffix alone, so the same digest fetched from
//! another repository or registry hits the same entry. Storage failures are
//! swallowed: the cache never changes the outcome of a request.

use crate::common::DigestUtils;
use crate::state::storage::{KeyValueStore, MemoryStore};
use std::sync::Arc;

const BODY_SUFFIX: &str = "responseText";
const DIGEST_SUFFIX: &str = "dockerContentdigest";

/// Cached body plus the `Docker-Content-Digest` header seen with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub body: String,
    pub digest: Option<String>,
}

#[derive(Clone)]
pub struct ResponseCache {
    store: Arc<dyn KeyValueStore>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl ResponseCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Session-scoped cache
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The `(blobs|manifests)/sha256:<hex>` suffix of `url`, if it has one
    pub fn cache_key(url: &str) -> Option<&str> {
        let url = url.split(['?', '#']).next().unwrap_or(url);

        for kind in ["blobs/", "manifests/"] {
            let Some(pos) = url.rfind(kind) else {
                continue;
            };
            if pos > 0 && !url[..pos].ends_with('/') {
                continue;
            }
            let rest = &url[pos + kind.len()..];
            let Some(hex) = rest.strip_prefix("sha256:") else {
                continue;
            };
            if DigestUtils::is_lower_hex(hex) {
                return Some(&url[pos..]);
            }
        }
        None
    }

    pub fn get(&self, url: &str) -> Option<CachedResponse> {
        let key = Self::cache_key(url)?;
        let body = self
            .store
            .get(&format!("{}/{}", key, BODY_SUFFIX))
            .ok()
            .flatten()?;
        let digest = self
            .store
            .get(&format!("{}/{}", key, DIGEST_SUFFIX))
            .ok()
            .flatten();
        Some(CachedResponse { body, digest })
    }

    /// Returns whether the entry was written
    pub fn set(&self, url: &str, body: &str, digest: Option<&str>) -> bool {
        let Some(key) = Self::cache_key(url) else {
            return false;
        };
        if self
            .store
            .set(&format!("{}/{}", key, BODY_SUFFIX), body)
            .is_err()
        {
            return false;
        }
        if let Some(digest) = digest {
            if self
                .store
                .set(&format!("{}/{}", key, DIGEST_SUFFIX), digest)
                .is_err()
            {
                // a body without its digest is still a valid entry
                return true;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "sha256:4f53cda18c2baa0c0354bb5f9a3ecbe5ed12ab4d8e11ba873c2f11161202b945";

    #[test]
    fn test_cache_key() {
        let url = format!("https://reg.example.com/v2/library/alpine/blobs/{}", DIGEST);
        assert_eq!(
            ResponseCache::cache_key(&url),
            Some(format!("blobs/{}", DIGEST).as_str())
        );
        let url = format!("http://reg/v2/a/b/manifests/{}", DIGEST);
        assert_eq!(
            ResponseCache::cache_key(&url),
            Some(format!("manifests/{}", DIGEST).as_str())
        );
        assert_eq!(ResponseCache::cache_key("http://reg/v2/alpine/manifests/latest"), None);
        assert_eq!(ResponseCache::cache_key("http://reg/v2/alpine/blobs/sha256:"), None);
        assert_eq!(ResponseCache::cache_key("http://reg/v2/alpine/blobs/sha256:xyz"), None);
        assert_eq!(ResponseCache::cache_key("http://reg/v2/alpine/blobs/sha256:ABC"), None);
        assert_eq!(ResponseCache::cache_key("http://reg/v2/_catalog?n=100"), None);
    }

    #[test]
    fn test_set_then_get() {
        let cache = ResponseCache::in_memory();
        let url = format!("http://reg/v2/alpine/manifests/{}", DIGEST);
        assert!(cache.set(&url, "{\"schemaVersion\":2}", Some(DIGEST)));
        assert_eq!(
            cache.get(&url),
            Some(CachedResponse {
                body: "{\"schemaVersion\":2}".to_string(),
                digest: Some(DIGEST.to_string()),
            })
        );
    }

    #[test]
    fn test_non_digest_urls_are_not_cached() {
        let cache = ResponseCache::in_memory();
        let url = "http://reg/v2/alpine/manifests/latest";
        assert!(!cache.set(url, "body", None));
        assert_eq!(cache.get(url), None);
    }

    #[test]
    fn test_entries_shared_across_registries() {
        let cache = ResponseCache::in_memory();
        cache.set(&format!("http://one/v2/a/blobs/{}", DIGEST), "cfg", None);
        let hit = cache.get(&format!("https://two/v2/other/repo/blobs/{}", DIGEST));
        assert_eq!(hit.map(|h| h.body), Some("cfg".to_string()));
    }

    #[test]
    fn test_storage_errors_are_swallowed() {
        let cache = ResponseCache::new(Arc::new(MemoryStore::with_quota(8)));
        let url = format!("http://reg/v2/a/blobs/{}", DIGEST);
        assert!(!cache.set(&url, "a body that does not fit", None));
        assert_eq!(cache.get(&url), None);
    }
}
