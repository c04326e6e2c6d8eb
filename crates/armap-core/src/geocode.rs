//! Postcode geocoding seam.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, PoisonError};

use crate::model::Coordinate;

/// Postcode to coordinate lookup.
///
/// `Ok(None)` means the service answered but has no usable coordinate for
/// the postcode. Errors are reserved for failed or malformed lookups.
pub trait Geocoder: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn lookup(
        &self,
        postcode: &str,
    ) -> impl Future<Output = Result<Option<Coordinate>, Self::Error>> + Send;
}

/// Cache key for a postcode: uppercase with all whitespace removed, so
/// `"ab1 2cd"` and `"AB12CD"` share an entry.
#[must_use]
pub fn normalize_postcode(postcode: &str) -> String {
    postcode
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Process-lifetime postcode cache in front of another [`Geocoder`].
///
/// Answers (including "no match") are kept forever; errors are not cached.
pub struct CachedGeocoder<G> {
    inner: G,
    entries: Mutex<HashMap<String, Option<Coordinate>>>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Number of cached postcodes.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cached(&self, key: &str) -> Option<Option<Coordinate>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    type Error = G::Error;

    async fn lookup(&self, postcode: &str) -> Result<Option<Coordinate>, Self::Error> {
        let key = normalize_postcode(postcode);
        if let Some(hit) = self.cached(&key) {
            tracing::trace!(postcode = %key, "postcode cache hit");
            return Ok(hit);
        }

        let answer = self.inner.lookup(postcode).await?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, answer);
        Ok(answer)
    }
}

/// Either a cached or a direct geocoder, chosen at startup from config.
pub enum MaybeCached<G> {
    Cached(CachedGeocoder<G>),
    Direct(G),
}

impl<G: Geocoder> MaybeCached<G> {
    pub fn new(inner: G, cache: bool) -> Self {
        if cache {
            MaybeCached::Cached(CachedGeocoder::new(inner))
        } else {
            MaybeCached::Direct(inner)
        }
    }
}

impl<G: Geocoder> Geocoder for MaybeCached<G> {
    type Error = G::Error;

    async fn lookup(&self, postcode: &str) -> Result<Option<Coordinate>, Self::Error> {
        match self {
            MaybeCached::Cached(cached) => cached.lookup(postcode).await,
            MaybeCached::Direct(direct) => direct.lookup(postcode).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("lookup failed")]
    struct Boom;

    struct CountingGeocoder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Geocoder for CountingGeocoder {
        type Error = Boom;

        async fn lookup(&self, postcode: &str) -> Result<Option<Coordinate>, Boom> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Boom);
            }
            if postcode.starts_with("ZZ") {
                Ok(None)
            } else {
                Ok(Some(Coordinate::new(57.1, -2.1)))
            }
        }
    }

    fn counting(fail: bool) -> CountingGeocoder {
        CountingGeocoder {
            calls: AtomicUsize::new(0),
            fail,
        }
    }

    #[test]
    fn normalize_postcode_strips_whitespace_and_uppercases() {
        assert_eq!(normalize_postcode(" ab1  2cd "), "AB12CD");
        assert_eq!(normalize_postcode("AB12CD"), "AB12CD");
    }

    #[tokio::test]
    async fn cache_serves_repeat_lookups_without_calling_inner() {
        let cache = CachedGeocoder::new(counting(false));

        let first = cache.lookup("AB1 2CD").await.unwrap();
        let second = cache.lookup("ab12cd").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn cache_remembers_no_match() {
        let cache = CachedGeocoder::new(counting(false));

        assert_eq!(cache.lookup("ZZ9 9ZZ").await.unwrap(), None);
        assert_eq!(cache.lookup("ZZ9 9ZZ").await.unwrap(), None);
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cache_does_not_store_errors() {
        let cache = CachedGeocoder::new(counting(true));

        assert!(cache.lookup("AB1 2CD").await.is_err());
        assert!(cache.lookup("AB1 2CD").await.is_err());
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn direct_mode_always_calls_inner() {
        let geocoder = MaybeCached::new(counting(false), false);
        geocoder.lookup("AB1 2CD").await.unwrap();
        geocoder.lookup("AB1 2CD").await.unwrap();
        let MaybeCached::Direct(inner) = &geocoder else {
            panic!("expected direct geocoder");
        };
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
