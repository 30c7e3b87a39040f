//! System name to directory id resolution with a process-lifetime cache.
//!
//! # Lock policy
//!
//! The cache sits behind a single async mutex that is only ever
//! *tried*. If another lookup holds it, [`IdentifierResolver::lookup`]
//! returns `Ok(None)` straight away instead of queueing. The lock is
//! held across the directory call, so at most one request is in flight
//! and a slow directory never stacks up callers; the cost is that a
//! contended caller gets no id for that call.
//!
//! Only exact, case-sensitive name matches are cached. Entries are never
//! evicted and failures are never cached.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::DuplicateMatch;
use crate::directory::{DirectoryError, SystemDirectory};

/// A system name with its directory id and page URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedSystem {
    /// System name.
    pub name: String,
    /// Directory id.
    pub eddb_id: i64,
    /// Directory page URL.
    pub eddb_url: String,
}

/// Cache-first resolver over a [`SystemDirectory`].
pub struct IdentifierResolver {
    directory: Arc<dyn SystemDirectory>,
    cache: Mutex<HashMap<String, i64>>,
    duplicate_match: DuplicateMatch,
}

impl IdentifierResolver {
    /// Create a resolver with an empty cache.
    pub fn new(directory: Arc<dyn SystemDirectory>, duplicate_match: DuplicateMatch) -> Self {
        Self {
            directory,
            cache: Mutex::new(HashMap::new()),
            duplicate_match,
        }
    }

    /// Look up the directory id for `name`.
    ///
    /// Returns `Ok(None)` when the cache is busy or the directory has no
    /// exact match. Directory failures are returned as errors.
    pub async fn lookup(&self, name: &str) -> Result<Option<i64>, DirectoryError> {
        let Ok(mut cache) = self.cache.try_lock() else {
            debug!(system = name, "Identifier cache busy, skipping lookup");
            return Ok(None);
        };

        if let Some(id) = cache.get(name) {
            return Ok(Some(*id));
        }

        let entries = self.directory.search(name).await?;
        for entry in entries.into_iter().filter(|e| e.name == name) {
            cache.insert(entry.name, entry.id);
            if self.duplicate_match == DuplicateMatch::FirstWins {
                break;
            }
        }

        let found = cache.get(name).copied();
        debug!(system = name, id = ?found, "Directory lookup finished");
        Ok(found)
    }

    /// Directory page URL for `name`, if it resolves.
    pub async fn system_url(&self, name: &str) -> Result<Option<String>, DirectoryError> {
        Ok(self
            .lookup(name)
            .await?
            .map(|id| self.directory.system_url(id)))
    }

    /// Id and URL for `name` from a single lookup.
    pub async fn resolve(&self, name: &str) -> Result<Option<ResolvedSystem>, DirectoryError> {
        Ok(self.lookup(name).await?.map(|id| ResolvedSystem {
            name: name.to_owned(),
            eddb_id: id,
            eddb_url: self.directory.system_url(id),
        }))
    }

    /// Cached id for `name` without contacting the directory.
    ///
    /// Returns `None` when not cached or when the cache is busy.
    pub fn cached(&self, name: &str) -> Option<i64> {
        self.cache.try_lock().ok()?.get(name).copied()
    }
}

impl std::fmt::Debug for IdentifierResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentifierResolver")
            .field("duplicate_match", &self.duplicate_match)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::directory::DirectoryEntry;

    /// Directory stub that answers from a fixed list and counts calls.
    struct FakeDirectory {
        entries: Vec<DirectoryEntry>,
        calls: AtomicUsize,
        delay: Duration,
        fail: bool,
    }

    impl FakeDirectory {
        fn new(entries: &[(i64, &str)]) -> Self {
            Self {
                entries: entries
                    .iter()
                    .map(|(id, name)| DirectoryEntry {
                        id: *id,
                        name: (*name).to_owned(),
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SystemDirectory for FakeDirectory {
        async fn search(&self, _name: &str) -> Result<Vec<DirectoryEntry>, DirectoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(DirectoryError::Status {
                    status: 500,
                    body: String::from("boom"),
                });
            }
            Ok(self.entries.clone())
        }

        fn system_url(&self, id: i64) -> String {
            format!("https://eddb.io/system/{id}")
        }
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let directory = Arc::new(FakeDirectory::new(&[(17072, "Sol")]));
        let resolver = IdentifierResolver::new(directory.clone(), DuplicateMatch::LastWins);

        assert_eq!(resolver.lookup("Sol").await.unwrap(), Some(17072));
        assert_eq!(resolver.lookup("Sol").await.unwrap(), Some(17072));
        assert_eq!(directory.calls(), 1);
    }

    #[tokio::test]
    async fn only_exact_case_sensitive_matches_count() {
        let directory = Arc::new(FakeDirectory::new(&[(1, "Sol Prime"), (2, "sol")]));
        let resolver = IdentifierResolver::new(directory.clone(), DuplicateMatch::LastWins);

        assert_eq!(resolver.lookup("Sol").await.unwrap(), None);
        assert_eq!(resolver.cached("Sol"), None);
        // Misses are not cached, so the directory is asked again.
        assert_eq!(resolver.lookup("Sol").await.unwrap(), None);
        assert_eq!(directory.calls(), 2);
    }

    #[tokio::test]
    async fn duplicate_exact_matches_follow_policy() {
        let entries = [(10, "Lave"), (11, "Lave")];

        let last = IdentifierResolver::new(
            Arc::new(FakeDirectory::new(&entries)),
            DuplicateMatch::LastWins,
        );
        assert_eq!(last.lookup("Lave").await.unwrap(), Some(11));

        let first = IdentifierResolver::new(
            Arc::new(FakeDirectory::new(&entries)),
            DuplicateMatch::FirstWins,
        );
        assert_eq!(first.lookup("Lave").await.unwrap(), Some(10));
    }

    #[tokio::test]
    async fn contended_lookup_returns_none_without_waiting() {
        let mut fake = FakeDirectory::new(&[(42, "Diso")]);
        fake.delay = Duration::from_millis(200);
        let directory = Arc::new(fake);
        let resolver = IdentifierResolver::new(directory.clone(), DuplicateMatch::LastWins);

        let (a, b) = tokio::time::timeout(Duration::from_secs(2), async {
            tokio::join!(resolver.lookup("Diso"), resolver.lookup("Diso"))
        })
        .await
        .unwrap();

        let mut results = [a.unwrap(), b.unwrap()];
        results.sort();
        assert_eq!(results, [None, Some(42)]);
        assert_eq!(directory.calls(), 1);
    }

    #[tokio::test]
    async fn directory_failure_propagates_and_releases_lock() {
        let mut fake = FakeDirectory::new(&[]);
        fake.fail = true;
        let resolver = IdentifierResolver::new(Arc::new(fake), DuplicateMatch::LastWins);

        assert!(resolver.lookup("Sol").await.is_err());
        // The lock was released, so the next call reaches the directory again.
        assert!(resolver.lookup("Sol").await.is_err());
    }

    #[tokio::test]
    async fn resolve_formats_url() {
        let resolver = IdentifierResolver::new(
            Arc::new(FakeDirectory::new(&[(17072, "Sol")])),
            DuplicateMatch::LastWins,
        );
        let resolved = resolver.resolve("Sol").await.unwrap().unwrap();
        assert_eq!(resolved.eddb_id, 17072);
        assert_eq!(resolved.eddb_url, "https://eddb.io/system/17072");
        assert_eq!(
            resolver.system_url("Sol").await.unwrap().as_deref(),
            Some("https://eddb.io/system/17072")
        );
        assert_eq!(resolver.system_url("Nowhere").await.unwrap(), None);
    }
}
