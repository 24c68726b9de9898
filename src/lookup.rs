//! Read-side API over a built index and its payloads.
//!
//! A [`LookupService`] wraps one immutable [`Index`] snapshot and a
//! [`PayloadLoader`]. Rebuilding content means constructing a new service;
//! nothing here is ever mutated in place, so readers can't observe a
//! half-updated snapshot.
//!
//! `get_full` distinguishes two failures:
//!
//! - [`LookupError::NotFound`]: the slug isn't in the index. A normal miss.
//! - [`LookupError::PayloadMissing`]: the index has the slug but the loader
//!   has no body for it. The index and payloads disagree, which is an
//!   operational fault.
//!
//! Full entries are memoized by slug once loaded. The memo lock is never
//! held during a load, so lookups of different slugs don't wait on each
//! other.

use crate::store::{self, PayloadRecord, StoreError};
use crate::types::{Entry, Index, IndexEntry, PayloadStore};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("No entry with slug '{0}'")]
    NotFound(String),
    #[error("Entry '{0}' is indexed but its payload is missing")]
    PayloadMissing(String),
    #[error("Loading payload for '{slug}': {source}")]
    Load {
        slug: String,
        #[source]
        source: StoreError,
    },
}

/// Fetches post bodies by slug.
///
/// `Ok(None)` means the loader has no body for the slug.
pub trait PayloadLoader: Send + Sync {
    fn load(&self, slug: &str) -> Result<Option<String>, StoreError>;
}

impl PayloadLoader for PayloadStore {
    fn load(&self, slug: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(slug).map(str::to_string))
    }
}

/// Loads payload files written by [`store::write_payloads`].
#[derive(Debug, Clone)]
pub struct FilePayloadLoader {
    dir: PathBuf,
}

impl FilePayloadLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PayloadLoader for FilePayloadLoader {
    fn load(&self, slug: &str) -> Result<Option<String>, StoreError> {
        if !store::is_payload_slug(slug) {
            return Ok(None);
        }
        let content = match std::fs::read_to_string(store::payload_path(&self.dir, slug)) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let record: PayloadRecord = serde_json::from_str(&content)?;
        Ok(Some(record.body))
    }
}

pub struct LookupService<L> {
    index: Arc<Index>,
    /// Slug → position of its first entry in the index.
    positions: HashMap<String, usize>,
    loader: L,
    memo: Mutex<HashMap<String, Entry>>,
}

impl<L: PayloadLoader> LookupService<L> {
    pub fn new(index: impl Into<Arc<Index>>, loader: L) -> Self {
        let index = index.into();
        let mut positions = HashMap::with_capacity(index.entries.len());
        for (i, entry) in index.entries.iter().enumerate() {
            positions.entry(entry.slug.clone()).or_insert(i);
        }
        Self {
            index,
            positions,
            loader,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// The whole index, in its stored order.
    pub fn list_all(&self) -> &Index {
        &self.index
    }

    /// A shared handle to the index snapshot.
    pub fn snapshot(&self) -> Arc<Index> {
        Arc::clone(&self.index)
    }

    pub fn get_meta(&self, slug: &str) -> Result<&IndexEntry, LookupError> {
        self.positions
            .get(slug)
            .map(|&i| &self.index.entries[i])
            .ok_or_else(|| LookupError::NotFound(slug.to_string()))
    }

    /// Metadata from the index plus the body from the loader.
    pub fn get_full(&self, slug: &str) -> Result<Entry, LookupError> {
        let meta = self.get_meta(slug)?;

        if let Some(hit) = self.memo.lock().ok().and_then(|m| m.get(slug).cloned()) {
            return Ok(hit);
        }

        let body = match self.loader.load(slug) {
            Ok(Some(body)) => body,
            Ok(None) => {
                tracing::error!(slug, "indexed entry has no payload");
                return Err(LookupError::PayloadMissing(slug.to_string()));
            }
            Err(source) => {
                return Err(LookupError::Load {
                    slug: slug.to_string(),
                    source,
                });
            }
        };

        let entry = Entry {
            meta: meta.clone(),
            body,
        };
        if let Ok(mut memo) = self.memo.lock() {
            memo.entry(slug.to_string()).or_insert_with(|| entry.clone());
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::build_collection;
    use crate::config::{CollectionConfig, OutputConfig};
    use crate::split::split_for_delivery;
    use crate::store::{OutputLayout, write_payloads};
    use crate::test_helpers::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn built() -> (Index, PayloadStore) {
        let units = vec![
            post_unit("a.md", "Alpha", "2024-01-03", "alpha body"),
            post_unit("b.md", "Beta", "2024-01-02", "beta body"),
            post_unit("c.md", "Gamma", "2024-01-01", "gamma body"),
        ];
        split_for_delivery(build_collection(units, &CollectionConfig::default()).collection)
    }

    /// Counts loads, serves from an inner store.
    struct CountingLoader {
        inner: PayloadStore,
        loads: AtomicUsize,
    }

    impl PayloadLoader for CountingLoader {
        fn load(&self, slug: &str) -> Result<Option<String>, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(slug)
        }
    }

    struct FailingLoader;

    impl PayloadLoader for FailingLoader {
        fn load(&self, _slug: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Io(io::Error::other("disk on fire")))
        }
    }

    // =========================================================================
    // In-memory lookups
    // =========================================================================

    #[test]
    fn list_all_returns_index_in_order() {
        let (index, payloads) = built();
        let service = LookupService::new(index.clone(), payloads);
        assert_eq!(service.list_all(), &index);
        assert_eq!(service.list_all().slug_order, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn unknown_slug_is_not_found() {
        let (index, payloads) = built();
        let service = LookupService::new(index, payloads);
        assert!(matches!(
            service.get_meta("nonexistent"),
            Err(LookupError::NotFound(s)) if s == "nonexistent"
        ));
        assert!(matches!(
            service.get_full("nonexistent"),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn full_entry_matches_meta_and_payload_for_every_slug() {
        let (index, payloads) = built();
        let service = LookupService::new(index.clone(), payloads.clone());

        for slug in &index.slug_order {
            let full = service.get_full(slug).unwrap();
            assert_eq!(full.body, payloads.get(slug).unwrap());
            assert_eq!(&full.meta, service.get_meta(slug).unwrap());
        }
    }

    #[test]
    fn indexed_slug_without_payload_is_payload_missing() {
        let (index, _) = built();
        let mut partial = PayloadStore::new();
        partial.push("alpha".into(), "alpha body".into());
        let service = LookupService::new(index, partial);

        assert!(service.get_full("alpha").is_ok());
        assert!(service.get_meta("beta").is_ok());
        assert!(matches!(
            service.get_full("beta"),
            Err(LookupError::PayloadMissing(s)) if s == "beta"
        ));
    }

    #[test]
    fn loader_failure_is_a_load_error() {
        let (index, _) = built();
        let service = LookupService::new(index, FailingLoader);
        let err = service.get_full("alpha").unwrap_err();
        assert!(matches!(err, LookupError::Load { ref slug, .. } if slug == "alpha"));
        assert!(err.to_string().contains("disk on fire"));
    }

    #[test]
    fn duplicate_slug_resolves_to_first_entry() {
        let units = vec![
            post_unit("old.md", "Hello World", "2024-01-01", "old"),
            post_unit("new.md", "Hello World", "2024-02-01", "new"),
        ];
        let (index, payloads) =
            split_for_delivery(build_collection(units, &CollectionConfig::default()).collection);
        let service = LookupService::new(index, payloads);

        let full = service.get_full("hello-world").unwrap();
        assert_eq!(full.meta.source_name, "new.md");
        assert_eq!(full.body, "new");
    }

    // =========================================================================
    // Memoization
    // =========================================================================

    #[test]
    fn full_entries_are_loaded_once() {
        let (index, payloads) = built();
        let service = LookupService::new(
            index,
            CountingLoader {
                inner: payloads,
                loads: AtomicUsize::new(0),
            },
        );

        let first = service.get_full("beta").unwrap();
        let second = service.get_full("beta").unwrap();
        assert_eq!(first, second);
        assert_eq!(service.loader.loads.load(Ordering::SeqCst), 1);

        service.get_full("alpha").unwrap();
        assert_eq!(service.loader.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn missing_payloads_are_not_memoized() {
        let (index, _) = built();
        let service = LookupService::new(
            index,
            CountingLoader {
                inner: PayloadStore::new(),
                loads: AtomicUsize::new(0),
            },
        );
        assert!(service.get_full("alpha").is_err());
        assert!(service.get_full("alpha").is_err());
        assert_eq!(service.loader.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn concurrent_lookups_agree() {
        let (index, payloads) = built();
        let service = Arc::new(LookupService::new(index, payloads));

        let handles: Vec<_> = ["alpha", "beta", "gamma", "alpha"]
            .into_iter()
            .map(|slug| {
                let service = Arc::clone(&service);
                std::thread::spawn(move || service.get_full(slug).unwrap().body)
            })
            .collect();
        let bodies: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(bodies, vec!["alpha body", "beta body", "gamma body", "alpha body"]);
    }

    // =========================================================================
    // File-backed payloads
    // =========================================================================

    #[test]
    fn file_loader_reads_written_payloads() {
        let tmp = TempDir::new().unwrap();
        let layout = OutputLayout::new(tmp.path(), &OutputConfig::default());
        let (index, payloads) = built();
        write_payloads(&payloads, &layout).unwrap();

        let service = LookupService::new(index, FilePayloadLoader::new(layout.payload_dir()));
        assert_eq!(service.get_full("gamma").unwrap().body, "gamma body");
    }

    #[test]
    fn file_loader_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let loader = FilePayloadLoader::new(tmp.path());
        assert!(loader.load("absent").unwrap().is_none());
    }

    #[test]
    fn file_loader_ignores_path_like_slugs() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("secret.json"), r#"{"body":"x"}"#).unwrap();
        let loader = FilePayloadLoader::new(tmp.path().join("posts"));
        assert!(loader.load("../secret").unwrap().is_none());
        assert!(loader.load("").unwrap().is_none());
    }

    #[test]
    fn file_loader_corrupt_payload_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("bad.json"), "not json").unwrap();
        let loader = FilePayloadLoader::new(tmp.path());
        assert!(matches!(loader.load("bad"), Err(StoreError::Json(_))));
    }
}
