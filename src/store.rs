//! Writing build artifacts to disk.
//!
//! Stage 4 of the pipeline: persist the [`Index`], the [`PayloadStore`] and
//! the [`BuildReport`] under an output directory.
//!
//! ## Output Structure
//!
//! ```text
//! dist/content/
//! ├── index.json                  # Index: metadata + slugOrder + generatedAt
//! ├── diagnostics.json            # BuildReport: rejected, collisions, drafts
//! └── posts/
//!     ├── .payload-manifest.json  # Hashes of the payloads written last build
//!     ├── hello-world.json        # { "body": "..." }
//!     └── ...
//! ```
//!
//! File names come from [`OutputConfig`]; the layout above uses the defaults.
//!
//! ## Incremental payload writes
//!
//! The index is small and is rewritten every build. Payloads are not: each
//! one is serialized, hashed with SHA-256, and compared against the hash
//! recorded in `.payload-manifest.json` by the previous build. A payload is
//! rewritten only if its hash changed or its file is gone. Payload files
//! listed in the old manifest whose slug no longer exists are removed.
//! Files the manifest never recorded are left alone.
//!
//! A missing, corrupt, or wrong-version manifest is treated as empty, so the
//! worst case is a full rewrite. Manifest keys that are not plain slugs (see
//! [`is_payload_slug`]) are never turned into paths.
//!
//! ## Write order
//!
//! [`write_all`] writes payloads first, then the report, then the index. If
//! anything fails partway the previous index stays in place, so the index on
//! disk only ever names payloads that were already written.
//!
//! ## Duplicate slugs
//!
//! A payload store may carry two records for one slug (see
//! [`crate::config::CollisionPolicy::Keep`]). Only the first record, the
//! newest entry, is written; later ones are counted as shadowed.

use crate::collection::BuildReport;
use crate::config::OutputConfig;
use crate::slug::derive_slug;
use crate::types::{Index, PayloadStore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the payload manifest within the payload directory.
pub const MANIFEST_FILENAME: &str = ".payload-manifest.json";

/// Name of the build report within the output directory.
pub const REPORT_FILENAME: &str = "diagnostics.json";

/// Version of the manifest format. Bump to force a full payload rewrite.
const MANIFEST_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Index not found: {0}")]
    IndexNotFound(PathBuf),
}

/// On-disk shape of one payload file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadRecord {
    pub body: String,
}

/// Resolved artifact paths under one output directory.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    index_file: String,
    payload_dir: String,
    pretty: bool,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, config: &OutputConfig) -> Self {
        Self {
            root: root.into(),
            index_file: config.index_file.clone(),
            payload_dir: config.payload_dir.clone(),
            pretty: config.pretty,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILENAME)
    }

    pub fn payload_dir(&self) -> PathBuf {
        self.root.join(&self.payload_dir)
    }

    pub fn payload_path(&self, slug: &str) -> PathBuf {
        payload_path(&self.payload_dir(), slug)
    }
}

/// `<dir>/<slug>.json`
pub fn payload_path(dir: &Path, slug: &str) -> PathBuf {
    dir.join(format!("{slug}.json"))
}

/// Whether `slug` can name a payload file: non-empty, no separators, no
/// leading dot, and already in the form [`derive_slug`] produces.
pub fn is_payload_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.contains(['/', '\\'])
        && !slug.starts_with('.')
        && derive_slug(slug) == slug
}

// =============================================================================
// Payload manifest
// =============================================================================

/// Slug → SHA-256 of the payload file written for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadManifest {
    pub version: u32,
    pub entries: BTreeMap<String, String>,
}

impl PayloadManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the payload directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(payload_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(payload_dir.join(MANIFEST_FILENAME)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, payload_dir: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(payload_dir.join(MANIFEST_FILENAME), json)?;
        Ok(())
    }
}

/// SHA-256 of `bytes` as lowercase hex.
pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

// =============================================================================
// Write statistics
// =============================================================================

/// What a payload write did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteStats {
    pub written: u32,
    pub unchanged: u32,
    pub removed: u32,
    pub shadowed: u32,
}

impl fmt::Display for WriteStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} written", self.written)?;
        if self.unchanged > 0 {
            write!(f, ", {} unchanged", self.unchanged)?;
        }
        if self.removed > 0 {
            write!(f, ", {} removed", self.removed)?;
        }
        if self.shadowed > 0 {
            write!(f, ", {} shadowed", self.shadowed)?;
        }
        Ok(())
    }
}

// =============================================================================
// Writers and readers
// =============================================================================

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Write the index, replacing any previous one.
pub fn write_index(index: &Index, layout: &OutputLayout) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(&layout.root)?;
    let path = layout.index_path();
    std::fs::write(&path, to_json(index, layout.pretty)?)?;
    tracing::debug!(path = %path.display(), entries = index.len(), "wrote index");
    Ok(path)
}

/// Write the build report next to the index.
pub fn write_report(report: &BuildReport, layout: &OutputLayout) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(&layout.root)?;
    let path = layout.report_path();
    std::fs::write(&path, to_json(report, layout.pretty)?)?;
    Ok(path)
}

/// Write one file per payload, skipping the ones that haven't changed.
pub fn write_payloads(
    payloads: &PayloadStore,
    layout: &OutputLayout,
) -> Result<WriteStats, StoreError> {
    let dir = layout.payload_dir();
    std::fs::create_dir_all(&dir)?;

    let previous = PayloadManifest::load(&dir);
    let mut current = PayloadManifest::empty();
    let mut stats = WriteStats::default();

    for payload in payloads.iter() {
        if current.entries.contains_key(&payload.slug) {
            tracing::warn!(slug = %payload.slug, "payload shadowed by a newer entry with the same slug");
            stats.shadowed += 1;
            continue;
        }

        let json = to_json(
            &PayloadRecord {
                body: payload.body.clone(),
            },
            layout.pretty,
        )?;
        let hash = hash_bytes(json.as_bytes());
        let path = payload_path(&dir, &payload.slug);

        if previous.entries.get(&payload.slug) == Some(&hash) && path.exists() {
            stats.unchanged += 1;
        } else {
            std::fs::write(&path, json)?;
            stats.written += 1;
        }
        current.entries.insert(payload.slug.clone(), hash);
    }

    for slug in previous.entries.keys() {
        if current.entries.contains_key(slug) {
            continue;
        }
        if !is_payload_slug(slug) {
            tracing::warn!(slug = %slug, "ignoring manifest entry that is not a slug");
            continue;
        }
        match std::fs::remove_file(payload_path(&dir, slug)) {
            Ok(()) => stats.removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }

    current.save(&dir)?;
    tracing::debug!(dir = %dir.display(), %stats, "wrote payloads");
    Ok(stats)
}

/// Write every artifact of one build: payloads, then the report, then the
/// index last.
pub fn write_all(
    index: &Index,
    payloads: &PayloadStore,
    report: &BuildReport,
    layout: &OutputLayout,
) -> Result<WriteStats, StoreError> {
    let stats = write_payloads(payloads, layout)?;
    write_report(report, layout)?;
    write_index(index, layout)?;
    Ok(stats)
}

/// Read back an index written by [`write_index`].
pub fn read_index(layout: &OutputLayout) -> Result<Index, StoreError> {
    let path = layout.index_path();
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(StoreError::IndexNotFound(path));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&content)?)
}
