//! Content enumeration.
//!
//! Stage 1 of the pipeline: find every content file under a root directory
//! and hand it over as a [`ContentUnit`]. Nothing is parsed here.
//!
//! ## Directory Structure
//!
//! ```text
//! content/
//! ├── config.toml                 # Pipeline config (optional, not a unit)
//! ├── hello-world.md              # source name "hello-world.md"
//! ├── 2024/
//! │   └── year-in-review.mdx      # source name "2024/year-in-review.mdx"
//! ├── bundles/
//! │   └── launch/
//! │       ├── index.md            # directory post, id "bundles/launch"
//! │       └── diagram.svg         # ignored (not a content extension)
//! └── .drafts/                    # hidden, skipped entirely
//! ```
//!
//! Units come back sorted by source name so every build sees the same input
//! order. Files are read in parallel on the global rayon pool.
//!
//! ## Failure
//!
//! Only a root that can't be listed fails the scan: a missing root, or an
//! error reading the root directory itself. An empty collection must never
//! be mistaken for "no posts".
//!
//! Anything below the root that can't be walked or read (a dangling symlink,
//! an unreadable file or subdirectory) is logged and returned as a
//! [`SkippedFile`] next to the units, and the rest of the tree still scans.
//! Invalid UTF-8 is not a failure; such files are read lossily and logged.

use crate::config::ContentConfig;
use crate::types::ContentUnit;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Content root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("Walking content directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A file under the content root that could not be walked or read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub source_name: String,
    pub reason: String,
}

/// Everything one enumeration produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    pub units: Vec<ContentUnit>,
    pub skipped: Vec<SkippedFile>,
}

/// Anything that can list raw content units.
pub trait ContentSource {
    fn scan(&self) -> Result<Scan, ScanError>;

    /// The units alone. Skipped files were already logged by `scan`.
    fn units(&self) -> Result<Vec<ContentUnit>, ScanError> {
        Ok(self.scan()?.units)
    }
}

impl ContentSource for [ContentUnit] {
    fn scan(&self) -> Result<Scan, ScanError> {
        Ok(Scan {
            units: self.to_vec(),
            skipped: Vec::new(),
        })
    }
}

/// Content files under a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extensions: Vec<String>,
}

impl DirectorySource {
    /// Source with the default extensions (`md`, `mdx`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(root, &ContentConfig::default())
    }

    pub fn from_config(root: impl Into<PathBuf>, config: &ContentConfig) -> Self {
        Self {
            root: root.into(),
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_content_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| *allowed == ext))
    }

    /// Paths of every content file, paired with their source names, sorted,
    /// plus the entries below the root that couldn't be walked.
    fn discover(&self) -> Result<(Vec<(PathBuf, String)>, Vec<SkippedFile>), ScanError> {
        if !self.root.is_dir() {
            return Err(ScanError::RootNotFound(self.root.clone()));
        }

        let mut found = Vec::new();
        let mut skipped = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => return Err(err.into()),
                Err(err) => {
                    skipped.extend(self.walk_failure(&err));
                    continue;
                }
            };
            if !entry.file_type().is_file() || !self.is_content_file(entry.path()) {
                continue;
            }
            let source_name = source_name(&self.root, entry.path());
            found.push((entry.into_path(), source_name));
        }

        found.sort_by(|a, b| a.1.cmp(&b.1));
        Ok((found, skipped))
    }

    /// Log a walk error below the root. Returns it as a [`SkippedFile`]
    /// unless the entry is hidden or clearly not content (another extension).
    fn walk_failure(&self, err: &walkdir::Error) -> Option<SkippedFile> {
        let reason = err
            .io_error()
            .map(ToString::to_string)
            .unwrap_or_else(|| err.to_string());
        let Some(path) = err.path() else {
            tracing::warn!(error = %reason, "skipping unwalkable entry");
            return None;
        };
        let source_name = source_name(&self.root, path);
        if source_name.split('/').any(|part| part.starts_with('.')) {
            tracing::debug!(source_name = %source_name, error = %reason, "skipping hidden unwalkable entry");
            return None;
        }
        if path.extension().is_some() && !self.is_content_file(path) {
            tracing::debug!(source_name = %source_name, error = %reason, "skipping unwalkable non-content entry");
            return None;
        }
        tracing::warn!(source_name = %source_name, error = %reason, "skipping unwalkable entry");
        Some(SkippedFile {
            source_name,
            reason,
        })
    }
}

impl ContentSource for DirectorySource {
    fn scan(&self) -> Result<Scan, ScanError> {
        let (files, mut skipped) = self.discover()?;
        tracing::debug!(root = %self.root.display(), files = files.len(), "discovered content files");

        // Collecting an indexed parallel iterator keeps the sorted order.
        let read: Vec<Result<ContentUnit, SkippedFile>> = files
            .par_iter()
            .map(|(path, source_name)| read_unit(path, source_name))
            .collect();

        let mut units = Vec::with_capacity(read.len());
        for result in read {
            match result {
                Ok(unit) => units.push(unit),
                Err(skip) => skipped.push(skip),
            }
        }
        skipped.sort_by(|a, b| a.source_name.cmp(&b.source_name));

        Ok(Scan { units, skipped })
    }
}

fn read_unit(path: &Path, source_name: &str) -> Result<ContentUnit, SkippedFile> {
    let bytes = std::fs::read(path).map_err(|err| {
        tracing::warn!(source_name = %source_name, error = %err, "skipping unreadable content file");
        SkippedFile {
            source_name: source_name.to_string(),
            reason: err.to_string(),
        }
    })?;
    let raw_text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(source_name = %source_name, "content is not valid UTF-8, reading lossily");
            String::from_utf8_lossy(err.as_bytes()).into_owned()
        }
    };
    Ok(ContentUnit::new(source_name, raw_text))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Root-relative, `/`-separated name for a file under `root`.
fn source_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
