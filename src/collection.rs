//! Collection building.
//!
//! Stage 2 of the pipeline: parse every [`ContentUnit`], keep the ones that
//! validate, and order them newest first.
//!
//! ## Failure model
//!
//! Per-unit problems never abort the batch. A unit that fails validation ends
//! up in [`BuildReport::rejected`], and so does a file the scan found but
//! couldn't read; a draft (when drafts are excluded) ends up in
//! [`BuildReport::drafts`]. Only enumeration of the root can fail outright,
//! and that happens before this module sees any input (see
//! [`build_from_source`]).
//!
//! ## Ordering
//!
//! Entries are sorted by `publishedAt` descending. The sort is stable, so
//! entries with the same timestamp keep their input order. Dates are compared
//! as parsed UTC timestamps, not as strings, so `2024-01-05` and
//! `2024-01-05T10:00:00+02:00` order correctly against each other.
//!
//! ## Slug collisions
//!
//! Two entries whose titles derive the same slug form a [`Collision`]. Neither
//! entry is dropped. With [`CollisionPolicy::Keep`] both keep the shared slug
//! and slug-keyed reads resolve to the newer one; with
//! [`CollisionPolicy::Suffix`] every later entry gets the first free `-N`
//! suffix, starting at `-2`. Either way the collision is reported.

use crate::config::{CollectionConfig, CollisionPolicy};
use crate::entry::{Rejected, parse_date, parse_entry};
use crate::scan::{ContentSource, ScanError, SkippedFile};
use crate::types::{ContentUnit, Entry};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Accepted entries, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub entries: Vec<Entry>,
    /// Slugs in the same order as `entries`.
    pub slug_order: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl Collection {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Two or more entries that derived the same slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collision {
    pub slug: String,
    /// Sources sharing the slug, in collection order.
    pub source_names: Vec<String>,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.slug, self.source_names.join(", "))
    }
}

/// Everything a build noticed but did not fail on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildReport {
    pub rejected: Vec<Rejected>,
    pub collisions: Vec<Collision>,
    /// Source names of skipped drafts.
    pub drafts: Vec<String>,
}

impl BuildReport {
    /// No rejected units and no collisions. Skipped drafts don't count.
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty() && self.collisions.is_empty()
    }
}

/// A collection together with its diagnostics.
#[derive(Debug, Clone)]
pub struct BuiltCollection {
    pub collection: Collection,
    pub report: BuildReport,
}

/// Enumerate `source` and build a collection from what it returns. Files the
/// source skipped are reported as rejected.
///
/// Enumeration failure is the one fatal condition of a build.
pub fn build_from_source<S>(
    source: &S,
    config: &CollectionConfig,
) -> Result<BuiltCollection, ScanError>
where
    S: ContentSource + ?Sized,
{
    let scan = source.scan()?;
    let mut built = build_collection(scan.units, config);
    if !scan.skipped.is_empty() {
        built.report.rejected.extend(scan.skipped.into_iter().map(Rejected::from));
        built
            .report
            .rejected
            .sort_by(|a, b| a.source_name.cmp(&b.source_name));
    }
    Ok(built)
}

impl From<SkippedFile> for Rejected {
    fn from(skipped: SkippedFile) -> Self {
        Rejected::unreadable(skipped.source_name, skipped.reason)
    }
}

/// Parse, filter, order and check a batch of content units.
pub fn build_collection(units: Vec<ContentUnit>, config: &CollectionConfig) -> BuiltCollection {
    let mut report = BuildReport::default();
    let mut dated = Vec::with_capacity(units.len());

    for unit in &units {
        match parse_entry(unit) {
            Ok(entry) if entry.meta.draft && config.exclude_drafts => {
                tracing::debug!(source_name = %unit.source_name, "skipping draft");
                report.drafts.push(unit.source_name.clone());
            }
            Ok(entry) => match with_timestamp(entry) {
                Ok(pair) => dated.push(pair),
                Err(rejected) => {
                    tracing::warn!("rejected {rejected}");
                    report.rejected.push(rejected);
                }
            },
            Err(rejected) => {
                tracing::warn!("rejected {rejected}");
                report.rejected.push(rejected);
            }
        }
    }

    // Vec::sort_by is stable: equal timestamps keep input order.
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    let mut entries: Vec<Entry> = dated.into_iter().map(|(_, entry)| entry).collect();

    report.collisions = find_collisions(&entries);
    for collision in &report.collisions {
        tracing::warn!("slug collision {collision}");
    }
    if config.on_collision == CollisionPolicy::Suffix && !report.collisions.is_empty() {
        suffix_duplicates(&mut entries);
    }

    let slug_order = entries.iter().map(|e| e.meta.slug.clone()).collect();
    tracing::info!(
        accepted = entries.len(),
        rejected = report.rejected.len(),
        collisions = report.collisions.len(),
        drafts = report.drafts.len(),
        "built collection"
    );

    BuiltCollection {
        collection: Collection {
            entries,
            slug_order,
            generated_at: Utc::now(),
        },
        report,
    }
}

/// Pair an entry with its parsed `publishedAt` for sorting. An entry whose
/// date doesn't parse is rejected rather than dropped.
fn with_timestamp(entry: Entry) -> Result<(DateTime<Utc>, Entry), Rejected> {
    match parse_date(&entry.meta.published_at) {
        Some(published) => Ok((published, entry)),
        None => Err(Rejected {
            source_name: entry.meta.source_name,
            missing_fields: Vec::new(),
            invalid_fields: vec!["publishedAt".to_string()],
            detail: None,
        }),
    }
}

/// Slugs used by more than one entry, in order of first appearance.
fn find_collisions(entries: &[Entry]) -> Vec<Collision> {
    let mut groups: Vec<Collision> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        let slug = entry.slug();
        match position.get(slug) {
            Some(&i) => groups[i].source_names.push(entry.meta.source_name.clone()),
            None => {
                position.insert(slug, groups.len());
                groups.push(Collision {
                    slug: slug.to_string(),
                    source_names: vec![entry.meta.source_name.clone()],
                });
            }
        }
    }

    groups.retain(|g| g.source_names.len() > 1);
    groups
}

/// Give every repeated slug after the first a `-N` suffix no other entry uses.
fn suffix_duplicates(entries: &mut [Entry]) {
    let mut taken: HashSet<String> = entries.iter().map(|e| e.meta.slug.clone()).collect();
    let mut seen: HashSet<String> = HashSet::new();

    for entry in entries.iter_mut() {
        if seen.insert(entry.meta.slug.clone()) {
            continue;
        }
        let base = entry.meta.slug.clone();
        let mut n = 2;
        let mut candidate = format!("{base}-{n}");
        while taken.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        tracing::debug!(source_name = %entry.meta.source_name, from = %base, to = %candidate, "suffixed slug");
        taken.insert(candidate.clone());
        seen.insert(candidate.clone());
        entry.meta.slug = candidate;
    }
}
