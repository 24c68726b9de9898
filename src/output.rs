//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Every post leads with
//! its position and title; slug, date and source file follow as indented
//! context lines. The output reads as a content inventory while still letting
//! users trace each post back to its file.
//!
//! # Output Format
//!
//! ## Check / Build
//!
//! ```text
//! Posts
//! 001 Newest post
//!     Slug: newest-post
//!     Date: 2024-04-30
//!     Source: newest-post.md
//! 002 Older post (draft)
//!     Slug: older-post
//!     Date: 2024-01-02
//!     Source: 2024/older-post.mdx
//!
//! Rejected
//!     untitled.md: missing title
//!
//! Collisions
//!     hello-world: a.md, b.md
//!
//! Drafts
//!     wip.md
//! ```
//!
//! Empty diagnostic sections are left out.
//!
//! ## Get
//!
//! ```text
//! Newest post
//!     Slug: newest-post
//!     Date: 2024-04-30
//!     Author: Ada
//!     Summary: What happened this week
//!     Source: newest-post.md
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::collection::{BuildReport, Collection};
use crate::store::{OutputLayout, WriteStats};
use crate::types::{Index, IndexEntry};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Position + title, marking drafts.
///
/// ```text
/// 001 Hello World
/// 002 Work in progress (draft)
/// ```
fn entity_header(index: usize, title: &str, draft: bool) -> String {
    if draft {
        format!("{} {} (draft)", format_index(index), title)
    } else {
        format!("{} {}", format_index(index), title)
    }
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Slug, date and source lines shared by every listing.
fn entry_context(entry: &IndexEntry, depth: usize) -> Vec<String> {
    let pad = indent(depth);
    vec![
        format!("{}Slug: {}", pad, entry.slug),
        format!("{}Date: {}", pad, entry.published_at),
        format!("{}Source: {}", pad, entry.source_name),
    ]
}

fn entry_lines<'a>(entries: impl Iterator<Item = &'a IndexEntry>) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];
    let mut any = false;
    for (i, entry) in entries.enumerate() {
        any = true;
        lines.push(entity_header(i + 1, &entry.title, entry.draft));
        lines.extend(entry_context(entry, 1));
    }
    if !any {
        lines.push(format!("{}(none)", indent(1)));
    }
    lines
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Rejected units, collisions and skipped drafts. Empty sections are omitted.
pub fn format_diagnostics(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.rejected.is_empty() {
        lines.push(String::new());
        lines.push("Rejected".to_string());
        for rejected in &report.rejected {
            lines.push(format!("{}{}", indent(1), rejected));
        }
    }

    if !report.collisions.is_empty() {
        lines.push(String::new());
        lines.push("Collisions".to_string());
        for collision in &report.collisions {
            lines.push(format!("{}{}", indent(1), collision));
        }
    }

    if !report.drafts.is_empty() {
        lines.push(String::new());
        lines.push("Drafts".to_string());
        for draft in &report.drafts {
            lines.push(format!("{}{}", indent(1), draft));
        }
    }

    lines
}

// ============================================================================
// Check
// ============================================================================

/// Inventory of a built collection followed by its diagnostics.
pub fn format_check_output(collection: &Collection, report: &BuildReport) -> Vec<String> {
    let mut lines = entry_lines(collection.entries.iter().map(|e| &e.meta));
    lines.extend(format_diagnostics(report));
    lines
}

pub fn print_check_output(collection: &Collection, report: &BuildReport) {
    for line in format_check_output(collection, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Build
// ============================================================================

/// Where the build wrote its artifacts and what the payload write did.
pub fn format_build_output(
    index: &Index,
    stats: &WriteStats,
    layout: &OutputLayout,
) -> Vec<String> {
    let noun = if index.len() == 1 { "entry" } else { "entries" };
    vec![
        format!(
            "Index → {} ({} {})",
            layout.index_path().display(),
            index.len(),
            noun
        ),
        format!("Payloads → {} ({})", layout.payload_dir().display(), stats),
        format!("Diagnostics → {}", layout.report_path().display()),
    ]
}

pub fn print_build_output(index: &Index, stats: &WriteStats, layout: &OutputLayout) {
    for line in format_build_output(index, stats, layout) {
        println!("{}", line);
    }
}

// ============================================================================
// List / Get
// ============================================================================

/// Every index entry in stored order.
pub fn format_index_listing(index: &Index) -> Vec<String> {
    let mut lines = entry_lines(index.entries.iter());
    lines.push(String::new());
    lines.push(format!("Generated {}", index.generated_at.to_rfc3339()));
    lines
}

pub fn print_index_listing(index: &Index) {
    for line in format_index_listing(index) {
        println!("{}", line);
    }
}

/// One entry's metadata, optionally followed by its body.
pub fn format_entry(entry: &IndexEntry, body: Option<&str>) -> Vec<String> {
    let pad = indent(1);
    let mut lines = vec![
        entry.title.clone(),
        format!("{}Slug: {}", pad, entry.slug),
        format!("{}Date: {}", pad, entry.published_at),
        format!("{}Author: {}", pad, entry.author),
        format!("{}Summary: {}", pad, truncate_desc(&entry.summary, 80)),
        format!("{}Source: {}", pad, entry.source_name),
    ];
    if entry.draft {
        lines.push(format!("{}Draft: yes", pad));
    }
    if let Some(body) = body {
        lines.push(String::new());
        lines.extend(body.lines().map(str::to_string));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Collision, build_collection};
    use crate::config::{CollectionConfig, OutputConfig};
    use crate::entry::Rejected;
    use crate::test_helpers::*;
    use chrono::{DateTime, Utc};

    fn sample_index(entries: Vec<IndexEntry>) -> Index {
        Index {
            generated_at: DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            slug_order: entries.iter().map(|e| e.slug.clone()).collect(),
            entries,
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(999), "999");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn entity_header_marks_drafts() {
        assert_eq!(entity_header(1, "Hello", false), "001 Hello");
        assert_eq!(entity_header(2, "WIP", true), "002 WIP (draft)");
    }

    #[test]
    fn truncate_desc_short() {
        assert_eq!(truncate_desc("hello", 10), "hello");
    }

    #[test]
    fn truncate_desc_exact() {
        assert_eq!(truncate_desc("hello", 5), "hello");
    }

    #[test]
    fn truncate_desc_long() {
        assert_eq!(truncate_desc("hello world", 5), "hello...");
    }

    #[test]
    fn truncate_desc_respects_char_boundaries() {
        assert_eq!(truncate_desc("crème brûlée", 4), "crèm...");
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_output_lists_posts_then_diagnostics() {
        let built = build_collection(
            vec![
                post_unit("b.md", "Beta", "2024-01-02", ""),
                post_unit("a.md", "Alpha", "2024-01-05", ""),
                unit_with_frontmatter("bad.md", "title: Bad", ""),
            ],
            &CollectionConfig::default(),
        );
        let lines = format_check_output(&built.collection, &built.report);

        assert_eq!(
            &lines[..9],
            &[
                "Posts",
                "001 Alpha",
                "    Slug: alpha",
                "    Date: 2024-01-05",
                "    Source: a.md",
                "002 Beta",
                "    Slug: beta",
                "    Date: 2024-01-02",
                "    Source: b.md",
            ]
        );
        assert_eq!(lines[9], "");
        assert_eq!(lines[10], "Rejected");
        assert_eq!(
            lines[11],
            "    bad.md: missing publishedAt, author, summary"
        );
        assert_eq!(lines.len(), 12);
    }

    #[test]
    fn empty_collection_says_none() {
        let built = build_collection(Vec::new(), &CollectionConfig::default());
        let lines = format_check_output(&built.collection, &built.report);
        assert_eq!(lines, vec!["Posts", "    (none)"]);
    }

    #[test]
    fn diagnostics_sections_in_order() {
        let report = BuildReport {
            rejected: vec![Rejected {
                source_name: "x.md".into(),
                missing_fields: vec!["title".into()],
                invalid_fields: vec!["publishedAt".into()],
                detail: None,
            }],
            collisions: vec![Collision {
                slug: "same".into(),
                source_names: vec!["a.md".into(), "b.md".into()],
            }],
            drafts: vec!["wip.md".into()],
        };
        assert_eq!(
            format_diagnostics(&report),
            vec![
                "",
                "Rejected",
                "    x.md: missing title: invalid publishedAt",
                "",
                "Collisions",
                "    same: a.md, b.md",
                "",
                "Drafts",
                "    wip.md",
            ]
        );
    }

    #[test]
    fn clean_report_has_no_diagnostics() {
        assert!(format_diagnostics(&BuildReport::default()).is_empty());
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_output_names_artifacts() {
        let layout = OutputLayout::new("/site", &OutputConfig::default());
        let index = sample_index(vec![index_entry("a", "2024-01-01")]);
        let stats = WriteStats {
            written: 1,
            ..WriteStats::default()
        };
        assert_eq!(
            format_build_output(&index, &stats, &layout),
            vec![
                "Index → /site/index.json (1 entry)",
                "Payloads → /site/posts (1 written)",
                "Diagnostics → /site/diagnostics.json",
            ]
        );
    }

    // =========================================================================
    // List / Get
    // =========================================================================

    #[test]
    fn listing_ends_with_generation_time() {
        let index = sample_index(vec![
            index_entry("a", "2024-01-01"),
            index_entry("b", "2023-01-01"),
        ]);
        let lines = format_index_listing(&index);
        assert_eq!(lines[1], "001 Post a");
        assert_eq!(lines[5], "002 Post b");
        assert_eq!(lines.last().unwrap(), "Generated 2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn entry_without_body() {
        let lines = format_entry(&index_entry("hello", "2024-01-05"), None);
        assert_eq!(
            lines,
            vec![
                "Post hello",
                "    Slug: hello",
                "    Date: 2024-01-05",
                "    Author: Ada",
                "    Summary: Summary of hello",
                "    Source: hello.md",
            ]
        );
    }

    #[test]
    fn entry_with_body_appends_it() {
        let lines = format_entry(&index_entry("hello", "2024-01-05"), Some("One\n\nTwo"));
        assert_eq!(&lines[6..], &["", "One", "", "Two"]);
    }
}
