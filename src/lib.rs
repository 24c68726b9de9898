//! # Blog Index
//!
//! A build-time content pipeline for static blogs. Markdown/MDX posts with
//! YAML frontmatter go in; a slim metadata index plus one body payload per
//! post come out, so a page layer can render listings without loading every
//! post body.
//!
//! # Architecture: Staged Pipeline
//!
//! ```text
//! 1. Scan      content/    →  ContentUnit[]          (files → raw text)
//! 2. Collect   units       →  Collection + report    (parse, validate, order)
//! 3. Split     collection  →  Index + PayloadStore   (metadata / bodies)
//! 4. Store     artifacts   →  dist/content/          (index.json, posts/*.json)
//! ```
//!
//! At read time a [`lookup::LookupService`] serves metadata straight from the
//! index and fetches bodies on demand through a [`lookup::PayloadLoader`].
//!
//! Each stage is a plain function over owned values, so everything from
//! stage 2 on can be tested without touching the filesystem.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: the `ContentSource` trait and the directory walker |
//! | [`collection`] | Stage 2: parses every unit, collects diagnostics, orders newest first, detects slug collisions |
//! | [`split`] | Stage 3: separates bodies from metadata |
//! | [`store`] | Stage 4: writes the index, payloads (incrementally) and diagnostics |
//! | [`lookup`] | Read API: `list_all`, `get_meta`, `get_full` |
//! | [`entry`] | Parses one unit into a validated `Entry` or a `Rejected` diagnostic |
//! | [`frontmatter`] | Splits a `---` fenced YAML block from the body |
//! | [`slug`] | Title → URL-safe slug |
//! | [`naming`] | Source path → stable identifier and stem |
//! | [`types`] | Types shared between stages and serialized to disk |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Bad posts never fail the build
//!
//! A post missing a required field, or with a date that won't parse, is
//! reported and left out, and so is a file below the root that can't be read
//! (a dangling symlink, say). The rest of the batch still builds. The only
//! fatal condition is not being able to list the content root at all: an
//! unreadable content root must never look like an empty blog.
//!
//! ## Slug collisions are reported, not resolved silently
//!
//! Two posts whose titles slugify the same are both kept. By default they
//! share the slug and lookups resolve to the newer post; `on_collision =
//! "suffix"` renames later ones instead. Either way the collision shows up in
//! `diagnostics.json`.
//!
//! ## Immutable snapshots
//!
//! The index and payloads are rebuilt wholesale every build. A
//! `LookupService` wraps one snapshot and never mutates it, so readers never
//! see a half-updated index.
//!
//! ## Literal slugs
//!
//! Slugs keep ASCII letters, digits, `_` and `-` and drop everything else.
//! `Crème Brûlée` becomes `crme-brle`, not `creme-brulee`. Transliteration
//! would change existing URLs, so it is not done.

pub mod collection;
pub mod config;
pub mod entry;
pub mod frontmatter;
pub mod lookup;
pub mod naming;
pub mod output;
pub mod scan;
pub mod slug;
pub mod split;
pub mod store;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
