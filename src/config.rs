//! Pipeline configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. The file lives in
//! the content root and is optional; stock defaults are used for anything it
//! doesn't set.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [content]
//! extensions = ["md", "mdx"]  # Files treated as posts (case-insensitive)
//!
//! [collection]
//! exclude_drafts = true       # Skip posts with `draft: true`
//! on_collision = "keep"       # "keep" or "suffix"
//!
//! [output]
//! index_file = "index.json"   # Index file name inside the output directory
//! payload_dir = "posts"       # Directory for per-post body files
//! pretty = true               # Pretty-print JSON
//!
//! [processing]
//! max_processes = 4           # Max parallel file readers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Override just the values you want:
//!
//! ```toml
//! [collection]
//! on_collision = "suffix"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the config file looked up in the content root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Which files count as content units.
    pub content: ContentConfig,
    /// Draft handling and slug collision policy.
    pub collection: CollectionConfig,
    /// Where and how the index and payloads are written.
    pub output: OutputConfig,
    /// Parallel file reading settings.
    pub processing: ProcessingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.content.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "content.extensions must not be empty".into(),
            ));
        }
        if self
            .content
            .extensions
            .iter()
            .any(|e| e.trim_start_matches('.').is_empty())
        {
            return Err(ConfigError::Validation(
                "content.extensions must not contain empty values".into(),
            ));
        }
        if !is_plain_name(&self.output.index_file) {
            return Err(ConfigError::Validation(
                "output.index_file must be a plain file name".into(),
            ));
        }
        if !is_plain_name(&self.output.payload_dir) {
            return Err(ConfigError::Validation(
                "output.payload_dir must be a plain directory name".into(),
            ));
        }
        if self.output.payload_dir == self.output.index_file {
            return Err(ConfigError::Validation(
                "output.payload_dir and output.index_file must differ".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A single path component: no separators, not `.` or `..`.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

/// Content discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContentConfig {
    /// File extensions treated as content units, without the dot.
    pub extensions: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["md".to_string(), "mdx".to_string()],
        }
    }
}

/// What to do when two posts derive the same slug.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Keep every entry under the shared slug. Slug lookups resolve to the
    /// newest one.
    #[default]
    Keep,
    /// Give later entries `-2`, `-3`, ... so every slug is unique.
    Suffix,
}

/// Collection building settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionConfig {
    /// Leave `draft: true` posts out of the collection.
    pub exclude_drafts: bool,
    pub on_collision: CollisionPolicy,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            exclude_drafts: true,
            on_collision: CollisionPolicy::Keep,
        }
    }
}

/// Output artifact settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub index_file: String,
    pub payload_dir: String,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            index_file: "index.json".to_string(),
            payload_dir: "posts".to_string(),
            pretty: true,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel file readers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given content root.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# blog-index configuration
# ========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file in the content root (next to your posts).
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content discovery
# ---------------------------------------------------------------------------
[content]
# File extensions treated as posts. Matching is case-insensitive.
extensions = ["md", "mdx"]

# ---------------------------------------------------------------------------
# Collection
# ---------------------------------------------------------------------------
[collection]
# Leave posts whose frontmatter says `draft: true` out of the build.
exclude_drafts = true

# What to do when two posts derive the same slug from their titles.
#   "keep"   - keep both under the same slug (a warning is printed; links
#              resolve to the newest post)
#   "suffix" - rename later posts to slug-2, slug-3, ...
on_collision = "keep"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Index file (all metadata, no bodies), written to the output directory.
index_file = "index.json"

# Directory (inside the output directory) holding one <slug>.json per post.
payload_dir = "posts"

# Pretty-print JSON output.
pretty = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel file readers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
