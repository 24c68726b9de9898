//! Metadata/body splitting for `---` fenced YAML frontmatter.
//!
//! ```md
//! ---
//! title: Hello, world!
//! publishedAt: 2024-04-16
//! author: Ada
//! summary: A first post.
//! ---
//! # Hello
//! ```
//!
//! The opening fence must be the first line of the unit (a UTF-8 BOM is
//! tolerated). The metadata block ends at the next line that is exactly `---`
//! (trailing whitespace ignored). A unit with no opening fence has empty
//! metadata and its whole text is the body.

use serde_yaml::{Mapping, Value};
use thiserror::Error;

const FENCE: &str = "---";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("frontmatter opened with `---` but never closed")]
    UnclosedFence,
    #[error("frontmatter is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("frontmatter must be a key/value mapping")]
    NotAMapping,
}

/// Parsed frontmatter keys, read leniently as text.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    fields: Mapping,
}

impl Metadata {
    /// First non-empty scalar value among `keys`, trimmed.
    ///
    /// Strings, numbers and booleans are all read as text, so an unquoted
    /// `title: 2024` still counts as a title.
    pub fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| {
            let text = match self.fields.get(*key)? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            (!text.is_empty()).then_some(text)
        })
    }

    /// Whether `key` is set to boolean `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.fields.get(key), Some(Value::Bool(true)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Split raw unit text into metadata and body.
pub fn split(raw: &str) -> Result<(Metadata, &str), FrontmatterError> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);

    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return Ok((Metadata::default(), text));
    };
    if first.trim_end() != FENCE {
        return Ok((Metadata::default(), text));
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == FENCE {
            let yaml = &text[yaml_start..offset];
            let body = &text[offset + line.len()..];
            return Ok((parse_yaml(yaml)?, body));
        }
        offset += line.len();
    }

    Err(FrontmatterError::UnclosedFence)
}

fn parse_yaml(yaml: &str) -> Result<Metadata, FrontmatterError> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::default());
    }
    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Mapping(fields) => Ok(Metadata { fields }),
        Value::Null => Ok(Metadata::default()),
        _ => Err(FrontmatterError::NotAMapping),
    }
}
