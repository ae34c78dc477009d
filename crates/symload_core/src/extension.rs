//! Symbol file extension filter.
//!
//! # Responsibility
//! - Merge built-in symbol file extensions with user supplied extras.
//! - Classify candidate files by case-insensitive suffix match.
//!
//! # Invariants
//! - Every entry is non-empty, lower-cased and starts with `.`.
//! - The resolved set is always a superset of `DEFAULT_EXTENSIONS`.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Extensions recognized without any `--ext` input.
pub const DEFAULT_EXTENSIONS: &[&str] = &[".debug", ".so", ".sym"];

/// Extension parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    /// Entry consists of the separator only (`.`).
    BareSeparator,
    /// Entry contains a path separator and can never match a file name.
    ContainsPathSeparator(String),
}

impl Display for ExtensionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BareSeparator => write!(f, "extension must not be a bare `.`"),
            Self::ContainsPathSeparator(value) => {
                write!(f, "extension must not contain a path separator: {value}")
            }
        }
    }
}

impl Error for ExtensionError {}

/// Ordered, deduplicated set of normalized extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    entries: BTreeSet<String>,
}

impl Default for ExtensionSet {
    fn default() -> Self {
        Self {
            entries: DEFAULT_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl ExtensionSet {
    /// Builds the default set extended by a comma-separated list.
    ///
    /// Empty and whitespace-only entries are ignored. Entries are trimmed,
    /// lower-cased and prefixed with `.` when missing.
    ///
    /// # Errors
    /// - Returns an error when an entry is a bare `.`.
    /// - Returns an error when an entry contains `/` or `\`.
    pub fn parse(extra: &str) -> Result<Self, ExtensionError> {
        let mut set = Self::default();
        for raw in extra.split(',') {
            if let Some(ext) = normalize_extension(raw)? {
                set.entries.insert(ext);
            }
        }
        Ok(set)
    }

    /// Same as [`ExtensionSet::parse`] with an optional input.
    pub fn from_option(extra: Option<&str>) -> Result<Self, ExtensionError> {
        match extra {
            Some(value) => Self::parse(value),
            None => Ok(Self::default()),
        }
    }

    /// Returns `true` when the file name of `path` ends with any entry.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy().to_lowercase();
        self.entries.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    pub fn contains(&self, ext: &str) -> bool {
        self.entries.contains(ext)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn normalize_extension(raw: &str) -> Result<Option<String>, ExtensionError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.contains(['/', '\\']) {
        return Err(ExtensionError::ContainsPathSeparator(trimmed.to_string()));
    }
    if trimmed == "." {
        return Err(ExtensionError::BareSeparator);
    }

    let lowered = trimmed.to_lowercase();
    if lowered.starts_with('.') {
        Ok(Some(lowered))
    } else {
        Ok(Some(format!(".{lowered}")))
    }
}
