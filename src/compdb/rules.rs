//! Which parts of the source tree count as project code.
//!
//! JSON shape (every key optional):
//! {
//!   "include_dirs": ["src", "app"],
//!   "exclude_patterns": ["thirdparty", "_deps", "external", "third_party", "build"],
//!   "case_insensitive": false
//! }

use crate::Result;
use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterRules {
    /// Directories, relative to the source root, that hold project code.
    pub include_dirs: Vec<String>,
    /// Substrings that disqualify a normalized file path.
    pub exclude_patterns: Vec<String>,
    /// Fold case before comparing paths and patterns.
    pub case_insensitive: bool,
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_dirs: vec!["src".to_string(), "app".to_string()],
            exclude_patterns: ["thirdparty", "_deps", "external", "third_party", "build"]
                .into_iter()
                .map(String::from)
                .collect(),
            case_insensitive: cfg!(windows),
        }
    }
}

impl FilterRules {
    /// Load rules from a JSON file; keys left out keep their defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read filter rules {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse filter rules {}", path.display()))
    }

    /// First exclusion pattern found in `normalized`, if any.
    pub fn excluded_by(&self, normalized: &str) -> Option<&str> {
        self.exclude_patterns
            .iter()
            .map(String::as_str)
            .find(|pattern| {
                if self.case_insensitive {
                    normalized.to_lowercase().contains(&pattern.to_lowercase())
                } else {
                    normalized.contains(pattern)
                }
            })
    }
}
