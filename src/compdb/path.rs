//! Lexical path normalization for prefix comparison.
//!
//! Paths in a compilation database come from whatever generator wrote it and
//! the files need not exist on this machine, so nothing here touches the
//! filesystem. Both `/` and `\` separate components; `.` and `..` are resolved
//! lexically.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    absolute: bool,
    parts: Vec<String>,
}

impl NormalizedPath {
    /// Normalize `raw`. With `fold_case` every component is lowercased so that
    /// comparisons behave like a case-insensitive filesystem.
    pub fn new(raw: &str, fold_case: bool) -> Self {
        let mut path = Self {
            absolute: raw.starts_with(['/', '\\']),
            parts: Vec::new(),
        };
        path.push_segments(raw, fold_case);
        path
    }

    /// Append a (relative) path. An absolute `rel` replaces `self` entirely.
    pub fn join(&self, rel: &str, fold_case: bool) -> Self {
        let joined = Self::new(rel, fold_case);
        if joined.absolute || joined.has_drive() {
            return joined;
        }
        let mut out = self.clone();
        out.push_segments(rel, fold_case);
        out
    }

    /// True when the path has no root and no drive prefix.
    pub fn is_relative(&self) -> bool {
        !self.absolute && !self.has_drive()
    }

    /// Component-wise prefix test: `/p/src/a.cpp` is under `/p/src`,
    /// `/p/srcfoo/a.cpp` is not.
    pub fn starts_with(&self, base: &NormalizedPath) -> bool {
        self.absolute == base.absolute
            && self.parts.len() >= base.parts.len()
            && self.parts.iter().zip(&base.parts).all(|(a, b)| a == b)
    }

    fn has_drive(&self) -> bool {
        self.parts.first().is_some_and(|p| is_drive(p))
    }

    fn push_segments(&mut self, raw: &str, fold_case: bool) {
        for seg in raw.split(['/', '\\']) {
            match seg {
                "" | "." => {}
                ".." => match self.parts.last() {
                    Some(last) if last != ".." && !(self.parts.len() == 1 && is_drive(last)) => {
                        self.parts.pop();
                    }
                    // The parent of a root (or drive root) is itself.
                    Some(last) if last != ".." => {}
                    None if self.absolute => {}
                    _ => self.parts.push("..".to_string()),
                },
                _ if fold_case => self.parts.push(seg.to_lowercase()),
                _ => self.parts.push(seg.to_string()),
            }
        }
    }
}

fn is_drive(part: &str) -> bool {
    let b = part.as_bytes();
    b.len() == 2 && b[1] == b':' && b[0].is_ascii_alphabetic()
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        } else if self.parts.is_empty() {
            return f.write_str(".");
        }
        f.write_str(&self.parts.join("/"))
    }
}
