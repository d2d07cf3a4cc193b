// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Path model

use std::fmt;

/// Separator between path segments
pub const SEPARATOR: char = '/';

/// A parsed absolute path. Empty segments are dropped, so `"//a/b/"` and
/// `"/a/b"` denote the same path, and the empty segment list is the root.
///
/// Paths order lexicographically by segment. This is the order move acquires
/// its two parents in: an ancestor sorts before its descendants, and sibling
/// subtrees sort by name regardless of which characters the names contain.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FsPath<'a> {
    segments: Vec<&'a str>,
}

impl<'a> FsPath<'a> {
    pub fn parse(path: &'a str) -> Self {
        Self {
            segments: path
                .split(SEPARATOR)
                .filter(|segment| !segment.is_empty())
                .collect(),
        }
    }

    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Splits into the parent path and the final entry name; `None` for the root.
    pub fn split_last(&self) -> Option<(FsPath<'a>, &'a str)> {
        let (name, parent) = self.segments.split_last()?;
        Some((
            FsPath {
                segments: parent.to_vec(),
            },
            *name,
        ))
    }

    /// Canonical string form: `/` followed by the segments joined with `/`.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FsPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "{SEPARATOR}");
        }
        for segment in &self.segments {
            write!(f, "{SEPARATOR}{segment}")?;
        }
        Ok(())
    }
}
