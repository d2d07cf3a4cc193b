// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Directory payload: a bounded, unordered name table

use crate::error::{FsError, FsResult};
use crate::types::NodeId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub child: NodeId,
}

/// Fixed-capacity entry table. Removed entries leave a free slot behind
/// that the next insert may reuse; names of live entries are pairwise distinct.
#[derive(Clone, Debug)]
pub struct Directory {
    entries: Box<[Option<DirEntry>]>,
}

impl Directory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: vec![None; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn lookup(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|entry| entry.name == name).map(|entry| entry.child)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn insert(&mut self, name: &str, child: NodeId) -> FsResult<()> {
        if self.contains(name) {
            return Err(FsError::AlreadyExists);
        }
        let slot = self
            .entries
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(FsError::NoSpace)?;
        *slot = Some(DirEntry {
            name: name.to_string(),
            child,
        });
        Ok(())
    }

    /// Clears the entry named `name` and returns the child it pointed to.
    pub fn remove(&mut self, name: &str) -> FsResult<NodeId> {
        let slot = self
            .entries
            .iter_mut()
            .find(|slot| slot.as_ref().is_some_and(|entry| entry.name == name))
            .ok_or(FsError::NotFound)?;
        slot.take().map(|entry| entry.child).ok_or(FsError::NotFound)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.entries.iter().all(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.entries.iter().filter(|slot| slot.is_some()).count()
    }

    /// Live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = &DirEntry> {
        self.entries.iter().flatten()
    }
}
