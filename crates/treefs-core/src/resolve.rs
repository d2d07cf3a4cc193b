// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Path resolution with lock coupling

use crate::error::{FsError, FsResult};
use crate::lockset::{LockMode, LockSet};
use crate::path::FsPath;
use crate::types::NodeId;

/// Walks `path` from the root, locking every node on the way into `locks`.
///
/// Ancestors are read-locked. The final node is write-locked when `mode` is
/// [`LockMode::Write`]. Nodes already held by `locks` are not locked again.
/// On failure the locks taken so far stay in `locks`; the caller releases them.
pub(crate) fn resolve(locks: &mut LockSet<'_>, path: &FsPath<'_>, mode: LockMode) -> FsResult<NodeId> {
    let segments = path.segments();
    let mode_for = |is_last: bool| {
        if is_last && mode == LockMode::Write {
            LockMode::Write
        } else {
            LockMode::Read
        }
    };

    let mut current = NodeId::ROOT;
    locks.acquire(current, mode_for(segments.is_empty()))?;

    for (i, name) in segments.iter().enumerate() {
        // A file has no entries, so any segment below it is missing.
        let child = locks
            .node(current)?
            .directory()
            .and_then(|dir| dir.lookup(name))
            .ok_or(FsError::NotFound)?;
        locks.acquire(child, mode_for(i + 1 == segments.len()))?;
        current = child;
    }

    Ok(current)
}
