// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Per-operation set of held node locks

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

use crate::error::{FsError, FsResult};
use crate::table::{Node, NodeTable};
use crate::types::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

enum NodeGuard<'t> {
    Read(RwLockReadGuard<'t, Node>),
    Write(RwLockWriteGuard<'t, Node>),
}

impl NodeGuard<'_> {
    fn mode(&self) -> LockMode {
        match self {
            NodeGuard::Read(_) => LockMode::Read,
            NodeGuard::Write(_) => LockMode::Write,
        }
    }

    fn node(&self) -> &Node {
        match self {
            NodeGuard::Read(guard) => &**guard,
            NodeGuard::Write(guard) => &**guard,
        }
    }
}

/// Locks acquired by one operation, in acquisition order.
///
/// A node is locked at most once per set: acquiring an id that is already held
/// is a no-op, which lets two overlapping path resolutions share their common
/// prefix. Every lock is released when the set is dropped or [`LockSet::release`]d.
pub struct LockSet<'t> {
    table: &'t NodeTable,
    held: Vec<(NodeId, NodeGuard<'t>)>,
}

impl<'t> LockSet<'t> {
    pub fn new(table: &'t NodeTable) -> Self {
        Self {
            table,
            held: Vec::new(),
        }
    }

    /// Locks `id` in `mode` unless this set already holds it.
    ///
    /// Upgrading a held read lock to a write lock is refused with
    /// [`FsError::InvalidArgument`]; blocking on it would self-deadlock.
    pub fn acquire(&mut self, id: NodeId, mode: LockMode) -> FsResult<()> {
        if let Some(held) = self.mode(id) {
            if held == LockMode::Read && mode == LockMode::Write {
                return Err(FsError::InvalidArgument);
            }
            return Ok(());
        }
        let slot = self.table.slot(id)?;
        let guard = match mode {
            LockMode::Read => NodeGuard::Read(slot.read()),
            LockMode::Write => NodeGuard::Write(slot.write()),
        };
        trace!(node = %id, ?mode, "locked");
        self.held.push((id, guard));
        Ok(())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.mode(id).is_some()
    }

    pub fn mode(&self, id: NodeId) -> Option<LockMode> {
        self.held
            .iter()
            .find(|(held, _)| *held == id)
            .map(|(_, guard)| guard.mode())
    }

    pub fn node(&self, id: NodeId) -> FsResult<&Node> {
        self.held
            .iter()
            .find(|(held, _)| *held == id)
            .map(|(_, guard)| guard.node())
            .ok_or(FsError::InvalidArgument)
    }

    /// Mutable access, only for nodes this set holds for writing.
    pub fn node_mut(&mut self, id: NodeId) -> FsResult<&mut Node> {
        match self.held.iter_mut().find(|(held, _)| *held == id) {
            Some((_, NodeGuard::Write(guard))) => Ok(&mut **guard),
            _ => Err(FsError::InvalidArgument),
        }
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    /// Drops every held lock, most recently acquired first.
    pub fn release(&mut self) {
        while let Some((id, guard)) = self.held.pop() {
            drop(guard);
            trace!(node = %id, "unlocked");
        }
    }
}

impl Drop for LockSet<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
