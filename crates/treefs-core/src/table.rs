// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Node pool: fixed slots, each behind its own reader/writer lock

use parking_lot::{Mutex, RwLock};
use tracing::trace;

use crate::directory::Directory;
use crate::error::{FsError, FsResult};
use crate::types::{NodeId, NodeType};

/// Payload of a live node
#[derive(Clone, Debug)]
pub enum NodeKind {
    Directory(Directory),
    /// Files carry no content.
    File,
}

/// One slot of the pool. `kind` is `None` while the slot is on the free list.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: Option<NodeKind>,
}

impl Node {
    fn vacant(id: NodeId) -> Self {
        Self { id, kind: None }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn node_type(&self) -> Option<NodeType> {
        self.kind.as_ref().map(|kind| match kind {
            NodeKind::Directory(_) => NodeType::Directory,
            NodeKind::File => NodeType::File,
        })
    }

    pub fn directory(&self) -> Option<&Directory> {
        match &self.kind {
            Some(NodeKind::Directory(dir)) => Some(dir),
            _ => None,
        }
    }

    pub fn directory_mut(&mut self) -> Option<&mut Directory> {
        match &mut self.kind {
            Some(NodeKind::Directory(dir)) => Some(dir),
            _ => None,
        }
    }

    pub(crate) fn install(&mut self, kind: NodeKind) {
        self.kind = Some(kind);
    }

    pub(crate) fn clear(&mut self) {
        self.kind = None;
    }
}

pub struct NodeTable {
    slots: Box<[RwLock<Node>]>,
    free: Mutex<Vec<NodeId>>,
}

impl NodeTable {
    pub fn with_capacity(capacity: usize) -> Self {
        let slots = (0..capacity)
            .map(|i| RwLock::new(Node::vacant(NodeId(i as u32))))
            .collect();
        // Reversed so the lowest id is handed out first.
        let free = (0..capacity).rev().map(|i| NodeId(i as u32)).collect();
        Self {
            slots,
            free: Mutex::new(free),
        }
    }

    /// Takes a slot off the free list. The caller installs the payload under
    /// the slot's write lock.
    pub fn allocate(&self) -> FsResult<NodeId> {
        let id = self.free.lock().pop().ok_or(FsError::NoSpace)?;
        trace!(node = %id, "allocated node");
        Ok(id)
    }

    /// Returns `id` to the free list. The slot must already be cleared and unlinked.
    pub fn reclaim(&self, id: NodeId) {
        trace!(node = %id, "reclaimed node");
        self.free.lock().push(id);
    }

    pub fn slot(&self, id: NodeId) -> FsResult<&RwLock<Node>> {
        self.slots.get(id.index()).ok_or(FsError::NotFound)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.lock().len()
    }
}
