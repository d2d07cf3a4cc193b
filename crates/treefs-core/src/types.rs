// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Type definitions for TreeFS Core

use serde::{Deserialize, Serialize};

/// Stable identifier of a node slot in the pool
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The root directory always lives in slot zero.
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind tag of a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    File,
    Directory,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::File => write!(f, "file"),
            NodeType::Directory => write!(f, "directory"),
        }
    }
}

/// One node visited by [`crate::FsCore::walk`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub id: NodeId,
    /// Entry name in the parent directory, empty for the root
    pub name: String,
    /// Canonical absolute path, `/` for the root
    pub path: String,
    pub depth: usize,
    pub node_type: NodeType,
}

/// Node pool occupancy
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FsStats {
    pub capacity: usize,
    pub in_use: usize,
    pub free: usize,
}
