// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Configuration types for TreeFS Core

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};

/// Fixed capacities of the inode table, decided once at initialization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FsLimits {
    /// Number of slots in the node pool, root included
    pub max_nodes: usize,
    /// Number of entries a single directory can hold
    pub max_dir_entries: usize,
    /// Longest accepted entry name, in bytes
    pub max_name_len: usize,
}

impl Default for FsLimits {
    fn default() -> Self {
        Self {
            max_nodes: 50,
            max_dir_entries: 20,
            max_name_len: 100,
        }
    }
}

/// Top-level configuration for an [`crate::FsCore`]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FsConfig {
    pub limits: FsLimits,
}

impl FsConfig {
    /// Configuration with the given pool capacity and default directory/name bounds.
    pub fn with_max_nodes(max_nodes: usize) -> Self {
        Self {
            limits: FsLimits {
                max_nodes,
                ..FsLimits::default()
            },
        }
    }

    pub fn validate(&self) -> FsResult<()> {
        let limits = &self.limits;
        if limits.max_nodes == 0 || limits.max_dir_entries == 0 || limits.max_name_len == 0 {
            return Err(FsError::InvalidArgument);
        }
        // Node ids travel as non-negative i32 result codes.
        if limits.max_nodes > i32::MAX as usize {
            return Err(FsError::InvalidArgument);
        }
        Ok(())
    }
}
