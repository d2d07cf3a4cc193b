// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TreeFS Core - concurrent in-memory inode table
//!
//! A fixed-capacity pool of directory and file nodes, each guarded by its own
//! reader/writer lock. Operations resolve paths with lock coupling: every
//! ancestor stays read-locked and the node being mutated is write-locked
//! until the operation finishes. Independent subtrees are mutated in parallel.

pub mod config;
pub mod directory;
pub mod error;
pub mod lockset;
pub mod path;
mod resolve;
pub mod table;
pub mod types;
pub mod vfs;

pub use config::{FsConfig, FsLimits};
pub use directory::{DirEntry, Directory};
pub use error::{FsError, FsResult};
pub use lockset::{LockMode, LockSet};
pub use path::FsPath;
pub use types::{FsStats, NodeId, NodeType, TreeEntry};
pub use vfs::FsCore;
