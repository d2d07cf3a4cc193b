// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Tree operations over the node table

use std::fmt::Debug;

use tracing::{debug, info};

use crate::config::FsConfig;
use crate::directory::{DirEntry, Directory};
use crate::error::{FsError, FsResult};
use crate::lockset::{LockMode, LockSet};
use crate::path::FsPath;
use crate::resolve::resolve;
use crate::table::{NodeKind, NodeTable};
use crate::types::{FsStats, NodeId, NodeType, TreeEntry};

/// The TreeFS core
///
/// All operations take `&self`; an `FsCore` is shared between worker threads
/// behind an `Arc`. There is no global lock: each operation locks the nodes on
/// its path(s) and releases them before returning.
pub struct FsCore {
    config: FsConfig,
    table: NodeTable,
}

impl FsCore {
    pub fn new(config: FsConfig) -> FsResult<Self> {
        config.validate()?;
        let table = NodeTable::with_capacity(config.limits.max_nodes);
        let core = Self { config, table };
        core.create_root_directory()?;
        info!(
            max_nodes = core.config.limits.max_nodes,
            max_dir_entries = core.config.limits.max_dir_entries,
            "initialized inode table"
        );
        Ok(core)
    }

    fn create_root_directory(&self) -> FsResult<()> {
        let id = self.table.allocate().map_err(|_| FsError::RootUnavailable)?;
        if id != NodeId::ROOT {
            return Err(FsError::RootUnavailable);
        }
        let slot = self.table.slot(id).map_err(|_| FsError::RootUnavailable)?;
        slot.write().install(self.new_kind(NodeType::Directory));
        Ok(())
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// An empty lock set bound to this table, for use with [`FsCore::lookup`].
    pub fn lock_set(&self) -> LockSet<'_> {
        LockSet::new(&self.table)
    }

    fn new_kind(&self, node_type: NodeType) -> NodeKind {
        match node_type {
            NodeType::Directory => {
                NodeKind::Directory(Directory::with_capacity(self.config.limits.max_dir_entries))
            }
            NodeType::File => NodeKind::File,
        }
    }

    fn check_name(&self, name: &str) -> FsResult<()> {
        if name.is_empty() || name.len() > self.config.limits.max_name_len {
            return Err(FsError::InvalidName);
        }
        Ok(())
    }

    /// Creates a node of `node_type` at `path` and returns its id.
    pub fn create(&self, path: &str, node_type: NodeType) -> FsResult<NodeId> {
        let result = self.create_node(&FsPath::parse(path), node_type);
        log_outcome("create", path, &result);
        result
    }

    fn create_node(&self, path: &FsPath<'_>, node_type: NodeType) -> FsResult<NodeId> {
        // The root always exists.
        let (parent_path, name) = path.split_last().ok_or(FsError::AlreadyExists)?;
        self.check_name(name)?;

        let mut locks = self.lock_set();
        let parent = resolve(&mut locks, &parent_path, LockMode::Write)?;
        let dir = directory(&locks, parent)?;
        if dir.contains(name) {
            return Err(FsError::AlreadyExists);
        }
        if dir.is_full() {
            return Err(FsError::NoSpace);
        }

        let id = self.table.allocate()?;
        if let Err(err) = locks.acquire(id, LockMode::Write) {
            self.table.reclaim(id);
            return Err(err);
        }
        locks.node_mut(id)?.install(self.new_kind(node_type));
        directory_mut(&mut locks, parent)?.insert(name, id)?;
        Ok(id)
    }

    /// Unlinks and frees the node at `path`. Directories must be empty.
    pub fn delete(&self, path: &str) -> FsResult<()> {
        let result = self.delete_node(&FsPath::parse(path));
        log_outcome("delete", path, &result);
        result
    }

    fn delete_node(&self, path: &FsPath<'_>) -> FsResult<()> {
        // Can't remove root
        let (parent_path, name) = path.split_last().ok_or(FsError::InvalidArgument)?;

        let mut locks = self.lock_set();
        let parent = resolve(&mut locks, &parent_path, LockMode::Write)?;
        let child = directory(&locks, parent)?
            .lookup(name)
            .ok_or(FsError::NotFound)?;
        locks.acquire(child, LockMode::Write)?;
        if locks.node(child)?.directory().is_some_and(|dir| !dir.is_empty()) {
            return Err(FsError::NotEmpty);
        }

        directory_mut(&mut locks, parent)?.remove(name)?;
        locks.node_mut(child)?.clear();
        locks.release();
        // Only back on the free list once nothing in this operation holds it.
        self.table.reclaim(child);
        Ok(())
    }

    /// Relocates the entry at `src` to `dst` and returns the moved node's id.
    ///
    /// Both parent directories are locked for writing. To stay deadlock-free
    /// against concurrent moves, the parent whose path sorts first (segment by
    /// segment) is always resolved first. The moved node itself is write-locked
    /// while its entry is relocated.
    pub fn move_node(&self, src: &str, dst: &str) -> FsResult<NodeId> {
        let result = self.relocate(&FsPath::parse(src), &FsPath::parse(dst));
        match &result {
            Ok(id) => debug!(op = "move", src, dst, node = %id, "operation applied"),
            Err(err) => debug!(op = "move", src, dst, %err, "operation rejected"),
        }
        result
    }

    fn relocate(&self, src: &FsPath<'_>, dst: &FsPath<'_>) -> FsResult<NodeId> {
        let (src_parent, src_name) = src.split_last().ok_or(FsError::InvalidArgument)?;
        let (dst_parent, dst_name) = dst.split_last().ok_or(FsError::AlreadyExists)?;
        self.check_name(dst_name)?;

        let mut locks = self.lock_set();
        let (src_dir, dst_dir) = if src_parent <= dst_parent {
            let src_dir = resolve(&mut locks, &src_parent, LockMode::Write)?;
            let dst_dir = resolve(&mut locks, &dst_parent, LockMode::Write)?;
            (src_dir, dst_dir)
        } else {
            let dst_dir = resolve(&mut locks, &dst_parent, LockMode::Write)?;
            let src_dir = resolve(&mut locks, &src_parent, LockMode::Write)?;
            (src_dir, dst_dir)
        };

        let target = directory(&locks, dst_dir)?;
        if target.contains(dst_name) {
            return Err(FsError::AlreadyExists);
        }
        let target_full = target.is_full();
        let child = locks
            .node(src_dir)?
            .directory()
            .and_then(|dir| dir.lookup(src_name))
            .ok_or(FsError::NotFound)?;
        // Already locked means it lies on the destination path: a move into its own subtree.
        if locks.contains(child) {
            return Err(FsError::InvalidArgument);
        }
        if target_full && src_dir != dst_dir {
            return Err(FsError::NoSpace);
        }

        locks.acquire(child, LockMode::Write)?;
        directory_mut(&mut locks, src_dir)?.remove(src_name)?;
        directory_mut(&mut locks, dst_dir)?.insert(dst_name, child)?;
        Ok(child)
    }

    /// Resolves `path` with read locks, leaving them in `locks`.
    ///
    /// The caller decides when to release them; until then the node and all of
    /// its ancestors cannot be deleted or moved.
    pub fn lookup<'t>(&'t self, path: &str, locks: &mut LockSet<'t>) -> FsResult<NodeId> {
        let result = resolve(locks, &FsPath::parse(path), LockMode::Read);
        log_outcome("lookup", path, &result);
        result
    }

    /// Lookup that releases its locks before returning.
    pub fn lookup_id(&self, path: &str) -> FsResult<NodeId> {
        let mut locks = self.lock_set();
        self.lookup(path, &mut locks)
    }

    /// Entries of the directory at `path`, in slot order.
    pub fn read_dir(&self, path: &str) -> FsResult<Vec<DirEntry>> {
        let mut locks = self.lock_set();
        let id = resolve(&mut locks, &FsPath::parse(path), LockMode::Read)?;
        Ok(directory(&locks, id)?.iter().cloned().collect())
    }

    /// Depth-first preorder listing of the tree, root first.
    ///
    /// Holds at most one read lock at a time, so the result is not a snapshot:
    /// concurrent operations may be partially reflected. Descent stops at a
    /// depth equal to the pool capacity.
    pub fn walk(&self) -> Vec<TreeEntry> {
        let max_depth = self.table.capacity();
        let mut out = Vec::new();
        let mut stack = vec![(NodeId::ROOT, String::new(), String::from("/"), 0usize)];

        while let Some((id, name, path, depth)) = stack.pop() {
            let Ok(slot) = self.table.slot(id) else {
                continue;
            };
            let node = slot.read();
            // Freed since its parent was read.
            let Some(node_type) = node.node_type() else {
                continue;
            };
            if let Some(dir) = node.directory().filter(|_| depth < max_depth) {
                let entries: Vec<&DirEntry> = dir.iter().collect();
                for entry in entries.into_iter().rev() {
                    let child_path = if depth == 0 {
                        format!("/{}", entry.name)
                    } else {
                        format!("{path}/{}", entry.name)
                    };
                    stack.push((entry.child, entry.name.clone(), child_path, depth + 1));
                }
            }
            drop(node);
            out.push(TreeEntry {
                id,
                name,
                path,
                depth,
                node_type,
            });
        }
        out
    }

    pub fn stats(&self) -> FsStats {
        let capacity = self.table.capacity();
        let free = self.table.free_count();
        FsStats {
            capacity,
            in_use: capacity - free,
            free,
        }
    }
}

fn directory<'a>(locks: &'a LockSet<'_>, id: NodeId) -> FsResult<&'a Directory> {
    locks.node(id)?.directory().ok_or(FsError::NotADirectory)
}

fn directory_mut<'a>(locks: &'a mut LockSet<'_>, id: NodeId) -> FsResult<&'a mut Directory> {
    locks.node_mut(id)?.directory_mut().ok_or(FsError::NotADirectory)
}

fn log_outcome<T: Debug>(op: &'static str, path: &str, result: &FsResult<T>) {
    match result {
        Ok(value) => debug!(op, path, result = ?value, "operation applied"),
        Err(err) => debug!(op, path, %err, "operation rejected"),
    }
}
