// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TreeFS server
//!
//! Two front ends share one [`treefs_core::FsCore`]: a batch runner that feeds
//! a command file through a bounded queue to worker threads, and a Unix
//! datagram server answering one command per datagram.

pub mod batch;
pub mod config;
pub mod datagram;
pub mod dispatch;
pub mod dump;
pub mod pool;

pub use batch::{run_batch, BatchReport};
pub use config::ServerConfig;
pub use datagram::{DatagramServer, ShutdownHandle};
pub use dump::{write_tree, DumpStyle};
pub use pool::{PoolReport, WorkerPool};
