// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Bounded command queue drained by a fixed set of worker threads

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, bail, Context};
use crossbeam_channel as chan;
use tracing::{debug, info};
use treefs_core::FsCore;
use treefs_proto::Command;

use crate::dispatch::apply;

/// Counts of commands processed by the pool
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub applied: usize,
    pub failed: usize,
}

impl PoolReport {
    fn merge(&mut self, other: PoolReport) {
        self.applied += other.applied;
        self.failed += other.failed;
    }
}

pub struct WorkerPool {
    sender: chan::Sender<Command>,
    workers: Vec<JoinHandle<PoolReport>>,
}

impl WorkerPool {
    pub fn spawn(fs: Arc<FsCore>, threads: usize, queue_capacity: usize) -> anyhow::Result<Self> {
        if threads == 0 || queue_capacity == 0 {
            bail!("worker pool needs at least one thread and one queue slot");
        }
        let (sender, receiver) = chan::bounded(queue_capacity);
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let fs = Arc::clone(&fs);
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("treefs-worker-{index}"))
                .spawn(move || drain(&fs, receiver))
                .context("failed to spawn worker thread")?;
            workers.push(handle);
        }
        info!(threads, queue_capacity, "worker pool started");
        Ok(Self { sender, workers })
    }

    /// Queues `command`, blocking while the queue is full.
    pub fn submit(&self, command: Command) -> anyhow::Result<()> {
        self.sender
            .send(command)
            .map_err(|_| anyhow!("all worker threads have exited"))
    }

    /// Closes the queue and waits for the workers to drain it.
    pub fn finish(self) -> anyhow::Result<PoolReport> {
        let Self { sender, workers } = self;
        drop(sender);

        let mut report = PoolReport::default();
        let mut panicked = 0;
        for worker in workers {
            match worker.join() {
                Ok(tally) => report.merge(tally),
                Err(_) => panicked += 1,
            }
        }
        if panicked > 0 {
            bail!("{panicked} worker thread(s) panicked");
        }
        info!(applied = report.applied, failed = report.failed, "worker pool drained");
        Ok(report)
    }
}

fn drain(fs: &FsCore, commands: chan::Receiver<Command>) -> PoolReport {
    let mut tally = PoolReport::default();
    for command in commands.iter() {
        match apply(fs, &command) {
            Ok(_) => tally.applied += 1,
            Err(err) => {
                debug!(%command, %err, "command failed");
                tally.failed += 1;
            }
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use treefs_core::{FsConfig, NodeType};

    #[test]
    fn test_pool_applies_everything() {
        let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
        let pool = WorkerPool::spawn(Arc::clone(&fs), 3, 2).unwrap();
        for i in 0..10 {
            pool.submit(Command::Create {
                path: format!("/f{i}"),
                node_type: NodeType::File,
            })
            .unwrap();
        }
        pool.submit(Command::Delete {
            path: "/missing".into(),
        })
        .unwrap();

        let report = pool.finish().unwrap();
        assert_eq!(report, PoolReport { applied: 10, failed: 1 });
        assert_eq!(fs.read_dir("/").unwrap().len(), 10);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
        assert!(WorkerPool::spawn(Arc::clone(&fs), 0, 4).is_err());
        assert!(WorkerPool::spawn(fs, 2, 0).is_err());
    }
}
