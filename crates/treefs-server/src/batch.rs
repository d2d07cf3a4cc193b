// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Batch mode: feed a command file through the worker pool

use std::io::BufRead;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::info;
use treefs_core::FsCore;
use treefs_proto::{validate_command, Command};

use crate::config::ServerConfig;
use crate::pool::WorkerPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchReport {
    /// Commands read and queued, comments excluded
    pub commands: usize,
    pub applied: usize,
    pub failed: usize,
    pub elapsed: Duration,
}

/// Parses `input` line by line and applies every command with
/// `config.threads` workers. Commands start running while the rest of the
/// input is still being read.
///
/// A malformed line stops reading; commands already queued still run before
/// the error, which names the 1-based line number, is returned.
pub fn run_batch<R: BufRead>(fs: Arc<FsCore>, input: R, config: &ServerConfig) -> anyhow::Result<BatchReport> {
    let started = Instant::now();
    let pool = WorkerPool::spawn(fs, config.threads, config.queue_capacity)?;

    let queued = feed(&pool, input);
    let report = pool.finish()?;
    let commands = queued?;

    let batch = BatchReport {
        commands,
        applied: report.applied,
        failed: report.failed,
        elapsed: started.elapsed(),
    };
    info!(
        commands = batch.commands,
        failed = batch.failed,
        elapsed_ms = batch.elapsed.as_millis() as u64,
        "batch finished"
    );
    Ok(batch)
}

fn feed<R: BufRead>(pool: &WorkerPool, input: R) -> anyhow::Result<usize> {
    let mut queued = 0;
    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        let Some(command) =
            Command::parse(&line).with_context(|| format!("line {line_no}: cannot parse {line:?}"))?
        else {
            continue;
        };
        validate_command(&command).with_context(|| format!("line {line_no}: invalid command"))?;
        pool.submit(command)?;
        queued += 1;
    }
    Ok(queued)
}
