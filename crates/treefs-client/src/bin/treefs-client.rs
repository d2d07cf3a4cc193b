// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Replays a command file against a running TreeFS server

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use treefs_client::{ClientConfig, ClientError, TfsClient};
use treefs_logging::CliLoggingArgs;
use treefs_proto::Command;

#[derive(Parser)]
#[command(name = "treefs-client")]
#[command(about = "Send TreeFS commands to a datagram server")]
#[command(version, long_about = None)]
struct Cli {
    /// Server socket path
    #[arg(long, env = "TREEFS_SOCKET")]
    socket: PathBuf,

    /// Command file, one command per line
    #[arg(long)]
    input: PathBuf,

    /// Per-request reply timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.logging.init("treefs-client")?;

    let input = File::open(&cli.input)
        .with_context(|| format!("failed to open input file {}", cli.input.display()))?;
    let config = ClientConfig::default().timeout(Duration::from_millis(cli.timeout_ms));
    let mut client = TfsClient::mount_with(&cli.socket, &config)
        .with_context(|| format!("failed to mount {}", cli.socket.display()))?;

    for (index, line) in BufReader::new(input).lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", index + 1))?;
        let Some(command) =
            Command::parse(&line).with_context(|| format!("line {}: cannot parse {line:?}", index + 1))?
        else {
            continue;
        };

        match client.execute(&command) {
            Ok(value) => println!("{command}: {value}"),
            Err(ClientError::Fs(err)) => println!("{command}: {err} ({})", err.code()),
            Err(err) => return Err(err).with_context(|| format!("line {}: {command}", index + 1)),
        }
    }

    client.unmount()?;
    Ok(())
}
