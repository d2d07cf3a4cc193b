// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TreeFS server executable

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use treefs_core::FsCore;
use treefs_logging::CliLoggingArgs;
use treefs_server::{run_batch, write_tree, DatagramServer, DumpStyle, ServerConfig};

const COMPONENT: &str = "treefs-server";

#[derive(Parser)]
#[command(name = "treefs-server")]
#[command(about = "Concurrent in-memory inode table: batch runner and datagram server")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    logging: CliLoggingArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a command file and write the resulting tree
    Run(RunArgs),
    /// Answer commands sent as datagrams on a Unix socket
    Serve(ServeArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Command file, one command per line
    #[arg(long)]
    input: PathBuf,

    /// Where to write the tree dump
    #[arg(long)]
    output: PathBuf,

    /// Tree dump layout
    #[arg(long, value_enum, default_value_t = DumpStyle::Paths)]
    style: DumpStyle,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Args)]
struct ServeArgs {
    /// Socket path to bind
    #[arg(long, env = "TREEFS_SOCKET")]
    socket: PathBuf,

    #[command(flatten)]
    tuning: TuningArgs,
}

#[derive(Args)]
struct TuningArgs {
    /// TOML configuration file
    #[arg(long, env = "TREEFS_CONFIG")]
    config: Option<PathBuf>,

    /// Worker threads (overrides the config file)
    #[arg(long, env = "TREEFS_THREADS")]
    threads: Option<usize>,

    /// Command queue capacity (overrides the config file)
    #[arg(long, env = "TREEFS_QUEUE_CAPACITY")]
    queue_capacity: Option<usize>,
}

impl TuningArgs {
    fn resolve(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(queue_capacity) = self.queue_capacity {
            config.queue_capacity = queue_capacity;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.logging.init(COMPONENT)?;

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Serve(args) => serve(args),
    }
}

fn init_fs(config: &ServerConfig) -> anyhow::Result<Arc<FsCore>> {
    let fs = FsCore::new(config.fs.clone()).context("failed to initialize inode table")?;
    Ok(Arc::new(fs))
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = args.tuning.resolve()?;
    let input = File::open(&args.input)
        .with_context(|| format!("failed to open input file {}", args.input.display()))?;
    let fs = init_fs(&config)?;

    let report = run_batch(Arc::clone(&fs), BufReader::new(input), &config)?;

    let output = File::create(&args.output)
        .with_context(|| format!("failed to create output file {}", args.output.display()))?;
    write_tree(&fs, BufWriter::new(output), args.style)
        .with_context(|| format!("failed to write tree to {}", args.output.display()))?;

    println!("TreeFS completed in {:.4} seconds.", report.elapsed.as_secs_f64());
    Ok(())
}

fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = args.tuning.resolve()?;
    let fs = init_fs(&config)?;
    let server = DatagramServer::bind(&args.socket, fs)?;

    let shutdown = server.shutdown_handle();
    ctrlc::set_handler(move || shutdown.shutdown()).context("failed to install signal handler")?;

    info!(
        component = COMPONENT,
        threads = config.threads,
        "serving on {}",
        args.socket.display()
    );
    server.serve(config.threads, config.recv_timeout())
}
