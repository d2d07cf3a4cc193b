// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Client for the TreeFS datagram server.
//!
//! A mounted client binds a private datagram socket, so the server has an
//! address to reply to, and exchanges exactly one request and one reply per
//! operation. Replies carry no request id: after a timeout the client moves to
//! a freshly bound socket, so a late reply can never answer a later request.

use std::io::ErrorKind;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};
use treefs_core::{FsError, NodeId, NodeType};
use treefs_proto::{validate_command, Command, Reply, ReplyError, ValidationError};

const MAX_REPLY: usize = 64;

static NEXT_SOCKET: AtomicU64 = AtomicU64::new(0);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid command: {0}")]
    Invalid(#[from] ValidationError),
    #[error("bad reply: {0}")]
    Reply(#[from] ReplyError),
    #[error("timed out waiting for the server")]
    Timeout,
    #[error(transparent)]
    Fs(#[from] FsError),
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    timeout: Option<Duration>,
    socket_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            socket_dir: std::env::temp_dir(),
        }
    }
}

impl ClientConfig {
    /// Give up on a reply after `timeout` instead of waiting forever.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Directory for the client's own reply socket (default: the temp dir).
    pub fn socket_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.socket_dir = dir.into();
        self
    }
}

pub struct TfsClient {
    socket: UnixDatagram,
    local_path: PathBuf,
    server_path: PathBuf,
    config: ClientConfig,
}

/// Binds a uniquely named reply socket in `config.socket_dir` and connects it to `server_path`.
fn bind_reply_socket(server_path: &Path, config: &ClientConfig) -> ClientResult<(UnixDatagram, PathBuf)> {
    let local_path = config.socket_dir.join(format!(
        "treefs-client-{}-{}.sock",
        std::process::id(),
        NEXT_SOCKET.fetch_add(1, Ordering::Relaxed)
    ));
    remove_socket_file(&local_path)?;

    let socket = UnixDatagram::bind(&local_path)?;
    let connected = socket
        .connect(server_path)
        .and_then(|()| socket.set_read_timeout(config.timeout));
    if let Err(err) = connected {
        let _ = std::fs::remove_file(&local_path);
        return Err(err.into());
    }
    Ok((socket, local_path))
}

fn remove_socket_file(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(err) if err.kind() != ErrorKind::NotFound => Err(err),
        _ => Ok(()),
    }
}

impl TfsClient {
    pub fn mount(server_path: impl AsRef<Path>) -> ClientResult<Self> {
        Self::mount_with(server_path, &ClientConfig::default())
    }

    pub fn mount_with(server_path: impl AsRef<Path>, config: &ClientConfig) -> ClientResult<Self> {
        let server_path = server_path.as_ref().to_path_buf();
        let (socket, local_path) = bind_reply_socket(&server_path, config)?;
        let client = Self {
            socket,
            local_path,
            server_path,
            config: config.clone(),
        };
        debug!(
            server = %client.server_path.display(),
            local = %client.local_path.display(),
            "mounted"
        );
        Ok(client)
    }

    pub fn server_path(&self) -> &Path {
        &self.server_path
    }

    pub fn create(&mut self, path: &str, node_type: NodeType) -> ClientResult<()> {
        self.execute(&Command::Create {
            path: path.to_string(),
            node_type,
        })
        .map(|_| ())
    }

    pub fn delete(&mut self, path: &str) -> ClientResult<()> {
        self.execute(&Command::Delete {
            path: path.to_string(),
        })
        .map(|_| ())
    }

    pub fn move_node(&mut self, src: &str, dst: &str) -> ClientResult<()> {
        self.execute(&Command::Move {
            src: src.to_string(),
            dst: dst.to_string(),
        })
        .map(|_| ())
    }

    pub fn lookup(&mut self, path: &str) -> ClientResult<NodeId> {
        self.execute(&Command::Lookup {
            path: path.to_string(),
        })
        .map(NodeId::new)
    }

    /// Sends `command` and waits for its reply. Returns the success value:
    /// zero, or the node id for a lookup.
    pub fn execute(&mut self, command: &Command) -> ClientResult<u32> {
        validate_command(command)?;
        self.socket.send(command.to_string().as_bytes())?;

        let mut buf = [0u8; MAX_REPLY];
        let len = match self.socket.recv(&mut buf) {
            Ok(len) => len,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                self.rebind()?;
                return Err(ClientError::Timeout);
            }
            Err(err) => return Err(err.into()),
        };
        let value = Reply::decode(&buf[..len])?.into_result()??;
        Ok(value)
    }

    /// Replaces the reply socket. The old socket file is unlinked, so the
    /// server's reply to an abandoned request has nowhere to go.
    fn rebind(&mut self) -> ClientResult<()> {
        let (socket, local_path) = bind_reply_socket(&self.server_path, &self.config)?;
        self.socket = socket;
        let stale = std::mem::replace(&mut self.local_path, local_path);
        remove_socket_file(&stale)?;
        debug!(
            stale = %stale.display(),
            local = %self.local_path.display(),
            "rebound reply socket after timeout"
        );
        Ok(())
    }

    /// Detaches from the server and removes the reply socket.
    pub fn unmount(self) -> ClientResult<()> {
        std::fs::remove_file(&self.local_path)?;
        Ok(())
    }
}

impl Drop for TfsClient {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.local_path) {
            if err.kind() != ErrorKind::NotFound {
                warn!(path = %self.local_path.display(), error = %err, "failed to remove client socket");
            }
        }
    }
}
