// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Unix datagram front end
//!
//! Each datagram carries one command line. The reply, a single result code,
//! is sent back to the address the request came from, so clients must bind
//! their own socket before sending.

use std::io::ErrorKind;
use std::os::unix::fs::MetadataExt;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context};
use tracing::{debug, info, warn};
use treefs_core::FsCore;
use treefs_proto::{validate_command, Command, Reply};

use crate::dispatch::apply;

/// Largest request accepted. Longer datagrams get a protocol error reply.
pub const MAX_DATAGRAM: usize = 1024;

/// Stops a running [`DatagramServer`] from any thread.
#[derive(Clone, Debug, Default)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct DatagramServer {
    socket: UnixDatagram,
    path: PathBuf,
    /// Device and inode of the socket file this server created
    file_id: (u64, u64),
    fs: Arc<FsCore>,
    shutdown: ShutdownHandle,
}

fn file_id(path: &Path) -> std::io::Result<(u64, u64)> {
    let meta = std::fs::symlink_metadata(path)?;
    Ok((meta.dev(), meta.ino()))
}

impl DatagramServer {
    /// Binds `path`, replacing a socket file left behind by a previous run.
    pub fn bind(path: impl AsRef<Path>, fs: Arc<FsCore>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        match std::fs::remove_file(&path) {
            Ok(()) => debug!(path = %path.display(), "removed stale socket"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove stale socket {}", path.display()))
            }
        }
        let socket = UnixDatagram::bind(&path)
            .with_context(|| format!("failed to bind datagram socket {}", path.display()))?;
        let file_id = file_id(&path).with_context(|| format!("failed to stat socket {}", path.display()))?;
        info!(path = %path.display(), "listening");
        Ok(Self {
            socket,
            path,
            file_id,
            fs,
            shutdown: ShutdownHandle::default(),
        })
    }

    pub fn local_path(&self) -> &Path {
        &self.path
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serves requests on `threads` workers until shut down.
    ///
    /// Workers notice a shutdown within `poll`. The socket file is removed on return.
    pub fn serve(self, threads: usize, poll: Duration) -> anyhow::Result<()> {
        if threads == 0 {
            bail!("datagram server needs at least one worker");
        }
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let socket = self.socket.try_clone().context("failed to clone datagram socket")?;
            socket
                .set_read_timeout(Some(poll))
                .context("failed to set socket read timeout")?;
            let fs = Arc::clone(&self.fs);
            let shutdown = self.shutdown.clone();
            let handle = thread::Builder::new()
                .name(format!("treefs-dgram-{index}"))
                .spawn(move || serve_datagrams(&socket, &fs, &shutdown))
                .context("failed to spawn datagram worker")?;
            workers.push(handle);
        }

        let panicked = workers.into_iter().filter_map(|worker| worker.join().err()).count();
        info!(path = %self.path.display(), "datagram server stopped");
        if panicked > 0 {
            bail!("{panicked} datagram worker(s) panicked");
        }
        Ok(())
    }
}

impl Drop for DatagramServer {
    fn drop(&mut self) {
        // Another server may have rebound the path since; leave its socket alone.
        match file_id(&self.path) {
            Ok(id) if id == self.file_id => {
                if let Err(err) = std::fs::remove_file(&self.path) {
                    warn!(path = %self.path.display(), error = %err, "failed to remove socket");
                }
            }
            Ok(_) => debug!(path = %self.path.display(), "socket path was rebound, not removing"),
            Err(_) => {}
        }
    }
}

fn serve_datagrams(socket: &UnixDatagram, fs: &FsCore, shutdown: &ShutdownHandle) {
    // One spare byte tells an oversized datagram from one that fits exactly.
    let mut buf = [0u8; MAX_DATAGRAM + 1];
    while !shutdown.is_shutdown() {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(err) => {
                warn!(error = %err, "receive failed");
                continue;
            }
        };
        let Some(peer_path) = peer.as_pathname() else {
            warn!(len, "dropping datagram from unbound sender");
            continue;
        };

        let reply = if len > MAX_DATAGRAM {
            warn!(peer = %peer_path.display(), "request exceeds {MAX_DATAGRAM} bytes");
            Reply::protocol_error()
        } else {
            handle_request(fs, &buf[..len])
        };
        if let Err(err) = socket.send_to(&reply.encode(), peer_path) {
            warn!(peer = %peer_path.display(), error = %err, "failed to send reply");
        }
    }
}

/// Decodes, validates and applies one request payload.
pub fn handle_request(fs: &FsCore, payload: &[u8]) -> Reply {
    let Ok(text) = std::str::from_utf8(payload) else {
        warn!(len = payload.len(), "request is not valid UTF-8");
        return Reply::protocol_error();
    };
    let command = match Command::parse(text.trim_end_matches('\0')) {
        Ok(Some(command)) => command,
        Ok(None) => {
            warn!("request carries no command");
            return Reply::protocol_error();
        }
        Err(err) => {
            warn!(%err, "malformed request");
            return Reply::protocol_error();
        }
    };
    if let Err(err) = validate_command(&command) {
        warn!(%command, %err, "rejected request");
        return Reply::protocol_error();
    }
    Reply::from_result(&apply(fs, &command))
}

#[cfg(test)]
mod tests {
    use super::*;
    use treefs_core::{FsConfig, FsError};
    use treefs_proto::PROTOCOL_ERROR;

    #[test]
    fn test_handle_request() {
        let fs = FsCore::new(FsConfig::default()).unwrap();
        assert_eq!(handle_request(&fs, b"c /a d").code(), 0);
        assert_eq!(handle_request(&fs, b"c /a d\0\0").code(), FsError::AlreadyExists.code());
        assert_eq!(handle_request(&fs, b"l /a").code(), 1);
        assert_eq!(handle_request(&fs, b"l /").code(), 0);
    }

    #[test]
    fn test_bad_requests_get_protocol_error() {
        let fs = FsCore::new(FsConfig::default()).unwrap();
        let payloads: [&[u8]; 5] = [b"x /a", b"", b"# comment", b"c /a", &[0xff, 0x00]];
        for payload in payloads {
            assert_eq!(handle_request(&fs, payload).code(), PROTOCOL_ERROR);
        }
        let long = format!("l /{}", "a".repeat(200));
        assert_eq!(handle_request(&fs, long.as_bytes()).code(), PROTOCOL_ERROR);
    }
}
