// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use treefs_core::{FsCore, FsResult};
use treefs_proto::{Command, Outcome};

/// Runs one parsed command against the inode table.
pub fn apply(fs: &FsCore, command: &Command) -> FsResult<Outcome> {
    match command {
        Command::Create { path, node_type } => fs.create(path, *node_type).map(|_| Outcome::Done),
        Command::Delete { path } => fs.delete(path).map(|()| Outcome::Done),
        Command::Move { src, dst } => fs.move_node(src, dst).map(|_| Outcome::Done),
        Command::Lookup { path } => {
            let mut locks = fs.lock_set();
            let id = fs.lookup(path, &mut locks)?;
            locks.release();
            Ok(Outcome::Found(id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use treefs_core::{FsConfig, FsError, NodeType};

    fn command(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_apply_sequence() {
        let fs = FsCore::new(FsConfig::default()).unwrap();

        assert_eq!(apply(&fs, &command("c /a d")), Ok(Outcome::Done));
        assert_eq!(apply(&fs, &command("c /a/b f")), Ok(Outcome::Done));
        let id = fs.lookup_id("/a/b").unwrap();
        assert_eq!(apply(&fs, &command("l /a/b")), Ok(Outcome::Found(id)));
        assert_eq!(apply(&fs, &command("m /a/b /c")), Ok(Outcome::Done));
        assert_eq!(apply(&fs, &command("l /c")), Ok(Outcome::Found(id)));
        assert_eq!(apply(&fs, &command("d /a")), Ok(Outcome::Done));
        assert_eq!(apply(&fs, &command("l /a")), Err(FsError::NotFound));
        assert_eq!(fs.create("/a", NodeType::File).map(|_| ()), Ok(()));
    }
}
