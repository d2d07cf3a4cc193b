// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Text rendering of the tree

use std::io::{self, Write};

use treefs_core::{FsCore, NodeType};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum DumpStyle {
    /// One absolute path per line
    #[default]
    Paths,
    /// Names indented two spaces per level, directories suffixed with `/`
    Indented,
}

/// Writes every node reachable from the root in depth-first order.
///
/// The walk is not atomic; run it on a quiescent tree for an exact picture.
pub fn write_tree<W: Write>(fs: &FsCore, mut out: W, style: DumpStyle) -> io::Result<()> {
    for entry in fs.walk() {
        match style {
            DumpStyle::Paths => writeln!(out, "{}", entry.path)?,
            DumpStyle::Indented if entry.depth == 0 => writeln!(out, "/")?,
            DumpStyle::Indented => {
                let suffix = if entry.node_type == NodeType::Directory { "/" } else { "" };
                writeln!(out, "{}{}{suffix}", "  ".repeat(entry.depth), entry.name)?;
            }
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use treefs_core::FsConfig;

    fn sample() -> FsCore {
        let fs = FsCore::new(FsConfig::default()).unwrap();
        fs.create("/docs", NodeType::Directory).unwrap();
        fs.create("/docs/a.txt", NodeType::File).unwrap();
        fs.create("/bin", NodeType::Directory).unwrap();
        fs
    }

    fn render(fs: &FsCore, style: DumpStyle) -> String {
        let mut out = Vec::new();
        write_tree(fs, &mut out, style).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_paths_style() {
        assert_eq!(render(&sample(), DumpStyle::Paths), "/\n/docs\n/docs/a.txt\n/bin\n");
    }

    #[test]
    fn test_indented_style() {
        assert_eq!(
            render(&sample(), DumpStyle::Indented),
            "/\n  docs/\n    a.txt\n  bin/\n"
        );
    }
}
