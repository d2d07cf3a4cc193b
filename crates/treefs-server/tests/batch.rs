// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::io::{Cursor, Write};
use std::sync::Arc;

use treefs_core::{FsConfig, FsCore, FsError};
use treefs_server::{run_batch, write_tree, DumpStyle, ServerConfig};

const SCRIPT: &str = "\
# build a small tree
c /docs d
c /docs/readme f
c /bin d
c /bin/sh f

l /docs/readme
c /docs d
m /bin/sh /docs/sh
d /bin
d /missing
";

fn single_threaded() -> ServerConfig {
    ServerConfig {
        threads: 1,
        ..ServerConfig::default()
    }
}

fn dump(fs: &FsCore, style: DumpStyle) -> String {
    let mut out = Vec::new();
    write_tree(fs, &mut out, style).unwrap();
    String::from_utf8(out).unwrap()
}

#[treefs_test_utils::logged_test]
fn test_batch_applies_script_in_order() {
    let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
    let report = run_batch(Arc::clone(&fs), Cursor::new(SCRIPT), &single_threaded()).unwrap();
    logger.log(&format!("{report:?}")).unwrap();

    assert_eq!(report.commands, 9);
    // The duplicate create and the missing delete.
    assert_eq!(report.failed, 2);
    assert_eq!(report.applied, 7);

    assert_eq!(dump(&fs, DumpStyle::Paths), "/\n/docs\n/docs/readme\n/docs/sh\n");
    assert_eq!(
        dump(&fs, DumpStyle::Indented),
        "/\n  docs/\n    readme\n    sh\n"
    );
}

#[treefs_test_utils::logged_test]
fn test_parallel_batch_of_independent_commands() {
    let mut script = String::new();
    for dir in 0..8 {
        script.push_str(&format!("c /d{dir} d\n"));
    }
    let fs = Arc::new(FsCore::new(FsConfig::with_max_nodes(64)).unwrap());
    let config = ServerConfig {
        threads: 4,
        queue_capacity: 2,
        ..ServerConfig::default()
    };
    let report = run_batch(Arc::clone(&fs), Cursor::new(script), &config).unwrap();
    assert_eq!(report.commands, 8);
    assert_eq!(report.failed, 0);
    assert_eq!(fs.read_dir("/").unwrap().len(), 8);
}

#[treefs_test_utils::logged_test]
fn test_parse_error_names_line() {
    let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
    let script = "c /a d\n# fine\nx /a\nc /b d\n";
    let err = run_batch(Arc::clone(&fs), Cursor::new(script), &single_threaded()).unwrap_err();
    let message = format!("{err:#}");
    logger.log(&message).unwrap();

    assert!(message.contains("line 3"), "{message}");
    // Commands before the bad line were still applied; the rest were not read.
    assert!(fs.lookup_id("/a").is_ok());
    assert_eq!(fs.lookup_id("/b"), Err(FsError::NotFound));
}

#[treefs_test_utils::logged_test]
fn test_invalid_path_names_line() {
    let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
    let script = format!("c /a d\nl /{}\n", "x".repeat(150));
    let err = run_batch(fs, Cursor::new(script), &single_threaded()).unwrap_err();
    assert!(format!("{err:#}").contains("line 2"));
}

#[treefs_test_utils::logged_test]
fn test_config_file_limits_apply() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "threads = 2\nqueue-capacity = 3\n\n[fs.limits]\nmax-nodes = 3").unwrap();
    let config = ServerConfig::load(file.path()).unwrap();
    logger.log(&format!("{config:?}")).unwrap();
    assert_eq!(config.threads, 2);
    assert_eq!(config.queue_capacity, 3);

    let fs = Arc::new(FsCore::new(config.fs.clone()).unwrap());
    let config = ServerConfig { threads: 1, ..config };
    let report = run_batch(Arc::clone(&fs), Cursor::new("c /a f\nc /b f\nc /c f\n"), &config).unwrap();
    assert_eq!(report.applied, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(fs.stats().free, 0);
}

#[treefs_test_utils::logged_test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ServerConfig::load(&dir.path().join("absent.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("absent.toml"));
}
