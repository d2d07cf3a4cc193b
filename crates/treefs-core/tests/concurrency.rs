// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use treefs_core::{FsConfig, FsCore, FsError, FsLimits, NodeType};

/// Every live node is reachable exactly once and the pool accounts for all of them.
fn assert_consistent(fs: &FsCore) {
    let entries = fs.walk();
    let ids: HashSet<_> = entries.iter().map(|entry| entry.id).collect();
    assert_eq!(ids.len(), entries.len(), "a node is linked twice");
    assert_eq!(entries.len(), fs.stats().in_use, "pool and tree disagree");
}

#[treefs_test_utils::logged_test]
fn test_concurrent_creates_in_one_directory() {
    const THREADS: usize = 16;
    let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
    fs.create("/shared", NodeType::Directory).unwrap();
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let fs = Arc::clone(&fs);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                fs.create(&format!("/shared/f{i}"), NodeType::File)
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.join().unwrap().unwrap());
    }
    assert_eq!(ids.len(), THREADS);
    assert_eq!(fs.read_dir("/shared").unwrap().len(), THREADS);
    logger.log_json("stats", &fs.stats()).unwrap();
    assert_consistent(&fs);
}

#[treefs_test_utils::logged_test]
fn test_swapped_moves_terminate() {
    const ROUNDS: usize = 200;
    let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
    fs.create("/x", NodeType::Directory).unwrap();
    fs.create("/y", NodeType::Directory).unwrap();
    let p = fs.create("/x/p", NodeType::File).unwrap();
    let q = fs.create("/y/q", NodeType::File).unwrap();

    let barrier = Arc::new(Barrier::new(2));
    let spawn_mover = |src: &'static str, dst: &'static str| {
        let fs = Arc::clone(&fs);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let mut moved = 0;
            for _ in 0..ROUNDS {
                barrier.wait();
                if fs.move_node(src, dst).is_ok() {
                    moved += 1;
                }
                barrier.wait();
                // Put things back so every round starts from the same tree.
                let _ = fs.move_node(dst, src);
            }
            moved
        })
    };
    let forward = spawn_mover("/x/p", "/y/p");
    let backward = spawn_mover("/y/q", "/x/q");

    let moved_forward = forward.join().unwrap();
    let moved_backward = backward.join().unwrap();
    logger
        .log(&format!("forward moved {moved_forward}, backward moved {moved_backward}"))
        .unwrap();

    assert_eq!(moved_forward, ROUNDS);
    assert_eq!(moved_backward, ROUNDS);
    assert_eq!(fs.lookup_id("/x/p"), Ok(p));
    assert_eq!(fs.lookup_id("/y/q"), Ok(q));
    assert_consistent(&fs);
}

#[treefs_test_utils::logged_test]
fn test_swapped_directory_moves_reach_valid_end_state() {
    for round in 0..100 {
        let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
        fs.create("/x", NodeType::Directory).unwrap();
        fs.create("/y", NodeType::Directory).unwrap();

        let a = {
            let fs = Arc::clone(&fs);
            thread::spawn(move || fs.move_node("/x", "/y/x"))
        };
        let b = {
            let fs = Arc::clone(&fs);
            thread::spawn(move || fs.move_node("/y", "/x/y"))
        };
        let a = a.join().unwrap();
        let b = b.join().unwrap();

        // Whichever ran second no longer finds its destination parent.
        match (a, b) {
            (Ok(_), Err(FsError::NotFound)) => assert!(fs.lookup_id("/y/x").is_ok()),
            (Err(FsError::NotFound), Ok(_)) => assert!(fs.lookup_id("/x/y").is_ok()),
            other => panic!("round {round}: unexpected outcome {other:?}"),
        }
        assert_consistent(&fs);
    }
}

#[treefs_test_utils::logged_test]
fn test_moves_between_names_sorting_below_separator() {
    const ROUNDS: usize = 200;
    let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
    for dir in ["/a", "/a/x", "/a-b", "/a-b/y"] {
        fs.create(dir, NodeType::Directory).unwrap();
    }
    fs.create("/a-b/k", NodeType::File).unwrap();
    fs.create("/a/k2", NodeType::File).unwrap();

    // One move locks /a-b then /a/x, the other /a then /a-b/y.
    let shuttle = |there: [&'static str; 2]| {
        let fs = Arc::clone(&fs);
        thread::spawn(move || {
            for _ in 0..ROUNDS {
                fs.move_node(there[0], there[1]).unwrap();
                fs.move_node(there[1], there[0]).unwrap();
            }
        })
    };
    let first = shuttle(["/a-b/k", "/a/x/k"]);
    let second = shuttle(["/a/k2", "/a-b/y/k2"]);
    first.join().unwrap();
    second.join().unwrap();

    assert!(fs.lookup_id("/a-b/k").is_ok());
    assert!(fs.lookup_id("/a/k2").is_ok());
    logger.log_json("stats", &fs.stats()).unwrap();
    assert_consistent(&fs);
}

#[treefs_test_utils::logged_test]
fn test_lookup_blocks_delete_until_released() {
    let fs = Arc::new(FsCore::new(FsConfig::default()).unwrap());
    fs.create("/held", NodeType::File).unwrap();

    let mut locks = fs.lock_set();
    fs.lookup("/held", &mut locks).unwrap();

    let deleter = {
        let fs = Arc::clone(&fs);
        thread::spawn(move || fs.delete("/held"))
    };
    thread::sleep(std::time::Duration::from_millis(50));
    // No further locking here: a queued writer blocks new readers.
    assert!(!deleter.is_finished(), "delete ran while the path was read-locked");

    locks.release();
    assert_eq!(deleter.join().unwrap(), Ok(()));
    assert_eq!(fs.lookup_id("/held"), Err(FsError::NotFound));
}

#[treefs_test_utils::logged_test]
fn test_random_workload_keeps_tree_consistent() {
    const THREADS: u64 = 8;
    const OPS: usize = 2_000;
    let limits = FsLimits {
        max_nodes: 40,
        max_dir_entries: 6,
        max_name_len: 16,
    };
    let fs = Arc::new(FsCore::new(FsConfig { limits }).unwrap());
    let dirs = ["/", "/a", "/b", "/a/c", "/b/d", "/a/c/e"];
    let names = ["a", "b", "c", "d", "e", "f"];

    let handles: Vec<_> = (0..THREADS)
        .map(|seed| {
            let fs = Arc::clone(&fs);
            thread::spawn(move || {
                let mut rng = SmallRng::seed_from_u64(0x7ee5 + seed);
                for _ in 0..OPS {
                    let dir = dirs[rng.gen_range(0..dirs.len())];
                    let name = names[rng.gen_range(0..names.len())];
                    let path = format!("{}/{name}", dir.trim_end_matches('/'));
                    match rng.gen_range(0..5) {
                        0 => {
                            let _ = fs.create(&path, NodeType::Directory);
                        }
                        1 => {
                            let _ = fs.create(&path, NodeType::File);
                        }
                        2 => {
                            let _ = fs.delete(&path);
                        }
                        3 => {
                            let _ = fs.lookup_id(&path);
                        }
                        _ => {
                            let other = dirs[rng.gen_range(0..dirs.len())];
                            let dst = format!(
                                "{}/{}",
                                other.trim_end_matches('/'),
                                names[rng.gen_range(0..names.len())]
                            );
                            let _ = fs.move_node(&path, &dst);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    let entries = fs.walk();
    logger.log(&format!("{} nodes after workload", entries.len())).unwrap();
    assert_consistent(&fs);
}
