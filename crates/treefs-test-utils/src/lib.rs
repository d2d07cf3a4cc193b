// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TreeFS test utilities
//!
//! Every integration test is annotated with [`logged_test`], which gives the
//! test body a `logger` bound to a unique file under `target/test-logs/`.

pub mod guard;
pub mod logging;

pub use guard::TestLoggerGuard;
pub use logging::{create_unique_test_log, TestLogError, TestLogger};
pub use treefs_test_utils_macros::logged_test;
