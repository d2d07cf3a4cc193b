// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Guard used by `#[logged_test]`

use std::path::{Path, PathBuf};

use crate::{TestLogError, TestLogger};

/// Owns a [`TestLogger`] for the duration of one test.
///
/// If the guard is dropped before [`TestLoggerGuard::finish_success`] runs,
/// which is what happens when the test body panics, the log is closed as a failure.
pub struct TestLoggerGuard {
    logger: Option<TestLogger>,
    log_path: PathBuf,
}

impl TestLoggerGuard {
    pub fn new(test_name: &str) -> Result<Self, TestLogError> {
        let logger = TestLogger::new(test_name)?;
        let log_path = logger.log_path().to_path_buf();
        Ok(Self {
            logger: Some(logger),
            log_path,
        })
    }

    pub fn logger(&mut self) -> &mut TestLogger {
        self.logger.as_mut().expect("test logger already finalized")
    }

    pub fn finish_success(mut self) -> Result<PathBuf, TestLogError> {
        match self.logger.take() {
            Some(logger) => logger.finish_success(),
            None => Ok(self.log_path.clone()),
        }
    }

    pub fn finish_failure(mut self, reason: &str) -> Result<PathBuf, TestLogError> {
        match self.logger.take() {
            Some(logger) => logger.finish_failure(reason),
            None => Ok(self.log_path.clone()),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

impl Drop for TestLoggerGuard {
    fn drop(&mut self) {
        let Some(logger) = self.logger.take() else {
            return;
        };
        let reason = if std::thread::panicking() {
            "test panicked"
        } else {
            "test ended without finishing its log"
        };
        if let Err(err) = logger.finish_failure(reason) {
            eprintln!("failed to finalize {}: {err}", self.log_path.display());
        }
    }
}
