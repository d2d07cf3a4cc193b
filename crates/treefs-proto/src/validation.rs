// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Validation of parsed commands before they reach the core

use thiserror::Error;

use crate::command::Command;

/// Longest accepted path argument, in bytes
pub const MAX_PATH_LEN: usize = 100;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("path is empty")]
    EmptyPath,
    #[error("path is {len} bytes long, limit is {max}")]
    PathTooLong { len: usize, max: usize },
    #[error("path contains forbidden character {0:?}")]
    ForbiddenCharacter(char),
}

pub fn validate_path(path: &str) -> Result<(), ValidationError> {
    if path.is_empty() {
        return Err(ValidationError::EmptyPath);
    }
    if path.len() > MAX_PATH_LEN {
        return Err(ValidationError::PathTooLong {
            len: path.len(),
            max: MAX_PATH_LEN,
        });
    }
    if let Some(c) = path.chars().find(|c| c.is_whitespace() || *c == '\0') {
        return Err(ValidationError::ForbiddenCharacter(c));
    }
    Ok(())
}

/// Checks every path argument of `command`.
pub fn validate_command(command: &Command) -> Result<(), ValidationError> {
    command.paths().into_iter().try_for_each(validate_path)
}
