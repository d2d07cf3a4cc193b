// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for TreeFS Core

/// Core filesystem error type
///
/// Every variant is a local, recoverable outcome reported to the immediate caller,
/// except [`FsError::RootUnavailable`], which only `FsCore::new` produces.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("not a directory")]
    NotADirectory,
    #[error("directory not empty")]
    NotEmpty,
    #[error("no space left")]
    NoSpace,
    #[error("name not allowed")]
    InvalidName,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("root node unavailable")]
    RootUnavailable,
}

pub type FsResult<T> = Result<T, FsError>;

impl FsError {
    /// Integer result code carried over the wire. Success codes are never negative.
    pub fn code(self) -> i32 {
        match self {
            FsError::NotFound => -1,
            FsError::AlreadyExists => -2,
            FsError::NotADirectory => -3,
            FsError::NotEmpty => -4,
            FsError::NoSpace => -5,
            FsError::InvalidName => -6,
            FsError::InvalidArgument => -7,
            FsError::RootUnavailable => -8,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let err = match code {
            -1 => FsError::NotFound,
            -2 => FsError::AlreadyExists,
            -3 => FsError::NotADirectory,
            -4 => FsError::NotEmpty,
            -5 => FsError::NoSpace,
            -6 => FsError::InvalidName,
            -7 => FsError::InvalidArgument,
            -8 => FsError::RootUnavailable,
            _ => return None,
        };
        Some(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct_and_negative() {
        let all = [
            FsError::NotFound,
            FsError::AlreadyExists,
            FsError::NotADirectory,
            FsError::NotEmpty,
            FsError::NoSpace,
            FsError::InvalidName,
            FsError::InvalidArgument,
            FsError::RootUnavailable,
        ];
        for err in all {
            assert!(err.code() < 0, "{err} should map to a negative code");
            assert_eq!(FsError::from_code(err.code()), Some(err));
        }
        assert_eq!(FsError::from_code(0), None);
        assert_eq!(FsError::from_code(-64), None);
    }
}
