// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Reply payload: one signed decimal result code
//!
//! Zero or a positive node id means success, [`treefs_core::FsError::code`]
//! values report filesystem errors and [`PROTOCOL_ERROR`] a rejected request.

use std::fmt;

use thiserror::Error;
use treefs_core::{FsError, FsResult, NodeId};

/// Code sent back for a request that failed to parse or validate
pub const PROTOCOL_ERROR: i32 = -64;

/// Successful result of a dispatched command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Found(NodeId),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplyError {
    #[error("reply is not valid UTF-8")]
    NotUtf8,
    #[error("malformed reply {0:?}")]
    Malformed(String),
    #[error("server rejected the request")]
    Rejected,
    #[error("unknown result code {0}")]
    UnknownCode(i32),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reply {
    code: i32,
}

impl Reply {
    pub fn from_result(result: &FsResult<Outcome>) -> Self {
        let code = match result {
            Ok(Outcome::Done) => 0,
            Ok(Outcome::Found(id)) => id.as_u32() as i32,
            Err(err) => err.code(),
        };
        Self { code }
    }

    pub fn protocol_error() -> Self {
        Self {
            code: PROTOCOL_ERROR,
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn encode(&self) -> Vec<u8> {
        self.code.to_string().into_bytes()
    }

    /// Accepts a decimal code, ignoring surrounding whitespace and trailing NULs.
    pub fn decode(bytes: &[u8]) -> Result<Self, ReplyError> {
        let text = std::str::from_utf8(bytes).map_err(|_| ReplyError::NotUtf8)?;
        let text = text.trim_end_matches('\0').trim();
        let code = text
            .parse::<i32>()
            .map_err(|_| ReplyError::Malformed(text.to_string()))?;
        Ok(Self { code })
    }

    /// Success value (zero, or the node id of a lookup) or the filesystem error.
    pub fn into_result(self) -> Result<FsResult<u32>, ReplyError> {
        match self.code {
            code if code >= 0 => Ok(Ok(code as u32)),
            PROTOCOL_ERROR => Err(ReplyError::Rejected),
            code => FsError::from_code(code)
                .map(Err)
                .ok_or(ReplyError::UnknownCode(code)),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Reply::from_result(&Ok(Outcome::Done)).code(), 0);
        assert_eq!(Reply::from_result(&Ok(Outcome::Found(NodeId::new(7)))).code(), 7);
        assert_eq!(
            Reply::from_result(&Err(FsError::NotFound)).code(),
            FsError::NotFound.code()
        );
        assert_eq!(Reply::protocol_error().encode(), b"-64".to_vec());
    }

    #[test]
    fn test_decode_tolerates_padding() {
        assert_eq!(Reply::decode(b"12\0\0").unwrap().code(), 12);
        assert_eq!(Reply::decode(b" -2\n").unwrap().code(), -2);
        assert!(matches!(Reply::decode(b"ok"), Err(ReplyError::Malformed(_))));
        assert_eq!(Reply::decode(&[0xff, 0xfe]), Err(ReplyError::NotUtf8));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(Reply::decode(b"3").unwrap().into_result(), Ok(Ok(3)));
        assert_eq!(
            Reply::from_result(&Err(FsError::NotEmpty)).into_result(),
            Ok(Err(FsError::NotEmpty))
        );
        assert_eq!(Reply::protocol_error().into_result(), Err(ReplyError::Rejected));
        assert_eq!(
            Reply::decode(b"-40").unwrap().into_result(),
            Err(ReplyError::UnknownCode(-40))
        );
    }
}
