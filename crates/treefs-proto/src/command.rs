// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Line grammar for TreeFS commands
//!
//! ```text
//! c PATH f|d      create a file or directory
//! l PATH          lookup
//! d PATH          delete
//! m PATH NEWPATH  move
//! # ...           comment
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use treefs_core::NodeType;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Command {
    Create { path: String, node_type: NodeType },
    Lookup { path: String },
    Delete { path: String },
    Move { src: String, dst: String },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unknown command token {0:?}")]
    UnknownToken(String),
    #[error("command '{token}' is missing its {what}")]
    MissingArgument { token: char, what: &'static str },
    #[error("invalid node type {0:?}, expected 'f' or 'd'")]
    InvalidNodeType(String),
    #[error("unexpected argument {0:?}")]
    UnexpectedArgument(String),
}

impl Command {
    /// Parses one input line. Blank lines and `#` comments yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let mut tokens = line.split_whitespace();
        let token = match tokens.next() {
            Some(token) => token,
            None => return Ok(None),
        };
        let op = match token {
            "c" => 'c',
            "l" => 'l',
            "d" => 'd',
            "m" => 'm',
            other => return Err(ParseError::UnknownToken(other.to_string())),
        };

        let path = tokens
            .next()
            .ok_or(ParseError::MissingArgument { token: op, what: "path" })?
            .to_string();

        let command = match op {
            'c' => {
                let flag = tokens
                    .next()
                    .ok_or(ParseError::MissingArgument { token: op, what: "node type" })?;
                let node_type = match flag {
                    "f" => NodeType::File,
                    "d" => NodeType::Directory,
                    other => return Err(ParseError::InvalidNodeType(other.to_string())),
                };
                Command::Create { path, node_type }
            }
            'm' => {
                let dst = tokens
                    .next()
                    .ok_or(ParseError::MissingArgument { token: op, what: "destination" })?
                    .to_string();
                Command::Move { src: path, dst }
            }
            'l' => Command::Lookup { path },
            _ => Command::Delete { path },
        };

        if let Some(extra) = tokens.next() {
            return Err(ParseError::UnexpectedArgument(extra.to_string()));
        }
        Ok(Some(command))
    }

    /// Short operation name used in logs
    pub fn op(&self) -> &'static str {
        match self {
            Command::Create { .. } => "create",
            Command::Lookup { .. } => "lookup",
            Command::Delete { .. } => "delete",
            Command::Move { .. } => "move",
        }
    }

    /// Every path argument, in order.
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Command::Create { path, .. } | Command::Lookup { path } | Command::Delete { path } => {
                vec![path.as_str()]
            }
            Command::Move { src, dst } => vec![src.as_str(), dst.as_str()],
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Create { path, node_type } => {
                let flag = match node_type {
                    NodeType::File => 'f',
                    NodeType::Directory => 'd',
                };
                write!(f, "c {path} {flag}")
            }
            Command::Lookup { path } => write!(f, "l {path}"),
            Command::Delete { path } => write!(f, "d {path}"),
            Command::Move { src, dst } => write!(f, "m {src} {dst}"),
        }
    }
}
