// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! TreeFS wire protocol
//!
//! Requests are single command lines (see [`command`]), replies a single
//! decimal result code (see [`reply`]). The same grammar is used for batch
//! input files and for datagrams.

pub mod command;
pub mod reply;
pub mod validation;

pub use command::{Command, ParseError};
pub use reply::{Outcome, Reply, ReplyError, PROTOCOL_ERROR};
pub use validation::{validate_command, validate_path, ValidationError, MAX_PATH_LEN};
