//! xtask library for shared functionality
//!
//! The binary only parses arguments and dispatches; everything it runs lives
//! here so integration tests can reach it.

pub mod cli;
pub mod commands;
