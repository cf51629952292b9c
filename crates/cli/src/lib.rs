//! bucketview CLI library
//!
//! Exposes the command layer so the binary and integration tests share it.

pub mod backend;
pub mod commands;
pub mod exit_code;
pub mod output;
