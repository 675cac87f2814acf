//! imgd binary crate: CLI and HTTP surface
//!
//! Exposed as a library so router-level integration tests can exercise the
//! HTTP surface without spawning the binary.

pub mod cli;
pub mod commands;
pub mod server;
