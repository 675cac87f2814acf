//! Core library for the imgd image transform cache
//!
//! This crate contains the whole request pipeline — cache key derivation,
//! the disk-backed image cache, source fetching, the resize/re-encode
//! transform — plus configuration, logging, and error handling. The HTTP
//! surface lives in the `imgd` binary crate and only depends on
//! [`service::TransformService`].

pub mod cache;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod logging;
pub mod observability;
pub mod service;
pub mod transform;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
