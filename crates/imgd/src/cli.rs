//! Command-line interface definition and dispatch

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

/// On-demand image transform cache
#[derive(Parser)]
#[command(name = "imgd", version, about = "On-demand image transform cache")]
pub struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log verbosity
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
}

/// Serve command arguments
///
/// Every flag overrides the corresponding configuration-file field; fields
/// left unset fall back to the file (if `--config` is given), then to
/// defaults. Origins have no default and must come from a flag, environment
/// variable, or the file.
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Address to bind the HTTP server to
    #[arg(long, env = "IMGD_BIND")]
    pub bind: Option<SocketAddr>,

    /// Directory cache entries are written to
    #[arg(long, env = "IMGD_CACHE_ROOT")]
    pub cache_root: Option<PathBuf>,

    /// Origin serving bundled static assets (the `public` class)
    #[arg(long, env = "IMGD_STATIC_ORIGIN")]
    pub static_origin: Option<String>,

    /// Origin serving dynamically generated assets (the `gen` class)
    #[arg(long, env = "IMGD_GENERATED_ORIGIN")]
    pub generated_origin: Option<String>,

    /// Response Cache-Control max-age in seconds
    #[arg(long, env = "IMGD_CACHE_MAX_AGE")]
    pub cache_max_age: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(long, env = "IMGD_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub async fn dispatch(self) -> Result<()> {
        // Initialize logging based on global options
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None, // Let the logging module check environment variables
        };

        let log_level = match self.log_level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        };

        // Set the filter before initializing logging, unless the user already did
        if std::env::var_os("IMGD_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var(
                "RUST_LOG",
                format!("imgd={},imgd_core={}", log_level, log_level),
            );
        }
        imgd_core::logging::init(log_format)?;

        tracing::debug!("CLI initialized with log level: {}", log_level);

        match self.command {
            Commands::Serve(args) => crate::commands::serve::execute_serve(args).await,
        }
    }
}
