//! Service configuration
//!
//! Configuration is assembled by the CLI from flags, environment variables,
//! and an optional TOML file (flag > env > file > default). This module owns
//! the resulting `ServiceConfig` struct, the TOML loader, and validation.
//! The config is built once at bootstrap and injected into the service; no
//! module-level globals.

use crate::cache::ImageClass;
use crate::errors::ConfigError;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default response Cache-Control max-age (24 hours)
pub const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 86_400;

/// Resolved service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Directory cache entries are written to
    #[serde(default = "default_cache_root")]
    pub cache_root: PathBuf,

    /// Origin serving bundled static assets (the `public` class)
    #[serde(default)]
    pub static_origin: String,

    /// Origin serving dynamically generated assets (the `gen` class)
    #[serde(default)]
    pub generated_origin: String,

    /// Response Cache-Control max-age in seconds
    #[serde(default = "default_cache_max_age")]
    pub cache_max_age: u64,
}

fn default_bind_addr() -> SocketAddr {
    "127.0.0.1:8080".parse().expect("valid literal address")
}

fn default_cache_root() -> PathBuf {
    PathBuf::from("image-cache")
}

fn default_cache_max_age() -> u64 {
    DEFAULT_CACHE_MAX_AGE_SECS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cache_root: default_cache_root(),
            static_origin: String::new(),
            generated_origin: String::new(),
            cache_max_age: default_cache_max_age(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Parsing {
            message: e.to_string(),
        })?;
        debug!(path = %path.display(), "configuration file loaded");
        Ok(config)
    }

    /// Validate that the configuration is usable
    ///
    /// Both origins must be set and absolute http(s) URLs; the cache root
    /// must be non-empty. Called once at bootstrap, before the server binds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_origin("static_origin", &self.static_origin)?;
        validate_origin("generated_origin", &self.generated_origin)?;

        if self.cache_root.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "cache_root must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// The base URL source bytes are fetched from for a given class
    pub fn origin(&self, class: ImageClass) -> &str {
        match class {
            ImageClass::Public => &self.static_origin,
            ImageClass::Generated => &self.generated_origin,
        }
    }

    /// Resolve the full source URL for a class and source path
    pub fn source_url(&self, class: ImageClass, source_path: &str) -> String {
        format!(
            "{}/{}",
            self.origin(class).trim_end_matches('/'),
            source_path.trim_start_matches('/')
        )
    }
}

fn validate_origin(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation {
            message: format!("{} must be set", name),
        });
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::Validation {
            message: format!("{} must be an absolute http(s) URL, got \"{}\"", name, value),
        });
    }
    Ok(())
}
