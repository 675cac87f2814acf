//! Error types and handling
//!
//! This module provides domain-specific error types for the image transform
//! cache. The taxonomy is structured with specific error enums for each stage
//! of the request pipeline (validation, source fetch, transform, cache I/O)
//! that are then wrapped in the main ImgdError enum for unified handling.
//!
//! Mapping errors to HTTP status codes is the server's concern; nothing in
//! this module knows about response codes, and no variant carries data that
//! would be unsafe to log.

use std::path::PathBuf;
use thiserror::Error;

/// Request validation errors, raised before any filesystem or network I/O
#[derive(Error, Debug)]
pub enum ValidationError {
    /// A dimension query parameter did not parse as a non-negative integer
    #[error("invalid {name} parameter: expected a non-negative integer, got \"{value}\"")]
    Dimension { name: &'static str, value: String },

    /// The fit query parameter was not a recognized mode
    #[error("invalid fit parameter: expected \"cover\" or \"contain\", got \"{value}\"")]
    Fit { value: String },

    /// The source path segment of the request was empty
    #[error("empty source path")]
    EmptySourcePath,
}

/// Source origin fetch errors
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the response body could not be read
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The origin answered with a non-2xx status
    #[error("source {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The origin answered 2xx but with no body
    #[error("source {url} returned an empty body")]
    EmptyBody { url: String },
}

/// Resize/re-encode pipeline errors
#[derive(Error, Debug)]
pub enum TransformError {
    /// The source bytes were not a decodable image
    #[error("failed to decode source image: {0}")]
    Decode(#[source] image::ImageError),

    /// The encoder rejected the transformed image
    #[error("failed to encode output image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Cache storage errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// An existing cache entry could not be read
    #[error("failed to read cache entry {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A new cache entry could not be written or renamed into place
    #[error("failed to write cache entry {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file parsing error
    #[error("failed to parse configuration file: {message}")]
    Parsing { message: String },

    /// Configuration validation error
    #[error("configuration validation error: {message}")]
    Validation { message: String },

    /// Configuration file I/O error
    #[error("failed to read configuration file")]
    Io(#[from] std::io::Error),
}

/// Main error enum wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum ImgdError {
    /// Request validation errors
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Source origin fetch errors
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Resize/re-encode pipeline errors
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Cache storage errors
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Convenience type alias for Results with ImgdError
pub type Result<T> = std::result::Result<T, ImgdError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_validation_error_display() {
        let error = ValidationError::Dimension {
            name: "w",
            value: "abc".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "invalid w parameter: expected a non-negative integer, got \"abc\""
        );

        let error = ValidationError::Fit {
            value: "stretch".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "invalid fit parameter: expected \"cover\" or \"contain\", got \"stretch\""
        );

        let error = ValidationError::EmptySourcePath;
        assert_eq!(format!("{}", error), "empty source path");
    }

    #[test]
    fn test_fetch_error_display() {
        let error = FetchError::Status {
            url: "http://origin.test/a.png".to_string(),
            status: 503,
        };
        assert_eq!(
            format!("{}", error),
            "source http://origin.test/a.png returned HTTP 503"
        );

        let error = FetchError::EmptyBody {
            url: "http://origin.test/a.png".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "source http://origin.test/a.png returned an empty body"
        );
    }

    #[test]
    fn test_cache_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let cache_error = CacheError::Write {
            path: PathBuf::from("/cache/entry.webp"),
            source: io_error,
        };
        let imgd_error = ImgdError::Cache(cache_error);

        assert!(imgd_error.source().is_some());
        if let Some(source) = imgd_error.source() {
            assert!(source.source().is_some()); // the underlying io::Error
        }
    }

    #[test]
    fn test_imgd_error_from_domain_errors() {
        let validation_error = ValidationError::EmptySourcePath;
        let imgd_error: ImgdError = validation_error.into();
        assert!(matches!(imgd_error, ImgdError::Validation(_)));

        let fetch_error = FetchError::EmptyBody {
            url: "http://origin.test/a.png".to_string(),
        };
        let imgd_error: ImgdError = fetch_error.into();
        assert!(matches!(imgd_error, ImgdError::Fetch(_)));

        let config_error = ConfigError::Validation {
            message: "missing origin".to_string(),
        };
        let imgd_error: ImgdError = config_error.into();
        assert!(matches!(imgd_error, ImgdError::Config(_)));
    }

    #[test]
    fn test_anyhow_conversions() {
        let config_error = ConfigError::Parsing {
            message: "bad toml".to_string(),
        };
        // thiserror automatically provides the conversion
        let anyhow_error = anyhow::Error::from(config_error);
        assert!(anyhow_error
            .to_string()
            .contains("failed to parse configuration file"));
    }
}
