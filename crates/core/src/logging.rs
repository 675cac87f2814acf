//! Logging and observability bootstrap
//!
//! Structured logging via tracing-subscriber, with text and JSON formats
//! selected at runtime via a CLI flag or environment variable (no feature
//! flags). All logging output is directed to stderr so stdout stays clean.

use anyhow::Result;
use std::{io, sync::Once};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the logging system with an optional format specification
///
/// Safe to call multiple times; subsequent calls are no-ops.
///
/// ## Arguments
///
/// * `format` - `None` or `"text"` for human-readable output, `"json"` for
///   structured JSON
///
/// ## Environment Variables
///
/// * `IMGD_LOG_FORMAT` - output format ("json" for JSON, anything else text);
///   used when `format` is `None`
/// * `IMGD_LOG` - logging filter specification
/// * `RUST_LOG` - standard fallback when `IMGD_LOG` is unset
pub fn init(format: Option<&str>) -> Result<()> {
    INIT.call_once(|| {
        let filter = create_env_filter();

        let env_format = std::env::var("IMGD_LOG_FORMAT").ok();
        let effective_format = format.or(env_format.as_deref()).unwrap_or("text");

        match effective_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(
                        fmt::layer()
                            .json()
                            .with_target(true)
                            .with_writer(io::stderr),
                    )
                    .with(filter)
                    .init();
            }
            _ => {
                // Default to text format (including None or any other value)
                tracing_subscriber::registry()
                    .with(fmt::layer().with_target(true).with_writer(io::stderr))
                    .with(filter)
                    .init();
            }
        }

        tracing::debug!("logging initialized with format: {}", effective_format);
    });

    Ok(())
}

/// Create an EnvFilter from IMGD_LOG, falling back to RUST_LOG, then "info"
fn create_env_filter() -> EnvFilter {
    if let Ok(imgd_log) = std::env::var("IMGD_LOG") {
        EnvFilter::try_new(&imgd_log).unwrap_or_else(|_| {
            tracing::warn!(
                "invalid IMGD_LOG specification '{}', using default 'info'",
                imgd_log
            );
            EnvFilter::new("info")
        })
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Check if logging has been initialized
///
/// Primarily useful for tests that need to know whether the subscriber is
/// already installed.
pub fn is_initialized() -> bool {
    INIT.is_completed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Use a mutex to ensure tests don't interfere with each other
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn test_init_multiple_calls_safe() {
        let _guard = TEST_MUTEX.lock().unwrap();

        assert!(init(None).is_ok());
        assert!(init(Some("json")).is_ok());
        assert!(init(Some("text")).is_ok());
    }

    #[test]
    fn test_init_unknown_format_falls_back_to_text() {
        let _guard = TEST_MUTEX.lock().unwrap();
        assert!(init(Some("invalid")).is_ok());
    }

    #[test]
    fn test_env_filter_with_env_vars() {
        std::env::set_var("IMGD_LOG", "trace");
        let _filter = create_env_filter();
        std::env::remove_var("IMGD_LOG");

        std::env::set_var("RUST_LOG", "warn");
        let _filter = create_env_filter();
        std::env::remove_var("RUST_LOG");
    }

    #[test]
    fn test_is_initialized() {
        let _guard = TEST_MUTEX.lock().unwrap();

        let _ = init(None);
        assert!(is_initialized());
    }
}
