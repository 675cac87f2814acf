//! Observability utilities for standardized tracing spans and stage timings
//!
//! Canonical span names for the request pipeline, a duration-recording span
//! helper, and the `StageTimings` accumulator behind the `Server-Timing`
//! response header.

use std::time::{Duration, Instant};
use tracing::{span, Span};

/// Canonical span names for the request pipeline
pub mod spans {
    pub const REQUEST_SERVE: &str = "request.serve";
    pub const CACHE_LOOKUP: &str = "cache.lookup";
    pub const SOURCE_FETCH: &str = "source.fetch";
    pub const IMAGE_TRANSFORM: &str = "image.transform";
    pub const CACHE_WRITE: &str = "cache.write";
}

/// Common field names for structured logging
pub mod fields {
    pub const CACHE_KEY: &str = "cache_key";
    pub const SOURCE_URL: &str = "source_url";
    pub const DURATION_MS: &str = "duration_ms";
}

/// Start a span covering one whole transform request
pub fn request_serve_span(cache_key: &str) -> Span {
    span!(
        target: "imgd_core::observability",
        tracing::Level::INFO,
        spans::REQUEST_SERVE,
        duration_ms = tracing::field::Empty,
        cache_key = %cache_key
    )
}

/// Start a span for the source fetch stage
pub fn source_fetch_span(source_url: &str) -> Span {
    span!(
        target: "imgd_core::observability",
        tracing::Level::INFO,
        spans::SOURCE_FETCH,
        duration_ms = tracing::field::Empty,
        source_url = %source_url
    )
}

/// Start a span for the resize/re-encode stage
pub fn image_transform_span(cache_key: &str) -> Span {
    span!(
        target: "imgd_core::observability",
        tracing::Level::INFO,
        spans::IMAGE_TRANSFORM,
        duration_ms = tracing::field::Empty,
        cache_key = %cache_key
    )
}

/// Start a span for the cache lookup stage
pub fn cache_lookup_span(cache_key: &str) -> Span {
    span!(
        target: "imgd_core::observability",
        tracing::Level::DEBUG,
        spans::CACHE_LOOKUP,
        cache_key = %cache_key
    )
}

/// Start a span for the cache write stage
pub fn cache_write_span(cache_key: &str) -> Span {
    span!(
        target: "imgd_core::observability",
        tracing::Level::DEBUG,
        spans::CACHE_WRITE,
        cache_key = %cache_key
    )
}

/// Helper for recording duration on span completion
///
/// Holds the span without entering it: callers attach the span to async
/// stages via `Instrument` (or a short-lived `enter` guard around sync work)
/// so the timer can live across `.await` points on a multi-threaded runtime.
pub struct TimedSpan {
    span: Span,
    start_time: Instant,
}

impl TimedSpan {
    /// Create a new timed span from an existing span
    pub fn new(span: Span) -> Self {
        Self {
            span,
            start_time: Instant::now(),
        }
    }

    /// Complete the span, recording its duration and returning it
    pub fn complete(self) -> Duration {
        let elapsed = self.start_time.elapsed();
        self.span
            .record(fields::DURATION_MS, elapsed.as_millis() as u64);
        elapsed
    }

    /// Get the underlying span for recording additional fields
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// Per-stage timings for one request, rendered into `Server-Timing`
#[derive(Debug, Clone, Default)]
pub struct StageTimings {
    /// Whether the response came straight from the cache
    pub cache_hit: bool,
    /// Source fetch duration (miss only)
    pub fetch: Option<Duration>,
    /// Resize/re-encode duration (miss only)
    pub transform: Option<Duration>,
    /// Whole-request duration
    pub total: Duration,
}

impl StageTimings {
    /// Render as a `Server-Timing` header value
    pub fn header_value(&self) -> String {
        let mut parts = vec![format!(
            "cache;desc=\"{}\"",
            if self.cache_hit { "hit" } else { "miss" }
        )];
        if let Some(fetch) = self.fetch {
            parts.push(format!("fetch;dur={}", fetch.as_millis()));
        }
        if let Some(transform) = self.transform {
            parts.push(format!("transform;dur={}", transform.as_millis()));
        }
        parts.push(format!("total;dur={}", self.total.as_millis()));
        parts.join(", ")
    }
}
