//! Transform service: the cache-lookup → fetch → transform → store pipeline
//!
//! `TransformService` owns the disk cache and the injected source fetcher and
//! executes one `TransformKey` end to end. Per-request state machine:
//! lookup hit → serve; lookup miss → fetch source bytes, resize/re-encode,
//! persist, serve. Nothing is retried within a request; a client retry
//! re-enters the pipeline from scratch and may then observe a hit.
//!
//! There is deliberately no single-flight de-duplication around cache
//! population. Two concurrent misses for the same key both fetch and
//! transform; the transform is deterministic, so both writes carry identical
//! bytes and the cache's rename-into-place write keeps readers safe.

use crate::cache::{ImageCache, TransformKey};
use crate::config::ServiceConfig;
use crate::errors::Result;
use crate::fetch::SourceFetcher;
use crate::observability::{
    cache_lookup_span, cache_write_span, image_transform_span, request_serve_span,
    source_fetch_span, StageTimings, TimedSpan,
};
use crate::transform::{self, OUTPUT_CONTENT_TYPE};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, Instrument};

/// A successfully transformed (or cache-served) image
#[derive(Debug)]
pub struct TransformedImage {
    /// WebP bytes to serve
    pub bytes: Bytes,
    /// Always `image/webp`
    pub content_type: &'static str,
    /// Seconds for the response Cache-Control max-age
    pub cache_max_age: u64,
    /// Stage timings for the Server-Timing diagnostic header
    pub timings: StageTimings,
}

/// The image transform cache pipeline
pub struct TransformService {
    config: ServiceConfig,
    cache: ImageCache,
    fetcher: Arc<dyn SourceFetcher>,
}

impl TransformService {
    /// Build the service from a validated config and an injected fetcher
    pub fn new(config: ServiceConfig, fetcher: Arc<dyn SourceFetcher>) -> Self {
        let cache = ImageCache::new(config.cache_root.clone());
        Self {
            config,
            cache,
            fetcher,
        }
    }

    /// The cache the service writes to (exposed for tests asserting on entry paths)
    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    /// Serve one transform request
    ///
    /// The key is assumed validated (construction already rejects malformed
    /// input); this method performs no further parameter checks and goes
    /// straight to the cache.
    pub async fn get(&self, key: &TransformKey) -> Result<TransformedImage> {
        let started = Instant::now();
        let file_name = key.file_name();
        let request_span = TimedSpan::new(request_serve_span(&file_name));

        // Attach the span via Instrument rather than an enter guard: the
        // future must stay Send so it can run on a multi-threaded runtime.
        let result = self
            .get_inner(key, &file_name, started)
            .instrument(request_span.span().clone())
            .await;
        request_span.complete();
        result
    }

    async fn get_inner(
        &self,
        key: &TransformKey,
        file_name: &str,
        started: Instant,
    ) -> Result<TransformedImage> {
        let cached = self
            .cache
            .lookup(key)
            .instrument(cache_lookup_span(file_name))
            .await?;
        if let Some(bytes) = cached {
            return Ok(TransformedImage {
                bytes,
                content_type: OUTPUT_CONTENT_TYPE,
                cache_max_age: self.config.cache_max_age,
                timings: StageTimings {
                    cache_hit: true,
                    total: started.elapsed(),
                    ..StageTimings::default()
                },
            });
        }

        // Miss: fetch the original from our own origin
        let url = self.config.source_url(key.class, &key.source_path);
        let fetch_span = TimedSpan::new(source_fetch_span(&url));
        let source = match self
            .fetcher
            .fetch(&url)
            .instrument(fetch_span.span().clone())
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => {
                error!(source_url = %url, error = %e, "source fetch failed");
                return Err(e.into());
            }
        };
        let fetch_elapsed = fetch_span.complete();

        let transform_span = TimedSpan::new(image_transform_span(file_name));
        let output = {
            // Synchronous stage, so a scoped enter guard is safe here
            let _guard = transform_span.span().enter();
            match transform::transform(&source, key.width, key.height, key.fit) {
                Ok(bytes) => bytes,
                Err(e) => {
                    error!(source_url = %url, error = %e, "transform failed");
                    return Err(e.into());
                }
            }
        };
        let transform_elapsed = transform_span.complete();

        let path = self
            .cache
            .store(key, &output)
            .instrument(cache_write_span(file_name))
            .await?;
        info!(
            cache_key = %file_name,
            path = %path.display(),
            source_url = %url,
            "cache entry populated"
        );

        Ok(TransformedImage {
            bytes: Bytes::from(output),
            content_type: OUTPUT_CONTENT_TYPE,
            cache_max_age: self.config.cache_max_age,
            timings: StageTimings {
                cache_hit: false,
                fetch: Some(fetch_elapsed),
                transform: Some(transform_elapsed),
                total: started.elapsed(),
            },
        })
    }
}
