//! Transformed-image cache
//!
//! This module provides the cache key type and the disk-backed store for
//! transformed images. One file per key, named deterministically from the
//! key; existence of the file is the hit signal. There is no index, no
//! metadata store, and no eviction — invalidation is an operational concern
//! (clearing the cache directory).

mod disk;
mod key;

pub use disk::ImageCache;
pub use key::{parse_dimension, FitMode, ImageClass, TransformKey, CACHE_FORMAT_VERSION};
