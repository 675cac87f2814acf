//! Cache key derivation
//!
//! A `TransformKey` identifies one transformed image: which namespace the
//! source lives in, the source path relative to that namespace's origin, the
//! requested dimensions, and the fit mode. The mapping from key to cache file
//! name is a pure function — same key, same name, across processes and
//! restarts — so the filesystem can serve as the whole cache index.

use crate::errors::ValidationError;
use std::fmt;

/// Version tag baked into every cache file name.
///
/// Bump this when the output encoding changes (e.g. switching to a lossy
/// encoder) so new entries never collide with files produced by an older
/// format.
pub const CACHE_FORMAT_VERSION: &str = "v1";

/// Which namespace/origin a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageClass {
    /// Bundled static asset, fetched from the static-file origin
    Public,
    /// Dynamically produced asset (e.g. social preview), fetched from the
    /// generation origin
    Generated,
}

impl ImageClass {
    /// Parse an image class from its URL path prefix (`public` or `gen`)
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "public" => Some(ImageClass::Public),
            "gen" => Some(ImageClass::Generated),
            _ => None,
        }
    }

    /// Namespace segment used in cache file names
    pub fn namespace(self) -> &'static str {
        match self {
            ImageClass::Public => "public",
            ImageClass::Generated => "gen",
        }
    }
}

impl fmt::Display for ImageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.namespace())
    }
}

/// Resize behavior when both target dimensions are given
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FitMode {
    /// Fill the target box exactly, cropping overflow (center crop)
    #[default]
    Cover,
    /// Largest size that fits inside the target box, aspect preserved
    Contain,
}

impl FitMode {
    /// Parse a fit mode from the `fit` query parameter; `None` means default
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw {
            None => Ok(FitMode::default()),
            Some("cover") => Ok(FitMode::Cover),
            Some("contain") => Ok(FitMode::Contain),
            Some(other) => Err(ValidationError::Fit {
                value: other.to_string(),
            }),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a dimension query parameter as a non-negative integer
///
/// `None` (parameter absent) is accepted and means "no constraint". Anything
/// that does not parse as a `u32` — including negative numbers — is rejected
/// before any I/O happens. An explicit `0` is normalized to `None`, matching
/// the `0` placeholder the derived file name uses for absent dimensions.
pub fn parse_dimension(
    name: &'static str,
    raw: Option<&str>,
) -> Result<Option<u32>, ValidationError> {
    match raw {
        None => Ok(None),
        Some(value) => match value.parse::<u32>() {
            Ok(0) => Ok(None),
            Ok(n) => Ok(Some(n)),
            Err(_) => Err(ValidationError::Dimension {
                name,
                value: value.to_string(),
            }),
        },
    }
}

/// Deterministic identity of one transformed image
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransformKey {
    pub class: ImageClass,
    pub source_path: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fit: FitMode,
}

impl TransformKey {
    /// Build a key from validated parts
    ///
    /// Leading slashes on the source path are stripped so that `/a.png` and
    /// `a.png` name the same entry; an empty path is rejected.
    pub fn new(
        class: ImageClass,
        source_path: &str,
        width: Option<u32>,
        height: Option<u32>,
        fit: FitMode,
    ) -> Result<Self, ValidationError> {
        let source_path = source_path.trim_start_matches('/');
        if source_path.is_empty() {
            return Err(ValidationError::EmptySourcePath);
        }

        Ok(Self {
            class,
            source_path: source_path.to_string(),
            // 0 means "no constraint on that axis"
            width: width.filter(|&w| w > 0),
            height: height.filter(|&h| h > 0),
            fit,
        })
    }

    /// Derive the cache file name for this key
    ///
    /// Path separators in the source path are replaced with `-` so the whole
    /// identifier fits in a single file name. Absent dimensions appear as
    /// `0`. The result is a pure function of the key: no randomness, no time
    /// dependence.
    pub fn file_name(&self) -> String {
        let sanitized: String = self
            .source_path
            .chars()
            .map(|c| if c == '/' || c == '\\' { '-' } else { c })
            .collect();

        format!(
            "{}-{}-{}-{}x{}-{}.webp",
            self.class.namespace(),
            CACHE_FORMAT_VERSION,
            sanitized,
            self.width.unwrap_or(0),
            self.height.unwrap_or(0),
            self.fit
        )
    }
}
