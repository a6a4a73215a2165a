//! Build-time options.

use std::path::{Path, PathBuf};

use super::buckets::MAX_BUCKET_DEPTH;
use super::storage::mapped::MAX_MAPPED_ELEMENTS;
use super::EsaError;

/// Build-time options for an [`EnhancedSuffixArray`].
///
/// The storage backend itself is picked by the index type; these options
/// tune bucket acceleration and where mapped tables live.
///
/// [`EnhancedSuffixArray`]: super::EnhancedSuffixArray
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildConfig {
    /// Prefix length of the bucket table (0 disables it).
    pub bucket_depth: usize,
    /// Directory receiving memory-mapped table files.
    pub mapped_dir: Option<PathBuf>,
    /// Maximum number of `u32` elements per mapped file.
    pub chunk_elements: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            bucket_depth: 0,
            mapped_dir: None,
            chunk_elements: MAX_MAPPED_ELEMENTS,
        }
    }
}

impl BuildConfig {
    /// Enable prefix buckets of length `depth` (at most [`MAX_BUCKET_DEPTH`]).
    pub fn with_bucket_depth(mut self, depth: usize) -> Result<Self, EsaError> {
        if depth > MAX_BUCKET_DEPTH {
            return Err(EsaError::Format(format!(
                "bucket depth {depth} exceeds the maximum of {MAX_BUCKET_DEPTH}"
            )));
        }
        self.bucket_depth = depth;
        Ok(self)
    }

    /// Write memory-mapped tables under `dir`.
    pub fn with_mapped_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.mapped_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Split mapped tables into files of at most `elements` entries.
    pub fn with_chunk_elements(mut self, elements: usize) -> Result<Self, EsaError> {
        if elements == 0 || elements > MAX_MAPPED_ELEMENTS {
            return Err(EsaError::Format(format!(
                "chunk size must lie in 1..={MAX_MAPPED_ELEMENTS}, got {elements}"
            )));
        }
        self.chunk_elements = elements;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validates_limits() {
        let config = BuildConfig::default()
            .with_bucket_depth(8)
            .unwrap()
            .with_chunk_elements(16)
            .unwrap();
        assert_eq!(config.bucket_depth, 8);
        assert_eq!(config.chunk_elements, 16);
        assert!(BuildConfig::default().with_bucket_depth(13).is_err());
        assert!(BuildConfig::default().with_chunk_elements(0).is_err());
    }
}
