//! Enhanced suffix array: construction, storage backends, navigation and
//! exact search.
//!
//! Construction runs in four phases over a validated [`Sequence`]:
//! suffix sorting, LCP computation, child-table construction and table
//! materialisation into the chosen [`storage`] backend. Queries walk the
//! lcp-interval tree through the child table without materialising a suffix
//! tree.
//!
//! [`Sequence`]: crate::genomics::Sequence

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::genomics::SequenceError;
use crate::util::Cancelled;

pub mod buckets;
pub mod child_table;
pub mod config;
pub mod index;
pub mod interval;
pub mod lcp;
pub mod persist;
pub mod storage;
pub mod suffix_sort;

pub use buckets::{BucketLookup, PrefixBuckets, MAX_BUCKET_DEPTH};
pub use config::BuildConfig;
pub use index::{CompactEsa, EnhancedSuffixArray, InMemoryEsa, MappedEsa};
pub use interval::Interval;
pub use storage::{
    compact::{CompactTable, OverflowMap},
    mapped::{MappedTable, MAX_MAPPED_ELEMENTS},
    BuildTable, IntTable, TableKind, TableStorage,
};
pub use suffix_sort::SuffixSorter;

/// Errors raised while building, storing or querying an index.
#[derive(Debug, Error)]
pub enum EsaError {
    /// Sequence or pattern failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] SequenceError),

    /// Exact search was asked for an empty pattern.
    #[error("pattern must be non-empty")]
    EmptyPattern,

    /// A table cell could not be resolved.
    #[error("corrupt {table} entry at index {index}")]
    IndexCorruption {
        /// Table the lookup went to.
        table: &'static str,
        /// Slot that failed to decode.
        index: usize,
    },

    /// Reading or writing index data failed.
    #[error("I/O error on {}: {source}", path.display())]
    Persistence {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Persisted data or configuration is malformed.
    #[error("malformed index data: {0}")]
    Format(String),

    /// Construction was cancelled.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl EsaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        EsaError::Persistence {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(kind: TableKind, index: usize) -> Self {
        EsaError::IndexCorruption {
            table: kind.name(),
            index,
        }
    }
}
