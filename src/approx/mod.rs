//! Seed-and-extend approximate search.
//!
//! Exact seeds taken from the query's 3' end locate candidate sites on
//! either strand; candidates are kept when the 3'-terminal bases align
//! within a threshold, deduplicated, and finally verified by aligning the
//! whole query.

use thiserror::Error;

use crate::esa::EsaError;

pub mod dp;
pub mod params;
pub mod seed;

pub use dp::DpScratch;
pub use params::ApproxSearchParams;
pub use seed::{ApproxMatch, ApproxSearcher};

/// Errors raised by approximate search.
#[derive(Debug, Error)]
pub enum ApproxSearchError {
    /// Parameters do not fit the query.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Underlying index lookup failed.
    #[error(transparent)]
    Index(#[from] EsaError),
}
