//! # Enhanced Suffix Array Search for Genomes
//!
//! This library indexes DNA sequences with an enhanced suffix array (suffix
//! array, LCP table and child table) and answers exact and approximate
//! substring-occurrence queries against it.
//!
//! ## Core Algorithm
//!
//! 1. **Induced suffix sorting**: S/L classification, reduction to the
//!    leftmost positions of the rarer type, recursion on named substrings
//! 2. **Kasai LCP**: one linear pass over text positions
//! 3. **Child table**: up, down and next links packed into one integer per
//!    slot, decoded from neighbouring LCP values
//! 4. **Top-down descent**: exact search walks lcp-intervals without
//!    building a suffix tree
//! 5. **Seed and extend**: exact 3' seeds, unit-cost DP verification on
//!    both strands
//!
//! LCP and child tables are stored one byte per slot with an overflow list
//! for the rare large values; all tables may instead live in memory-mapped
//! files.
//!
//! ## Usage Example
//!
//! ```
//! use esaseek::{CompactEsa, Sequence};
//!
//! let esa = CompactEsa::build(Sequence::new("acaaacatat")?)?;
//! let hits: Vec<usize> = esa.find_positions("aca")?.into_iter().collect();
//! assert_eq!(hits, vec![0, 4]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]

pub mod approx; // Seed-and-extend approximate search
pub mod esa; // Enhanced suffix array construction, storage and queries
pub mod genome; // Multi-contig genome index
pub mod genomics; // Sequences, strands and hits
pub mod space; // Workspace accounting
pub mod util; // Cancellation

// Re-exports for convenience
pub use approx::{ApproxMatch, ApproxSearchError, ApproxSearchParams, ApproxSearcher};
pub use esa::{
    BuildConfig, CompactEsa, EnhancedSuffixArray, EsaError, InMemoryEsa, Interval, MappedEsa,
};
pub use genome::{GenomeIndex, GenomeIndexError};
pub use genomics::{Hit, Sequence, SequenceError, Strand};
pub use util::CancellationToken;
