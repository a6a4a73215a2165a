//! Integer-table backends.
//!
//! The index algorithms read every table through [`TableStorage`], so the
//! same navigation code runs over plain vectors, the compact byte encoding
//! and memory-mapped files.

use std::fmt;

use super::buckets::PrefixBuckets;
use super::{BuildConfig, EsaError};
use crate::genomics::Sequence;

pub mod compact;
pub mod mapped;

/// Which of the three index tables a backend holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Suffix array.
    Suffix,
    /// LCP table.
    Lcp,
    /// Child table.
    Child,
}

impl TableKind {
    /// Short name used in errors and file names.
    pub fn name(self) -> &'static str {
        match self {
            TableKind::Suffix => "suftab",
            TableKind::Lcp => "lcptab",
            TableKind::Child => "childtab",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read access to a table of non-negative integers.
pub trait TableStorage: fmt::Debug + Send + Sync {
    /// Number of slots.
    fn len(&self) -> usize;

    /// Whether the table has no slots.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`.
    ///
    /// Cells that cannot be resolved yield [`EsaError::IndexCorruption`].
    fn get(&self, index: usize) -> Result<usize, EsaError>;

    /// Decode every slot into a vector.
    fn to_vec(&self) -> Result<Vec<u32>, EsaError> {
        (0..self.len())
            .map(|index| self.get(index).map(|value| value as u32))
            .collect()
    }
}

/// Backends that can be produced from freshly built table values.
pub trait BuildTable: TableStorage + Sized {
    /// Store `values` as table `kind`.
    fn from_values(kind: TableKind, values: Vec<u32>, config: &BuildConfig)
        -> Result<Self, EsaError>;

    /// Store what a later session needs besides the tables to reopen the
    /// index. Backends that live only in memory have nothing to store.
    fn store_manifest(
        _sequence: &Sequence,
        _buckets: Option<&PrefixBuckets>,
        _config: &BuildConfig,
    ) -> Result<(), EsaError> {
        Ok(())
    }
}

/// Plain in-memory `u32` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntTable {
    kind: TableKind,
    values: Vec<u32>,
}

impl IntTable {
    /// Wrap already computed values.
    pub fn new(kind: TableKind, values: Vec<u32>) -> Self {
        Self { kind, values }
    }

    /// Raw values.
    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }
}

impl TableStorage for IntTable {
    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn get(&self, index: usize) -> Result<usize, EsaError> {
        self.values
            .get(index)
            .map(|&value| value as usize)
            .ok_or_else(|| EsaError::corrupt(self.kind, index))
    }

    fn to_vec(&self) -> Result<Vec<u32>, EsaError> {
        Ok(self.values.clone())
    }
}

impl BuildTable for IntTable {
    fn from_values(kind: TableKind, values: Vec<u32>, _config: &BuildConfig) -> Result<Self, EsaError> {
        Ok(Self::new(kind, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_table_reports_out_of_range_slot() {
        let table = IntTable::new(TableKind::Lcp, vec![0, 0, 2]);
        assert_eq!(table.get(2).unwrap(), 2);
        assert!(matches!(
            table.get(3),
            Err(EsaError::IndexCorruption {
                table: "lcptab",
                index: 3
            })
        ));
    }
}
