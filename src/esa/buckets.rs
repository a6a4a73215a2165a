//! Prefix bucket table.
//!
//! For a depth `d`, every ACGT string of length `d` is mapped to the
//! half-open range of suffix-array ranks whose suffixes start with it.
//! Suffixes shorter than `d` or containing `N` within their first `d`
//! bases belong to no bucket. A query of length at least `d` with an ACGT
//! prefix can start its descent from the bucket with `d` symbols already
//! matched.

use super::interval::Interval;
use super::EsaError;
use crate::genomics::BaseCode;

/// Deepest supported bucket prefix (4^12 buckets).
pub const MAX_BUCKET_DEPTH: usize = 12;

/// Outcome of a bucket lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketLookup {
    /// Pattern is too short or its prefix holds `N`; search from the root.
    NotApplicable,
    /// No suffix starts with the pattern prefix.
    Empty,
    /// Suffixes starting with the pattern prefix.
    Range(Interval),
}

/// Suffix-array ranges of every length-`depth` ACGT prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixBuckets {
    depth: usize,
    starts: Vec<u32>,
    ends: Vec<u32>,
}

impl PrefixBuckets {
    /// Build the table for `text` (uppercase ASCII) from its suffix array.
    pub fn build(text: &[u8], suftab: &[u32], depth: usize) -> Result<Self, EsaError> {
        if depth == 0 || depth > MAX_BUCKET_DEPTH {
            return Err(EsaError::Format(format!(
                "bucket depth must lie in 1..={MAX_BUCKET_DEPTH}, got {depth}"
            )));
        }
        let size = 1usize << (2 * depth);
        let mut starts = vec![0u32; size];
        let mut ends = vec![0u32; size];
        for (rank, &pos) in suftab.iter().enumerate() {
            let Some(prefix) = text.get(pos as usize..pos as usize + depth) else {
                continue;
            };
            let Some(code) = prefix_code(prefix) else {
                continue;
            };
            if starts[code] == ends[code] {
                starts[code] = rank as u32;
            }
            ends[code] = rank as u32 + 1;
        }
        Ok(Self {
            depth,
            starts,
            ends,
        })
    }

    /// Reassemble a table from persisted ranges.
    pub fn from_parts(depth: usize, starts: Vec<u32>, ends: Vec<u32>) -> Result<Self, EsaError> {
        let expected = (1..=MAX_BUCKET_DEPTH)
            .contains(&depth)
            .then(|| 1usize << (2 * depth));
        if expected != Some(starts.len()) || starts.len() != ends.len() {
            return Err(EsaError::Format(format!(
                "bucket table of depth {depth} has {} starts and {} ends",
                starts.len(),
                ends.len()
            )));
        }
        if starts.iter().zip(&ends).any(|(start, end)| start > end) {
            return Err(EsaError::Format("bucket range ends before it starts".to_string()));
        }
        Ok(Self {
            depth,
            starts,
            ends,
        })
    }

    /// Prefix length.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Range starts per prefix code.
    pub fn starts(&self) -> &[u32] {
        &self.starts
    }

    /// Range ends (exclusive) per prefix code.
    pub fn ends(&self) -> &[u32] {
        &self.ends
    }

    /// Interval of suffixes sharing the first `depth` bases of `pattern`.
    pub fn lookup(&self, pattern: &[u8]) -> BucketLookup {
        let Some(code) = pattern.get(..self.depth).and_then(prefix_code) else {
            return BucketLookup::NotApplicable;
        };
        let (start, end) = (self.starts[code] as usize, self.ends[code] as usize);
        if start == end {
            BucketLookup::Empty
        } else {
            BucketLookup::Range(Interval::new(start, end - 1))
        }
    }
}

/// Base-4 code of an ACGT prefix; `None` if it contains another symbol.
fn prefix_code(prefix: &[u8]) -> Option<usize> {
    prefix.iter().try_fold(0usize, |code, &base| {
        let bits = BaseCode::from_ascii(base)?.two_bit()?;
        Some((code << 2) | bits as usize)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_SUFTAB: [u32; 11] = [10, 2, 3, 0, 4, 8, 6, 1, 5, 9, 7];

    #[test]
    fn fixture_buckets_of_depth_two() {
        let buckets = PrefixBuckets::build(b"ACAAACATAT", &FIXTURE_SUFTAB, 2).unwrap();
        // AA: ranks 1..=2, AC: 3..=4, AT: 5..=6, CA: 7..=8, TA: 10
        assert_eq!(buckets.lookup(b"AAC"), BucketLookup::Range(Interval::new(1, 2)));
        assert_eq!(buckets.lookup(b"AC"), BucketLookup::Range(Interval::new(3, 4)));
        assert_eq!(buckets.lookup(b"TAT"), BucketLookup::Range(Interval::new(10, 10)));
        assert_eq!(buckets.lookup(b"GG"), BucketLookup::Empty);
        assert_eq!(buckets.lookup(b"A"), BucketLookup::NotApplicable);
        assert_eq!(buckets.lookup(b"NA"), BucketLookup::NotApplicable);
    }

    #[test]
    fn suffixes_with_mask_symbols_are_skipped() {
        let text = b"ANAA";
        // suffixes: $ A AA ANAA NAA -> ranks 4,3,2,0,1
        let suftab = [4, 3, 2, 0, 1];
        let buckets = PrefixBuckets::build(text, &suftab, 2).unwrap();
        assert_eq!(buckets.lookup(b"AA"), BucketLookup::Range(Interval::new(2, 2)));
        assert_eq!(buckets.lookup(b"AN"), BucketLookup::NotApplicable);
    }

    #[test]
    fn depth_limits_are_enforced() {
        assert!(PrefixBuckets::build(b"ACGT", &[4, 0, 1, 2, 3], 0).is_err());
        assert!(PrefixBuckets::build(b"ACGT", &[4, 0, 1, 2, 3], 13).is_err());
        assert!(PrefixBuckets::from_parts(1, vec![0; 4], vec![0; 3]).is_err());
    }
}
