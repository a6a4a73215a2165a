use std::fmt;

use thiserror::Error;

/// Number of distinct symbols in the index alphabet (A, C, G, N, T).
pub const ALPHABET_SIZE: usize = 5;

/// Largest sequence length addressable by the 32-bit index tables.
///
/// One slot is reserved for the sentinel suffix.
pub const MAX_SEQUENCE_LEN: usize = u32::MAX as usize - 1;

/// Enumeration of the bases accepted by the index, in suffix-sort order.
///
/// Discriminants follow the byte order of the uppercase letters so that the
/// suffix array over ranks equals a byte-wise sort of the suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaseCode {
    /// Adenine.
    A = 0,
    /// Cytosine.
    C = 1,
    /// Guanine.
    G = 2,
    /// Masked or ambiguous base.
    N = 3,
    /// Thymine/Uracil.
    T = 4,
}

impl BaseCode {
    /// Attempt to parse an ASCII base into a [`BaseCode`].
    pub fn from_ascii(base: u8) -> Option<Self> {
        match base {
            b'A' | b'a' => Some(BaseCode::A),
            b'C' | b'c' => Some(BaseCode::C),
            b'G' | b'g' => Some(BaseCode::G),
            b'T' | b't' | b'U' | b'u' => Some(BaseCode::T),
            b'N' | b'n' => Some(BaseCode::N),
            _ => None,
        }
    }

    /// Uppercase ASCII letter for this base.
    pub fn to_ascii(self) -> u8 {
        match self {
            BaseCode::A => b'A',
            BaseCode::C => b'C',
            BaseCode::G => b'G',
            BaseCode::N => b'N',
            BaseCode::T => b'T',
        }
    }

    /// Rank of the base in the sort alphabet.
    #[inline]
    pub fn rank(self) -> u32 {
        self as u32
    }

    /// Watson-Crick complement (`N` maps to itself).
    pub fn complement(self) -> Self {
        match self {
            BaseCode::A => BaseCode::T,
            BaseCode::C => BaseCode::G,
            BaseCode::G => BaseCode::C,
            BaseCode::T => BaseCode::A,
            BaseCode::N => BaseCode::N,
        }
    }

    /// 2-bit code for canonical bases; `None` for the mask symbol.
    pub fn two_bit(self) -> Option<u8> {
        match self {
            BaseCode::A => Some(0b00),
            BaseCode::C => Some(0b01),
            BaseCode::G => Some(0b10),
            BaseCode::T => Some(0b11),
            BaseCode::N => None,
        }
    }
}

/// Errors raised while validating or slicing sequences.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// Sequence (or pattern) was empty.
    #[error("sequence must be non-empty")]
    Empty,

    /// Encountered a character outside the {A, C, G, T, N} alphabet.
    #[error("unsupported character '{ch}' at position {position}")]
    UnsupportedBase {
        /// Character that could not be encoded.
        ch: char,
        /// Offset of the character in the input.
        position: usize,
    },

    /// Sequence does not fit the 32-bit index tables.
    #[error("sequence length {len} exceeds the maximum of {max}")]
    TooLong {
        /// Length of the rejected sequence.
        len: usize,
        /// Largest supported length.
        max: usize,
    },

    /// Requested window lies (partly) outside the sequence.
    #[error("window of {len} bases at {start} lies outside 0..{bound}")]
    OutOfBounds {
        /// Requested start coordinate (may be negative).
        start: i64,
        /// Requested window length.
        len: usize,
        /// Sequence length.
        bound: usize,
    },
}

/// Immutable, validated nucleotide sequence stored as uppercase ASCII.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sequence {
    bases: Vec<u8>,
}

impl Sequence {
    /// Validate and normalise `raw` (case-insensitive, `U` read as `T`).
    pub fn new(raw: impl AsRef<[u8]>) -> Result<Self, SequenceError> {
        let raw = raw.as_ref();
        if raw.is_empty() {
            return Err(SequenceError::Empty);
        }
        if raw.len() > MAX_SEQUENCE_LEN {
            return Err(SequenceError::TooLong {
                len: raw.len(),
                max: MAX_SEQUENCE_LEN,
            });
        }
        Ok(Self {
            bases: normalize_pattern(raw)?,
        })
    }

    /// Number of bases.
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    /// Always `false`; empty sequences are rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    /// Uppercase ASCII bases.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bases
    }

    /// Base at `idx`, if in range.
    pub fn base_at(&self, idx: usize) -> Option<u8> {
        self.bases.get(idx).copied()
    }

    /// Borrow `len` bases starting at `start`.
    ///
    /// Windows reaching outside the sequence yield
    /// [`SequenceError::OutOfBounds`].
    pub fn window(&self, start: i64, len: usize) -> Result<&[u8], SequenceError> {
        let out_of_bounds = || SequenceError::OutOfBounds {
            start,
            len,
            bound: self.bases.len(),
        };
        let begin = usize::try_from(start).map_err(|_| out_of_bounds())?;
        let end = begin.checked_add(len).ok_or_else(out_of_bounds)?;
        self.bases.get(begin..end).ok_or_else(out_of_bounds)
    }

    /// Sort ranks of every base (see [`BaseCode::rank`]).
    pub fn ranks(&self) -> Vec<u32> {
        self.bases.iter().map(|&base| rank_of(base)).collect()
    }

    /// Reverse complement as a new sequence.
    pub fn reverse_complement(&self) -> Sequence {
        Sequence {
            bases: reverse_complement(&self.bases),
        }
    }

    /// Consume the sequence, returning its bases.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bases
    }
}

impl AsRef<[u8]> for Sequence {
    fn as_ref(&self) -> &[u8] {
        &self.bases
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bases))
    }
}

/// Normalise a query pattern to uppercase ASCII, rejecting foreign symbols.
///
/// Unlike [`Sequence::new`] an empty input is returned as-is so callers can
/// report emptiness in their own terms.
pub fn normalize_pattern(raw: &[u8]) -> Result<Vec<u8>, SequenceError> {
    raw.iter()
        .enumerate()
        .map(|(position, &ch)| {
            BaseCode::from_ascii(ch)
                .map(BaseCode::to_ascii)
                .ok_or(SequenceError::UnsupportedBase {
                    ch: ch as char,
                    position,
                })
        })
        .collect()
}

/// Complement of a normalised base; unknown bytes map to `N`.
#[inline]
pub fn complement(base: u8) -> u8 {
    BaseCode::from_ascii(base)
        .map(|code| code.complement().to_ascii())
        .unwrap_or(b'N')
}

/// Reverse complement of a normalised base slice.
pub fn reverse_complement(bases: &[u8]) -> Vec<u8> {
    bases.iter().rev().map(|&base| complement(base)).collect()
}

#[inline]
fn rank_of(base: u8) -> u32 {
    BaseCode::from_ascii(base).unwrap_or(BaseCode::N).rank()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalises_case_and_uracil() {
        let seq = Sequence::new(b"acgUn").unwrap();
        assert_eq!(seq.as_bytes(), b"ACGTN");
        assert_eq!(seq.to_string(), "ACGTN");
    }

    #[test]
    fn rejects_empty_and_foreign_symbols() {
        assert_eq!(Sequence::new(b""), Err(SequenceError::Empty));
        assert_eq!(
            Sequence::new(b"ACXT"),
            Err(SequenceError::UnsupportedBase {
                ch: 'X',
                position: 2
            })
        );
    }

    #[test]
    fn ranks_follow_byte_order() {
        let seq = Sequence::new(b"TNGCA").unwrap();
        assert_eq!(seq.ranks(), vec![4, 3, 2, 1, 0]);
    }

    #[test]
    fn reverse_complement_roundtrip() {
        let seq = Sequence::new(b"AACGTN").unwrap();
        let rc = seq.reverse_complement();
        assert_eq!(rc.as_bytes(), b"NACGTT");
        assert_eq!(rc.reverse_complement(), seq);
    }

    #[test]
    fn window_checks_bounds() {
        let seq = Sequence::new(b"ACGTACGT").unwrap();
        assert_eq!(seq.window(2, 3).unwrap(), b"GTA");
        assert_eq!(seq.window(5, 3).unwrap(), b"CGT");
        assert!(matches!(
            seq.window(-1, 3),
            Err(SequenceError::OutOfBounds { start: -1, .. })
        ));
        assert!(matches!(
            seq.window(6, 3),
            Err(SequenceError::OutOfBounds { bound: 8, .. })
        ));
    }
}
