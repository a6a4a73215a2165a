//! Nucleotide sequences and the hit types reported by searches.

mod sequence;
mod types;

pub use sequence::{
    complement, normalize_pattern, reverse_complement, BaseCode, Sequence, SequenceError,
    ALPHABET_SIZE, MAX_SEQUENCE_LEN,
};
pub use types::{Hit, Strand};
