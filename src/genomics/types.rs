use std::fmt;

/// Strand on which an occurrence was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Strand {
    /// Pattern occurs as given.
    Forward,
    /// Reverse complement of the pattern occurs.
    Reverse,
}

impl Strand {
    /// Returns `true` for [`Strand::Forward`].
    pub fn is_forward(self) -> bool {
        matches!(self, Strand::Forward)
    }

    /// Single-character strand symbol (`+` / `-`).
    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// Occurrence of a pattern in an indexed genome.
///
/// Reverse-strand hits report the leftmost genomic coordinate covered by the
/// reverse-complement occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hit {
    /// Index of the contig within its [`GenomeIndex`](crate::GenomeIndex).
    pub contig_id: usize,
    /// 0-based leftmost coordinate on the contig.
    pub position: usize,
    /// Strand of the occurrence.
    pub strand: Strand,
}

impl Hit {
    /// Construct a hit.
    pub fn new(contig_id: usize, position: usize, strand: Strand) -> Self {
        Self {
            contig_id,
            position,
            strand,
        }
    }

    /// Whether the hit lies on the forward strand.
    pub fn is_forward_strand(&self) -> bool {
        self.strand.is_forward()
    }
}

impl fmt::Display for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            self.contig_id,
            self.position,
            self.strand.symbol()
        )
    }
}
