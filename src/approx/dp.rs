//! Unit-cost global alignment (match 0, mismatch, insertion and deletion 1).
//!
//! Forward candidates compare query and genome base by base. Reverse
//! candidates read the query from its 3' end and compare it against the
//! complement of the genome read forward from the hit position, which is
//! the same as aligning the reverse complement without building it.

use crate::genomics::{complement, Sequence, Strand};

/// Reusable rows of the alignment matrix.
#[derive(Debug, Default, Clone)]
pub struct DpScratch {
    previous: Vec<usize>,
    current: Vec<usize>,
}

impl DpScratch {
    /// Empty scratch space; rows grow on first use.
    pub fn new() -> Self {
        Self::default()
    }

    /// Edit distance between `query` and `genome` on `strand`.
    pub fn edit_distance(&mut self, query: &[u8], genome: &[u8], strand: Strand) -> usize {
        let width = genome.len() + 1;
        self.previous.clear();
        self.previous.extend(0..width);
        self.current.clear();
        self.current.resize(width, 0);

        for i in 1..=query.len() {
            let q = match strand {
                Strand::Forward => query[i - 1],
                Strand::Reverse => query[query.len() - i],
            };
            self.current[0] = i;
            for j in 1..width {
                let g = match strand {
                    Strand::Forward => genome[j - 1],
                    Strand::Reverse => complement(genome[j - 1]),
                };
                let substitution = self.previous[j - 1] + usize::from(q != g);
                let deletion = self.previous[j] + 1;
                let insertion = self.current[j - 1] + 1;
                self.current[j] = substitution.min(deletion).min(insertion);
            }
            std::mem::swap(&mut self.previous, &mut self.current);
        }
        self.previous[width - 1]
    }

    /// Cost of the last `length` query bases against the genome window they
    /// would cover for a candidate at `start`.
    ///
    /// Windows outside the genome cost `None` (infinite).
    pub fn three_prime_cost(
        &mut self,
        query: &[u8],
        genome: &Sequence,
        start: i64,
        strand: Strand,
        length: usize,
    ) -> Option<usize> {
        let length = length.min(query.len());
        let tail = &query[query.len() - length..];
        let window_start = match strand {
            Strand::Forward => {
                if start < 0 {
                    return None;
                }
                start + (query.len() - length) as i64
            }
            Strand::Reverse => start,
        };
        let window = genome.window(window_start, length).ok()?;
        Some(self.edit_distance(tail, window, strand))
    }

    /// Cost of the whole query against the genome window of a candidate at
    /// `start`; `None` if the window leaves the genome.
    pub fn whole_cost(&mut self, query: &[u8], genome: &Sequence, start: i64, strand: Strand) -> Option<usize> {
        let window = genome.window(start, query.len()).ok()?;
        Some(self.edit_distance(query, window, strand))
    }
}
