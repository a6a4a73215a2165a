//! Seed-and-extend approximate search over one enhanced suffix array.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use super::dp::DpScratch;
use super::params::ApproxSearchParams;
use super::ApproxSearchError;
use crate::esa::{EnhancedSuffixArray, EsaError, TableStorage};
use crate::genomics::{normalize_pattern, reverse_complement, Strand};
use crate::util::CancellationToken;

/// Candidate that passed both alignment filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApproxMatch {
    /// Leftmost genomic coordinate of the aligned window.
    pub position: usize,
    /// Strand the query aligns to.
    pub strand: Strand,
    /// Edit distance of the whole query.
    pub cost: usize,
}

/// Seed-and-extend search over one index.
///
/// Owns its alignment scratch rows, so a searcher is reused across queries
/// but not shared between threads.
#[derive(Debug)]
pub struct ApproxSearcher<'a, S, T> {
    esa: &'a EnhancedSuffixArray<S, T>,
    params: ApproxSearchParams,
    scratch: DpScratch,
}

impl<'a, S: TableStorage, T: TableStorage> ApproxSearcher<'a, S, T> {
    /// Searcher over `esa` with `params`.
    pub fn new(esa: &'a EnhancedSuffixArray<S, T>, params: ApproxSearchParams) -> Self {
        Self {
            esa,
            params,
            scratch: DpScratch::new(),
        }
    }

    /// Parameters in use.
    pub fn params(&self) -> &ApproxSearchParams {
        &self.params
    }

    /// Approximate occurrences of `query` on both strands.
    pub fn search(&mut self, query: impl AsRef<[u8]>) -> Result<Vec<ApproxMatch>, ApproxSearchError> {
        self.search_with(query, &CancellationToken::new())
    }

    /// As [`search`](Self::search), polling `cancel` before every seed window.
    pub fn search_with(
        &mut self,
        query: impl AsRef<[u8]>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ApproxMatch>, ApproxSearchError> {
        let query = normalize_pattern(query.as_ref()).map_err(EsaError::from)?;
        if query.is_empty() {
            return Err(ApproxSearchError::InvalidArgument(
                "query must be non-empty".to_string(),
            ));
        }
        self.params.validate(query.len())?;

        let candidates = self.collect_candidates(&query, cancel)?;
        let esa = self.esa;
        let genome = esa.sequence();
        let mut matches = Vec::new();
        for &(position, strand) in &candidates {
            let Some(cost) = self.scratch.whole_cost(&query, genome, position as i64, strand) else {
                continue;
            };
            if cost <= self.params.whole_dp_threshold {
                matches.push(ApproxMatch {
                    position,
                    strand,
                    cost,
                });
            }
        }
        debug!(
            query_len = query.len(),
            candidates = candidates.len(),
            matches = matches.len(),
            "approximate search finished"
        );
        Ok(matches)
    }

    /// Seed windows from the 3' end, filtered by the 3' alignment cost.
    fn collect_candidates(
        &mut self,
        query: &[u8],
        cancel: &CancellationToken,
    ) -> Result<BTreeSet<(usize, Strand)>, ApproxSearchError> {
        let m = query.len() as i64;
        let word_size = self.params.word_size;
        let mut candidates = BTreeSet::new();

        let windows: Vec<usize> = self.params.window_starts(query.len()).collect();
        for (scanned, &offset) in windows.iter().enumerate() {
            cancel.checkpoint("seed window").map_err(EsaError::from)?;
            let seed = &query[offset..offset + word_size];
            let mut survivors = BTreeSet::new();

            for pos in self.esa.find_positions(seed)? {
                let start = pos as i64 - offset as i64;
                if self.passes_three_prime(query, start, Strand::Forward) {
                    survivors.insert((start as usize, Strand::Forward));
                }
            }
            for pos in self.esa.find_positions(reverse_complement(seed))? {
                let start = pos as i64 - (m - offset as i64 - word_size as i64);
                if self.passes_three_prime(query, start, Strand::Reverse) {
                    survivors.insert((start as usize, Strand::Reverse));
                }
            }

            trace!(offset, survivors = survivors.len(), "seed window scanned");
            let kept = survivors.len();
            candidates.extend(survivors);
            if self.params.early_stop.is_some_and(|limit| kept <= limit) {
                debug!(windows = scanned + 1, total = windows.len(), "early stop");
                break;
            }
        }
        Ok(candidates)
    }

    fn passes_three_prime(&mut self, query: &[u8], start: i64, strand: Strand) -> bool {
        if start < 0 {
            return false;
        }
        self.scratch
            .three_prime_cost(
                query,
                self.esa.sequence(),
                start,
                strand,
                self.params.three_prime_dp_length,
            )
            .is_some_and(|cost| cost <= self.params.three_prime_dp_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::esa::CompactEsa;
    use crate::genomics::Sequence;

    const PRIMER_SITE: &str = "TGTAATCACATGAAGAAGTACTTGG";

    fn params() -> ApproxSearchParams {
        ApproxSearchParams::new(11, 1, 5, 2, 0).unwrap()
    }

    #[test]
    fn query_matches_itself_on_forward_strand() {
        let esa = CompactEsa::build(Sequence::new(PRIMER_SITE).unwrap()).unwrap();
        let hits = ApproxSearcher::new(&esa, params()).search(PRIMER_SITE).unwrap();
        assert_eq!(
            hits,
            vec![ApproxMatch {
                position: 0,
                strand: Strand::Forward,
                cost: 0
            }]
        );
    }

    #[test]
    fn reverse_complement_matches_on_reverse_strand() {
        let esa = CompactEsa::build(Sequence::new(PRIMER_SITE).unwrap()).unwrap();
        let query = reverse_complement(PRIMER_SITE.as_bytes());
        let hits = ApproxSearcher::new(&esa, params()).search(&query).unwrap();
        assert_eq!(
            hits,
            vec![ApproxMatch {
                position: 0,
                strand: Strand::Reverse,
                cost: 0
            }]
        );
    }

    #[test]
    fn tolerates_a_mismatch_within_threshold() {
        let genome = format!("CCCCCCCCCC{PRIMER_SITE}GGGGGGGGGG");
        let esa = CompactEsa::build(Sequence::new(&genome).unwrap()).unwrap();
        let mut query = PRIMER_SITE.as_bytes().to_vec();
        query[3] = b'C';
        let loose = ApproxSearchParams::new(11, 1, 5, 2, 1).unwrap();
        let hits = ApproxSearcher::new(&esa, loose).search(&query).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!((hits[0].position, hits[0].strand, hits[0].cost), (10, Strand::Forward, 1));

        let strict = ApproxSearcher::new(&esa, params()).search(&query).unwrap();
        assert!(strict.is_empty());
    }

    #[test]
    fn empty_first_window_stops_the_default_scan() {
        let genome = format!("CCCCCCCCCC{PRIMER_SITE}GGGGGGGGGG");
        let esa = CompactEsa::build(Sequence::new(&genome).unwrap()).unwrap();
        let mut query = PRIMER_SITE.as_bytes().to_vec();
        query[16] = b'C';
        let loose = ApproxSearchParams::new(11, 1, 5, 2, 2).unwrap();

        let stopped = ApproxSearcher::new(&esa, loose).search(&query).unwrap();
        assert!(stopped.is_empty());

        let exhaustive = ApproxSearcher::new(&esa, loose.with_early_stop(None))
            .search(&query)
            .unwrap();
        assert_eq!(
            exhaustive,
            vec![ApproxMatch {
                position: 10,
                strand: Strand::Forward,
                cost: 1
            }]
        );
    }

    #[test]
    fn short_query_is_rejected() {
        let esa = CompactEsa::build(Sequence::new(PRIMER_SITE).unwrap()).unwrap();
        let err = ApproxSearcher::new(&esa, params()).search("TGTAATC").unwrap_err();
        assert!(matches!(err, ApproxSearchError::InvalidArgument(_)));
    }

    #[test]
    fn cancellation_stops_the_scan() {
        let esa = CompactEsa::build(Sequence::new(PRIMER_SITE).unwrap()).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = ApproxSearcher::new(&esa, params())
            .search_with(PRIMER_SITE, &token)
            .unwrap_err();
        assert!(matches!(err, ApproxSearchError::Index(EsaError::Cancelled(_))));
    }
}
