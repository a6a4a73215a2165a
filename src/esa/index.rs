//! The enhanced suffix array and its exact-match queries.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use super::buckets::{BucketLookup, PrefixBuckets};
use super::child_table::{build_child_table, ChildLink};
use super::config::BuildConfig;
use super::interval::Interval;
use super::lcp::build_lcp;
use super::persist;
use super::storage::compact::CompactTable;
use super::storage::mapped::MappedTable;
use super::storage::{BuildTable, IntTable, TableKind, TableStorage};
use super::suffix_sort::SuffixSorter;
use super::EsaError;
use crate::genomics::{normalize_pattern, Sequence};
use crate::util::CancellationToken;

/// Index with every table held as plain `u32` vectors.
pub type InMemoryEsa = EnhancedSuffixArray<IntTable, IntTable>;

/// Index with byte-encoded LCP and child tables (the default layout).
pub type CompactEsa = EnhancedSuffixArray<IntTable, CompactTable>;

/// Index reading all three tables from memory-mapped files.
pub type MappedEsa = EnhancedSuffixArray<MappedTable, MappedTable>;

/// Suffix array, LCP table and child table over one sequence.
///
/// `S` stores the suffix array and `T` the LCP and child tables; the
/// navigation and search code is the same for every backend.
#[derive(Debug)]
pub struct EnhancedSuffixArray<S = IntTable, T = CompactTable> {
    sequence: Sequence,
    suftab: S,
    lcptab: T,
    childtab: T,
    buckets: Option<PrefixBuckets>,
}

impl<S: BuildTable, T: BuildTable> EnhancedSuffixArray<S, T> {
    /// Build with default options.
    pub fn build(sequence: Sequence) -> Result<Self, EsaError> {
        Self::build_with(sequence, &BuildConfig::default(), &CancellationToken::new())
    }

    /// Build with explicit options, polling `cancel` between phases.
    ///
    /// A cancelled build returns [`EsaError::Cancelled`] and nothing else.
    pub fn build_with(
        sequence: Sequence,
        config: &BuildConfig,
        cancel: &CancellationToken,
    ) -> Result<Self, EsaError> {
        let started = Instant::now();
        let text = sequence.as_bytes();

        cancel.checkpoint("suffix sorting")?;
        let mut sorter = SuffixSorter::new();
        let suftab = sorter.sort(&sequence);
        debug!(
            len = text.len(),
            peak_workspace_bytes = sorter.profile().peak_bytes,
            "suffix array built"
        );

        cancel.checkpoint("lcp construction")?;
        let lcp = build_lcp(text, &suftab);
        debug!(max_lcp = lcp.iter().max().copied().unwrap_or(0), "lcp table built");

        cancel.checkpoint("child table construction")?;
        let childtab = build_child_table(&lcp);

        let buckets = match config.bucket_depth {
            0 => None,
            depth => Some(PrefixBuckets::build(text, &suftab, depth)?),
        };

        cancel.checkpoint("table storage")?;
        let suftab = S::from_values(TableKind::Suffix, suftab, config)?;
        let lcptab = T::from_values(TableKind::Lcp, lcp, config)?;
        let childtab = T::from_values(TableKind::Child, childtab, config)?;
        S::store_manifest(&sequence, buckets.as_ref(), config)?;

        info!(
            len = sequence.len(),
            bucket_depth = config.bucket_depth,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "enhanced suffix array built"
        );
        Self::from_parts(sequence, suftab, lcptab, childtab, buckets)
    }
}

impl MappedEsa {
    /// Reopen an index built with [`MappedEsa::build_with`] from its
    /// mapped directory.
    pub fn open(dir: &Path) -> Result<Self, EsaError> {
        let (sequence, buckets) = persist::read_manifest(dir)?;
        let suftab = MappedTable::open(dir, TableKind::Suffix)?;
        let lcptab = MappedTable::open(dir, TableKind::Lcp)?;
        let childtab = MappedTable::open(dir, TableKind::Child)?;
        let esa = Self::from_parts(sequence, suftab, lcptab, childtab, buckets)?;
        info!(dir = %dir.display(), len = esa.len(), "mapped index opened");
        Ok(esa)
    }
}

impl<S: TableStorage, T: TableStorage> EnhancedSuffixArray<S, T> {
    /// Assemble an index from tables built elsewhere.
    pub fn from_parts(
        sequence: Sequence,
        suftab: S,
        lcptab: T,
        childtab: T,
        buckets: Option<PrefixBuckets>,
    ) -> Result<Self, EsaError> {
        let expected = sequence.len() + 1;
        for (kind, len) in [
            (TableKind::Suffix, suftab.len()),
            (TableKind::Lcp, lcptab.len()),
            (TableKind::Child, childtab.len()),
        ] {
            if len != expected {
                return Err(EsaError::Format(format!(
                    "{kind} has {len} slots, expected {expected}"
                )));
            }
        }
        Ok(Self {
            sequence,
            suftab,
            lcptab,
            childtab,
            buckets,
        })
    }

    /// Indexed sequence.
    pub fn sequence(&self) -> &Sequence {
        &self.sequence
    }

    /// Length of the indexed sequence (without the sentinel).
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Always `false`; empty sequences cannot be indexed.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Suffix-array storage.
    pub fn suftab(&self) -> &S {
        &self.suftab
    }

    /// LCP-table storage.
    pub fn lcptab(&self) -> &T {
        &self.lcptab
    }

    /// Child-table storage.
    pub fn childtab(&self) -> &T {
        &self.childtab
    }

    /// Prefix bucket table, if one was built.
    pub fn buckets(&self) -> Option<&PrefixBuckets> {
        self.buckets.as_ref()
    }

    /// Interval of all suffixes, `[0, n]`.
    pub fn root(&self) -> Interval {
        Interval::new(0, self.len())
    }

    /// Start position of the suffix at `rank`.
    pub fn suffix_at(&self, rank: usize) -> Result<usize, EsaError> {
        self.suftab.get(rank)
    }

    /// `lcp[i]`, with the virtual closing entry `lcp[n + 1] = 0`.
    pub fn lcp_at(&self, index: usize) -> Result<usize, EsaError> {
        if index > self.len() {
            Ok(0)
        } else {
            self.lcptab.get(index)
        }
    }

    /// Decoded child-table link at `slot`.
    pub fn link_at(&self, slot: usize) -> Result<ChildLink, EsaError> {
        let raw = self.childtab.get(slot)?;
        let lcp_slot = self.lcp_at(slot)?;
        let lcp_next = self.lcp_at(slot + 1)?;
        let lcp_target = self.lcp_at(raw)?;
        Ok(ChildLink::decode(
            slot,
            raw,
            lcp_slot as u32,
            lcp_next as u32,
            lcp_target as u32,
        ))
    }

    fn next_l_index(&self, index: usize) -> Result<Option<usize>, EsaError> {
        Ok(match self.link_at(index)? {
            ChildLink::Next(next) => Some(next),
            _ => None,
        })
    }

    /// First l-index of the non-singleton interval `[i, j]`.
    fn first_l_index(&self, interval: Interval) -> Result<usize, EsaError> {
        let Interval { lb, ub } = interval;
        let first = if interval == self.root() {
            self.next_l_index(0)?
        } else {
            let up = if ub < self.len() {
                match self.link_at(ub)? {
                    ChildLink::Up(up) if lb < up && up <= ub => Some(up),
                    _ => None,
                }
            } else {
                None
            };
            match up {
                Some(up) => Some(up),
                None => match self.link_at(lb)? {
                    ChildLink::Down(down) => Some(down),
                    _ => None,
                },
            }
        };
        first
            .filter(|&index| lb < index && index <= ub)
            .ok_or_else(|| EsaError::corrupt(TableKind::Child, lb))
    }

    /// Length of the longest prefix shared by all suffixes of `interval`.
    ///
    /// For a singleton this is the length of its suffix.
    pub fn interval_lcp(&self, interval: Interval) -> Result<usize, EsaError> {
        if interval.is_singleton() {
            return Ok(self.len() - self.suffix_at(interval.lb)?);
        }
        if interval == self.root() {
            return Ok(0);
        }
        self.lcp_at(self.first_l_index(interval)?)
    }

    /// Child intervals of `interval` in rank order; empty for a singleton.
    pub fn child_intervals(&self, interval: Interval) -> Result<Vec<Interval>, EsaError> {
        let mut children = Vec::new();
        if interval.is_singleton() {
            return Ok(children);
        }
        let mut current = self.first_l_index(interval)?;
        children.push(Interval::new(interval.lb, current - 1));
        while let Some(next) = self.next_l_index(current)? {
            if next > interval.ub {
                break;
            }
            children.push(Interval::new(current, next - 1));
            current = next;
        }
        children.push(Interval::new(current, interval.ub));
        Ok(children)
    }

    /// Child of `interval` whose edge starts with `symbol`, if any.
    pub fn child_interval(&self, interval: Interval, symbol: u8) -> Result<Option<Interval>, EsaError> {
        if interval.is_singleton() {
            return Ok(None);
        }
        let depth = self.interval_lcp(interval)?;
        self.child_with_symbol(interval, depth, symbol)
    }

    fn child_with_symbol(
        &self,
        interval: Interval,
        depth: usize,
        symbol: u8,
    ) -> Result<Option<Interval>, EsaError> {
        let text = self.sequence.as_bytes();
        for child in self.child_intervals(interval)? {
            let pos = self.suffix_at(child.lb)? + depth;
            if text.get(pos) == Some(&symbol) {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    /// Interval of the suffixes starting with `pattern`, if any.
    ///
    /// The pattern is normalised like a sequence; an empty pattern is an
    /// error and a pattern longer than the sequence simply has no match.
    pub fn find_interval(&self, pattern: impl AsRef<[u8]>) -> Result<Option<Interval>, EsaError> {
        let pattern = normalize_pattern(pattern.as_ref())?;
        if pattern.is_empty() {
            return Err(EsaError::EmptyPattern);
        }
        if pattern.len() > self.len() {
            return Ok(None);
        }
        self.descend(&pattern)
    }

    fn descend(&self, pattern: &[u8]) -> Result<Option<Interval>, EsaError> {
        let text = self.sequence.as_bytes();
        let m = pattern.len();
        let start = match self.buckets.as_ref().map(|buckets| buckets.lookup(pattern)) {
            Some(BucketLookup::Empty) => return Ok(None),
            Some(BucketLookup::Range(interval)) => Some((interval, self.buckets_depth())),
            Some(BucketLookup::NotApplicable) | None => None,
        };
        let (mut interval, mut matched) = start.unwrap_or((self.root(), 0));

        while matched < m {
            let pos = self.suffix_at(interval.lb)?;
            if interval.is_singleton() {
                let rest = text.get(pos + matched..pos + m);
                return Ok(rest.filter(|rest| *rest == &pattern[matched..]).map(|_| interval));
            }
            let end = self.interval_lcp(interval)?.min(m);
            match text.get(pos + matched..pos + end) {
                Some(shared) if shared == &pattern[matched..end] => {}
                _ => return Ok(None),
            }
            matched = end;
            if matched == m {
                break;
            }
            match self.child_with_symbol(interval, matched, pattern[matched])? {
                Some(child) => interval = child,
                None => return Ok(None),
            }
        }
        Ok(Some(interval))
    }

    fn buckets_depth(&self) -> usize {
        self.buckets.as_ref().map_or(0, PrefixBuckets::depth)
    }

    /// Start positions of every occurrence of `pattern`, ascending.
    pub fn find_positions(&self, pattern: impl AsRef<[u8]>) -> Result<BTreeSet<usize>, EsaError> {
        match self.find_interval(pattern)? {
            Some(interval) => self.positions_in(interval),
            None => Ok(BTreeSet::new()),
        }
    }

    /// Number of occurrences of `pattern`.
    pub fn match_count(&self, pattern: impl AsRef<[u8]>) -> Result<usize, EsaError> {
        Ok(self.find_interval(pattern)?.map_or(0, |interval| interval.len()))
    }

    /// Suffix start positions of the ranks in `interval`.
    pub fn positions_in(&self, interval: Interval) -> Result<BTreeSet<usize>, EsaError> {
        interval.ranks().map(|rank| self.suffix_at(rank)).collect()
    }
}
