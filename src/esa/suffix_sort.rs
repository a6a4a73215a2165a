//! Linear-time suffix sorting by induced bucket sorting.
//!
//! Every position is classified as S-type (its suffix is smaller than the
//! next one) or L-type. The leftmost positions of S-runs (S*) or of L-runs
//! (L*), depending on which type has fewer positions, are sorted as
//! substrings by two induced passes, named, and the renamed string is
//! sorted recursively until all names are unique. The full order is then
//! induced from the sorted reduced suffixes. Each level works on at most
//! half the symbols of the previous one, so the total work is linear.
//!
//! The text carries an implicit sentinel at position `n`, smaller than every
//! symbol; the returned array has `n + 1` entries and starts with `n`.

use bitvec::prelude::*;
use tracing::trace;

use crate::genomics::{Sequence, ALPHABET_SIZE};
use crate::space::{WorkspaceProfile, WorkspaceTracker};

/// Marker for unfilled suffix-array slots.
const EMPTY: u32 = u32::MAX;

/// Inputs up to this length are sorted by direct comparison.
const BASE_CASE_LEN: usize = 3;

/// Suffix sorter over validated nucleotide sequences.
#[derive(Debug, Default)]
pub struct SuffixSorter {
    tracker: WorkspaceTracker,
}

impl SuffixSorter {
    /// Create a sorter with a fresh workspace tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suffix array (`n + 1` entries, sentinel first) of `sequence`.
    pub fn sort(&mut self, sequence: &Sequence) -> Vec<u32> {
        let ranks = sequence.ranks();
        self.tracker.allocate(bytes_of::<u32>(ranks.len()));
        let suftab = sort_suffixes(&ranks, ALPHABET_SIZE, &mut self.tracker);
        self.tracker.free(bytes_of::<u32>(ranks.len()));
        suftab
    }

    /// Workspace used by the sorts performed so far.
    pub fn profile(&self) -> WorkspaceProfile {
        self.tracker.profile()
    }
}

/// Sort the suffixes of `text`, whose symbols lie in `0..alphabet_size`.
///
/// Returns `text.len() + 1` suffix start positions in lexicographic order,
/// the sentinel suffix (`text.len()`) first.
pub fn sort_suffixes(text: &[u32], alphabet_size: usize, tracker: &mut WorkspaceTracker) -> Vec<u32> {
    tracker.push_level();
    let suftab = sort_level(text, alphabet_size, tracker);
    tracker.pop_level();
    suftab
}

/// Which run heads make up the reduced problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reduction {
    /// Leftmost S-type positions (S*).
    LeftmostS,
    /// Leftmost L-type positions (L*).
    LeftmostL,
}

impl Reduction {
    /// Ko-Aluru criterion: reduce over the type with fewer positions.
    fn choose(types: &BitSlice) -> Self {
        let n = types.len() - 1;
        let s_count = types[..n].count_ones();
        if n - s_count < s_count {
            Reduction::LeftmostL
        } else {
            Reduction::LeftmostS
        }
    }

    /// Whether real position `i` heads a run of the reduced type.
    #[inline]
    fn is_head(self, types: &BitSlice, i: usize) -> bool {
        if i == 0 || i + 1 >= types.len() {
            return false;
        }
        match self {
            Reduction::LeftmostS => types[i] && !types[i - 1],
            Reduction::LeftmostL => !types[i] && types[i - 1],
        }
    }
}

/// Bucket boundaries per symbol; slot 0 belongs to the sentinel.
#[derive(Debug)]
struct Buckets {
    heads: Vec<u32>,
    tails: Vec<u32>,
}

impl Buckets {
    fn new(text: &[u32], alphabet_size: usize) -> Self {
        let mut counts = vec![0u32; alphabet_size];
        for &symbol in text {
            counts[symbol as usize] += 1;
        }
        let mut heads = Vec::with_capacity(alphabet_size);
        let mut tails = Vec::with_capacity(alphabet_size);
        let mut offset = 1u32;
        for count in counts {
            heads.push(offset);
            offset += count;
            tails.push(offset);
        }
        Self { heads, tails }
    }

    fn workspace_bytes(&self) -> usize {
        bytes_of::<u32>(self.heads.len() + self.tails.len())
    }
}

fn sort_level(text: &[u32], alphabet_size: usize, tracker: &mut WorkspaceTracker) -> Vec<u32> {
    let n = text.len();
    if n <= BASE_CASE_LEN {
        return sort_directly(text);
    }

    let types = classify(text);
    let types_bytes = (n + 1).div_ceil(8);
    tracker.allocate(types_bytes);
    let buckets = Buckets::new(text, alphabet_size);
    tracker.allocate(buckets.workspace_bytes());
    let reduction = Reduction::choose(&types);

    let heads: Vec<u32> = (1..n)
        .filter(|&i| reduction.is_head(&types, i))
        .map(|i| i as u32)
        .collect();
    tracker.allocate(bytes_of::<u32>(heads.len()));
    trace!(len = n, heads = heads.len(), ?reduction, "sorting reduced substrings");

    // Pass 1: order run heads by their reduced substrings.
    let mut suftab = vec![EMPTY; n + 1];
    tracker.allocate(bytes_of::<u32>(n + 1));
    place_heads(text, &mut suftab, &buckets, reduction, &heads);
    induce(text, &types, &mut suftab, &buckets, reduction);

    let (names, name_count) = name_substrings(text, &types, reduction, &suftab);
    tracker.allocate(bytes_of::<u32>(names.len()));
    drop(suftab);
    tracker.free(bytes_of::<u32>(n + 1));

    let reduced: Vec<u32> = heads.iter().map(|&p| names[p as usize / 2]).collect();
    drop(names);
    tracker.free(bytes_of::<u32>(n / 2 + 1));
    tracker.allocate(bytes_of::<u32>(reduced.len()));

    // Pass 2: sort the reduced string, recursing while names repeat.
    let reduced_order: Vec<u32> = if name_count as usize == reduced.len() {
        let mut order = vec![0u32; reduced.len()];
        for (idx, &name) in reduced.iter().enumerate() {
            order[name as usize] = idx as u32;
        }
        order
    } else {
        let mut order = sort_suffixes(&reduced, name_count as usize, tracker);
        order.remove(0);
        order
    };
    tracker.free(bytes_of::<u32>(reduced.len()));
    drop(reduced);

    let sorted_heads: Vec<u32> = reduced_order.iter().map(|&r| heads[r as usize]).collect();
    drop(reduced_order);

    // Pass 3: induce every suffix from the sorted run heads.
    let mut suftab = vec![EMPTY; n + 1];
    tracker.allocate(bytes_of::<u32>(n + 1));
    place_heads(text, &mut suftab, &buckets, reduction, &sorted_heads);
    induce(text, &types, &mut suftab, &buckets, reduction);
    suftab
}

/// S/L classification with the sentinel (index `n`) as S-type.
fn classify(text: &[u32]) -> BitVec {
    let n = text.len();
    let mut types = bitvec![0; n + 1];
    types.set(n, true);
    for i in (0..n.saturating_sub(1)).rev() {
        let s_type = text[i] < text[i + 1] || (text[i] == text[i + 1] && types[i + 1]);
        types.set(i, s_type);
    }
    types
}

/// Seed `suftab` with run heads, preserving their given relative order.
///
/// S* heads go to bucket tails, L* heads to bucket heads.
fn place_heads(text: &[u32], suftab: &mut [u32], buckets: &Buckets, reduction: Reduction, heads: &[u32]) {
    suftab[0] = text.len() as u32;
    match reduction {
        Reduction::LeftmostS => {
            let mut tails = buckets.tails.clone();
            for &p in heads.iter().rev() {
                let symbol = text[p as usize] as usize;
                tails[symbol] -= 1;
                suftab[tails[symbol] as usize] = p;
            }
        }
        Reduction::LeftmostL => {
            let mut starts = buckets.heads.clone();
            for &p in heads {
                let symbol = text[p as usize] as usize;
                suftab[starts[symbol] as usize] = p;
                starts[symbol] += 1;
            }
        }
    }
}

fn induce(text: &[u32], types: &BitSlice, suftab: &mut [u32], buckets: &Buckets, reduction: Reduction) {
    match reduction {
        Reduction::LeftmostS => {
            induce_l(text, types, suftab, buckets);
            induce_s(text, types, suftab, buckets);
        }
        Reduction::LeftmostL => {
            induce_s(text, types, suftab, buckets);
            induce_l(text, types, suftab, buckets);
        }
    }
}

/// Left-to-right scan placing each L-type predecessor at its bucket head.
fn induce_l(text: &[u32], types: &BitSlice, suftab: &mut [u32], buckets: &Buckets) {
    let mut heads = buckets.heads.clone();
    for i in 0..suftab.len() {
        let j = suftab[i];
        if j == EMPTY || j == 0 {
            continue;
        }
        let prev = j as usize - 1;
        if !types[prev] {
            let symbol = text[prev] as usize;
            suftab[heads[symbol] as usize] = prev as u32;
            heads[symbol] += 1;
        }
    }
}

/// Right-to-left scan placing each S-type predecessor at its bucket tail.
fn induce_s(text: &[u32], types: &BitSlice, suftab: &mut [u32], buckets: &Buckets) {
    let mut tails = buckets.tails.clone();
    for i in (0..suftab.len()).rev() {
        let j = suftab[i];
        if j == EMPTY || j == 0 {
            continue;
        }
        let prev = j as usize - 1;
        if types[prev] {
            let symbol = text[prev] as usize;
            tails[symbol] -= 1;
            suftab[tails[symbol] as usize] = prev as u32;
        }
    }
}

/// Name run-head substrings in sorted order.
///
/// Heads are never adjacent, so names are stored at `position / 2`.
/// Returns the name table and the number of distinct names.
fn name_substrings(text: &[u32], types: &BitSlice, reduction: Reduction, suftab: &[u32]) -> (Vec<u32>, u32) {
    let n = text.len();
    let mut names = vec![EMPTY; n / 2 + 1];
    let mut name_count = 0u32;
    let mut previous: Option<usize> = None;

    for &entry in suftab {
        if entry == EMPTY || !reduction.is_head(types, entry as usize) {
            continue;
        }
        let p = entry as usize;
        let is_new = match previous {
            None => true,
            Some(q) => substrings_differ(text, types, reduction, p, q),
        };
        if is_new {
            name_count += 1;
        }
        names[p / 2] = name_count - 1;
        previous = Some(p);
    }

    (names, name_count)
}

/// Compare the reduced substrings starting at `a` and `b` (symbols and types).
fn substrings_differ(text: &[u32], types: &BitSlice, reduction: Reduction, a: usize, b: usize) -> bool {
    let n = text.len();
    let mut d = 0;
    loop {
        let (x, y) = (a + d, b + d);
        // The sentinel is unique, so a substring reaching it matches nothing else.
        if x == n || y == n {
            return true;
        }
        if text[x] != text[y] || types[x] != types[y] {
            return true;
        }
        if d > 0 {
            let (x_end, y_end) = (reduction.is_head(types, x), reduction.is_head(types, y));
            if x_end || y_end {
                return !(x_end && y_end);
            }
        }
        d += 1;
    }
}

fn sort_directly(text: &[u32]) -> Vec<u32> {
    let mut suftab: Vec<u32> = (0..=text.len() as u32).collect();
    suftab.sort_by(|&a, &b| text[a as usize..].cmp(&text[b as usize..]));
    suftab
}

#[inline]
fn bytes_of<T>(count: usize) -> usize {
    count * std::mem::size_of::<T>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive(text: &[u32]) -> Vec<u32> {
        sort_directly(text)
    }

    fn sorted_with(text: &[u32], alphabet_size: usize) -> Vec<u32> {
        let mut tracker = WorkspaceTracker::new();
        sort_suffixes(text, alphabet_size, &mut tracker)
    }

    #[test]
    fn sorts_reference_fixture() {
        let seq = Sequence::new(b"acaaacatat").unwrap();
        let mut sorter = SuffixSorter::new();
        assert_eq!(sorter.sort(&seq), vec![10, 2, 3, 0, 4, 8, 6, 1, 5, 9, 7]);
    }

    #[test]
    fn base_case_handles_short_inputs() {
        assert_eq!(sorted_with(&[0], 1), vec![1, 0]);
        assert_eq!(sorted_with(&[1, 0], 2), vec![2, 1, 0]);
        assert_eq!(sorted_with(&[0, 0, 0], 1), vec![3, 2, 1, 0]);
    }

    #[test]
    fn unary_text_recurses_to_completion() {
        let text = vec![0u32; 64];
        let expected: Vec<u32> = (0..=64).rev().collect();
        assert_eq!(sorted_with(&text, 1), expected);
    }

    #[test]
    fn both_reductions_agree_with_naive_sort() {
        // The second and third texts have fewer L-type positions.
        let cases: [&[u32]; 4] = [
            &[2, 2, 0, 0, 3, 3, 0, 0, 3, 3, 0, 0, 1, 1, 0, 0],
            &[0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 2],
            &[3, 1, 2, 0, 3, 1, 2, 0, 3, 1],
            &[1, 0, 2, 0, 1, 0, 2, 0, 1, 0, 2, 0, 1],
        ];
        for text in cases {
            assert_eq!(sorted_with(text, 4), naive(text), "text {:?}", text);
        }
    }

    #[test]
    fn reduction_choice_picks_the_smaller_set() {
        let types = classify(&[0, 1, 0, 1, 0, 1, 0]);
        assert_eq!(Reduction::choose(&types), Reduction::LeftmostS);
        let types = classify(&[0, 0, 1, 1, 2, 2, 3, 0]);
        assert_eq!(Reduction::choose(&types), Reduction::LeftmostL);
    }

    #[test]
    fn workspace_is_released_between_levels() {
        let seq = Sequence::new(b"ACGTACGTTGCAACGTNNACGTACGTACGGT".repeat(20)).unwrap();
        let mut sorter = SuffixSorter::new();
        let suftab = sorter.sort(&seq);
        assert_eq!(suftab.len(), seq.len() + 1);

        let profile = sorter.profile();
        assert!(profile.max_depth >= 1);
        assert!(profile.satisfies_bound(seq.len(), 32), "{}", profile.report());
    }
}
