//! Child table construction (Abouelhoda, Kurtz & Ohlebusch).
//!
//! One integer per slot encodes exactly one of three links; which one is
//! decided when reading, from the neighbouring LCP values:
//!
//! - slot `k` holds `up(k + 1)` iff `lcp[k] > lcp[k + 1]`;
//! - otherwise it holds `next(k)` iff `childtab[k] > k` and
//!   `lcp[childtab[k]] == lcp[k]`;
//! - otherwise it holds `down(k)` iff `lcp[childtab[k]] > lcp[k]`;
//! - otherwise the slot is unused and holds 0.
//!
//! The table is closed by a virtual `lcp[n + 1] = 0`.

use bitvec::prelude::*;

/// Link stored in a child-table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildLink {
    /// First l-index of the largest interval ending just before slot `k + 1`.
    Up(usize),
    /// Next l-index of the same interval.
    Next(usize),
    /// First l-index of the child interval starting at the slot.
    Down(usize),
    /// Slot carries no link.
    Unused,
}

impl ChildLink {
    /// Decode slot `k` given its raw value and the relevant LCP values.
    ///
    /// `lcp_next` is `lcp[k + 1]` (0 past the end) and `lcp_target` is
    /// `lcp[raw]`.
    pub fn decode(k: usize, raw: usize, lcp_k: u32, lcp_next: u32, lcp_target: u32) -> Self {
        if lcp_k > lcp_next {
            ChildLink::Up(raw)
        } else if raw > k && lcp_target == lcp_k {
            ChildLink::Next(raw)
        } else if lcp_target > lcp_k {
            ChildLink::Down(raw)
        } else {
            ChildLink::Unused
        }
    }
}

/// Fused single-pass construction of up, down and next links.
pub fn build_child_table(lcp: &[u32]) -> Vec<u32> {
    let n = lcp.len() - 1;
    let lcp_at = |i: usize| if i <= n { lcp[i] } else { 0 };

    let mut childtab = vec![0u32; n + 1];
    let mut has_next = bitvec![0; n + 1];
    let mut stack: Vec<usize> = vec![0];
    let mut last: Option<usize> = None;

    for i in 1..=n + 1 {
        let current = lcp_at(i);
        while let Some(&top) = stack.last() {
            if current >= lcp[top] {
                break;
            }
            stack.pop();
            last = Some(top);
            if let Some(&parent) = stack.last() {
                if current <= lcp[parent] && lcp[parent] != lcp[top] && !has_next[parent] {
                    childtab[parent] = top as u32;
                }
            }
        }
        if let Some(up) = last.take() {
            childtab[i - 1] = up as u32;
        }
        if i <= n {
            if let Some(&top) = stack.last() {
                if current == lcp[top] {
                    // next wins over a previously recorded down link
                    childtab[top] = i as u32;
                    has_next.set(top, true);
                }
            }
            stack.push(i);
        }
    }
    childtab
}

/// Reference construction: an up/down pass followed by a next pass.
///
/// Must produce exactly the table of [`build_child_table`].
pub fn build_child_table_two_pass(lcp: &[u32]) -> Vec<u32> {
    let n = lcp.len() - 1;
    let lcp_at = |i: usize| if i <= n { lcp[i] } else { 0 };
    let (up, down) = up_down_links(lcp);
    let next = next_links(lcp);

    (0..=n)
        .map(|k| {
            if lcp[k] > lcp_at(k + 1) {
                up[k + 1].unwrap_or(0)
            } else {
                next[k].or(down[k]).unwrap_or(0)
            }
        })
        .collect()
}

/// `up[i]` for `i` in `0..=n + 1` and `down[i]` for `i` in `0..=n`.
fn up_down_links(lcp: &[u32]) -> (Vec<Option<u32>>, Vec<Option<u32>>) {
    let n = lcp.len() - 1;
    let lcp_at = |i: usize| if i <= n { lcp[i] } else { 0 };
    let mut up = vec![None; n + 2];
    let mut down = vec![None; n + 1];
    let mut stack: Vec<usize> = vec![0];
    let mut last: Option<usize> = None;

    for i in 1..=n + 1 {
        let current = lcp_at(i);
        while let Some(&top) = stack.last() {
            if current >= lcp[top] {
                break;
            }
            stack.pop();
            last = Some(top);
            if let Some(&parent) = stack.last() {
                if current <= lcp[parent] && lcp[parent] != lcp[top] {
                    down[parent] = Some(top as u32);
                }
            }
        }
        if let Some(index) = last.take() {
            up[i] = Some(index as u32);
        }
        if i <= n {
            stack.push(i);
        }
    }
    (up, down)
}

fn next_links(lcp: &[u32]) -> Vec<Option<u32>> {
    let n = lcp.len() - 1;
    let mut next = vec![None; n + 1];
    let mut stack: Vec<usize> = vec![0];

    for i in 1..=n {
        while let Some(&top) = stack.last() {
            if lcp[i] >= lcp[top] {
                break;
            }
            stack.pop();
        }
        if let Some(&top) = stack.last() {
            if lcp[i] == lcp[top] {
                stack.pop();
                next[top] = Some(i as u32);
            }
        }
        stack.push(i);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE_LCP: [u32; 11] = [0, 0, 2, 1, 3, 1, 2, 0, 2, 0, 1];
    const FIXTURE_CHILDTAB: [u32; 11] = [1, 7, 2, 5, 4, 6, 3, 9, 8, 10, 10];

    #[test]
    fn fused_construction_matches_fixture() {
        assert_eq!(build_child_table(&FIXTURE_LCP), FIXTURE_CHILDTAB.to_vec());
    }

    #[test]
    fn two_pass_construction_matches_fused() {
        assert_eq!(
            build_child_table_two_pass(&FIXTURE_LCP),
            build_child_table(&FIXTURE_LCP)
        );
    }

    #[test]
    fn fixture_slots_decode_to_expected_links() {
        let lcp = FIXTURE_LCP;
        let decoded: Vec<ChildLink> = FIXTURE_CHILDTAB
            .iter()
            .enumerate()
            .map(|(k, &raw)| {
                let next = lcp.get(k + 1).copied().unwrap_or(0);
                ChildLink::decode(k, raw as usize, lcp[k], next, lcp[raw as usize])
            })
            .collect();
        assert_eq!(decoded[0], ChildLink::Next(1));
        assert_eq!(decoded[1], ChildLink::Next(7));
        assert_eq!(decoded[2], ChildLink::Up(2));
        assert_eq!(decoded[3], ChildLink::Next(5));
        assert_eq!(decoded[5], ChildLink::Down(6));
        assert_eq!(decoded[10], ChildLink::Up(10));
    }

    #[test]
    fn single_base_text_has_trivial_table() {
        // "A": suftab [1, 0], lcp [0, 0]
        assert_eq!(build_child_table(&[0, 0]), vec![1, 0]);
        assert_eq!(build_child_table_two_pass(&[0, 0]), vec![1, 0]);
    }
}
