//! Longest-common-prefix table construction.

/// Linear-time LCP table (Kasai et al.).
///
/// `lcp[r]` is the length of the common prefix of the suffixes at ranks
/// `r - 1` and `r`; `lcp[0] = 0` and, since `suftab[0]` is the sentinel,
/// `lcp[1] = 0`. Text positions are visited in order while a single running
/// length is carried over, dropping by at most one per step.
pub fn build_lcp(text: &[u8], suftab: &[u32]) -> Vec<u32> {
    let n = text.len();
    debug_assert_eq!(suftab.len(), n + 1, "suffix array must include the sentinel");

    let mut rank = vec![0u32; n + 1];
    for (r, &pos) in suftab.iter().enumerate() {
        rank[pos as usize] = r as u32;
    }

    let mut lcp = vec![0u32; n + 1];
    let mut shared = 0usize;
    for i in 0..n {
        let r = rank[i] as usize;
        let j = suftab[r - 1] as usize;
        if j == n {
            // Predecessor is the sentinel.
            shared = 0;
            continue;
        }
        while i + shared < n && j + shared < n && text[i + shared] == text[j + shared] {
            shared += 1;
        }
        lcp[r] = shared as u32;
        shared = shared.saturating_sub(1);
    }
    lcp
}

/// Quadratic reference construction comparing adjacent suffixes directly.
pub fn naive_lcp(text: &[u8], suftab: &[u32]) -> Vec<u32> {
    let mut lcp = vec![0u32; suftab.len()];
    for r in 1..suftab.len() {
        let a = &text[(suftab[r - 1] as usize).min(text.len())..];
        let b = &text[(suftab[r] as usize).min(text.len())..];
        lcp[r] = a.iter().zip(b).take_while(|(x, y)| x == y).count() as u32;
    }
    lcp
}
