//! Parameters of the seed-and-extend search and the seed window order.

use super::ApproxSearchError;

/// Tuning knobs of the seed-and-extend search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ApproxSearchParams {
    /// Length of each exact-match seed window.
    pub word_size: usize,
    /// Distance between consecutive seed windows.
    pub step_size: usize,
    /// Number of 3'-terminal query bases aligned in the first filter.
    pub three_prime_dp_length: usize,
    /// Largest edit distance allowed over the 3' end.
    pub three_prime_dp_threshold: usize,
    /// Largest edit distance allowed over the whole query.
    pub whole_dp_threshold: usize,
    /// Stop scanning once a window keeps at most this many candidates.
    ///
    /// The count includes zero: if the 3'-most window keeps nothing, no
    /// later window is scanned, so a mismatch inside the first seed window
    /// but outside the 3' filter is only found with `None`, which scans
    /// every window.
    pub early_stop: Option<usize>,
}

impl Default for ApproxSearchParams {
    fn default() -> Self {
        Self {
            word_size: 11,
            step_size: 1,
            three_prime_dp_length: 5,
            three_prime_dp_threshold: 2,
            whole_dp_threshold: 2,
            early_stop: Some(1),
        }
    }
}

impl ApproxSearchParams {
    /// Parameters with explicit seed geometry and thresholds.
    pub fn new(
        word_size: usize,
        step_size: usize,
        three_prime_dp_length: usize,
        three_prime_dp_threshold: usize,
        whole_dp_threshold: usize,
    ) -> Result<Self, ApproxSearchError> {
        let params = Self {
            word_size,
            step_size,
            three_prime_dp_length,
            three_prime_dp_threshold,
            whole_dp_threshold,
            ..Self::default()
        };
        params.check_geometry()?;
        Ok(params)
    }

    /// Set the early-stop candidate count (`None` disables early stopping).
    pub fn with_early_stop(mut self, early_stop: Option<usize>) -> Self {
        self.early_stop = early_stop;
        self
    }

    /// Check the parameters against a query of `query_len` bases.
    pub fn validate(&self, query_len: usize) -> Result<(), ApproxSearchError> {
        self.check_geometry()?;
        if query_len < self.word_size {
            return Err(ApproxSearchError::InvalidArgument(format!(
                "query of {query_len} bases is shorter than the word size {}",
                self.word_size
            )));
        }
        if query_len < self.three_prime_dp_length {
            return Err(ApproxSearchError::InvalidArgument(format!(
                "query of {query_len} bases is shorter than the 3' DP length {}",
                self.three_prime_dp_length
            )));
        }
        Ok(())
    }

    fn check_geometry(&self) -> Result<(), ApproxSearchError> {
        for (name, value) in [
            ("word size", self.word_size),
            ("step size", self.step_size),
            ("3' DP length", self.three_prime_dp_length),
        ] {
            if value == 0 {
                return Err(ApproxSearchError::InvalidArgument(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }

    /// Start offsets of the seed windows, from the 3' end backwards.
    pub fn window_starts(&self, query_len: usize) -> impl Iterator<Item = usize> + '_ {
        let last = query_len.checked_sub(self.word_size);
        let step = self.step_size.max(1);
        last.into_iter()
            .flat_map(move |last| (0..=last).rev().step_by(step))
    }
}
