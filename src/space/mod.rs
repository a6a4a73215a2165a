//! Workspace accounting
//!
//! Tracks scratch memory of the suffix sorter to verify the linear bound

mod allocator;

pub use allocator::WorkspaceTracker;

/// Summary of the workspace used by one construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkspaceProfile {
    /// Maximum bytes held at once
    pub peak_bytes: usize,

    /// Deepest recursion level reached
    pub max_depth: usize,
}

impl WorkspaceProfile {
    /// Verify the peak stays within `factor` bytes per input symbol
    pub fn satisfies_bound(&self, input_len: usize, factor: usize) -> bool {
        self.peak_bytes <= input_len.max(1) * factor
    }

    /// Generate report
    pub fn report(&self) -> String {
        format!(
            "Peak workspace: {} bytes\nRecursion depth: {}",
            self.peak_bytes, self.max_depth
        )
    }
}
