//! Workspace accounting for index construction

use super::WorkspaceProfile;

/// Tracks scratch memory used while building an index.
///
/// The suffix sorter reports every working buffer it allocates and frees,
/// one recursion level at a time, so tests can check that peak workspace
/// stays linear in the input length.
#[derive(Debug, Default)]
pub struct WorkspaceTracker {
    /// Bytes currently held
    current: usize,

    /// Maximum seen
    peak: usize,

    /// Bytes held by each open recursion level
    level_bytes: Vec<usize>,

    /// Deepest level reached
    max_depth: usize,
}

impl WorkspaceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a recursion level
    pub fn push_level(&mut self) {
        self.level_bytes.push(0);
        self.max_depth = self.max_depth.max(self.level_bytes.len());
    }

    /// Leave the current level, releasing whatever it still holds
    pub fn pop_level(&mut self) {
        if let Some(bytes) = self.level_bytes.pop() {
            self.current = self.current.saturating_sub(bytes);
        }
    }

    /// Record an allocation of `bytes` in the current level
    pub fn allocate(&mut self, bytes: usize) {
        self.current += bytes;
        if let Some(level) = self.level_bytes.last_mut() {
            *level += bytes;
        }
        self.peak = self.peak.max(self.current);
    }

    /// Record that `bytes` of the current level were released
    pub fn free(&mut self, bytes: usize) {
        self.current = self.current.saturating_sub(bytes);
        if let Some(level) = self.level_bytes.last_mut() {
            *level = level.saturating_sub(bytes);
        }
    }

    /// Bytes currently held
    pub fn current_bytes(&self) -> usize {
        self.current
    }

    /// Maximum bytes held at any point
    pub fn peak_bytes(&self) -> usize {
        self.peak
    }

    /// Snapshot of the tracked figures
    pub fn profile(&self) -> WorkspaceProfile {
        WorkspaceProfile {
            peak_bytes: self.peak,
            max_depth: self.max_depth,
        }
    }
}
