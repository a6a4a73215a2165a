//! Utility types

mod cancel;

pub use cancel::{CancellationToken, Cancelled};
