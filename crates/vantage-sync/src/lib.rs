//! vantage-sync: Knowledge synchronizer for the Vantage graph.
//!
//! Translates what the environment adapter reports (static topology at
//! episode start, per-step observation deltas) into episode-partitioned
//! graph state, enforcing monotonic discovery/ownership along the way.

pub mod error;
pub mod screen;
pub mod synchronizer;
pub mod validate;

pub use error::{Result, SyncError};
pub use screen::{DeltaEntry, ScreenedDelta, SkippedEntity};
pub use synchronizer::{DeltaSummary, IngestSummary, Synchronizer};
