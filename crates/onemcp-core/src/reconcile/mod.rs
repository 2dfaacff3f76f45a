//! Merge engine: canonical server list and per-tool reconciliation.

pub mod engine;
pub mod merge;
pub mod report;

pub use engine::{AppState, LoadReport, Reconciler, ToolLoadFailure};
pub use merge::{MergeConflict, definition_fingerprint, merge_servers};
pub use report::{OperationReport, ToolWriteOutcome, WriteStatus};
