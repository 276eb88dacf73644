//! Timing log ingestion and per-column statistics.
//!
//! A timing log is a comma-separated table written by the profiler: one
//! header row naming the measured sections, then one row per sample. The
//! writer terminates every line with a separator, which shows up here as an
//! empty trailing column.

pub mod stats;
pub mod table;

pub use stats::{BoxStats, ColumnStats, ColumnSummary, TimingReport};
pub use table::{ColumnSelection, TableOptions, TimingColumn, TimingTable};
