//! Figure rendering for timing reports.

pub mod figure;
pub mod fonts;

pub use figure::{FigureConfig, render_report};
