//! Build helper utilities.
//!
//! - [`compdb`]: trim a `compile_commands.json` down to the project's own
//!   compilation units.
//! - [`timing`] + [`render`]: turn a timing log into per-section statistics
//!   and a box-plot figure.

pub mod compdb;
pub mod logging;
pub mod render;
pub mod timing;

pub type Result<T> = anyhow::Result<T>;
