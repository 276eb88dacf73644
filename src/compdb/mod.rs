//! Compilation database (`compile_commands.json`) filtering.
//!
//! Keeps the entries whose source file lives under the project's own source
//! directories and drops everything vendored or generated.

pub mod command;
pub mod filter;
pub mod path;
pub mod rules;

pub use command::{CompileCommand, read_compile_commands, write_compile_commands};
pub use filter::{FilterSummary, SourceMatcher, filter_commands, filter_file};
pub use path::NormalizedPath;
pub use rules::FilterRules;
