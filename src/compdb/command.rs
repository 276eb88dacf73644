use crate::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

/// A single compilation unit from `compile_commands.json`.
///
/// Only `file` (and `directory`, for relative files) is interpreted. Every
/// field is carried through verbatim and in its original key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompileCommand(pub Map<String, Value>);

impl CompileCommand {
    pub fn file(&self) -> Option<&str> {
        self.0.get("file").and_then(Value::as_str)
    }

    pub fn directory(&self) -> Option<&str> {
        self.0.get("directory").and_then(Value::as_str)
    }
}

/// Parse a compilation database from JSON text.
pub fn parse_compile_commands(text: &str) -> Result<Vec<CompileCommand>> {
    Ok(serde_json::from_str(text)?)
}

/// Read and parse a compilation database file.
pub fn read_compile_commands(path: &Path) -> Result<Vec<CompileCommand>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("read compilation database {}", path.display()))?;
    parse_compile_commands(&text)
        .with_context(|| format!("parse compilation database {}", path.display()))
}

/// Write entries as an indented JSON array, replacing `path`.
pub fn write_compile_commands(path: &Path, commands: &[CompileCommand]) -> Result<()> {
    let json = serde_json::to_string_pretty(commands)?;
    fs::write(path, json)
        .with_context(|| format!("write compilation database {}", path.display()))
}
