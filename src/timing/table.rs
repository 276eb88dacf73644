use crate::Result;
use anyhow::{Context, anyhow, bail};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Cells read as missing values.
const MISSING_TOKENS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// Which header columns carry timing series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    /// Drop the last column (the separator-terminated lines leave it empty).
    pub drop_trailing: bool,
    /// Further columns to drop, by zero-based position after the trailing drop.
    pub drop_positions: Vec<usize>,
}

impl Default for ColumnSelection {
    fn default() -> Self {
        Self {
            drop_trailing: true,
            drop_positions: Vec::new(),
        }
    }
}

impl ColumnSelection {
    /// Indices (into the header) of the columns to keep.
    pub fn retained(&self, width: usize) -> Result<Vec<usize>> {
        let mut columns: Vec<usize> = (0..width).collect();
        if self.drop_trailing {
            columns.pop();
        }

        let mut dropped = BTreeSet::new();
        for &pos in &self.drop_positions {
            if pos >= columns.len() {
                bail!(
                    "cannot drop column {}: only {} data columns",
                    pos,
                    columns.len()
                );
            }
            dropped.insert(pos);
        }

        Ok(columns
            .into_iter()
            .enumerate()
            .filter(|(pos, _)| !dropped.contains(pos))
            .map(|(_, idx)| idx)
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct TableOptions {
    pub delimiter: u8,
    pub selection: ColumnSelection,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            selection: ColumnSelection::default(),
        }
    }
}

/// One named timing series.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingColumn {
    pub name: String,
    pub values: Vec<f64>,
}

/// Retained columns over complete rows only: all columns have equal length.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingTable {
    pub columns: Vec<TimingColumn>,
    /// Rows dropped because a retained cell was missing.
    pub dropped_rows: usize,
}

impl TimingTable {
    pub fn from_path(path: &Path, options: &TableOptions) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("open timing log {}", path.display()))?;
        Self::from_reader(file, options)
            .with_context(|| format!("parse timing log {}", path.display()))
    }

    /// Parse a header-labelled table, apply the column selection and drop
    /// every row with a missing value in any retained column.
    pub fn from_reader<R: Read>(reader: R, options: &TableOptions) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            bail!("timing log has no header row");
        }

        let keep = options.selection.retained(headers.len())?;
        if keep.is_empty() {
            bail!(
                "no data columns left after column selection ({} in header)",
                headers.len()
            );
        }

        let mut columns: Vec<TimingColumn> = keep
            .iter()
            .map(|&idx| TimingColumn {
                name: headers[idx].clone(),
                values: Vec::new(),
            })
            .collect();
        let mut dropped_rows = 0usize;
        let mut row = Vec::with_capacity(keep.len());

        for record in rdr.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.len() > headers.len() {
                bail!(
                    "line {}: expected at most {} fields, found {}",
                    line,
                    headers.len(),
                    record.len()
                );
            }

            row.clear();
            let mut complete = true;
            for &idx in &keep {
                let cell = record.get(idx).unwrap_or("");
                match parse_cell(cell)
                    .with_context(|| format!("line {}, column {:?}", line, headers[idx]))?
                {
                    Some(v) => row.push(v),
                    None => complete = false,
                }
            }

            if complete {
                for (col, &v) in columns.iter_mut().zip(&row) {
                    col.values.push(v);
                }
            } else {
                dropped_rows += 1;
            }
        }

        if dropped_rows > 0 {
            debug!(dropped_rows, "dropped rows with missing values");
        }

        Ok(Self {
            columns,
            dropped_rows,
        })
    }

    /// Number of complete rows.
    pub fn rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }
}

fn parse_cell(cell: &str) -> Result<Option<f64>> {
    if MISSING_TOKENS.contains(&cell) {
        return Ok(None);
    }
    let v: f64 = cell
        .parse()
        .map_err(|_| anyhow!("not a number: {:?}", cell))?;
    if v.is_nan() {
        return Ok(None);
    }
    if v.is_infinite() {
        bail!("not a finite number: {:?}", cell);
    }
    Ok(Some(v))
}
