//! # Survey Tables
//!
//! Numeric CSV tables as exported by beach-survey tooling: one header row of
//! column names followed by rows of numbers. Survey files are "wide", with
//! one (x, y, distance) column triplet per transect. Wave files carry a
//! `height` column.
//!
//! Columns are stored individually because transects in the same file rarely
//! have the same number of samples. Short columns are padded with missing
//! cells, and missing cells are kept as `None` so that each column can drop
//! them independently. Text is tolerated in columns the analysis never
//! reads, such as a timestamp next to the wave heights.

use crate::{ProfileError, WaveObservation};
use std::{fs, io, path::Path};
use thiserror::Error;

/// Cell values read as "missing".
const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "NaN", "nan", "-nan", "null", "NULL", "None", "#N/A",
];

#[derive(Error, Debug)]
pub enum TableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("{source_name}: missing header row")]
    MissingHeader { source_name: String },

    #[error("{source_name}:{line} has {found} fields, header has {expected}")]
    Ragged {
        source_name: String,
        line: usize,
        found: usize,
        expected: usize,
    },
}

/// First cell of a column that is neither a number nor a missing marker.
#[derive(Clone, Debug, PartialEq)]
pub struct TextCell {
    pub line: usize,
    pub value: String,
}

/// One named column of optional numeric cells.
///
/// Text cells are read as missing, and the first one is remembered so that
/// using the column for numbers fails instead of silently losing data.
/// Columns nobody asks for (dates, comments) may hold anything.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Option<f64>>,
    pub text: Option<TextCell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
            text: None,
        }
    }

    /// The column itself, or an error if it holds text.
    fn numeric(&self) -> Result<&Self, ProfileError> {
        match &self.text {
            None => Ok(self),
            Some(cell) => Err(ProfileError::NonNumeric {
                column: self.name.clone(),
                line: cell.line,
                value: cell.value.clone(),
            }),
        }
    }

    /// Values with missing cells dropped, in source order.
    pub fn present(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }
}

/// A parsed numeric table, column-major.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProfileTable {
    columns: Vec<Column>,
}

impl ProfileTable {
    pub fn from_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Read and parse a CSV file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    /// Parse CSV text. `source_name` only appears in error messages.
    pub fn parse(content: &str, source_name: &str) -> Result<Self, TableError> {
        // Spreadsheet exports often start with a UTF-8 byte order mark
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut lines = content
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| !line.trim().is_empty());

        let (_, header) = lines.next().ok_or_else(|| TableError::MissingHeader {
            source_name: source_name.to_string(),
        })?;

        let mut columns: Vec<Column> = split_fields(header)
            .into_iter()
            .map(|name| Column::new(name, Vec::new()))
            .collect();

        for (line_no, line) in lines {
            let fields = split_fields(line);
            if fields.len() > columns.len() {
                return Err(TableError::Ragged {
                    source_name: source_name.to_string(),
                    line: line_no,
                    found: fields.len(),
                    expected: columns.len(),
                });
            }

            for (idx, column) in columns.iter_mut().enumerate() {
                let cell = match fields.get(idx) {
                    Some(raw) => parse_cell(raw).unwrap_or_else(|| {
                        column.text.get_or_insert_with(|| TextCell {
                            line: line_no,
                            value: raw.clone(),
                        });
                        None
                    }),
                    None => None,
                };
                column.values.push(cell);
            }
        }

        Ok(Self { columns })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Numeric column by 0-based position.
    pub fn column(&self, index: usize) -> Result<&Column, ProfileError> {
        self.columns
            .get(index)
            .ok_or_else(|| ProfileError::MissingColumn(format!("#{index}")))?
            .numeric()
    }

    /// First numeric column with the given header name.
    pub fn column_by_name(&self, name: &str) -> Result<&Column, ProfileError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ProfileError::MissingColumn(name.to_string()))?
            .numeric()
    }
}

/// Wave observations from the named column, missing cells dropped, source
/// order preserved.
pub fn wave_observations(
    table: &ProfileTable,
    column: &str,
) -> Result<Vec<WaveObservation>, ProfileError> {
    table
        .column_by_name(column)?
        .present()
        .map(WaveObservation::new)
        .collect()
}

/// Split one CSV record, honouring double-quoted fields.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// `Some(None)` for a missing marker, `Some(Some(v))` for a number, `None`
/// when the cell is neither.
fn parse_cell(raw: &str) -> Option<Option<f64>> {
    if MISSING_MARKERS.contains(&raw) {
        return Some(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_nan() => Some(None),
        Ok(v) => Some(Some(v)),
        Err(_) => None,
    }
}
