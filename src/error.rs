//! Error types for the analysis core.
//!
//! Collaborators that touch files or pixels (`table`, `storage`, `renderer`,
//! `config`) define their own error enums next to the code that raises them.

use thiserror::Error;

/// Failures raised while planning or evaluating profile analyses.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProfileError {
    /// Survey table columns cannot be grouped into (x, y, distance) triplets
    #[error("profile table has {columns} columns, which is not a multiple of 3 (x, y, distance)")]
    Shape { columns: usize },

    /// Wave direction is (nearly) parallel to the coast
    #[error("invalid breaking index {gamma:e} for incidence angle {theta_deg:.3}°")]
    InvalidGeometry { theta_deg: f64, gamma: f64 },

    /// A column the analysis needs is not in the table
    #[error("column '{0}' not found")]
    MissingColumn(String),

    /// A column the analysis reads contains text
    #[error("column '{column}' line {line}: '{value}' is not a number")]
    NonNumeric {
        column: String,
        line: usize,
        value: String,
    },

    /// A column exists but holds no usable values
    #[error("column '{0}' has no values")]
    MissingData(String),

    /// No (distance, depth) pair survived dropping missing samples
    #[error("columns '{x_column}' and '{y_column}' have no paired distance/depth samples")]
    EmptyTransect { x_column: String, y_column: String },

    /// Wave height is not a finite, positive number
    #[error("invalid wave height {value}")]
    InvalidWaveHeight { value: f64 },
}
