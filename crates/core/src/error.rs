//! Error types for groundsift
//!
//! Three failure kinds exist: configuration problems caught before any work
//! begins, raster-shape disagreements between pipeline inputs, and hot-loop
//! precondition failures that abort a pass. Nodata cells are data, never
//! errors.

use thiserror::Error;

/// Result alias used throughout groundsift
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A parameter was rejected before any raster was touched
    #[error("invalid parameter {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Rasters of one pipeline run must agree on dimensions
    #[error("raster shapes disagree: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Checked cell access landed outside the grid
    #[error("cell ({row}, {col}) lies outside a {rows}x{cols} raster")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    /// A flat buffer cannot be reshaped to the requested grid
    #[error("buffer of {len} cells cannot fill a {rows}x{cols} raster")]
    BufferSize {
        len: usize,
        rows: usize,
        cols: usize,
    },

    /// The region label counter ran into the scratch sentinel range
    #[error("region label counter exhausted at {0}")]
    LabelOverflow(u32),

    /// TIFF data could not be decoded or encoded
    #[error("TIFF: {0}")]
    Tiff(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
