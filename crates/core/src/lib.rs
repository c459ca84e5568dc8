//! # Groundsift Core
//!
//! Shared substrate for the groundsift bare-earth pipeline: the raster
//! grid, georeferencing, error types, and native GeoTIFF I/O.
//!
//! The pipeline's conventions are baked into these types rather than
//! configured per call:
//! - height rasters are u16 with `0` as the nodata sentinel
//! - label rasters are u32; class and void masks are u8
//! - every raster of one run shares dimensions and ground sample distance
//! - neighbor access at the raster border clamps, never wraps or skips

pub mod error;
pub mod io;
pub mod raster;

pub use error::{Error, Result};
pub use raster::{GeoTransform, Raster, RasterElement};

/// Single convenient import for downstream crates
pub mod prelude {
    pub use crate::{Algorithm, Error, GeoTransform, Raster, RasterElement, Result};
}

/// Interface shared by the pipeline stages.
///
/// A stage is a pure function from input plus parameters to output; state
/// lives in the rasters it is handed, never in the stage itself.
pub trait Algorithm {
    /// What the stage consumes
    type Input;
    /// What the stage produces
    type Output;
    /// Tuning knobs, with usable defaults
    type Params: Default;
    /// Failure type surfaced before or during the run
    type Error: std::error::Error;

    /// Short display name
    fn name(&self) -> &'static str;

    /// One-line summary of what the stage does
    fn description(&self) -> &'static str;

    /// Run the stage to completion
    fn run(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;
}
