//! Interpolation over void raster cells

mod voidfill;

pub use voidfill::fill_voids_pyramid;
