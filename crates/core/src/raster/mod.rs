//! The raster grid and its supporting types

mod element;
mod geotransform;
mod grid;
mod neighborhood;

pub use self::{
    element::RasterElement, geotransform::GeoTransform, grid::Raster,
    neighborhood::QUEEN_OFFSETS,
};
