//! # Groundsift Algorithms
//!
//! Bare-earth extraction from LiDAR surface models.
//!
//! The pipeline consumes a Digital Surface Model raster (u16 height units,
//! nodata = 0) and derives a bare-earth Digital Terrain Model plus a
//! per-pixel object mask:
//!
//! - **segmentation**: gradient boundary labeling, plateau extension,
//!   height-gated region growing, topological containment fill
//! - **interpolation**: multi-resolution void filling
//! - **classification**: iterative ground extraction, non-ground cleanup,
//!   building-interior infill
//!
//! All passes run on in-memory rasters; file I/O lives in
//! `groundsift_core::io`.

pub mod classification;
pub mod interpolation;
pub mod segmentation;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{
        classify_ground, classify_non_ground, fill_inside_buildings, ClassifyGround,
        ClassifyNonGround, GroundParams, GroundResult, NonGroundParams, LAS_BUILDING, LAS_GROUND,
        LAS_HIGH_VEGETATION, LAS_UNCLASSIFIED,
    };
    pub use crate::interpolation::fill_voids_pyramid;
    pub use crate::segmentation::{
        extend_object_boundaries, fill_object_bounds, finish_label_image, group_regions,
        label_object_boundaries, Pixel, Region, FIRST_REGION_LABEL, LABEL_GROUND, LABEL_NONGROUND,
    };
    pub use groundsift_core::prelude::*;
}
