//! Label-raster segmentation primitives
//!
//! A u32 label raster accompanies every height raster through the pipeline.
//! Between passes it carries only `LABEL_GROUND` (0) and `LABEL_NONGROUND`
//! (1); during a pass, region growing assigns per-component identifiers and
//! the containment fill uses scratch sentinels. `finish_label_image`
//! collapses everything back to the two-value form at the end of each pass.

mod boundary;
mod components;
mod fill;
mod labels;

pub use boundary::{extend_object_boundaries, label_object_boundaries};
pub use components::{group_regions, Pixel, Region};
pub use fill::fill_object_bounds;
pub use labels::{finish_label_image, FIRST_REGION_LABEL, LABEL_GROUND, LABEL_NONGROUND};
