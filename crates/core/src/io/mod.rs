//! I/O for height and class rasters

mod native;

pub use native::{read_class_tiff, read_height_tiff, write_class_tiff, write_height_tiff};
