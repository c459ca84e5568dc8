//! Affine georeferencing for rasters

use serde::{Deserialize, Serialize};

/// Placement of a raster grid in world coordinates.
///
/// North-up, no rotation terms: a pixel's world position is the origin
/// shifted by whole-pixel strides. `pixel_height` is negative for the usual
/// top-left origin. The ground sample distance the pipeline works in is the
/// absolute pixel width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// World X of the grid's upper-left corner
    pub origin_x: f64,
    /// World Y of the grid's upper-left corner
    pub origin_y: f64,
    /// Cell width in world units
    pub pixel_width: f64,
    /// Cell height in world units, negative when Y grows downward in
    /// pixel space
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Square-pixel transform with the given ground sample distance
    pub fn north_up(origin_x: f64, origin_y: f64, gsd: f64) -> Self {
        Self::new(origin_x, origin_y, gsd, -gsd)
    }

    /// Ground sample distance: metres per pixel, assuming square cells
    pub fn gsd(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// World coordinates of a pixel's center
    pub fn pixel_to_world(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        )
    }

    /// Fractional pixel coordinates of a world point
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    /// World-space extent of a `width x height` grid as
    /// (min_x, min_y, max_x, max_y)
    pub fn bounds(&self, width: usize, height: usize) -> (f64, f64, f64, f64) {
        let far_x = self.origin_x + width as f64 * self.pixel_width;
        let far_y = self.origin_y + height as f64 * self.pixel_height;
        (
            self.origin_x.min(far_x),
            self.origin_y.min(far_y),
            self.origin_x.max(far_x),
            self.origin_y.max(far_y),
        )
    }
}

impl Default for GeoTransform {
    /// Unit grid at the origin: one metre per pixel, top-left anchored
    fn default() -> Self {
        Self::north_up(0.0, 0.0, 1.0)
    }
}
