//! Building-interior infill on class rasters
//!
//! Courtyard-shaped or rooftop-enclosed vegetation is almost always misread
//! canopy over structure. Any connected vegetation region whose entire
//! outside neighborhood is building becomes building.

use groundsift_core::Raster;

use crate::segmentation::Pixel;

// ASPRS LAS point classes. Only the relative identities matter here.

/// Unclassified / created, never classified
pub const LAS_UNCLASSIFIED: u8 = 1;
/// Ground
pub const LAS_GROUND: u8 = 2;
/// High vegetation
pub const LAS_HIGH_VEGETATION: u8 = 5;
/// Building
pub const LAS_BUILDING: u8 = 6;

/// Reclassify vegetation regions fully enclosed by building pixels.
///
/// Walks every 8-connected component of `LAS_HIGH_VEGETATION` pixels using a
/// parallel visited mask (the class raster itself is never used as scratch).
/// If every neighbor outside the component is building, the whole component
/// is relabeled to `LAS_BUILDING`. Idempotent.
pub fn fill_inside_buildings(classes: &mut Raster<u8>) {
    let (rows, cols) = classes.shape();
    if rows == 0 || cols == 0 {
        return;
    }
    let mut visited: Raster<u8> = classes.with_same_meta(rows, cols);

    for row in 0..rows {
        for col in 0..cols {
            let seed = unsafe { visited.get_unchecked(row, col) } == 0
                && unsafe { classes.get_unchecked(row, col) } == LAS_HIGH_VEGETATION;
            if !seed {
                continue;
            }

            let component = collect_component(classes, &mut visited, row, col);

            // The component is enclosed when every unvisited neighbor is
            // building.
            let mut inside = true;
            for pixel in &component {
                for nr in pixel.row.saturating_sub(1)..=(pixel.row + 1).min(rows - 1) {
                    for nc in pixel.col.saturating_sub(1)..=(pixel.col + 1).min(cols - 1) {
                        if unsafe { visited.get_unchecked(nr, nc) } == 0
                            && unsafe { classes.get_unchecked(nr, nc) } != LAS_BUILDING
                        {
                            inside = false;
                        }
                    }
                }
            }

            if inside {
                for pixel in &component {
                    unsafe { classes.set_unchecked(pixel.row, pixel.col, LAS_BUILDING) };
                }
            }
        }
    }
}

/// Gather the connected component of same-class pixels around a seed.
///
/// The frontier is appended to in place while it is being walked, so the
/// finished vector is the full component.
fn collect_component(
    classes: &Raster<u8>,
    visited: &mut Raster<u8>,
    row: usize,
    col: usize,
) -> Vec<Pixel> {
    let (rows, cols) = classes.shape();
    let class = unsafe { classes.get_unchecked(row, col) };

    let mut component = vec![Pixel { row, col }];
    unsafe { visited.set_unchecked(row, col, 1) };

    let mut index = 0;
    while index < component.len() {
        let pixel = component[index];
        index += 1;

        for nr in pixel.row.saturating_sub(1)..=(pixel.row + 1).min(rows - 1) {
            for nc in pixel.col.saturating_sub(1)..=(pixel.col + 1).min(cols - 1) {
                if unsafe { visited.get_unchecked(nr, nc) } == 1 {
                    continue;
                }
                if unsafe { classes.get_unchecked(nr, nc) } != class {
                    continue;
                }
                unsafe { visited.set_unchecked(nr, nc, 1) };
                component.push(Pixel { row: nr, col: nc });
            }
        }
    }

    component
}
