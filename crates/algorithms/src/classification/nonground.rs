//! Non-ground cleanup
//!
//! The ground pass is deliberately greedy: everything it voided is a
//! non-ground candidate. This pass whittles the candidate mask down to
//! credible objects by culling low AGL pixels, regions whose boundary
//! gradient looks like terrain, narrow features, and small footprints.

use groundsift_core::raster::QUEEN_OFFSETS;
use groundsift_core::{Algorithm, Error, Raster, Result};

use crate::segmentation::{finish_label_image, group_regions, Region, LABEL_GROUND};

/// Parameters for non-ground cleanup
#[derive(Debug, Clone)]
pub struct NonGroundParams {
    /// Minimum height step to call an object edge, in height units
    pub dz: u16,
    /// Minimum height above terrain for a pixel to stay non-ground, in
    /// height units. Ground-level clutter tends to sit below two metres.
    pub agl: u16,
    /// Minimum object footprint, in square metres
    pub min_area: f64,
}

impl Default for NonGroundParams {
    fn default() -> Self {
        Self {
            dz: 10,
            agl: 20,
            min_area: 50.0,
        }
    }
}

/// Non-ground cleanup algorithm
#[derive(Debug, Clone, Default)]
pub struct ClassifyNonGround;

impl Algorithm for ClassifyNonGround {
    type Input = (Raster<u16>, Raster<u16>, Raster<u32>);
    type Output = Raster<u32>;
    type Params = NonGroundParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Classify Non-Ground"
    }

    fn description(&self) -> &'static str {
        "Cull implausible candidates from the non-ground label mask"
    }

    fn run(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (dsm, dtm, mut labels) = input;
        classify_non_ground(&dsm, &dtm, &mut labels, &params)?;
        Ok(labels)
    }
}

/// Reduce the non-ground candidate mask to credible objects.
///
/// # Arguments
/// * `dsm` - Surface model in u16 height units, nodata = 0
/// * `dtm` - Bare-earth model from ground classification
/// * `labels` - Candidate mask (0 = ground, 1 = candidate), culled in place
/// * `params` - Cleanup parameters
///
/// On return the label raster contains only 0 and 1, and every surviving
/// component has at least the configured footprint.
pub fn classify_non_ground(
    dsm: &Raster<u16>,
    dtm: &Raster<u16>,
    labels: &mut Raster<u32>,
    params: &NonGroundParams,
) -> Result<()> {
    check_shapes(dsm, dtm, labels)?;
    let (rows, cols) = dsm.shape();
    let gsd = dsm.gsd();
    if gsd <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "gsd",
            value: gsd.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    let min_count = (params.min_area / (gsd * gsd)) as u64;

    // Drop candidates close to the terrain, and candidates without a
    // measurement at all.
    for row in 0..rows {
        for col in 0..cols {
            if unsafe { labels.get_unchecked(row, col) } == LABEL_GROUND {
                continue;
            }
            let surface = unsafe { dsm.get_unchecked(row, col) };
            let terrain = unsafe { dtm.get_unchecked(row, col) };
            if surface == 0 || (surface as f32 - terrain as f32) < params.agl as f32 {
                unsafe { labels.set_unchecked(row, col, LABEL_GROUND) };
            }
        }
    }

    // Group by height similarity and reject regions whose boundary steps
    // look like terrain roughness rather than object walls.
    let regions = group_regions(labels, dsm, params.dz / 2, u64::MAX)?;
    for region in &regions {
        let mut gradient_sum = 0.0f32;
        let mut touches = 0u32;

        for row in region.ymin..=region.ymax {
            for col in region.xmin..=region.xmax {
                if unsafe { labels.get_unchecked(row, col) } != region.label {
                    continue;
                }
                let center = unsafe { dsm.get_unchecked(row, col) } as f32;
                for (dr, dc) in QUEEN_OFFSETS {
                    let (nr, nc) = labels.clamp_offset(row, col, dr, dc);
                    if unsafe { labels.get_unchecked(nr, nc) } != LABEL_GROUND {
                        continue;
                    }
                    let near = unsafe { dsm.get_unchecked(nr, nc) } as f32;
                    let far = dsm.clamped(row, col, 2 * dr, 2 * dc) as f32;

                    // Both gradients assume the object stands above its
                    // neighbors; downhill contributions clamp to zero.
                    let my_gradient = (center - near).max(0.0);
                    let neighbor_gradient = (near - far).max(0.0);
                    gradient_sum += (my_gradient - neighbor_gradient).max(0.0);
                    touches += 1;
                }
            }
        }

        // A region with no ground contact cannot be judged here; the area
        // cull below still applies to it.
        if touches == 0 {
            continue;
        }
        let mean_gradient = gradient_sum / touches as f32;
        if mean_gradient != 0.0 && mean_gradient < params.dz as f32 / 2.0 {
            relabel_region(labels, region, LABEL_GROUND);
        }
    }

    // Erode then dilate at radius one to remove narrow features. The eroded
    // mask lives in a scratch copy; dilation reads it while writing the
    // original.
    let mut eroded = labels.clone();
    for row in 0..rows {
        for col in 0..cols {
            if unsafe { labels.get_unchecked(row, col) } == LABEL_GROUND {
                continue;
            }
            'erode: for nr in row.saturating_sub(1)..=(row + 1).min(rows - 1) {
                for nc in col.saturating_sub(1)..=(col + 1).min(cols - 1) {
                    if unsafe { labels.get_unchecked(nr, nc) } == LABEL_GROUND {
                        unsafe { eroded.set_unchecked(row, col, LABEL_GROUND) };
                        break 'erode;
                    }
                }
            }
        }
    }
    for row in 0..rows {
        for col in 0..cols {
            if unsafe { labels.get_unchecked(row, col) } == LABEL_GROUND {
                continue;
            }
            let mut found = false;
            for nr in row.saturating_sub(1)..=(row + 1).min(rows - 1) {
                for nc in col.saturating_sub(1)..=(col + 1).min(cols - 1) {
                    if unsafe { eroded.get_unchecked(nr, nc) } != LABEL_GROUND {
                        found = true;
                    }
                }
            }
            if !found {
                unsafe { labels.set_unchecked(row, col, LABEL_GROUND) };
            }
        }
    }

    finish_label_image(labels);

    // Area cull: group with similarity off so each surviving object is one
    // component regardless of height texture.
    let regions = group_regions(labels, dsm, u16::MAX, u64::MAX)?;
    for region in &regions {
        if region.count < min_count {
            relabel_region(labels, region, LABEL_GROUND);
        }
    }

    finish_label_image(labels);

    Ok(())
}

fn relabel_region(labels: &mut Raster<u32>, region: &Region, to: u32) {
    for row in region.ymin..=region.ymax {
        for col in region.xmin..=region.xmax {
            if unsafe { labels.get_unchecked(row, col) } == region.label {
                unsafe { labels.set_unchecked(row, col, to) };
            }
        }
    }
}

fn check_shapes(dsm: &Raster<u16>, dtm: &Raster<u16>, labels: &Raster<u32>) -> Result<()> {
    let expected = dsm.shape();
    if expected.0 == 0 || expected.1 == 0 {
        return Err(Error::InvalidParameter {
            name: "dsm",
            value: format!("{}x{}", expected.1, expected.0),
            reason: "raster is empty".to_string(),
        });
    }
    for actual in [dtm.shape(), labels.shape()] {
        if actual != expected {
            return Err(Error::ShapeMismatch { expected, actual });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::LABEL_NONGROUND;

    fn nonground_count(labels: &Raster<u32>) -> usize {
        labels
            .data()
            .iter()
            .filter(|&&v| v == LABEL_NONGROUND)
            .count()
    }

    fn scene_with_block(
        size: usize,
        block: std::ops::Range<usize>,
        height: u16,
    ) -> (Raster<u16>, Raster<u16>, Raster<u32>) {
        let mut dsm: Raster<u16> = Raster::filled(size, size, 1000);
        let dtm: Raster<u16> = Raster::filled(size, size, 1000);
        let mut labels: Raster<u32> = dsm.with_same_meta(size, size);
        for row in block.clone() {
            for col in block.clone() {
                dsm.set(row, col, height).unwrap();
                labels.set(row, col, LABEL_NONGROUND).unwrap();
            }
        }
        (dsm, dtm, labels)
    }

    #[test]
    fn test_tall_block_survives() {
        let (dsm, dtm, mut labels) = scene_with_block(20, 7..13, 1060);
        let params = NonGroundParams {
            dz: 20,
            agl: 20,
            min_area: 4.0,
        };

        classify_non_ground(&dsm, &dtm, &mut labels, &params).unwrap();

        assert_eq!(nonground_count(&labels), 36);
        for row in 7..13 {
            for col in 7..13 {
                assert_eq!(labels.get(row, col).unwrap(), LABEL_NONGROUND);
            }
        }
    }

    #[test]
    fn test_low_agl_candidates_are_dropped() {
        // Block only one metre above terrain: below the AGL floor.
        let (dsm, dtm, mut labels) = scene_with_block(20, 7..13, 1010);
        let params = NonGroundParams {
            dz: 20,
            agl: 20,
            min_area: 4.0,
        };

        classify_non_ground(&dsm, &dtm, &mut labels, &params).unwrap();

        assert_eq!(nonground_count(&labels), 0);
    }

    #[test]
    fn test_narrow_wall_is_eliminated() {
        // One pixel wide, twenty long, six metres tall: survives the
        // gradient test but not the erosion step.
        let mut dsm: Raster<u16> = Raster::filled(24, 24, 1000);
        let dtm: Raster<u16> = Raster::filled(24, 24, 1000);
        let mut labels: Raster<u32> = dsm.with_same_meta(24, 24);
        for row in 2..22 {
            dsm.set(row, 12, 1060).unwrap();
            labels.set(row, 12, LABEL_NONGROUND).unwrap();
        }
        let params = NonGroundParams {
            dz: 20,
            agl: 20,
            min_area: 4.0,
        };

        classify_non_ground(&dsm, &dtm, &mut labels, &params).unwrap();

        assert_eq!(nonground_count(&labels), 0);
    }

    #[test]
    fn test_small_footprint_is_culled() {
        // Wide enough to survive erosion, too small for the area floor.
        let (dsm, dtm, mut labels) = scene_with_block(20, 8..12, 1060);
        let params = NonGroundParams {
            dz: 20,
            agl: 20,
            min_area: 50.0,
        };

        classify_non_ground(&dsm, &dtm, &mut labels, &params).unwrap();

        assert_eq!(nonground_count(&labels), 0);
    }

    #[test]
    fn test_void_surface_candidates_are_dropped() {
        let (mut dsm, dtm, mut labels) = scene_with_block(20, 7..13, 1060);
        dsm.set(8, 8, 0).unwrap();
        let params = NonGroundParams {
            dz: 20,
            agl: 20,
            min_area: 4.0,
        };

        classify_non_ground(&dsm, &dtm, &mut labels, &params).unwrap();

        assert_eq!(labels.get(8, 8).unwrap(), LABEL_GROUND);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let dsm: Raster<u16> = Raster::filled(8, 8, 1000);
        let dtm: Raster<u16> = Raster::filled(8, 9, 1000);
        let mut labels: Raster<u32> = dsm.with_same_meta(8, 8);

        assert!(matches!(
            classify_non_ground(&dsm, &dtm, &mut labels, &NonGroundParams::default()),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_gentle_mound_is_rejected_by_gradient() {
        // A broad mound whose edges rise gently: mean boundary gradient is
        // positive but small, so the region reads as terrain.
        let mut dsm: Raster<u16> = Raster::filled(20, 20, 1000);
        let dtm: Raster<u16> = Raster::filled(20, 20, 1000);
        let mut labels: Raster<u32> = dsm.with_same_meta(20, 20);
        for row in 6..14 {
            for col in 6..14 {
                dsm.set(row, col, 1025).unwrap();
                labels.set(row, col, LABEL_NONGROUND).unwrap();
            }
        }
        // Soften the rim so boundary steps stay below dz/2.
        for col in 6..14 {
            dsm.set(5, col, 1012).unwrap();
            dsm.set(14, col, 1012).unwrap();
        }
        for row in 5..15 {
            dsm.set(row, 5, 1012).unwrap();
            dsm.set(row, 14, 1012).unwrap();
        }
        let params = NonGroundParams {
            dz: 30,
            agl: 20,
            min_area: 4.0,
        };

        classify_non_ground(&dsm, &dtm, &mut labels, &params).unwrap();

        assert_eq!(nonground_count(&labels), 0);
    }
}
