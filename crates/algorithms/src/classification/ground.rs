//! Iterative bare-earth extraction
//!
//! The working DTM starts as a copy of the DSM. Each iteration labels object
//! boundaries on it, widens them, grows height-gated components, fills their
//! topological interiors, then voids every labeled pixel and re-interpolates
//! terrain into the holes. Re-filling between iterations matters: the next
//! gradient test then sees a plausible local ground instead of a crater, so
//! each pass can peel off the next scale of above-ground clutter.

use groundsift_core::raster::QUEEN_OFFSETS;
use groundsift_core::{Algorithm, Error, Raster, Result};

use crate::interpolation::fill_voids_pyramid;
use crate::segmentation::{
    extend_object_boundaries, fill_object_bounds, finish_label_image, group_regions,
    label_object_boundaries, LABEL_GROUND, LABEL_NONGROUND,
};

/// Parameters for ground classification
#[derive(Debug, Clone)]
pub struct GroundParams {
    /// Stride of the boundary stencil, in pixels. Governs the scale of
    /// detectable height steps.
    pub edge_resolution: usize,
    /// Minimum height step to call an object edge, in height units
    pub dz: u16,
    /// Number of label-and-remove iterations
    pub iterations: usize,
    /// Soft cap on grown component footprint, in square metres. Bounds
    /// region-grow time on large connected structures.
    pub max_region_area: f64,
}

impl Default for GroundParams {
    fn default() -> Self {
        Self {
            edge_resolution: 3,
            dz: 10,
            iterations: 5,
            max_region_area: 10_000.0,
        }
    }
}

impl GroundParams {
    /// Derive the boundary stencil stride from a ground sample distance,
    /// targeting roughly three metres on the ground.
    pub fn for_gsd(gsd: f64) -> Self {
        Self {
            edge_resolution: ((3.0 / gsd).round() as usize).max(1),
            ..Self::default()
        }
    }
}

/// Output of ground classification
#[derive(Debug, Clone)]
pub struct GroundResult {
    /// Bare-earth terrain model, void-free
    pub dtm: Raster<u16>,
    /// Per-pixel labels: 0 = ground, 1 = non-ground
    pub labels: Raster<u32>,
}

/// Ground classification algorithm
#[derive(Debug, Clone, Default)]
pub struct ClassifyGround;

impl Algorithm for ClassifyGround {
    type Input = Raster<u16>;
    type Output = GroundResult;
    type Params = GroundParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Classify Ground"
    }

    fn description(&self) -> &'static str {
        "Derive a bare-earth DTM and non-ground labels from a DSM"
    }

    fn run(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        classify_ground(&input, &params)
    }
}

/// Derive a bare-earth DTM and a 0/1 non-ground label raster from a DSM.
///
/// # Arguments
/// * `dsm` - Surface model in u16 height units, nodata = 0
/// * `params` - Ground classification parameters
///
/// After the iterative removal the DTM is clamped back to the DSM wherever
/// it drifted above it, single-pixel spikes are voided and re-filled, and
/// the label raster is reduced to ground/non-ground.
pub fn classify_ground(dsm: &Raster<u16>, params: &GroundParams) -> Result<GroundResult> {
    validate_params(dsm, params)?;

    let (rows, cols) = dsm.shape();
    let gsd = dsm.gsd();
    let max_count = (params.max_region_area / (gsd * gsd)) as u64;

    let mut dtm = dsm.clone();
    fill_voids_pyramid(&mut dtm, true);

    let mut labels: Raster<u32> = dsm.with_same_meta(rows, cols);
    let mut voids: Raster<u8> = dsm.with_same_meta(rows, cols);

    for iteration in 0..params.iterations {
        label_object_boundaries(&dtm, &mut labels, params.edge_resolution, params.dz)?;
        extend_object_boundaries(&dtm, &mut labels, params.edge_resolution, params.dz);

        let mut regions = group_regions(&mut labels, &dtm, params.dz, max_count)?;
        for region in &mut regions {
            fill_object_bounds(&mut labels, &dtm, region, params.edge_resolution);
        }
        finish_label_image(&mut labels);

        // Fold this iteration's objects into the accumulated void mask and
        // reopen every accumulated void in the working DTM.
        for row in 0..rows {
            for col in 0..cols {
                if unsafe { labels.get_unchecked(row, col) } == LABEL_NONGROUND {
                    unsafe { voids.set_unchecked(row, col, 1) };
                }
                if unsafe { voids.get_unchecked(row, col) } == 1 {
                    unsafe { dtm.set_unchecked(row, col, 0) };
                }
            }
        }

        let no_smoothing = iteration + 1 != params.iterations;
        fill_voids_pyramid(&mut dtm, no_smoothing);
    }

    // Restore the surface wherever the terrain estimate drifted up to or
    // above it. DSM voids (height 0) re-void the DTM here and are filled
    // again below.
    for row in 0..rows {
        for col in 0..cols {
            let surface = unsafe { dsm.get_unchecked(row, col) };
            if unsafe { dtm.get_unchecked(row, col) } >= surface {
                unsafe { dtm.set_unchecked(row, col, surface) };
                unsafe { labels.set_unchecked(row, col, LABEL_GROUND) };
                unsafe { voids.set_unchecked(row, col, 0) };
            }
        }
    }

    // Remove leftover single-pixel spikes: a pixel standing more than dz/2
    // above all eight neighbors is voided. The sweep reads its own writes;
    // the min-over-neighbors form keeps that from cascading.
    let half_step = params.dz as f32 / 2.0;
    for row in 0..rows {
        for col in 0..cols {
            let center = unsafe { dtm.get_unchecked(row, col) } as f32;
            let mut min_diff = f32::MAX;
            for (dr, dc) in QUEEN_OFFSETS {
                let neighbor = dtm.clamped(row, col, dr, dc) as f32;
                min_diff = min_diff.min((center - neighbor).max(0.0));
            }
            if min_diff > half_step {
                unsafe { labels.set_unchecked(row, col, LABEL_NONGROUND) };
                unsafe { voids.set_unchecked(row, col, 1) };
                unsafe { dtm.set_unchecked(row, col, 0) };
            }
        }
    }

    for row in 0..rows {
        for col in 0..cols {
            if unsafe { voids.get_unchecked(row, col) } == 1 {
                unsafe { dtm.set_unchecked(row, col, 0) };
            }
        }
    }
    fill_voids_pyramid(&mut dtm, false);

    // Terminal labels: voided pixels are the non-ground set.
    for row in 0..rows {
        for col in 0..cols {
            let value = if unsafe { voids.get_unchecked(row, col) } == 1 {
                LABEL_NONGROUND
            } else {
                LABEL_GROUND
            };
            unsafe { labels.set_unchecked(row, col, value) };
        }
    }

    Ok(GroundResult { dtm, labels })
}

fn validate_params(dsm: &Raster<u16>, params: &GroundParams) -> Result<()> {
    let (rows, cols) = dsm.shape();
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidParameter {
            name: "dsm",
            value: format!("{}x{}", cols, rows),
            reason: "raster is empty".to_string(),
        });
    }
    if params.iterations < 1 {
        return Err(Error::InvalidParameter {
            name: "iterations",
            value: params.iterations.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if params.edge_resolution < 1 {
        return Err(Error::InvalidParameter {
            name: "edge_resolution",
            value: params.edge_resolution.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if params.max_region_area <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "max_region_area",
            value: params.max_region_area.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if dsm.gsd() <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "gsd",
            value: dsm.gsd().to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use groundsift_core::GeoTransform;

    #[test]
    fn test_flat_terrain_is_all_ground() {
        let dsm: Raster<u16> = Raster::filled(10, 10, 1000);
        let params = GroundParams {
            edge_resolution: 3,
            dz: 20,
            iterations: 2,
            ..Default::default()
        };

        let result = classify_ground(&dsm, &params).unwrap();

        for row in 0..10 {
            for col in 0..10 {
                assert_eq!(result.dtm.get(row, col).unwrap(), 1000);
                assert_eq!(result.labels.get(row, col).unwrap(), LABEL_GROUND);
            }
        }
    }

    #[test]
    fn test_rejects_zero_iterations() {
        let dsm: Raster<u16> = Raster::filled(4, 4, 1000);
        let params = GroundParams {
            iterations: 0,
            ..Default::default()
        };
        assert!(matches!(
            classify_ground(&dsm, &params),
            Err(Error::InvalidParameter { name: "iterations", .. })
        ));
    }

    #[test]
    fn test_rejects_degenerate_gsd() {
        let mut dsm: Raster<u16> = Raster::filled(4, 4, 1000);
        dsm.set_transform(GeoTransform::new(0.0, 0.0, 0.0, 0.0));
        assert!(matches!(
            classify_ground(&dsm, &GroundParams::default()),
            Err(Error::InvalidParameter { name: "gsd", .. })
        ));
    }

    #[test]
    fn test_for_gsd_scales_stencil() {
        assert_eq!(GroundParams::for_gsd(1.0).edge_resolution, 3);
        assert_eq!(GroundParams::for_gsd(0.5).edge_resolution, 6);
        assert_eq!(GroundParams::for_gsd(10.0).edge_resolution, 1);
    }

    #[test]
    fn test_labels_are_binary() {
        let mut dsm: Raster<u16> = Raster::filled(20, 20, 1000);
        for row in 7..13 {
            for col in 7..13 {
                dsm.set(row, col, 1060).unwrap();
            }
        }

        let result = classify_ground(
            &dsm,
            &GroundParams {
                edge_resolution: 3,
                dz: 20,
                iterations: 2,
                ..Default::default()
            },
        )
        .unwrap();

        for &v in result.labels.data().iter() {
            assert!(v == LABEL_GROUND || v == LABEL_NONGROUND);
        }
    }
}
