//! Object boundary detection on height rasters
//!
//! Boundaries are height steps, not slopes: the detector compares the
//! gradient at a pixel against the gradient one stride further out, so a
//! continuous terrain ramp cancels itself while a discrete step survives.

use groundsift_core::{Error, Raster, Result};
use ndarray::Array2;

use super::labels::{LABEL_GROUND, LABEL_NONGROUND, LABEL_TEMP};

/// Run a per-row kernel over every row and concatenate the results.
///
/// With the `parallel` feature the rows are distributed across the rayon
/// pool; each row is a pure function of the height raster, so execution
/// order cannot leak into the output.
#[cfg(feature = "parallel")]
fn concat_rows<F>(rows: usize, kernel: F) -> Vec<u32>
where
    F: Fn(usize) -> Vec<u32> + Send + Sync,
{
    use rayon::prelude::*;
    (0..rows).into_par_iter().flat_map(kernel).collect()
}

#[cfg(not(feature = "parallel"))]
fn concat_rows<F>(rows: usize, kernel: F) -> Vec<u32>
where
    F: Fn(usize) -> Vec<u32>,
{
    (0..rows).flat_map(kernel).collect()
}

/// Mark pixels that sit on a height step larger than `dz`.
///
/// Resets the label raster to ground, then probes a 3x3 stencil at stride
/// `edge_resolution` around every pixel. For each non-void neighbor `q` the
/// second difference `(h[p] - h[q]) - (h[q] - h[q2])` is compared against
/// `dz`, where `q2` lies one further stride out in the same direction.
/// Coordinates clamp at the raster border.
pub fn label_object_boundaries(
    heights: &Raster<u16>,
    labels: &mut Raster<u32>,
    edge_resolution: usize,
    dz: u16,
) -> Result<()> {
    let (rows, cols) = heights.shape();
    let stride = edge_resolution as isize;
    let threshold = dz as f32;

    let data = concat_rows(rows, |row| {
        let mut row_labels = vec![LABEL_GROUND; cols];

        for col in 0..cols {
            let center = unsafe { heights.get_unchecked(row, col) } as f32;

            'probe: for dj in [-stride, 0, stride] {
                for di in [-stride, 0, stride] {
                    let near = heights.clamped(row, col, dj, di);
                    if near == 0 {
                        continue;
                    }
                    let far = heights.clamped(row, col, 2 * dj, 2 * di) as f32;

                    let my_gradient = center - near as f32;
                    let neighbor_gradient = near as f32 - far;
                    if my_gradient - neighbor_gradient > threshold {
                        row_labels[col] = LABEL_NONGROUND;
                        break 'probe;
                    }
                }
            }
        }

        row_labels
    });

    let len = data.len();
    *labels.data_mut() = Array2::from_shape_vec((rows, cols), data)
        .map_err(|_| Error::BufferSize { len, rows, cols })?;

    Ok(())
}

/// Widen boundary labels across the flat tops of objects.
///
/// Repeats `edge_resolution` times: neighbors of a marked pixel whose height
/// is less than `dz/2` below it become candidates, and a candidate is
/// promoted only when some 8-neighbor lies more than `dz/2` below it, i.e.
/// it sits on a step edge itself. Candidates that never promote revert to
/// ground, so labels do not bleed onto smooth terrain.
pub fn extend_object_boundaries(
    heights: &Raster<u16>,
    labels: &mut Raster<u32>,
    edge_resolution: usize,
    dz: u16,
) {
    let (rows, cols) = labels.shape();
    let half_step = dz as f32 / 2.0;

    for _ in 0..edge_resolution {
        // Mark close neighbors of labeled interior pixels.
        if rows >= 3 && cols >= 3 {
            for row in 1..rows - 1 {
                for col in 1..cols - 1 {
                    if unsafe { labels.get_unchecked(row, col) } != LABEL_NONGROUND {
                        continue;
                    }
                    let center = unsafe { heights.get_unchecked(row, col) } as f32;
                    for nr in row - 1..=row + 1 {
                        for nc in col - 1..=col + 1 {
                            if unsafe { labels.get_unchecked(nr, nc) } == LABEL_NONGROUND {
                                continue;
                            }
                            let height = unsafe { heights.get_unchecked(nr, nc) } as f32;
                            if center - height < half_step {
                                unsafe { labels.set_unchecked(nr, nc, LABEL_TEMP) };
                            }
                        }
                    }
                }
            }
        }

        // Promote candidates that sit on a step edge.
        for row in 0..rows {
            for col in 0..cols {
                if unsafe { labels.get_unchecked(row, col) } != LABEL_TEMP {
                    continue;
                }
                let center = unsafe { heights.get_unchecked(row, col) } as f32;
                'neighbors: for nr in row.saturating_sub(1)..=(row + 1).min(rows - 1) {
                    for nc in col.saturating_sub(1)..=(col + 1).min(cols - 1) {
                        let height = unsafe { heights.get_unchecked(nr, nc) } as f32;
                        if center - height > half_step {
                            unsafe { labels.set_unchecked(row, col, LABEL_NONGROUND) };
                            break 'neighbors;
                        }
                    }
                }
            }
        }
    }

    // Demote leftover candidates.
    for value in labels.data_mut().iter_mut() {
        if *value == LABEL_TEMP {
            *value = LABEL_GROUND;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_dsm(rows: usize, cols: usize, base: u16) -> Raster<u16> {
        Raster::filled(rows, cols, base)
    }

    fn raise_block(
        dsm: &mut Raster<u16>,
        row_range: std::ops::Range<usize>,
        col_range: std::ops::Range<usize>,
        value: u16,
    ) {
        for row in row_range {
            for col in col_range.clone() {
                dsm.set(row, col, value).unwrap();
            }
        }
    }

    fn marked_count(labels: &Raster<u32>) -> usize {
        labels.data().iter().filter(|&&v| v != LABEL_GROUND).count()
    }

    #[test]
    fn test_flat_terrain_has_no_boundaries() {
        let dsm = block_dsm(10, 10, 1000);
        let mut labels: Raster<u32> = dsm.with_same_meta(10, 10);

        label_object_boundaries(&dsm, &mut labels, 3, 20).unwrap();

        assert_eq!(marked_count(&labels), 0);
    }

    #[test]
    fn test_ramp_does_not_trigger() {
        // A constant slope cancels in the second difference.
        let mut dsm = block_dsm(12, 12, 0);
        for row in 0..12 {
            for col in 0..12 {
                dsm.set(row, col, 1000 + (col as u16) * 15).unwrap();
            }
        }
        let mut labels: Raster<u32> = dsm.with_same_meta(12, 12);

        label_object_boundaries(&dsm, &mut labels, 2, 20).unwrap();

        assert_eq!(marked_count(&labels), 0);
    }

    #[test]
    fn test_step_edge_is_marked() {
        let mut dsm = block_dsm(20, 20, 1000);
        raise_block(&mut dsm, 7..13, 7..13, 1060);
        let mut labels: Raster<u32> = dsm.with_same_meta(20, 20);

        label_object_boundaries(&dsm, &mut labels, 3, 20).unwrap();

        // The raised block itself must be fully marked.
        for row in 7..13 {
            for col in 7..13 {
                assert_eq!(labels.get(row, col).unwrap(), LABEL_NONGROUND);
            }
        }
    }

    #[test]
    fn test_boundaries_monotone_in_dz() {
        let mut dsm = block_dsm(16, 16, 1000);
        raise_block(&mut dsm, 4..9, 4..9, 1035);
        raise_block(&mut dsm, 11..14, 11..14, 1012);

        let mut loose: Raster<u32> = dsm.with_same_meta(16, 16);
        let mut strict: Raster<u32> = dsm.with_same_meta(16, 16);
        label_object_boundaries(&dsm, &mut loose, 2, 10).unwrap();
        label_object_boundaries(&dsm, &mut strict, 2, 30).unwrap();

        for row in 0..16 {
            for col in 0..16 {
                if strict.get(row, col).unwrap() == LABEL_NONGROUND {
                    assert_eq!(loose.get(row, col).unwrap(), LABEL_NONGROUND);
                }
            }
        }
        assert!(marked_count(&strict) < marked_count(&loose));
    }

    #[test]
    fn test_void_neighbors_are_skipped() {
        let mut dsm = block_dsm(10, 10, 0);
        // Lone measured pixel in a void raster produces no boundary.
        dsm.set(5, 5, 1000).unwrap();
        let mut labels: Raster<u32> = dsm.with_same_meta(10, 10);

        label_object_boundaries(&dsm, &mut labels, 2, 20).unwrap();

        assert_eq!(marked_count(&labels), 0);
    }

    #[test]
    fn test_extension_keeps_labels_binary() {
        // Extension may only add marks, and every candidate it leaves behind
        // must be demoted before it returns.
        let mut dsm = block_dsm(24, 24, 1000);
        raise_block(&mut dsm, 6..18, 6..18, 1080);
        let mut labels: Raster<u32> = dsm.with_same_meta(24, 24);

        label_object_boundaries(&dsm, &mut labels, 3, 20).unwrap();
        let before = labels.clone();
        extend_object_boundaries(&dsm, &mut labels, 3, 20);

        for row in 0..24 {
            for col in 0..24 {
                let v = labels.get(row, col).unwrap();
                assert!(v == LABEL_GROUND || v == LABEL_NONGROUND);
                if before.get(row, col).unwrap() == LABEL_NONGROUND {
                    assert_eq!(v, LABEL_NONGROUND);
                }
            }
        }
    }

    #[test]
    fn test_extension_does_not_bleed_onto_flat_ground() {
        let dsm = block_dsm(10, 10, 1000);
        let mut labels: Raster<u32> = dsm.with_same_meta(10, 10);
        labels.set(5, 5, LABEL_NONGROUND).unwrap();

        extend_object_boundaries(&dsm, &mut labels, 3, 20);

        assert_eq!(marked_count(&labels), 1);
        assert_eq!(labels.get(5, 5).unwrap(), LABEL_NONGROUND);
    }
}
