//! Topological interior fill for grown regions
//!
//! Region growing only tags the pixels that passed the height gate; the
//! interior of a building footprint can still be full of holes. This pass
//! recovers the interior by containment: a pixel belongs to the object when
//! it stands above the ground level flanking the region in both its row and
//! its column.

use groundsift_core::Raster;

use super::components::Region;
use super::labels::{LABEL_ACCEPTED, LABEL_GROUND, LABEL_OBJECT, LABEL_ROW_ACCEPTED, LABEL_TEMP};

/// Fill the interior of one region and commit it as an object.
///
/// Four stages over the region's padded bounding box:
/// 1. Row scan. Between the outermost pixels of the region in each row, a
///    pixel standing above the flanking ground level passes; region pixels
///    at or below it revert to ground. Rows spanning the whole raster are
///    left alone.
/// 2. Column scan, symmetric. Only pixels that passed both axes are
///    accepted.
/// 3. Closure at radius `edge_resolution`: the accepted set is widened by a
///    square ring, the bounding box grows to match, and the ring is
///    absorbed. This smooths the silhouette without losing area.
/// 4. Finalization: leftover region pixels revert to ground and accepted
///    pixels take the terminal object value.
///
/// The bounding box in `region` is updated to the widened extent.
pub fn fill_object_bounds(
    labels: &mut Raster<u32>,
    heights: &Raster<u16>,
    region: &mut Region,
    edge_resolution: usize,
) {
    let (rows, cols) = labels.shape();
    let label = region.label;

    let y0 = region.ymin.saturating_sub(1);
    let y1 = (region.ymax + 1).min(rows - 1);
    let x0 = region.xmin.saturating_sub(1);
    let x1 = (region.xmax + 1).min(cols - 1);

    // Row scan.
    for row in y0..=y1 {
        let Some(start) = (x0..=x1).find(|&col| unsafe { labels.get_unchecked(row, col) } == label)
        else {
            continue;
        };
        let stop = (x0..=x1)
            .rev()
            .find(|&col| unsafe { labels.get_unchecked(row, col) } == label)
            .unwrap_or(start);

        // A row spanning the full raster has no flanking ground to compare
        // against.
        if start == 0 && stop == cols - 1 {
            continue;
        }

        // A void flank reads as height zero, which can only lower the bar.
        let ground_level = if start == 0 {
            unsafe { heights.get_unchecked(row, stop + 1) }
        } else if stop == cols - 1 {
            unsafe { heights.get_unchecked(row, start - 1) }
        } else {
            unsafe { heights.get_unchecked(row, start - 1) }
                .max(unsafe { heights.get_unchecked(row, stop + 1) })
        };

        for col in start..=stop {
            if unsafe { heights.get_unchecked(row, col) } > ground_level {
                if unsafe { labels.get_unchecked(row, col) } != label {
                    unsafe { labels.set_unchecked(row, col, LABEL_ROW_ACCEPTED) };
                }
            } else if unsafe { labels.get_unchecked(row, col) } == label {
                unsafe { labels.set_unchecked(row, col, LABEL_GROUND) };
            }
        }
    }

    // Column scan.
    for col in x0..=x1 {
        let Some(start) = (y0..=y1).find(|&row| unsafe { labels.get_unchecked(row, col) } == label)
        else {
            continue;
        };
        let stop = (y0..=y1)
            .rev()
            .find(|&row| unsafe { labels.get_unchecked(row, col) } == label)
            .unwrap_or(start);

        if start == 0 && stop == rows - 1 {
            continue;
        }

        let ground_level = if start == 0 {
            unsafe { heights.get_unchecked(stop + 1, col) }
        } else if stop == rows - 1 {
            unsafe { heights.get_unchecked(start - 1, col) }
        } else {
            unsafe { heights.get_unchecked(start - 1, col) }
                .max(unsafe { heights.get_unchecked(stop + 1, col) })
        };

        for row in start..=stop {
            if unsafe { heights.get_unchecked(row, col) } > ground_level {
                let value = unsafe { labels.get_unchecked(row, col) };
                if value == label || value == LABEL_ROW_ACCEPTED {
                    unsafe { labels.set_unchecked(row, col, LABEL_ACCEPTED) };
                }
            }
        }
    }

    // Closure: widen the accepted set by a square ring of the edge radius.
    let radius = edge_resolution;
    for row in y0..=y1 {
        for col in x0..=x1 {
            if unsafe { labels.get_unchecked(row, col) } != LABEL_ACCEPTED {
                continue;
            }
            for nr in row.saturating_sub(radius)..=(row + radius).min(rows - 1) {
                for nc in col.saturating_sub(radius)..=(col + radius).min(cols - 1) {
                    if unsafe { labels.get_unchecked(nr, nc) } != LABEL_ACCEPTED {
                        unsafe { labels.set_unchecked(nr, nc, LABEL_TEMP) };
                    }
                }
            }
        }
    }

    region.xmin = region.xmin.saturating_sub(radius + 1);
    region.ymin = region.ymin.saturating_sub(radius + 1);
    region.xmax = (region.xmax + radius + 1).min(cols - 1);
    region.ymax = (region.ymax + radius + 1).min(rows - 1);

    for row in region.ymin..=region.ymax {
        for col in region.xmin..=region.xmax {
            if unsafe { labels.get_unchecked(row, col) } == LABEL_TEMP {
                unsafe { labels.set_unchecked(row, col, LABEL_ACCEPTED) };
            }
        }
    }

    // Finalization.
    let fy0 = region.ymin.saturating_sub(1);
    let fy1 = (region.ymax + 1).min(rows - 1);
    let fx0 = region.xmin.saturating_sub(1);
    let fx1 = (region.xmax + 1).min(cols - 1);
    for row in fy0..=fy1 {
        for col in fx0..=fx1 {
            let value = unsafe { labels.get_unchecked(row, col) };
            if value == label {
                unsafe { labels.set_unchecked(row, col, LABEL_GROUND) };
            } else if value == LABEL_ACCEPTED {
                unsafe { labels.set_unchecked(row, col, LABEL_OBJECT) };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::{finish_label_image, group_regions, LABEL_NONGROUND};

    fn raised_block_scene() -> (Raster<u16>, Raster<u32>) {
        // 12x12 flat terrain with a 4x4 block at rows/cols 4..8.
        let mut heights: Raster<u16> = Raster::filled(12, 12, 1000);
        for row in 4..8 {
            for col in 4..8 {
                heights.set(row, col, 1100).unwrap();
            }
        }
        let labels: Raster<u32> = heights.with_same_meta(12, 12);
        (heights, labels)
    }

    #[test]
    fn test_block_interior_becomes_object() {
        let (heights, mut labels) = raised_block_scene();
        // Only the block outline is marked; the fill must recover the
        // interior.
        for row in 4..8 {
            for col in 4..8 {
                let outline = row == 4 || row == 7 || col == 4 || col == 7;
                if outline {
                    labels.set(row, col, LABEL_NONGROUND).unwrap();
                }
            }
        }
        let mut regions = group_regions(&mut labels, &heights, 10, u64::MAX).unwrap();
        assert_eq!(regions.len(), 1);

        fill_object_bounds(&mut labels, &heights, &mut regions[0], 1);
        finish_label_image(&mut labels);

        // Block plus a one-pixel closure ring.
        for row in 3..9 {
            for col in 3..9 {
                assert_eq!(labels.get(row, col).unwrap(), LABEL_NONGROUND);
            }
        }
        let marked = labels
            .data()
            .iter()
            .filter(|&&v| v == LABEL_NONGROUND)
            .count();
        assert_eq!(marked, 36);
    }

    #[test]
    fn test_flat_region_reverts_to_ground() {
        // Marks on terrain no higher than their surroundings are dropped.
        let heights: Raster<u16> = Raster::filled(10, 10, 1000);
        let mut labels: Raster<u32> = heights.with_same_meta(10, 10);
        for col in 3..7 {
            labels.set(5, col, LABEL_NONGROUND).unwrap();
        }
        let mut regions = group_regions(&mut labels, &heights, 10, u64::MAX).unwrap();
        assert_eq!(regions.len(), 1);

        fill_object_bounds(&mut labels, &heights, &mut regions[0], 2);

        for row in 0..10 {
            for col in 0..10 {
                assert_eq!(labels.get(row, col).unwrap(), LABEL_GROUND);
            }
        }
    }

    #[test]
    fn test_bbox_expands_with_closure() {
        let (heights, mut labels) = raised_block_scene();
        for row in 4..8 {
            for col in 4..8 {
                labels.set(row, col, LABEL_NONGROUND).unwrap();
            }
        }
        let mut regions = group_regions(&mut labels, &heights, 10, u64::MAX).unwrap();
        let mut region = regions.remove(0);

        fill_object_bounds(&mut labels, &heights, &mut region, 2);

        assert_eq!((region.xmin, region.ymin), (1, 1));
        assert_eq!((region.xmax, region.ymax), (10, 10));
    }

    #[test]
    fn test_fill_at_raster_border() {
        // A raised strip touching the border must not panic and must use the
        // single defined flank.
        let mut heights: Raster<u16> = Raster::filled(6, 6, 1000);
        for col in 0..3 {
            heights.set(0, col, 1100).unwrap();
        }
        let mut labels: Raster<u32> = heights.with_same_meta(6, 6);
        for col in 0..3 {
            labels.set(0, col, LABEL_NONGROUND).unwrap();
        }
        let mut regions = group_regions(&mut labels, &heights, 10, u64::MAX).unwrap();

        fill_object_bounds(&mut labels, &heights, &mut regions[0], 1);
        finish_label_image(&mut labels);

        for col in 0..3 {
            assert_eq!(labels.get(0, col).unwrap(), LABEL_NONGROUND);
        }
    }
}
