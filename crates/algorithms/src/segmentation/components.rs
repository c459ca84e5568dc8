//! Height-gated connected-component growth over label rasters

use groundsift_core::{Error, Raster, Result};

use super::labels::{FIRST_REGION_LABEL, LABEL_NONGROUND, MAX_REGION_LABEL};

/// Raster cell identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pixel {
    pub row: usize,
    pub col: usize,
}

/// Descriptor for one grown component.
///
/// The bounding box is inclusive and tight at the moment the region is
/// built; later passes may re-tag pixels without updating it.
#[derive(Debug, Clone)]
pub struct Region {
    /// Unique identifier, also written into the label raster
    pub label: u32,
    pub xmin: usize,
    pub xmax: usize,
    pub ymin: usize,
    pub ymax: usize,
    /// Number of pixels carrying `label`
    pub count: u64,
}

/// Group marked pixels into connected components.
///
/// Scans the label raster in row-major order. Each pixel still carrying
/// `LABEL_NONGROUND` seeds a new region that grows over its 8-connected
/// marked neighbors, accepting a neighbor only when its height differs from
/// the current pixel by at most `dz_group`. Accepted pixels are relabeled
/// immediately so they cannot be rediscovered.
///
/// `max_count` is a soft cap: growth stops after the wave in which the
/// region's count exceeds it. Pixels of the component that were not reached
/// keep their marker and are rediscovered by the outer scan as sibling
/// regions. This split is crude but cheap, and downstream containment
/// filling recovers from it.
///
/// Returns the region descriptors; errors if the label counter would run
/// into the scratch-sentinel range.
pub fn group_regions(
    labels: &mut Raster<u32>,
    heights: &Raster<u16>,
    dz_group: u16,
    max_count: u64,
) -> Result<Vec<Region>> {
    let (rows, cols) = labels.shape();
    let mut regions: Vec<Region> = Vec::new();
    let mut next_label = FIRST_REGION_LABEL;

    for row in 0..rows {
        for col in 0..cols {
            if unsafe { labels.get_unchecked(row, col) } != LABEL_NONGROUND {
                continue;
            }

            if next_label > MAX_REGION_LABEL {
                return Err(Error::LabelOverflow(next_label));
            }
            let label = next_label;
            next_label += 1;

            let mut region = Region {
                label,
                xmin: col,
                xmax: col,
                ymin: row,
                ymax: row,
                count: 1,
            };
            unsafe { labels.set_unchecked(row, col, label) };

            // Breadth expansion: each wave is replaced by the neighbors it
            // accepted, so the frontier never revisits settled pixels.
            let mut frontier = vec![Pixel { row, col }];
            while !frontier.is_empty() {
                frontier = grow_wave(labels, heights, &frontier, &mut region, dz_group);
                if region.count > max_count {
                    break;
                }
            }

            regions.push(region);
        }
    }

    Ok(regions)
}

/// Expand one frontier wave, returning the next wave.
fn grow_wave(
    labels: &mut Raster<u32>,
    heights: &Raster<u16>,
    frontier: &[Pixel],
    region: &mut Region,
    dz_group: u16,
) -> Vec<Pixel> {
    let (rows, cols) = labels.shape();
    let mut next = Vec::new();

    for pixel in frontier {
        let center = unsafe { heights.get_unchecked(pixel.row, pixel.col) } as f32;

        for nr in pixel.row.saturating_sub(1)..=(pixel.row + 1).min(rows - 1) {
            for nc in pixel.col.saturating_sub(1)..=(pixel.col + 1).min(cols - 1) {
                if unsafe { labels.get_unchecked(nr, nc) } != LABEL_NONGROUND {
                    continue;
                }
                let height = unsafe { heights.get_unchecked(nr, nc) } as f32;
                if (height - center).abs() > dz_group as f32 {
                    continue;
                }

                unsafe { labels.set_unchecked(nr, nc, region.label) };
                next.push(Pixel { row: nr, col: nc });

                region.xmin = region.xmin.min(nc);
                region.xmax = region.xmax.max(nc);
                region.ymin = region.ymin.min(nr);
                region.ymax = region.ymax.max(nr);
                region.count += 1;
            }
        }
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmentation::LABEL_GROUND;

    fn mark(labels: &mut Raster<u32>, cells: &[(usize, usize)]) {
        for &(row, col) in cells {
            labels.set(row, col, LABEL_NONGROUND).unwrap();
        }
    }

    #[test]
    fn test_single_blob() {
        let heights: Raster<u16> = Raster::filled(6, 6, 1000);
        let mut labels: Raster<u32> = heights.with_same_meta(6, 6);
        mark(&mut labels, &[(2, 2), (2, 3), (3, 2), (3, 3)]);

        let regions = group_regions(&mut labels, &heights, 5, u64::MAX).unwrap();

        assert_eq!(regions.len(), 1);
        let region = &regions[0];
        assert_eq!(region.label, FIRST_REGION_LABEL);
        assert_eq!(region.count, 4);
        assert_eq!((region.xmin, region.xmax, region.ymin, region.ymax), (2, 3, 2, 3));
        assert_eq!(labels.get(2, 2).unwrap(), region.label);
    }

    #[test]
    fn test_ground_pixels_are_not_absorbed() {
        let heights: Raster<u16> = Raster::filled(4, 4, 1000);
        let mut labels: Raster<u32> = heights.with_same_meta(4, 4);
        mark(&mut labels, &[(1, 1)]);

        let regions = group_regions(&mut labels, &heights, u16::MAX, u64::MAX).unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].count, 1);
        assert_eq!(labels.get(0, 0).unwrap(), LABEL_GROUND);
        assert_eq!(labels.get(1, 2).unwrap(), LABEL_GROUND);
    }

    #[test]
    fn test_height_similarity_splits_components() {
        // Two adjacent marked pixels at very different heights stay apart.
        let mut heights: Raster<u16> = Raster::filled(3, 3, 1000);
        heights.set(1, 2, 1500).unwrap();
        let mut labels: Raster<u32> = heights.with_same_meta(3, 3);
        mark(&mut labels, &[(1, 1), (1, 2)]);

        let regions = group_regions(&mut labels, &heights, 20, u64::MAX).unwrap();

        assert_eq!(regions.len(), 2);
        assert_ne!(labels.get(1, 1).unwrap(), labels.get(1, 2).unwrap());
    }

    #[test]
    fn test_diagonal_connectivity() {
        let heights: Raster<u16> = Raster::filled(4, 4, 1000);
        let mut labels: Raster<u32> = heights.with_same_meta(4, 4);
        mark(&mut labels, &[(0, 0), (1, 1), (2, 2), (3, 3)]);

        let regions = group_regions(&mut labels, &heights, 5, u64::MAX).unwrap();

        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].count, 4);
    }

    #[test]
    fn test_max_count_truncation_spawns_siblings() {
        // A long strip with a tiny cap breaks into several regions, but
        // every marked pixel ends up owned by some region.
        let heights: Raster<u16> = Raster::filled(1, 20, 1000);
        let mut labels: Raster<u32> = heights.with_same_meta(1, 20);
        let marked: Vec<(usize, usize)> = (0..20).map(|col| (0, col)).collect();
        mark(&mut labels, &marked);

        let regions = group_regions(&mut labels, &heights, 5, 3).unwrap();

        assert!(regions.len() > 1);
        let total: u64 = regions.iter().map(|r| r.count).sum();
        assert_eq!(total, 20);
        for col in 0..20 {
            assert!(labels.get(0, col).unwrap() >= FIRST_REGION_LABEL);
        }
    }

    #[test]
    fn test_partition_of_marked_pixels() {
        // Region pixel sets partition the marked set exactly.
        let mut heights: Raster<u16> = Raster::filled(8, 8, 1000);
        heights.set(4, 4, 1300).unwrap();
        let mut labels: Raster<u32> = heights.with_same_meta(8, 8);
        let marked = [(0, 0), (0, 1), (1, 0), (4, 4), (6, 6), (6, 7)];
        mark(&mut labels, &marked);

        let regions = group_regions(&mut labels, &heights, 10, u64::MAX).unwrap();

        let mut recovered = 0u64;
        for region in &regions {
            for row in region.ymin..=region.ymax {
                for col in region.xmin..=region.xmax {
                    if labels.get(row, col).unwrap() == region.label {
                        recovered += 1;
                        assert!(marked.contains(&(row, col)));
                    }
                }
            }
        }
        assert_eq!(recovered, marked.len() as u64);
    }
}
