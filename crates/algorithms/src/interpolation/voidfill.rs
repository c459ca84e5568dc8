//! Multi-resolution void filling for height rasters
//!
//! Void cells (value 0) are estimated from a half-resolution mean pyramid:
//! each parent cell averages its non-void children, levels are stacked until
//! the voids disappear, and values propagate back down into the holes. The
//! estimate is coarse but cheap, and the classification passes that call it
//! only need a plausible local ground, not a faithful interpolant.

use groundsift_core::Raster;
use ndarray::Array2;

/// Fill void (zero) cells from a half-resolution mean pyramid.
///
/// A raster without voids is returned unchanged, as is a raster without any
/// measurement. With `no_smoothing` set, non-void cells are preserved
/// bit-exact and only voids are written; otherwise a 3x3 clamped mean pass
/// runs over the whole raster after filling. Output values stay within the
/// min/max of the non-void input.
pub fn fill_voids_pyramid(raster: &mut Raster<u16>, no_smoothing: bool) {
    let (rows, cols) = raster.shape();
    if rows == 0 || cols == 0 {
        return;
    }
    if !raster.data().iter().any(|&v| v == 0) {
        return;
    }
    if raster.data().iter().all(|&v| v == 0) {
        return;
    }

    let mut levels: Vec<Array2<u16>> = vec![raster.data().clone()];
    loop {
        let top = match levels.last() {
            Some(level) => level,
            None => break,
        };
        let done = !top.iter().any(|&v| v == 0) || (top.nrows() <= 1 && top.ncols() <= 1);
        if done {
            break;
        }
        levels.push(downsample(top));
    }

    // Walk back down, handing each void its parent's estimate.
    for k in (0..levels.len() - 1).rev() {
        let (fine_levels, coarse_levels) = levels.split_at_mut(k + 1);
        let fine = &mut fine_levels[k];
        let coarse = &coarse_levels[0];
        for row in 0..fine.nrows() {
            for col in 0..fine.ncols() {
                if fine[(row, col)] == 0 {
                    let parent = coarse[(row / 2, col / 2)];
                    if parent != 0 {
                        fine[(row, col)] = parent;
                    }
                }
            }
        }
    }

    *raster.data_mut() = levels.swap_remove(0);

    if !no_smoothing {
        smooth(raster);
    }
}

/// Halve a level, averaging the non-void cells of each 2x2 block.
fn downsample(level: &Array2<u16>) -> Array2<u16> {
    let rows = level.nrows().div_ceil(2);
    let cols = level.ncols().div_ceil(2);

    Array2::from_shape_fn((rows, cols), |(row, col)| {
        let mut sum = 0.0f64;
        let mut count = 0u32;
        for dr in 0..2 {
            for dc in 0..2 {
                let r = row * 2 + dr;
                let c = col * 2 + dc;
                if r < level.nrows() && c < level.ncols() {
                    let value = level[(r, c)];
                    if value != 0 {
                        sum += value as f64;
                        count += 1;
                    }
                }
            }
        }
        if count == 0 {
            0
        } else {
            (sum / count as f64).round() as u16
        }
    })
}

/// 3x3 clamped mean over every cell.
fn smooth(raster: &mut Raster<u16>) {
    let (rows, cols) = raster.shape();
    let source = raster.data().clone();

    for row in 0..rows {
        for col in 0..cols {
            let mut sum = 0.0f64;
            let mut count = 0u32;
            for nr in row.saturating_sub(1)..=(row + 1).min(rows - 1) {
                for nc in col.saturating_sub(1)..=(col + 1).min(cols - 1) {
                    sum += source[(nr, nc)] as f64;
                    count += 1;
                }
            }
            let mean = (sum / count as f64).round() as u16;
            unsafe { raster.set_unchecked(row, col, mean) };
        }
    }
}
