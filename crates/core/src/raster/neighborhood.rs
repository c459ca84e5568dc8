//! Neighborhood offsets for raster scans

/// 8-connected (queen) neighbor offsets as (row, col), in row-major order.
///
/// Scans that need the center cell as well iterate the clamped range
/// directly; this table is for loops that must skip it.
pub const QUEEN_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];
