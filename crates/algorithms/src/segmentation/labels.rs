//! Label values used by the segmentation passes

use groundsift_core::Raster;

/// Pixel classified as ground. Void pixels also carry this value; the
/// distinction lives in a parallel u8 void mask where one is retained.
pub const LABEL_GROUND: u32 = 0;

/// Generic non-ground marker. Boundary labeling writes it, region growing
/// seeds from it, and it is the terminal value after each pass.
pub const LABEL_NONGROUND: u32 = 1;

/// First value handed out by the region-label counter.
pub const FIRST_REGION_LABEL: u32 = 2;

// Scratch sentinels are parked at the top of the u32 range so the
// monotonically assigned region labels can never collide with them. They
// must not survive past `finish_label_image`.

/// Scratch: candidate picked up during boundary extension or the closure
/// step of the containment fill.
pub(crate) const LABEL_TEMP: u32 = u32::MAX;

/// Scratch: pixel passed the row scan of the containment fill.
pub(crate) const LABEL_ROW_ACCEPTED: u32 = u32::MAX - 1;

/// Scratch: pixel passed both containment scans.
pub(crate) const LABEL_ACCEPTED: u32 = u32::MAX - 2;

/// Terminal per-region value written by the containment fill.
pub(crate) const LABEL_OBJECT: u32 = u32::MAX - 3;

/// Largest value the region-label counter may reach.
pub(crate) const MAX_REGION_LABEL: u32 = u32::MAX - 4;

/// Collapse every non-ground value to `LABEL_NONGROUND`.
///
/// Region identifiers and leftover scratch sentinels all fold into the
/// generic marker; ground stays untouched. Idempotent.
pub fn finish_label_image(labels: &mut Raster<u32>) {
    for value in labels.data_mut().iter_mut() {
        if *value != LABEL_GROUND {
            *value = LABEL_NONGROUND;
        }
    }
}
