//! Raster element trait for generic cell values

use num_traits::Zero;
use std::fmt::Debug;

/// Cell types a raster can hold.
///
/// Integer cells use `0` as the nodata sentinel, matching the height-raster
/// convention ("no measurement" is stored as zero); float cells use NaN.
pub trait RasterElement: Copy + Debug + PartialOrd + Zero + Send + Sync + 'static {
    /// Sentinel stored in cells with no measurement
    const NODATA: Self;

    /// Whether `self` counts as nodata against the given sentinel.
    ///
    /// NaN is nodata regardless of the sentinel, which is what makes this a
    /// method rather than a plain comparison.
    fn is_nodata(&self, sentinel: Self) -> bool {
        self.partial_cmp(self).is_none() || *self == sentinel
    }
}

macro_rules! raster_element {
    ($($t:ty => $nodata:expr),* $(,)?) => {
        $(impl RasterElement for $t {
            const NODATA: Self = $nodata;
        })*
    };
}

raster_element!(
    u8 => 0,
    u16 => 0,
    u32 => 0,
    u64 => 0,
    f32 => f32::NAN,
    f64 => f64::NAN,
);
