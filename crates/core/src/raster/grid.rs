//! The raster grid

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use ndarray::Array2;

/// A dense 2-D grid of cells with georeferencing and a nodata sentinel.
///
/// Cells are addressed as (row, col) in row-major order. Every raster
/// carries a nodata sentinel from the moment it is built; for the integer
/// cell types this pipeline uses, that sentinel is `0`, so freshly
/// allocated rasters start out all-nodata.
///
/// Access comes in three flavors, matching how the passes read rasters:
/// - checked `get`/`set` returning [`Error::OutOfBounds`] for callers that
///   have not proven their indices
/// - `get_unchecked`/`set_unchecked` for hot loops whose bounds are
///   established by the enclosing scan
/// - `clamped`, the border policy of the whole pipeline: an offset that
///   runs off the grid reads the nearest edge cell instead of wrapping or
///   being skipped
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    nodata: T,
}

impl<T: RasterElement> Raster<T> {
    fn wrap(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: T::NODATA,
        }
    }

    /// Allocate a `rows x cols` grid of zeroed cells
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::wrap(Array2::zeros((rows, cols)))
    }

    /// Allocate a grid with every cell set to `value`
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::wrap(Array2::from_elem((rows, cols), value))
    }

    /// Take ownership of a row-major buffer as a grid
    pub fn from_vec(cells: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        let len = cells.len();
        let data = Array2::from_shape_vec((rows, cols), cells)
            .map_err(|_| Error::BufferSize { len, rows, cols })?;
        Ok(Self::wrap(data))
    }

    /// Zeroed grid of another cell type, placed like this raster.
    ///
    /// This is how the pipeline derives its label and void-mask companions
    /// from a height raster.
    pub fn with_same_meta<U: RasterElement>(&self, rows: usize, cols: usize) -> Raster<U> {
        Raster {
            data: Array2::zeros((rows, cols)),
            transform: self.transform,
            nodata: U::NODATA,
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Checked read
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or_else(|| self.out_of_bounds(row, col))
    }

    /// Checked write
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(self.out_of_bounds(row, col)),
        }
    }

    /// Unchecked read for hot loops
    ///
    /// # Safety
    /// `row < self.rows()` and `col < self.cols()`.
    #[inline]
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Unchecked write for hot loops
    ///
    /// # Safety
    /// `row < self.rows()` and `col < self.cols()`.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, row: usize, col: usize, value: T) {
        unsafe { *self.data.uget_mut((row, col)) = value }
    }

    /// Whether a signed (row, col) pair addresses a cell of this grid
    pub fn in_bounds(&self, row: isize, col: isize) -> bool {
        (0..self.rows() as isize).contains(&row) && (0..self.cols() as isize).contains(&col)
    }

    /// Cell index at offset (dr, dc) from (row, col), clamped to the grid
    #[inline]
    pub fn clamp_offset(&self, row: usize, col: usize, dr: isize, dc: isize) -> (usize, usize) {
        let r = (row as isize + dr).clamp(0, self.rows() as isize - 1);
        let c = (col as isize + dc).clamp(0, self.cols() as isize - 1);
        (r as usize, c as usize)
    }

    /// Read the neighbor at offset (dr, dc), clamping at the border.
    ///
    /// Near the edge the clamped neighbor can coincide with the center
    /// cell; the passes rely on that rather than guarding against it.
    #[inline]
    pub fn clamped(&self, row: usize, col: usize, dr: isize, dc: isize) -> T {
        let (r, c) = self.clamp_offset(row, col, dr, dc);
        unsafe { self.get_unchecked(r, c) }
    }

    /// Underlying array, for whole-raster sweeps
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Mutable underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// The nodata sentinel, `0` for integer cell types
    pub fn nodata(&self) -> T {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: T) {
        self.nodata = nodata;
    }

    /// Whether `value` counts as nodata for this raster
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Ground sample distance in metres per pixel
    pub fn gsd(&self) -> f64 {
        self.transform.gsd()
    }

    fn out_of_bounds(&self, row: usize, col: usize) -> Error {
        Error::OutOfBounds {
            row,
            col,
            rows: self.rows(),
            cols: self.cols(),
        }
    }
}
