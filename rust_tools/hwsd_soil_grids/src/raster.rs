// Row-block access to rasters, independent of the storage backend

use crate::chunking::RowBlock;
use crate::error::{Result, SoilGridError};
use ndarray::{s, Array2};

/// A raster of mapping-unit identifiers readable one row block at a time
pub trait IdentifierSource {
    /// (rows, cols)
    fn shape(&self) -> (usize, usize);
    fn read_rows(&self, block: &RowBlock) -> Result<Array2<i32>>;
}

/// A raster of optional values readable one row block at a time
pub trait ValueSource {
    /// (rows, cols)
    fn shape(&self) -> (usize, usize);
    fn read_rows(&self, block: &RowBlock) -> Result<Array2<Option<f32>>>;
}

/// A raster written one row block at a time, in increasing row order
pub trait ValueSink {
    fn write_rows(&mut self, block: &RowBlock, values: &Array2<Option<f32>>) -> Result<()>;
}

impl IdentifierSource for Array2<i32> {
    fn shape(&self) -> (usize, usize) {
        self.dim()
    }

    fn read_rows(&self, block: &RowBlock) -> Result<Array2<i32>> {
        Ok(self.slice(s![block.y_min..block.y_max, ..]).to_owned())
    }
}

impl ValueSource for Array2<Option<f32>> {
    fn shape(&self) -> (usize, usize) {
        self.dim()
    }

    fn read_rows(&self, block: &RowBlock) -> Result<Array2<Option<f32>>> {
        Ok(self.slice(s![block.y_min..block.y_max, ..]).to_owned())
    }
}

/// Tracks the next row a sequential sink expects and validates incoming blocks
#[derive(Debug, Clone)]
pub struct RowCursor {
    width: usize,
    height: usize,
    next_row: usize,
}

impl RowCursor {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            next_row: 0,
        }
    }

    pub fn next_row(&self) -> usize {
        self.next_row
    }

    pub fn is_complete(&self) -> bool {
        self.next_row == self.height
    }

    /// Check that `values` is the next block and advance past it
    pub fn advance(&mut self, block: &RowBlock, values: &Array2<Option<f32>>) -> Result<()> {
        if block.y_min != self.next_row {
            return Err(SoilGridError::OutOfOrderWrite {
                expected: self.next_row,
                actual: block.y_min,
            });
        }

        let (rows, cols) = values.dim();
        if rows != block.height() || cols != self.width || block.y_max > self.height {
            return Err(SoilGridError::BlockShapeMismatch {
                expected_rows: block.height(),
                expected_cols: self.width,
                actual_rows: rows,
                actual_cols: cols,
            });
        }

        self.next_row = block.y_max;
        Ok(())
    }
}

/// In-memory sink, used for coarse grids and tests
#[derive(Debug, Clone)]
pub struct MemoryRaster {
    data: Array2<Option<f32>>,
    cursor: RowCursor,
}

impl MemoryRaster {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), None),
            cursor: RowCursor::new(cols, rows),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    pub fn into_inner(self) -> Array2<Option<f32>> {
        self.data
    }
}

impl ValueSink for MemoryRaster {
    fn write_rows(&mut self, block: &RowBlock, values: &Array2<Option<f32>>) -> Result<()> {
        self.cursor.advance(block, values)?;
        self.data
            .slice_mut(s![block.y_min..block.y_max, ..])
            .assign(values);
        Ok(())
    }
}
