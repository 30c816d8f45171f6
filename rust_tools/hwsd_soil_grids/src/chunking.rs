use crate::error::{Result, SoilGridError};
use log::debug;

/// A contiguous range of full-width raster rows, `[y_min, y_max)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowBlock {
    pub y_min: usize,
    pub y_max: usize,
}

impl RowBlock {
    pub fn height(&self) -> usize {
        self.y_max - self.y_min
    }
}

/// Partition of a raster's rows into blocks of `block_rows`; the last block may be shorter.
pub struct RowBlockGrid {
    raster_height: usize,
    block_rows: usize,
    pub num_blocks: usize,
}

impl RowBlockGrid {
    pub fn new(raster_height: usize, block_rows: usize) -> Result<Self> {
        if block_rows == 0 {
            return Err(SoilGridError::InvalidBlockSize(block_rows));
        }

        let num_blocks = raster_height.div_ceil(block_rows);

        debug!(
            "RowBlockGrid: {} rows, block_rows={} → {} blocks",
            raster_height, block_rows, num_blocks
        );

        Ok(Self {
            raster_height,
            block_rows,
            num_blocks,
        })
    }

    pub fn iter(&self) -> RowBlockIterator<'_> {
        RowBlockIterator::new(self)
    }

    pub fn get_block(&self, block_idx: usize) -> RowBlock {
        let y_min = block_idx * self.block_rows;
        let y_max = ((block_idx + 1) * self.block_rows).min(self.raster_height);
        RowBlock { y_min, y_max }
    }
}

/// Yields blocks in strictly increasing row order
pub struct RowBlockIterator<'a> {
    grid: &'a RowBlockGrid,
    current_idx: usize,
}

impl<'a> RowBlockIterator<'a> {
    fn new(grid: &'a RowBlockGrid) -> Self {
        Self {
            grid,
            current_idx: 0,
        }
    }
}

impl<'a> Iterator for RowBlockIterator<'a> {
    type Item = (usize, RowBlock);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_idx < self.grid.num_blocks {
            let block = self.grid.get_block(self.current_idx);
            let idx = self.current_idx;
            self.current_idx += 1;
            Some((idx, block))
        } else {
            None
        }
    }
}
