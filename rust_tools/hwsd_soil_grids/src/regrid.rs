use crate::chunking::RowBlockGrid;
use crate::error::{Result, SoilGridError};
use crate::index::UnitIndex;
use crate::raster::{IdentifierSource, ValueSink};
use log::{debug, info, warn};

/// Counters collected while regridding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegridStats {
    pub blocks: usize,
    pub cells: usize,
    pub missing_bulk_density: usize,
    pub missing_soc: usize,
    /// Non-zero identifiers with no attribute entry
    pub unmatched_ids: usize,
}

/// Translate an identifier raster into bulk density and SOC rasters, one row block at a time.
///
/// Blocks are read and written in increasing row order. Any read or write
/// failure aborts the whole pass; the sinks then hold an incomplete raster that
/// callers must discard.
pub fn regrid<S, B, C>(
    source: &S,
    index: &UnitIndex,
    block_rows: usize,
    bulk_density: &mut B,
    soc: &mut C,
) -> Result<RegridStats>
where
    S: IdentifierSource + ?Sized,
    B: ValueSink + ?Sized,
    C: ValueSink + ?Sized,
{
    let (height, width) = source.shape();
    if width == 0 || height == 0 {
        return Err(SoilGridError::InvalidDimensions(width, height));
    }

    let grid = RowBlockGrid::new(height, block_rows)?;
    info!(
        "Regridding {}x{} raster in {} blocks of up to {} rows",
        width, height, grid.num_blocks, block_rows
    );

    let mut stats = RegridStats::default();

    for (block_idx, block) in grid.iter() {
        let ids = source.read_rows(&block)?;
        let resolved = index.resolve_block(ids.view());

        bulk_density.write_rows(&block, &resolved.bulk_density)?;
        soc.write_rows(&block, &resolved.soc)?;

        stats.blocks += 1;
        stats.cells += ids.len();
        stats.missing_bulk_density += resolved.bulk_density.iter().filter(|v| v.is_none()).count();
        stats.missing_soc += resolved.soc.iter().filter(|v| v.is_none()).count();
        stats.unmatched_ids += resolved.unmatched;

        debug!(
            "Block {}/{} rows [{}, {}): {} unmatched ids",
            block_idx + 1,
            grid.num_blocks,
            block.y_min,
            block.y_max,
            resolved.unmatched
        );
    }

    if stats.unmatched_ids > 0 {
        warn!(
            "{} cells reference mapping units absent from the attribute table; written as no data",
            stats.unmatched_ids
        );
    }
    info!(
        "Regridded {} cells: {} without bulk density, {} without SOC",
        stats.cells, stats.missing_bulk_density, stats.missing_soc
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::RowBlock;
    use crate::raster::MemoryRaster;
    use crate::records::MappingUnitSummary;
    use ndarray::{arr2, Array2};

    fn index() -> UnitIndex {
        UnitIndex::from_summaries(&[
            MappingUnitSummary {
                mapping_unit_id: 7,
                bulk_density: Some(1.4),
                soil_organic_carbon: Some(2.0),
            },
            MappingUnitSummary {
                mapping_unit_id: 8,
                bulk_density: Some(1.1),
                soil_organic_carbon: None,
            },
        ])
    }

    fn run(ids: &Array2<i32>, block_rows: usize) -> (Array2<Option<f32>>, Array2<Option<f32>>, RegridStats) {
        let (rows, cols) = ids.dim();
        let mut bd = MemoryRaster::new(rows, cols);
        let mut soc = MemoryRaster::new(rows, cols);
        let stats = regrid(ids, &index(), block_rows, &mut bd, &mut soc).unwrap();
        assert!(bd.is_complete() && soc.is_complete());
        (bd.into_inner(), soc.into_inner(), stats)
    }

    fn sample_ids() -> Array2<i32> {
        arr2(&[
            [7, 7, 8, 0, 99],
            [0, 7, 7, 8, 8],
            [99, 0, 0, 7, 7],
            [8, 8, 7, 7, 0],
            [7, 99, 8, 0, 7],
            [0, 0, 7, 8, 7],
            [7, 8, 99, 7, 0],
        ])
    }

    #[test]
    fn test_block_size_does_not_change_output() {
        let ids = sample_ids();
        let (bd_whole, soc_whole, _) = run(&ids, ids.nrows());

        for block_rows in 1..=ids.nrows() + 2 {
            let (bd, soc, stats) = run(&ids, block_rows);
            assert_eq!(bd, bd_whole, "bulk density differs with block_rows={}", block_rows);
            assert_eq!(soc, soc_whole, "SOC differs with block_rows={}", block_rows);
            assert_eq!(stats.cells, 35);
        }
    }

    #[test]
    fn test_stats() {
        let (_, _, stats) = run(&sample_ids(), 3);
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.unmatched_ids, 4);
        // zeros + unmatched ids
        assert_eq!(stats.missing_bulk_density, 9 + 4);
        // plus every cell of unit 8
        assert_eq!(stats.missing_soc, 9 + 4 + 8);
    }

    #[test]
    fn test_uniform_identifier() {
        let ids = Array2::from_elem((4, 4), 7);
        let (bd, soc, _) = run(&ids, 3);
        assert!(bd.iter().all(|v| *v == Some(1.4)));
        assert!(soc.iter().all(|v| *v == Some(2.0)));
    }

    #[test]
    fn test_all_no_data() {
        let ids = Array2::zeros((4, 4));
        let (bd, soc, stats) = run(&ids, 2);
        assert!(bd.iter().all(Option::is_none));
        assert!(soc.iter().all(Option::is_none));
        assert_eq!(stats.unmatched_ids, 0);
    }

    #[test]
    fn test_zero_block_rows_rejected() {
        let ids = Array2::from_elem((2, 2), 7);
        let mut bd = MemoryRaster::new(2, 2);
        let mut soc = MemoryRaster::new(2, 2);
        let result = regrid(&ids, &index(), 0, &mut bd, &mut soc);
        assert!(matches!(result, Err(SoilGridError::InvalidBlockSize(0))));
    }

    struct FailingSource;

    impl IdentifierSource for FailingSource {
        fn shape(&self) -> (usize, usize) {
            (4, 2)
        }

        fn read_rows(&self, block: &RowBlock) -> Result<Array2<i32>> {
            if block.y_min >= 2 {
                return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated").into());
            }
            Ok(Array2::from_elem((block.height(), 2), 7))
        }
    }

    /// Accepts the first block, then fails every write
    struct FailingSink {
        writes: usize,
    }

    impl ValueSink for FailingSink {
        fn write_rows(&mut self, _block: &RowBlock, _values: &Array2<Option<f32>>) -> Result<()> {
            self.writes += 1;
            if self.writes > 1 {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
            }
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_aborts() {
        let ids = Array2::from_elem((4, 2), 7);
        let mut bd = MemoryRaster::new(4, 2);
        let mut soc = FailingSink { writes: 0 };
        let result = regrid(&ids, &index(), 1, &mut bd, &mut soc);

        assert!(matches!(result, Err(SoilGridError::Io(_))));
        assert_eq!(soc.writes, 2);
        // Stopped after the second block; nothing past it was read or written
        assert!(!bd.is_complete());
    }

    #[test]
    fn test_read_failure_aborts() {
        let mut bd = MemoryRaster::new(4, 2);
        let mut soc = MemoryRaster::new(4, 2);
        let result = regrid(&FailingSource, &index(), 1, &mut bd, &mut soc);
        assert!(matches!(result, Err(SoilGridError::Io(_))));
        assert!(!bd.is_complete());
    }
}
