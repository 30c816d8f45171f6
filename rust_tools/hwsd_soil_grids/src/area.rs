use crate::chunking::{RowBlock, RowBlockGrid};
use crate::error::{Result, SoilGridError};
use crate::raster::{ValueSink, ValueSource};
use log::{debug, info};
use ndarray::{s, Array2, ArrayView2};

/// Counters collected while aggregating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoarseStats {
    pub rows: usize,
    pub cols: usize,
    pub missing_cells: usize,
}

/// Coarse grid shape for a `rows`x`cols` raster; partial edge blocks get their own cell
pub fn coarse_shape(rows: usize, cols: usize, factor: usize) -> (usize, usize) {
    (rows.div_ceil(factor), cols.div_ceil(factor))
}

/// Reject a factor that is zero or exceeds either raster dimension
pub fn validate_factor(rows: usize, cols: usize, factor: usize) -> Result<()> {
    if factor == 0 || factor > rows || factor > cols {
        return Err(SoilGridError::InvalidDownscaleFactor {
            factor,
            width: cols,
            height: rows,
        });
    }
    Ok(())
}

/// Mean of the non-missing values; `None` if there are none.
///
/// Accumulates in f64, so a block of identical values yields that value exactly.
fn block_mean<'a>(values: impl Iterator<Item = &'a Option<f32>>) -> Option<f32> {
    let (sum, count) = values
        .flatten()
        .fold((0.0f64, 0usize), |(sum, count), &v| (sum + f64::from(v), count + 1));

    if count == 0 {
        None
    } else {
        Some((sum / count as f64) as f32)
    }
}

/// Aggregate a band of at most `factor` full-width rows into one coarse row
pub fn aggregate_band(band: ArrayView2<Option<f32>>, factor: usize) -> Array2<Option<f32>> {
    let (_, cols) = band.dim();
    let (_, coarse_cols) = coarse_shape(1, cols, factor);

    Array2::from_shape_fn((1, coarse_cols), |(_, cx)| {
        let x_min = cx * factor;
        let x_max = (x_min + factor).min(cols);
        block_mean(band.slice(s![.., x_min..x_max]).iter())
    })
}

/// Downsample a whole in-memory raster by block mean
pub fn aggregate(raster: ArrayView2<Option<f32>>, factor: usize) -> Result<Array2<Option<f32>>> {
    let (rows, cols) = raster.dim();
    validate_factor(rows, cols, factor)?;

    let (coarse_rows, coarse_cols) = coarse_shape(rows, cols, factor);
    let coarse = Array2::from_shape_fn((coarse_rows, coarse_cols), |(cy, cx)| {
        let y_min = cy * factor;
        let x_min = cx * factor;
        let block = raster.slice(s![
            y_min..(y_min + factor).min(rows),
            x_min..(x_min + factor).min(cols)
        ]);
        block_mean(block.iter())
    });

    Ok(coarse)
}

/// Stream `source` in bands of `factor` rows and write one coarse row per band to `sink`
pub fn aggregate_source<S, K>(source: &S, factor: usize, sink: &mut K) -> Result<CoarseStats>
where
    S: ValueSource + ?Sized,
    K: ValueSink + ?Sized,
{
    let (rows, cols) = source.shape();
    validate_factor(rows, cols, factor)?;

    let (coarse_rows, coarse_cols) = coarse_shape(rows, cols, factor);
    info!(
        "Aggregating {}x{} raster by factor {} → {}x{}",
        cols, rows, factor, coarse_cols, coarse_rows
    );

    let grid = RowBlockGrid::new(rows, factor)?;
    let mut stats = CoarseStats {
        rows: coarse_rows,
        cols: coarse_cols,
        missing_cells: 0,
    };

    for (coarse_row, band_rows) in grid.iter() {
        let band = source.read_rows(&band_rows)?;
        let coarse = aggregate_band(band.view(), factor);
        stats.missing_cells += coarse.iter().filter(|v| v.is_none()).count();

        sink.write_rows(
            &RowBlock {
                y_min: coarse_row,
                y_max: coarse_row + 1,
            },
            &coarse,
        )?;

        debug!("Coarse row {}/{} done", coarse_row + 1, coarse_rows);
    }

    info!(
        "Coarse grid: {} of {} cells without data",
        stats.missing_cells,
        coarse_rows * coarse_cols
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::MemoryRaster;
    use ndarray::arr2;

    #[test]
    fn test_uniform_block_is_exact() {
        let raster = Array2::from_elem((4, 4), Some(1.4f32));
        let coarse = aggregate(raster.view(), 4).unwrap();
        assert_eq!(coarse.dim(), (1, 1));
        assert_eq!(coarse[[0, 0]], Some(1.4f32));
    }

    #[test]
    fn test_all_missing_block_is_missing() {
        let raster: Array2<Option<f32>> = Array2::from_elem((3, 3), None);
        let coarse = aggregate(raster.view(), 3).unwrap();
        assert_eq!(coarse[[0, 0]], None);
    }

    #[test]
    fn test_missing_cells_are_ignored() {
        let raster: Array2<Option<f32>> = arr2(&[
            [Some(1.0), None, Some(5.0), Some(5.0)],
            [Some(3.0), None, Some(5.0), None],
        ]);
        let coarse = aggregate(raster.view(), 2).unwrap();
        let expected: Array2<Option<f32>> = arr2(&[[Some(2.0), Some(5.0)]]);
        assert_eq!(coarse, expected);
    }

    #[test]
    fn test_partial_edge_blocks() {
        let raster: Array2<Option<f32>> = arr2(&[
            [Some(1.0), Some(1.0), Some(4.0)],
            [Some(1.0), Some(1.0), Some(6.0)],
            [Some(2.0), Some(4.0), None],
        ]);
        let coarse = aggregate(raster.view(), 2).unwrap();
        let expected: Array2<Option<f32>> = arr2(&[[Some(1.0), Some(5.0)], [Some(3.0), None]]);
        assert_eq!(coarse, expected);
    }

    #[test]
    fn test_invalid_factor() {
        let raster: Array2<Option<f32>> = Array2::from_elem((4, 6), None);
        assert!(matches!(
            aggregate(raster.view(), 0),
            Err(SoilGridError::InvalidDownscaleFactor { factor: 0, .. })
        ));
        assert!(matches!(
            aggregate(raster.view(), 5),
            Err(SoilGridError::InvalidDownscaleFactor { factor: 5, width: 6, height: 4 })
        ));
    }

    #[test]
    fn test_coarse_shape() {
        assert_eq!(coarse_shape(21600, 43200, 120), (180, 360));
        assert_eq!(coarse_shape(5, 7, 2), (3, 4));
        assert_eq!(coarse_shape(5, 7, usize::MAX), (1, 1));
    }

    #[test]
    fn test_streaming_matches_in_memory() {
        let raster: Array2<Option<f32>> = Array2::from_shape_fn((7, 5), |(r, c)| {
            if (r + c) % 3 == 0 {
                None
            } else {
                Some((r * 5 + c) as f32 * 0.25)
            }
        });
        let expected = aggregate(raster.view(), 2).unwrap();

        let (rows, cols) = expected.dim();
        let mut sink = MemoryRaster::new(rows, cols);
        let stats = aggregate_source(&raster, 2, &mut sink).unwrap();

        assert!(sink.is_complete());
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.cols, 3);
        assert_eq!(stats.missing_cells, expected.iter().filter(|v| v.is_none()).count());
        assert_eq!(sink.into_inner(), expected);
    }
}
