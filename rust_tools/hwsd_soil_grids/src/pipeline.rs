use crate::area::{aggregate_source, CoarseStats};
use crate::attributes::aggregate;
use crate::config::PipelineConfig;
use crate::crs::{check_area_mean_assumption, detect_grid_crs, same_crs};
use crate::database::AttributeStore;
use crate::error::{Result, SoilGridError};
use crate::gtiff::creation_options;
use crate::index::UnitIndex;
use crate::io::{
    write_netcdf, GdalIdentifierSource, GdalValueSink, GdalValueSource, OutputVariable,
    RasterMetadata, BULK_DENSITY_VARIABLE, SOC_VARIABLE,
};
use crate::regrid::{regrid, RegridStats};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub component_records: usize,
    pub mapping_units: usize,
    pub regrid: RegridStats,
    pub coarse_bulk_density: CoarseStats,
    pub coarse_soc: CoarseStats,
}

/// Output files written under a temporary name and renamed into place on commit.
///
/// Dropping without committing removes whatever was written, so an aborted run
/// leaves no output behind.
struct StagedOutputs {
    staged: Vec<(PathBuf, PathBuf)>,
    committed: bool,
}

impl StagedOutputs {
    fn new(finals: &[&PathBuf]) -> Self {
        let staged = finals
            .iter()
            .map(|path| (partial_path(path), (*path).clone()))
            .collect();
        Self {
            staged,
            committed: false,
        }
    }

    fn partial<'a>(&'a self, final_path: &'a Path) -> &'a Path {
        self.staged
            .iter()
            .find(|(_, f)| f == final_path)
            .map(|(p, _)| p.as_path())
            .unwrap_or(final_path)
    }

    /// Rename every partial into place; if any rename fails, the ones already
    /// renamed are removed again so no final output survives.
    fn commit(mut self) -> Result<()> {
        let mut renamed: Vec<&Path> = Vec::with_capacity(self.staged.len());
        for (partial, final_path) in &self.staged {
            if let Err(e) = std::fs::rename(partial, final_path) {
                for path in &renamed {
                    if let Err(remove_err) = std::fs::remove_file(path) {
                        warn!("Could not remove output {}: {}", path.display(), remove_err);
                    }
                }
                return Err(e.into());
            }
            renamed.push(final_path);
        }

        for path in &renamed {
            info!("Wrote {}", path.display());
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedOutputs {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for (partial, _) in &self.staged {
            if partial.exists() {
                match std::fs::remove_file(partial) {
                    Ok(()) => debug!("Removed incomplete output {}", partial.display()),
                    Err(e) => warn!("Could not remove incomplete output {}: {}", partial.display(), e),
                }
            }
        }
    }
}

/// `<path>.partial`
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Load attributes and build the unit index; the database is closed on return
fn build_index(config: &PipelineConfig) -> Result<(UnitIndex, usize)> {
    let store = AttributeStore::open(&config.database)?;

    if config.list_soil_types {
        let listing = store.soil_type_listing(&config.schema)?;
        info!("{} soil types in {}", listing.len(), config.schema.soil_unit_table);
        for entry in &listing {
            info!(
                "  {:<8} {} mapping units",
                entry.code.as_deref().unwrap_or("<none>"),
                entry.units
            );
        }
    }

    let records = store.load_components(&config.schema)?;
    let summaries = aggregate(&records);
    Ok((UnitIndex::from_summaries(&summaries), records.len()))
}

fn ensure_crs(expected: &RasterMetadata, written: &str, path: &Path) -> Result<()> {
    if !same_crs(&expected.projection, written) {
        return Err(SoilGridError::CrsMismatch(path.display().to_string()));
    }
    Ok(())
}

fn coarsen(
    native: &Path,
    staged_native: &Path,
    staged_coarse: &Path,
    input: &RasterMetadata,
    factor: usize,
    variable: OutputVariable,
) -> Result<CoarseStats> {
    let source = GdalValueSource::open(staged_native)?;
    ensure_crs(input, &source.metadata().projection, native)?;

    let mut sink = GdalValueSink::create_in_memory(&input.coarsened(factor), variable)?;
    let stats = aggregate_source(&source, factor, &mut sink)?;

    let written = write_netcdf(&sink.into_dataset(), staged_coarse)?;
    ensure_crs(input, &written.projection(), staged_coarse)?;
    Ok(stats)
}

/// Run the whole pipeline: attributes → unit index → native rasters → coarse rasters
pub fn run(config: &PipelineConfig) -> Result<RunSummary> {
    config.validate()?;

    let (index, component_records) = build_index(config)?;

    let source = GdalIdentifierSource::open(&config.raster, config.nodata)?;
    let metadata = source.metadata().clone();
    config.validate_for_raster(metadata.width, metadata.height)?;
    check_area_mean_assumption(detect_grid_crs(&metadata.projection));

    let outputs = &config.outputs;
    let staged = StagedOutputs::new(&outputs.all());
    let options = creation_options(&config.compression, config.tile_size);

    let regrid_stats = {
        let mut bd_sink = GdalValueSink::create_geotiff(
            staged.partial(&outputs.bulk_density),
            &metadata,
            BULK_DENSITY_VARIABLE,
            &options,
        )?;
        let mut soc_sink = GdalValueSink::create_geotiff(
            staged.partial(&outputs.soc),
            &metadata,
            SOC_VARIABLE,
            &options,
        )?;
        regrid(&source, &index, config.block_rows, &mut bd_sink, &mut soc_sink)?
        // Sinks drop here, closing the GeoTIFFs before they are read back
    };
    drop(source);

    let coarse_bulk_density = coarsen(
        &outputs.bulk_density,
        staged.partial(&outputs.bulk_density),
        staged.partial(&outputs.coarse_bulk_density),
        &metadata,
        config.factor,
        BULK_DENSITY_VARIABLE,
    )?;
    let coarse_soc = coarsen(
        &outputs.soc,
        staged.partial(&outputs.soc),
        staged.partial(&outputs.coarse_soc),
        &metadata,
        config.factor,
        SOC_VARIABLE,
    )?;

    staged.commit()?;

    Ok(RunSummary {
        component_records,
        mapping_units: index.len(),
        regrid: regrid_stats,
        coarse_bulk_density,
        coarse_soc,
    })
}
