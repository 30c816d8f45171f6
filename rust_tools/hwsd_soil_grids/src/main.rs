use clap::Parser;
use env_logger::Env;
use log::info;

use hwsd_soil_grids::cli::Args;
use hwsd_soil_grids::{pipeline, PipelineConfig, Result};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== HWSD Soil Grids ===");

    let config = PipelineConfig::from_args(args)?;
    info!("Identifier raster: {}", config.raster.display());
    info!("Attribute database: {}", config.database.display());
    info!(
        "Block rows: {}, downscale factor: {}",
        config.block_rows, config.factor
    );

    let summary = pipeline::run(&config)?;

    info!(
        "{} component records → {} mapping units",
        summary.component_records, summary.mapping_units
    );
    info!(
        "Native grid: {} cells in {} blocks, {} unmatched identifiers",
        summary.regrid.cells, summary.regrid.blocks, summary.regrid.unmatched_ids
    );
    info!(
        "Coarse grid: {}x{}, {} bulk density and {} SOC cells without data",
        summary.coarse_soc.cols,
        summary.coarse_soc.rows,
        summary.coarse_bulk_density.missing_cells,
        summary.coarse_soc.missing_cells
    );

    info!("=== Done! ===");
    Ok(())
}
