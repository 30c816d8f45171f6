use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "soil-grids")]
#[command(about = "Derive bulk density and soil organic carbon grids from the Harmonized World Soil Database")]
#[command(version)]
pub struct Args {
    /// HWSD mapping-unit identifier raster (any GDAL-readable format)
    #[arg(short, long, value_name = "FILE")]
    pub raster: String,

    /// HWSD attribute database converted to SQLite
    #[arg(short, long, value_name = "FILE")]
    pub database: String,

    /// Native-resolution bulk density output (GeoTIFF)
    #[arg(long, value_name = "FILE")]
    pub bulk_density_out: String,

    /// Native-resolution SOC output (GeoTIFF)
    #[arg(long, value_name = "FILE")]
    pub soc_out: String,

    /// Coarse bulk density output (netCDF)
    #[arg(long, value_name = "FILE")]
    pub coarse_bulk_density_out: String,

    /// Coarse SOC output (netCDF)
    #[arg(long, value_name = "FILE")]
    pub coarse_soc_out: String,

    /// Rows read per streaming block
    #[arg(long, value_name = "N", default_value_t = 2000)]
    pub block_rows: usize,

    /// Native cells per coarse cell along each axis (120 turns 30 arc-seconds into 1 degree)
    #[arg(short, long, value_name = "N", default_value_t = 120)]
    pub factor: usize,

    /// Override the identifier raster's nodata value (default: read from input)
    #[arg(long, value_name = "VALUE")]
    pub nodata: Option<f64>,

    /// Table holding one row per soil component
    #[arg(long, value_name = "NAME", default_value = "HWSD_DATA")]
    pub component_table: String,

    /// Table mapping mapping units to soil type codes
    #[arg(long, value_name = "NAME", default_value = "HWSD_SMU")]
    pub soil_unit_table: String,

    /// Soil type code column in the soil unit table
    #[arg(long, value_name = "NAME", default_value = "SU_SYM90")]
    pub soil_type_column: String,

    /// Use the reference bulk density columns instead of the measured ones
    #[arg(long)]
    pub reference_bulk_density: bool,

    /// Log the number of mapping units per soil type before processing
    #[arg(long)]
    pub list_soil_types: bool,

    /// GeoTIFF compression: DEFLATE, LZW, ZSTD or NONE
    #[arg(long, value_name = "TYPE", default_value = "DEFLATE")]
    pub compression: String,

    /// GeoTIFF tile size in pixels (multiple of 16)
    #[arg(long, value_name = "PIXELS", default_value_t = 512)]
    pub tile_size: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
