use crate::area::validate_factor;
use crate::cli::Args;
use crate::error::{Result, SoilGridError};
use crate::gtiff::{validate_compression, validate_tile_size};
use std::path::PathBuf;

/// Which pair of bulk density columns feeds the aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkDensitySource {
    /// `T_BULK_DENSITY` / `S_BULK_DENSITY`
    Measured,
    /// `T_REF_BULK_DENSITY` / `S_REF_BULK_DENSITY`
    Reference,
}

impl BulkDensitySource {
    pub fn columns(&self) -> (&'static str, &'static str) {
        match self {
            BulkDensitySource::Measured => ("T_BULK_DENSITY", "S_BULK_DENSITY"),
            BulkDensitySource::Reference => ("T_REF_BULK_DENSITY", "S_REF_BULK_DENSITY"),
        }
    }
}

/// Table and column names in the attribute database
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub component_table: String,
    pub soil_unit_table: String,
    pub soil_type_column: String,
    pub bulk_density: BulkDensitySource,
}

impl Default for AttributeSchema {
    fn default() -> Self {
        Self {
            component_table: "HWSD_DATA".to_string(),
            soil_unit_table: "HWSD_SMU".to_string(),
            soil_type_column: "SU_SYM90".to_string(),
            bulk_density: BulkDensitySource::Measured,
        }
    }
}

impl AttributeSchema {
    pub fn validate(&self) -> Result<()> {
        validate_sql_identifier(&self.component_table)?;
        validate_sql_identifier(&self.soil_unit_table)?;
        validate_sql_identifier(&self.soil_type_column)?;
        Ok(())
    }
}

/// Identifier rasters hold integers, so only a whole number in i32 range can mark nodata
pub fn integral_nodata(value: f64) -> Option<i32> {
    if value.fract() == 0.0 && value >= f64::from(i32::MIN) && value <= f64::from(i32::MAX) {
        Some(value as i32)
    } else {
        None
    }
}

/// Table and column names are spliced into SQL, so only plain identifiers are accepted
pub fn validate_sql_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .map(|c| c.is_ascii_alphabetic() || c == '_')
        .unwrap_or(false);
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SoilGridError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub bulk_density: PathBuf,
    pub soc: PathBuf,
    pub coarse_bulk_density: PathBuf,
    pub coarse_soc: PathBuf,
}

impl OutputPaths {
    pub fn all(&self) -> [&PathBuf; 4] {
        [
            &self.bulk_density,
            &self.soc,
            &self.coarse_bulk_density,
            &self.coarse_soc,
        ]
    }
}

/// Validated run configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub raster: PathBuf,
    pub database: PathBuf,
    pub outputs: OutputPaths,
    pub block_rows: usize,
    pub factor: usize,
    pub nodata: Option<f64>,
    pub schema: AttributeSchema,
    pub list_soil_types: bool,
    pub compression: String,
    pub tile_size: usize,
}

impl PipelineConfig {
    /// Build from command-line arguments, rejecting anything checkable without opening inputs
    pub fn from_args(args: Args) -> Result<Self> {
        let config = Self {
            raster: PathBuf::from(args.raster),
            database: PathBuf::from(args.database),
            outputs: OutputPaths {
                bulk_density: PathBuf::from(args.bulk_density_out),
                soc: PathBuf::from(args.soc_out),
                coarse_bulk_density: PathBuf::from(args.coarse_bulk_density_out),
                coarse_soc: PathBuf::from(args.coarse_soc_out),
            },
            block_rows: args.block_rows,
            factor: args.factor,
            nodata: args.nodata,
            schema: AttributeSchema {
                component_table: args.component_table,
                soil_unit_table: args.soil_unit_table,
                soil_type_column: args.soil_type_column,
                bulk_density: if args.reference_bulk_density {
                    BulkDensitySource::Reference
                } else {
                    BulkDensitySource::Measured
                },
            },
            list_soil_types: args.list_soil_types,
            compression: args.compression,
            tile_size: args.tile_size,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_rows == 0 {
            return Err(SoilGridError::InvalidBlockSize(self.block_rows));
        }
        if self.factor == 0 {
            return Err(SoilGridError::InvalidDownscaleFactor {
                factor: self.factor,
                width: 0,
                height: 0,
            });
        }
        if let Some(nodata) = self.nodata {
            if integral_nodata(nodata).is_none() {
                return Err(SoilGridError::InvalidNodata(nodata));
            }
        }
        self.validate_paths()?;
        self.schema.validate()?;
        validate_compression(&self.compression)?;
        validate_tile_size(self.tile_size)?;
        Ok(())
    }

    /// Every output must be distinct from the other outputs and from both inputs
    fn validate_paths(&self) -> Result<()> {
        let mut seen: Vec<&PathBuf> = vec![&self.raster, &self.database];
        for path in self.outputs.all() {
            if seen.contains(&path) {
                return Err(SoilGridError::DuplicatePath(path.display().to_string()));
            }
            seen.push(path);
        }
        Ok(())
    }

    /// Checks that need the raster dimensions
    pub fn validate_for_raster(&self, width: usize, height: usize) -> Result<()> {
        validate_factor(height, width, self.factor)
    }
}
