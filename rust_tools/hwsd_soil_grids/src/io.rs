use crate::chunking::RowBlock;
use crate::config::integral_nodata;
use crate::error::{Result, SoilGridError};
use crate::index::NO_DATA_ID;
use crate::raster::{IdentifierSource, RowCursor, ValueSink, ValueSource};
use gdal::cpl::CslStringList;
use gdal::raster::{Buffer, RasterBand};
use gdal::{Dataset, DriverManager, Metadata};
use log::{debug, info};
use ndarray::Array2;
use std::path::Path;

/// Nodata value declared on every float output band
pub const OUTPUT_NODATA: f32 = -9999.0;

#[derive(Debug, Clone)]
pub struct RasterMetadata {
    pub width: usize,
    pub height: usize,
    pub geotransform: [f64; 6],
    pub projection: String,
    pub nodata: Option<f64>,
}

impl RasterMetadata {
    /// Grid of the coarse output: same origin and CRS, cells `factor` times larger
    pub fn coarsened(&self, factor: usize) -> Self {
        let (height, width) = crate::area::coarse_shape(self.height, self.width, factor);
        let mut geotransform = self.geotransform;
        let f = factor as f64;
        geotransform[1] *= f;
        geotransform[2] *= f;
        geotransform[4] *= f;
        geotransform[5] *= f;

        Self {
            width,
            height,
            geotransform,
            projection: self.projection.clone(),
            nodata: Some(f64::from(OUTPUT_NODATA)),
        }
    }
}

/// Naming attached to an output variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputVariable {
    pub name: &'static str,
    pub units: &'static str,
    pub long_name: &'static str,
}

pub const SOC_VARIABLE: OutputVariable = OutputVariable {
    name: "SOC",
    units: "kg m^-2",
    long_name: "Soil organic carbon density",
};

pub const BULK_DENSITY_VARIABLE: OutputVariable = OutputVariable {
    name: "BD",
    units: "g cm^-3",
    long_name: "Soil bulk density",
};

/// Extract metadata from a dataset without reading any data
pub fn extract_metadata_from_dataset(dataset: &Dataset) -> Result<RasterMetadata> {
    let rasterband: RasterBand = dataset.rasterband(1)?;

    let width = rasterband.x_size() as usize;
    let height = rasterband.y_size() as usize;

    if width == 0 || height == 0 {
        return Err(SoilGridError::InvalidDimensions(width, height));
    }

    Ok(RasterMetadata {
        width,
        height,
        geotransform: dataset.geo_transform()?,
        projection: dataset.projection(),
        nodata: rasterband.no_data_value(),
    })
}

/// Identifier raster read from band 1 of a GDAL dataset; nodata cells read as identifier 0
pub struct GdalIdentifierSource {
    dataset: Dataset,
    metadata: RasterMetadata,
    nodata: Option<i32>,
}

impl GdalIdentifierSource {
    pub fn open(path: &Path, nodata_override: Option<f64>) -> Result<Self> {
        info!("Opening identifier raster: {}", path.display());
        let dataset = Dataset::open(path)?;
        let metadata = extract_metadata_from_dataset(&dataset)?;

        // The override is validated with the rest of the configuration
        let nodata = match nodata_override {
            Some(v) => integral_nodata(v),
            None => metadata.nodata.and_then(integral_nodata),
        };

        match nodata {
            Some(nd) => info!("Identifier nodata value: {}", nd),
            None => info!("No identifier nodata value; only {} marks missing cells", NO_DATA_ID),
        }
        debug!("Raster dimensions: {}x{}", metadata.width, metadata.height);

        Ok(Self {
            dataset,
            metadata,
            nodata,
        })
    }

    pub fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }
}

impl IdentifierSource for GdalIdentifierSource {
    fn shape(&self) -> (usize, usize) {
        (self.metadata.height, self.metadata.width)
    }

    fn read_rows(&self, block: &RowBlock) -> Result<Array2<i32>> {
        let rasterband = self.dataset.rasterband(1)?;
        let width = self.metadata.width;
        let height = block.height();

        let buffer = rasterband.read_as::<i32>(
            (0, block.y_min as isize),
            (width, height),
            (width, height),
            None,
        )?;

        let data_vec: Vec<i32> = match self.nodata {
            Some(nd) => buffer
                .into_iter()
                .map(|v| if v == nd { NO_DATA_ID } else { v })
                .collect(),
            None => buffer.into_iter().collect(),
        };
        Ok(Array2::from_shape_vec((height, width), data_vec)?)
    }
}

/// Float raster read back from band 1; declared nodata and NaN read as missing
pub struct GdalValueSource {
    dataset: Dataset,
    metadata: RasterMetadata,
}

impl GdalValueSource {
    pub fn open(path: &Path) -> Result<Self> {
        let dataset = Dataset::open(path)?;
        let metadata = extract_metadata_from_dataset(&dataset)?;
        Ok(Self { dataset, metadata })
    }

    pub fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }
}

impl ValueSource for GdalValueSource {
    fn shape(&self) -> (usize, usize) {
        (self.metadata.height, self.metadata.width)
    }

    fn read_rows(&self, block: &RowBlock) -> Result<Array2<Option<f32>>> {
        let rasterband = self.dataset.rasterband(1)?;
        let width = self.metadata.width;
        let height = block.height();

        let buffer = rasterband.read_as::<f32>(
            (0, block.y_min as isize),
            (width, height),
            (width, height),
            None,
        )?;

        let nodata = self.metadata.nodata.map(|v| v as f32);
        let data_vec: Vec<Option<f32>> = buffer
            .into_iter()
            .map(|v| {
                if v.is_nan() || Some(v) == nodata {
                    None
                } else {
                    Some(v)
                }
            })
            .collect();
        Ok(Array2::from_shape_vec((height, width), data_vec)?)
    }
}

/// Single-band float32 dataset written sequentially by row block
pub struct GdalValueSink {
    dataset: Dataset,
    cursor: RowCursor,
    width: usize,
}

impl GdalValueSink {
    /// Create a tiled GeoTIFF on disk
    pub fn create_geotiff(
        path: &Path,
        metadata: &RasterMetadata,
        variable: OutputVariable,
        options: &[String],
    ) -> Result<Self> {
        info!("Creating output raster: {}", path.display());
        let driver = DriverManager::get_driver_by_name("GTiff")?;

        let mut gdal_options = CslStringList::new();
        for opt in options {
            gdal_options.add_string(opt)?;
        }

        let dataset = driver.create_with_band_type_with_options::<f32, _>(
            path,
            metadata.width,
            metadata.height,
            1,
            &gdal_options,
        )?;
        Self::prepare(dataset, metadata, variable)
    }

    /// Create an in-memory dataset, later copied to a file format that only supports CreateCopy
    pub fn create_in_memory(metadata: &RasterMetadata, variable: OutputVariable) -> Result<Self> {
        let driver = DriverManager::get_driver_by_name("MEM")?;
        let dataset =
            driver.create_with_band_type::<f32, _>("", metadata.width, metadata.height, 1)?;
        Self::prepare(dataset, metadata, variable)
    }

    fn prepare(mut dataset: Dataset, metadata: &RasterMetadata, variable: OutputVariable) -> Result<Self> {
        dataset.set_geo_transform(&metadata.geotransform)?;
        dataset.set_projection(&metadata.projection)?;

        let mut band = dataset.rasterband(1)?;
        band.set_no_data_value(Some(f64::from(OUTPUT_NODATA)))?;
        band.set_description(variable.long_name)?;
        band.set_metadata_item("NETCDF_VARNAME", variable.name, "")?;
        band.set_metadata_item("units", variable.units, "")?;
        band.set_metadata_item("long_name", variable.long_name, "")?;

        Ok(Self {
            dataset,
            cursor: RowCursor::new(metadata.width, metadata.height),
            width: metadata.width,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.cursor.is_complete()
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}

impl ValueSink for GdalValueSink {
    fn write_rows(&mut self, block: &RowBlock, values: &Array2<Option<f32>>) -> Result<()> {
        self.cursor.advance(block, values)?;

        let height = block.height();
        let encoded: Vec<f32> = values.iter().map(|v| v.unwrap_or(OUTPUT_NODATA)).collect();
        let mut buffer = Buffer::new((self.width, height), encoded);

        let mut raster_band = self.dataset.rasterband(1)?;
        raster_band.write((0, block.y_min as isize), (self.width, height), &mut buffer)?;

        debug!("Wrote rows [{}, {})", block.y_min, block.y_max);
        Ok(())
    }
}

/// Copy a finished in-memory dataset to a netCDF file and return the written dataset
pub fn write_netcdf(source: &Dataset, path: &Path) -> Result<Dataset> {
    info!("Writing netCDF output: {}", path.display());
    let driver = DriverManager::get_driver_by_name("netCDF")?;

    let mut options = CslStringList::new();
    options.add_string("FORMAT=NC4")?;
    options.add_string("COMPRESS=DEFLATE")?;

    let written = source.create_copy(&driver, path, &options)?;
    Ok(written)
}
