use thiserror::Error;

#[derive(Error, Debug)]
pub enum SoilGridError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Array shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("Input raster has invalid dimensions: {0}x{1}")]
    InvalidDimensions(usize, usize),

    #[error("Invalid block size: {0} rows (must be positive)")]
    InvalidBlockSize(usize),

    #[error("Invalid downscale factor {factor} for a {width}x{height} raster (must be positive and no larger than either dimension)")]
    InvalidDownscaleFactor {
        factor: usize,
        width: usize,
        height: usize,
    },

    #[error("Block shape mismatch: expected {expected_rows}x{expected_cols}, got {actual_rows}x{actual_cols}")]
    BlockShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        actual_rows: usize,
        actual_cols: usize,
    },

    #[error("Out-of-order write: expected rows starting at {expected}, got {actual}")]
    OutOfOrderWrite { expected: usize, actual: usize },

    #[error("Invalid SQL identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("Path {0} is used for more than one input or output")]
    DuplicatePath(String),

    #[error("Invalid nodata value: {0} (identifier nodata must be a 32-bit integer)")]
    InvalidNodata(f64),

    #[error("CRS mismatch between input raster and {0}")]
    CrsMismatch(String),

    #[error("Invalid compression type: {0}")]
    InvalidCompression(String),

    #[error("Invalid tile size: {0} (must be multiple of 16)")]
    InvalidTileSize(usize),
}

pub type Result<T> = std::result::Result<T, SoilGridError>;
