// Library exports for testing and reuse

pub mod area;
pub mod attributes;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod crs;
pub mod database;
pub mod error;
pub mod gtiff;
pub mod index;
pub mod io;
pub mod pipeline;
pub mod raster;
pub mod records;
pub mod regrid;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use error::{Result, SoilGridError};
pub use index::{UnitIndex, UnitProperties};
pub use records::{MappingUnitSummary, SoilComponentRecord};
pub use regrid::regrid;
