use gdal::spatial_ref::SpatialRef;
use log::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridCrs {
    Geographic, // Uniform lat/long steps
    Projected,
    Unknown,
}

/// Classify the CRS of a raster from its WKT
pub fn detect_grid_crs(projection_wkt: &str) -> GridCrs {
    if projection_wkt.trim().is_empty() {
        warn!("Input raster declares no CRS");
        return GridCrs::Unknown;
    }

    let spatial_ref = match SpatialRef::from_wkt(projection_wkt) {
        Ok(sr) => sr,
        Err(e) => {
            warn!("Failed to parse projection WKT: {}", e);
            return GridCrs::Unknown;
        }
    };

    if spatial_ref.is_geographic() {
        GridCrs::Geographic
    } else if spatial_ref.is_projected() {
        GridCrs::Projected
    } else {
        GridCrs::Unknown
    }
}

/// Block means weight every native cell equally, which is only an area mean on a lat/long grid
pub fn check_area_mean_assumption(crs: GridCrs) {
    match crs {
        GridCrs::Geographic => info!("Geographic CRS detected, native cells share a uniform lat/long step"),
        GridCrs::Projected => warn!(
            "Projected CRS detected; block means treat every native cell as equal weight"
        ),
        GridCrs::Unknown => warn!(
            "Unknown CRS; block means treat every native cell as equal weight"
        ),
    }
}

/// Whether two WKT strings describe the same CRS
pub fn same_crs(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (SpatialRef::from_wkt(a), SpatialRef::from_wkt(b)) {
        (Ok(sa), Ok(sb)) => sa == sb,
        _ => false,
    }
}
