use crate::error::{Result, SoilGridError};

/// Validate compression type
pub fn validate_compression(compression: &str) -> Result<()> {
    let valid_types = ["DEFLATE", "LZW", "ZSTD", "NONE"];
    if !valid_types.contains(&compression) {
        return Err(SoilGridError::InvalidCompression(compression.to_string()));
    }
    Ok(())
}

/// Validate tile size (must be multiple of 16)
pub fn validate_tile_size(tile_size: usize) -> Result<()> {
    if tile_size == 0 || tile_size % 16 != 0 {
        return Err(SoilGridError::InvalidTileSize(tile_size));
    }
    Ok(())
}

/// GeoTIFF creation options for the native outputs.
///
/// BIGTIFF is needed once a global 30 arc-second float grid passes 4 GB.
pub fn creation_options(compression: &str, tile_size: usize) -> Vec<String> {
    let mut options = vec![
        format!("COMPRESS={}", compression),
        "TILED=YES".to_string(),
        format!("BLOCKXSIZE={}", tile_size),
        format!("BLOCKYSIZE={}", tile_size),
        "BIGTIFF=IF_SAFER".to_string(),
    ];
    if compression != "NONE" {
        options.push("PREDICTOR=3".to_string());
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_compression_valid() {
        assert!(validate_compression("DEFLATE").is_ok());
        assert!(validate_compression("LZW").is_ok());
        assert!(validate_compression("ZSTD").is_ok());
        assert!(validate_compression("NONE").is_ok());
    }

    #[test]
    fn test_validate_compression_invalid() {
        assert!(validate_compression("INVALID").is_err());
        assert!(validate_compression("deflate").is_err());
    }

    #[test]
    fn test_validate_tile_size() {
        assert!(validate_tile_size(256).is_ok());
        assert!(validate_tile_size(0).is_err());
        assert!(validate_tile_size(100).is_err());
    }

    #[test]
    fn test_creation_options() {
        let opts = creation_options("DEFLATE", 512);
        assert!(opts.contains(&"COMPRESS=DEFLATE".to_string()));
        assert!(opts.contains(&"BLOCKYSIZE=512".to_string()));
        assert!(opts.contains(&"PREDICTOR=3".to_string()));

        let opts = creation_options("NONE", 256);
        assert_eq!(opts.len(), 5);
        assert!(!opts.iter().any(|o| o.starts_with("PREDICTOR")));
    }
}
