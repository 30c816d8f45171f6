/// One row of the component table: a single soil type inside a mapping unit.
#[derive(Debug, Clone, PartialEq)]
pub struct SoilComponentRecord {
    pub id: i64,
    /// Foreign key shared with the identifier raster's cell values
    pub mapping_unit_id: i32,
    /// `None` when the flag is absent from the source row
    pub is_soil: Option<bool>,
    /// Reference soil depth in cm
    pub ref_depth: Option<f64>,
    /// kg dm^-3
    pub bulk_density_topsoil: Option<f64>,
    pub bulk_density_subsoil: Option<f64>,
    /// % weight
    pub organic_carbon_topsoil: Option<f64>,
    pub organic_carbon_subsoil: Option<f64>,
    /// Percentage of the mapping unit covered by this component
    pub share: Option<f64>,
}

impl SoilComponentRecord {
    /// Components explicitly flagged non-soil are excluded; an absent flag counts as soil.
    pub fn qualifies(&self) -> bool {
        self.is_soil != Some(false)
    }
}

/// Representative properties of one mapping unit.
///
/// Both values are either finite or `None`; `None` means no data and is never
/// replaced by zero downstream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappingUnitSummary {
    pub mapping_unit_id: i32,
    /// kg dm^-3
    pub bulk_density: Option<f64>,
    /// kg m^-2
    pub soil_organic_carbon: Option<f64>,
}

impl MappingUnitSummary {
    pub fn missing(mapping_unit_id: i32) -> Self {
        Self {
            mapping_unit_id,
            bulk_density: None,
            soil_organic_carbon: None,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.bulk_density.is_none() && self.soil_organic_carbon.is_none()
    }
}

/// Number of mapping units per soil type code, for the informational listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoilTypeCount {
    pub code: Option<String>,
    pub units: usize,
}
