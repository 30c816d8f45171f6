use crate::records::MappingUnitSummary;
use log::{info, warn};
use ndarray::{Array2, ArrayView2};
use std::collections::HashMap;

/// Identifier reserved for "no data" cells
pub const NO_DATA_ID: i32 = 0;

/// Output-precision properties of a mapping unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitProperties {
    pub bulk_density: Option<f32>,
    pub soc: Option<f32>,
}

impl UnitProperties {
    pub const MISSING: UnitProperties = UnitProperties {
        bulk_density: None,
        soc: None,
    };
}

/// Property blocks resolved from a block of identifiers
#[derive(Debug, Clone)]
pub struct ResolvedBlock {
    pub bulk_density: Array2<Option<f32>>,
    pub soc: Array2<Option<f32>>,
    /// Non-zero identifiers with no entry in the index
    pub unmatched: usize,
}

/// Lookup from mapping-unit identifier to properties.
///
/// Identifier 0 and any identifier absent from the map resolve to
/// [`UnitProperties::MISSING`].
#[derive(Debug, Clone, Default)]
pub struct UnitIndex {
    units: HashMap<i32, UnitProperties>,
}

impl UnitIndex {
    pub fn from_summaries(summaries: &[MappingUnitSummary]) -> Self {
        let mut units = HashMap::with_capacity(summaries.len());

        for summary in summaries {
            if summary.mapping_unit_id == NO_DATA_ID {
                warn!("Dropping summary for reserved no-data identifier {}", NO_DATA_ID);
                continue;
            }
            let properties = UnitProperties {
                bulk_density: to_output(summary.bulk_density),
                soc: to_output(summary.soil_organic_carbon),
            };
            if units.insert(summary.mapping_unit_id, properties).is_some() {
                warn!(
                    "Duplicate summary for mapping unit {}, keeping the last one",
                    summary.mapping_unit_id
                );
            }
        }

        info!("Built unit index with {} mapping units", units.len());
        Self { units }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn contains(&self, id: i32) -> bool {
        id != NO_DATA_ID && self.units.contains_key(&id)
    }

    pub fn lookup(&self, id: i32) -> UnitProperties {
        if id == NO_DATA_ID {
            return UnitProperties::MISSING;
        }
        self.units.get(&id).copied().unwrap_or(UnitProperties::MISSING)
    }

    /// Resolve every identifier of a block in one pass
    pub fn resolve_block(&self, ids: ArrayView2<i32>) -> ResolvedBlock {
        let mut unmatched = 0usize;
        let mut bulk_density = Array2::from_elem(ids.dim(), None);
        let mut soc = Array2::from_elem(ids.dim(), None);

        ndarray::Zip::from(&ids)
            .and(&mut bulk_density)
            .and(&mut soc)
            .for_each(|&id, bd, c| {
                if id != NO_DATA_ID && !self.units.contains_key(&id) {
                    unmatched += 1;
                }
                let properties = self.lookup(id);
                *bd = properties.bulk_density;
                *c = properties.soc;
            });

        ResolvedBlock {
            bulk_density,
            soc,
            unmatched,
        }
    }
}

fn to_output(value: Option<f64>) -> Option<f32> {
    value.map(|v| v as f32).filter(|v| v.is_finite())
}
