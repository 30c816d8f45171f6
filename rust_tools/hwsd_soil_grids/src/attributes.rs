use crate::records::{MappingUnitSummary, SoilComponentRecord};
use log::{debug, info};
use std::collections::BTreeMap;

/// Convert an organic carbon concentration into an areal carbon density.
///
/// `oc_percent` is % weight, `bulk_density` is kg dm^-3 and `depth_cm` is the
/// reference depth; the result is kg m^-2:
/// `oc / 100 * (bd * 1000 kg m^-3) * (depth / 100 m)`.
pub fn areal_carbon_density(oc_percent: f64, bulk_density: f64, depth_cm: f64) -> f64 {
    oc_percent / 100.0 * (bulk_density * 1000.0) * (depth_cm / 100.0)
}

/// Reduce component records to one summary per mapping unit, sorted by id
pub fn aggregate(records: &[SoilComponentRecord]) -> Vec<MappingUnitSummary> {
    let mut groups: BTreeMap<i32, Vec<&SoilComponentRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.mapping_unit_id).or_default().push(record);
    }

    info!(
        "Aggregating {} component records into {} mapping units",
        records.len(),
        groups.len()
    );

    let summaries: Vec<MappingUnitSummary> = groups
        .into_iter()
        .map(|(id, components)| aggregate_unit(id, &components))
        .collect();

    let missing = summaries.iter().filter(|s| s.is_missing()).count();
    if missing > 0 {
        info!("{} mapping units have no usable soil data", missing);
    }

    summaries
}

/// Aggregate the components of a single mapping unit
pub fn aggregate_unit(mapping_unit_id: i32, components: &[&SoilComponentRecord]) -> MappingUnitSummary {
    let qualifying: Vec<&SoilComponentRecord> =
        components.iter().copied().filter(|c| c.qualifies()).collect();

    if qualifying.is_empty() {
        debug!("Mapping unit {} has no soil components", mapping_unit_id);
        return MappingUnitSummary::missing(mapping_unit_id);
    }

    let bulk_density = share_weighted_mean(
        qualifying
            .iter()
            .filter_map(|c| component_bulk_density(c).map(|v| (weight(c), v))),
    );
    let soil_organic_carbon = share_weighted_mean(
        qualifying
            .iter()
            .filter_map(|c| component_soc(c).map(|v| (weight(c), v))),
    );

    MappingUnitSummary {
        mapping_unit_id,
        bulk_density,
        soil_organic_carbon,
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn weight(component: &SoilComponentRecord) -> f64 {
    finite(component.share).unwrap_or(0.0)
}

/// Topsoil value, falling back to subsoil
fn component_bulk_density(component: &SoilComponentRecord) -> Option<f64> {
    finite(component.bulk_density_topsoil).or(finite(component.bulk_density_subsoil))
}

/// SOC of one component, using the bulk density of the layer the carbon value came from
fn component_soc(component: &SoilComponentRecord) -> Option<f64> {
    let topsoil_bd = finite(component.bulk_density_topsoil);
    let subsoil_bd = finite(component.bulk_density_subsoil);

    let (oc, bd) = match (
        finite(component.organic_carbon_topsoil),
        finite(component.organic_carbon_subsoil),
    ) {
        (Some(oc), _) => (oc, topsoil_bd.or(subsoil_bd)?),
        (None, Some(oc)) => (oc, subsoil_bd.or(topsoil_bd)?),
        (None, None) => return None,
    };
    let depth = finite(component.ref_depth)?;

    Some(areal_carbon_density(oc, bd, depth))
}

/// Mean of `(share, value)` pairs with shares normalized over the pairs given.
///
/// Falls back to an unweighted mean when the shares do not sum to a positive
/// total. Returns `None` for no pairs or a non-finite result.
fn share_weighted_mean(pairs: impl Iterator<Item = (f64, f64)>) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = pairs.collect();
    if pairs.is_empty() {
        return None;
    }

    let total_share: f64 = pairs.iter().map(|(share, _)| share).sum();
    let mean = if total_share > 0.0 {
        pairs.iter().map(|(share, value)| share * value).sum::<f64>() / total_share
    } else {
        pairs.iter().map(|(_, value)| value).sum::<f64>() / pairs.len() as f64
    };

    Some(mean).filter(|m| m.is_finite())
}
