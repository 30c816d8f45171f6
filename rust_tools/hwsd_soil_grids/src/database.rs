use crate::config::AttributeSchema;
use crate::error::Result;
use crate::records::{SoilComponentRecord, SoilTypeCount};
use log::{debug, info};
use rusqlite::{Connection, OpenFlags, Row};
use std::path::Path;

/// Read-only handle on the HWSD attribute database (SQLite conversion of the Access file).
///
/// The connection closes when the store is dropped.
pub struct AttributeStore {
    conn: Connection,
}

impl AttributeStore {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening attribute database: {}", path.display());
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Load every component row of the component table
    pub fn load_components(&self, schema: &AttributeSchema) -> Result<Vec<SoilComponentRecord>> {
        schema.validate()?;
        let (bd_top, bd_sub) = schema.bulk_density.columns();

        let sql = format!(
            "SELECT ID, MU_GLOBAL, ISSOIL, REF_DEPTH, {bd_top}, {bd_sub}, T_OC, S_OC, SHARE \
             FROM {table} ORDER BY MU_GLOBAL, ID",
            table = schema.component_table,
        );
        debug!("Component query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], component_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        info!(
            "Loaded {} component records from {} ({} / {})",
            records.len(),
            schema.component_table,
            bd_top,
            bd_sub
        );
        Ok(records)
    }

    /// Count mapping units per soil type code, most frequent first
    pub fn soil_type_listing(&self, schema: &AttributeSchema) -> Result<Vec<SoilTypeCount>> {
        schema.validate()?;
        let sql = format!(
            "SELECT {column}, COUNT(DISTINCT MU_GLOBAL) AS units FROM {table} \
             GROUP BY {column} ORDER BY units DESC, {column}",
            column = schema.soil_type_column,
            table = schema.soil_unit_table,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let listing = stmt
            .query_map([], |row| {
                let units: i64 = row.get(1)?;
                Ok(SoilTypeCount {
                    code: row.get(0)?,
                    units: units.max(0) as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(listing)
    }
}

fn component_from_row(row: &Row<'_>) -> rusqlite::Result<SoilComponentRecord> {
    let is_soil: Option<i64> = row.get(2)?;
    Ok(SoilComponentRecord {
        id: row.get(0)?,
        mapping_unit_id: row.get(1)?,
        is_soil: is_soil.map(|flag| flag != 0),
        ref_depth: row.get(3)?,
        bulk_density_topsoil: row.get(4)?,
        bulk_density_subsoil: row.get(5)?,
        organic_carbon_topsoil: row.get(6)?,
        organic_carbon_subsoil: row.get(7)?,
        share: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::aggregate;
    use crate::config::BulkDensitySource;

    fn store() -> AttributeStore {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE HWSD_DATA (
                ID INTEGER PRIMARY KEY, MU_GLOBAL INTEGER, ISSOIL INTEGER, SHARE REAL,
                REF_DEPTH INTEGER, T_BULK_DENSITY REAL, S_BULK_DENSITY REAL,
                T_REF_BULK_DENSITY REAL, S_REF_BULK_DENSITY REAL, T_OC REAL, S_OC REAL
             );
             INSERT INTO HWSD_DATA VALUES (1, 10, 1, 60, 100, 1.3, 1.4, 1.35, 1.45, 1.0, 0.5);
             INSERT INTO HWSD_DATA VALUES (2, 10, 1, 40, 100, 1.5, NULL, 1.55, NULL, NULL, 0.5);
             INSERT INTO HWSD_DATA VALUES (3, 11, 0, 100, 100, NULL, NULL, NULL, NULL, NULL, NULL);
             INSERT INTO HWSD_DATA VALUES (4, 12, NULL, 100, 30, NULL, 1.2, NULL, 1.25, NULL, 2.0);
             CREATE TABLE HWSD_SMU (MU_GLOBAL INTEGER, SU_SYM90 TEXT);
             INSERT INTO HWSD_SMU VALUES (10, 'CMe'), (11, 'WR'), (12, 'CMe'), (13, NULL);",
        )
        .unwrap();
        AttributeStore::from_connection(conn)
    }

    #[test]
    fn test_load_components() {
        let records = store().load_components(&AttributeSchema::default()).unwrap();
        assert_eq!(records.len(), 4);

        let first = &records[0];
        assert_eq!(first.mapping_unit_id, 10);
        assert_eq!(first.is_soil, Some(true));
        assert_eq!(first.ref_depth, Some(100.0));
        assert_eq!(first.bulk_density_topsoil, Some(1.3));
        assert_eq!(first.share, Some(60.0));

        assert_eq!(records[1].organic_carbon_topsoil, None);
        assert_eq!(records[2].is_soil, Some(false));
        assert_eq!(records[3].is_soil, None);
    }

    #[test]
    fn test_reference_bulk_density_columns() {
        let schema = AttributeSchema {
            bulk_density: BulkDensitySource::Reference,
            ..AttributeSchema::default()
        };
        let records = store().load_components(&schema).unwrap();
        assert_eq!(records[0].bulk_density_topsoil, Some(1.35));
        assert_eq!(records[0].bulk_density_subsoil, Some(1.45));
    }

    #[test]
    fn test_database_to_summaries() {
        let records = store().load_components(&AttributeSchema::default()).unwrap();
        let summaries = aggregate(&records);
        assert_eq!(summaries.len(), 3);

        let unit10 = summaries[0];
        assert!((unit10.bulk_density.unwrap() - 1.38).abs() < 1e-12);
        // 0.6 * (1.0% * 1300 * 1 m) + 0.4 * (0.5% * 1500 * 1 m)
        assert!((unit10.soil_organic_carbon.unwrap() - (0.6 * 13.0 + 0.4 * 7.5)).abs() < 1e-9);

        assert!(summaries[1].is_missing());

        let unit12 = summaries[2];
        assert_eq!(unit12.bulk_density, Some(1.2));
        // 2.0% * 1200 * 0.3 m
        assert!((unit12.soil_organic_carbon.unwrap() - 7.2).abs() < 1e-9);
    }

    #[test]
    fn test_soil_type_listing() {
        let listing = store().soil_type_listing(&AttributeSchema::default()).unwrap();
        assert_eq!(
            listing[0],
            SoilTypeCount {
                code: Some("CMe".to_string()),
                units: 2
            }
        );
        assert_eq!(listing.len(), 3);
    }

    #[test]
    fn test_missing_table_is_error() {
        let schema = AttributeSchema {
            component_table: "NOT_THERE".to_string(),
            ..AttributeSchema::default()
        };
        assert!(store().load_components(&schema).is_err());
    }
}
