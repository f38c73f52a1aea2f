//! Export vers ESRI Shapefile (SHP + DBF + PRJ)
//!
//! Les noms de champs DBF sont limités à 10 caractères; l'historique des
//! codes sort donc en `crop_hist`.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csb::{FieldCollection, FieldRecord};
use geo::{Geometry, LineString};
use shapefile::dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, Writer};

/// WKT ESRI du système géodésique WGS84, écrit dans le sidecar .prj
const WGS84_ESRI_WKT: &str = "GEOGCS[\"GCS_WGS_1984\",DATUM[\"D_WGS_1984\",\
SPHEROID[\"WGS_1984\",6378137.0,298.257223563]],PRIMEM[\"Greenwich\",0.0],\
UNIT[\"Degree\",0.0174532925199433]]";

/// Exporte une collection en shapefile
pub fn export_to_shapefile(data: &FieldCollection, output_path: &Path) -> Result<()> {
    let table = TableWriterBuilder::new()
        .add_character_field(field_name("field_id")?, 32)
        .add_character_field(field_name("region")?, 16)
        .add_character_field(field_name("state_fips")?, 2)
        .add_numeric_field(field_name("area_acres")?, 13, 3)
        .add_character_field(field_name("crop_code")?, 8)
        .add_character_field(field_name("crop_name")?, 64)
        .add_character_field(field_name("crop_hist")?, 64);

    let mut writer = Writer::from_path(output_path, table)
        .context(format!("Failed to create {}", output_path.display()))?;

    for record in &data.records {
        let shape = polygon_shape(&record.geometry)
            .context(format!("Field {} is not writable as polygon", record.field_id))?;
        writer.write_shape_and_record(&shape, &dbf_record(record))?;
    }
    drop(writer);

    // Sidecar .prj pour que les SIG retrouvent le CRS
    std::fs::write(output_path.with_extension("prj"), WGS84_ESRI_WKT)?;

    Ok(())
}

fn field_name(name: &str) -> Result<FieldName> {
    FieldName::try_from(name).map_err(|e| anyhow!("invalid DBF field name {}: {:?}", name, e))
}

fn dbf_record(record: &FieldRecord) -> Record {
    let mut dbf = Record::default();
    dbf.insert(
        "field_id".to_string(),
        FieldValue::Character(Some(record.field_id.clone())),
    );
    dbf.insert(
        "region".to_string(),
        FieldValue::Character(Some(record.region.clone())),
    );
    dbf.insert(
        "state_fips".to_string(),
        FieldValue::Character(Some(record.state_fips.clone())),
    );
    dbf.insert(
        "area_acres".to_string(),
        FieldValue::Numeric(Some(record.area_acres)),
    );
    dbf.insert(
        "crop_code".to_string(),
        FieldValue::Character(Some(record.crop_code.clone())),
    );
    dbf.insert(
        "crop_name".to_string(),
        FieldValue::Character(record.crop_name.clone()),
    );
    dbf.insert(
        "crop_hist".to_string(),
        FieldValue::Character(record.crop_code_list.clone()),
    );
    dbf
}

/// Convertit une géométrie surfacique en shape polygone
fn polygon_shape(geometry: &Geometry) -> Result<Polygon> {
    let mut rings: Vec<PolygonRing<Point>> = Vec::new();

    match geometry {
        Geometry::Polygon(polygon) => push_rings(&mut rings, polygon),
        Geometry::MultiPolygon(multi) => {
            for polygon in &multi.0 {
                push_rings(&mut rings, polygon);
            }
        }
        _ => bail!("geometry is not a Polygon or MultiPolygon"),
    }

    Ok(Polygon::with_rings(rings))
}

fn push_rings(rings: &mut Vec<PolygonRing<Point>>, polygon: &geo::Polygon) {
    rings.push(PolygonRing::Outer(ring_points(polygon.exterior())));
    for interior in polygon.interiors() {
        rings.push(PolygonRing::Inner(ring_points(interior)));
    }
}

fn ring_points(ring: &LineString) -> Vec<Point> {
    ring.0.iter().map(|c| Point::new(c.x, c.y)).collect()
}
