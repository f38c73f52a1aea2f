//! Export vers GeoJSON avec geozero (streaming, zero-copy)

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use csb::{FieldCollection, FieldRecord};
use geozero::geojson::GeoJsonWriter;
use geozero::GeozeroGeometry;

/// Exporte une collection en GeoJSON (FeatureCollection, streaming)
pub fn export_to_geojson(data: &FieldCollection, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .context(format!("Failed to create file: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);

    // Header FeatureCollection avec CRS
    let epsg = data.crs.map(|crs| crs.epsg).unwrap_or(4326);
    write!(
        writer,
        r#"{{"type":"FeatureCollection","crs":{{"type":"name","properties":{{"name":"urn:ogc:def:crs:EPSG::{}"}}}},"features":["#,
        epsg
    )?;

    for (i, record) in data.records.iter().enumerate() {
        if i > 0 {
            write!(writer, ",")?;
        }
        write_feature(&mut writer, record)?;
    }

    write!(writer, "]}}")?;
    writer.flush()?;

    Ok(())
}

/// Écrit une parcelle en feature GeoJSON
fn write_feature<W: Write>(writer: &mut W, record: &FieldRecord) -> Result<()> {
    write!(
        writer,
        r#"{{"type":"Feature","id":"{}","#,
        escape_json(&record.field_id)
    )?;

    // Geometry via geozero (efficace, zero-copy)
    write!(writer, r#""geometry":"#)?;
    let mut geom_buf = Vec::new();
    let mut geom_writer = GeoJsonWriter::new(&mut geom_buf);
    record.geometry.process_geom(&mut geom_writer)?;
    writer.write_all(&geom_buf)?;

    // Properties: les chaînes échappées, la surface en nombre
    write!(
        writer,
        r#","properties":{{"field_id":"{}","region":"{}","state_fips":"{}","area_acres":{}"#,
        escape_json(&record.field_id),
        escape_json(&record.region),
        escape_json(&record.state_fips),
        record.area_acres
    )?;
    write!(
        writer,
        r#","crop_code":"{}""#,
        escape_json(&record.crop_code)
    )?;
    write_optional(writer, "crop_name", record.crop_name.as_deref())?;
    write_optional(writer, "crop_code_list", record.crop_code_list.as_deref())?;
    write!(writer, "}}}}")?;

    Ok(())
}

fn write_optional<W: Write>(writer: &mut W, key: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => write!(writer, r#","{}":"{}""#, key, escape_json(v))?,
        None => write!(writer, r#","{}":null"#, key)?,
    }
    Ok(())
}

/// Échappe une chaîne pour JSON
fn escape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use csb::FieldCollection;
    use geo::{Geometry, LineString, Polygon};
    use std::io::Cursor;

    fn sample_record() -> FieldRecord {
        FieldRecord {
            field_id: "1900112345".to_string(),
            region: "corn_belt".to_string(),
            state_fips: "19".to_string(),
            area_acres: 123.456,
            crop_code: "1".to_string(),
            crop_name: Some("Corn".to_string()),
            crop_code_list: None,
            geometry: Geometry::Polygon(Polygon::new(
                LineString::from(vec![
                    (-93.62, 41.59),
                    (-93.61, 41.59),
                    (-93.61, 41.60),
                    (-93.62, 41.59),
                ]),
                vec![],
            )),
        }
    }

    #[test]
    fn test_write_feature() {
        let mut buffer = Cursor::new(Vec::new());
        write_feature(&mut buffer, &sample_record()).unwrap();

        let json = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(json.contains(r#""id":"1900112345""#));
        assert!(json.contains(r#""type":"Feature""#));
        assert!(json.contains(r#""area_acres":123.456"#));
        assert!(json.contains(r#""crop_name":"Corn""#));
        assert!(json.contains(r#""crop_code_list":null"#));
        assert!(json.contains("coordinates"));
    }

    #[test]
    fn test_escape_json() {
        assert_eq!(escape_json("hello"), "hello");
        assert_eq!(escape_json("hello\"world"), "hello\\\"world");
        assert_eq!(escape_json("line\nbreak"), "line\\nbreak");
    }

    #[test]
    fn test_export_to_geojson() {
        let collection = FieldCollection::harmonized(vec![sample_record()]);

        let output_path = std::env::temp_dir().join("csb_test_export.geojson");
        export_to_geojson(&collection, &output_path).unwrap();

        let content = std::fs::read_to_string(&output_path).unwrap();
        assert!(content.contains(r#""type":"FeatureCollection""#));
        assert!(content.contains("EPSG::4326"));
        assert!(content.contains(r#""region":"corn_belt""#));

        // le document doit rester du JSON valide
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["features"].as_array().unwrap().len(), 1);

        std::fs::remove_file(output_path).ok();
    }
}
