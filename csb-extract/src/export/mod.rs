//! Persistance des extraits de parcelles

pub mod geojson;
pub mod reader;
pub mod shapefile;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use csb::FieldCollection;
use tracing::info;

use crate::config::Config;

/// Format de sortie vectoriel supporté
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    GeoJson,
    Shapefile,
}

impl OutputFormat {
    /// Extension du fichier principal
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::GeoJson => "geojson",
            OutputFormat::Shapefile => "shp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "geojson" => Ok(OutputFormat::GeoJson),
            "shapefile" | "shp" => Ok(OutputFormat::Shapefile),
            _ => Err(format!(
                "Unsupported output format: {}. Use 'geojson' or 'shapefile'.",
                s
            )),
        }
    }
}

/// Sauvegarde la collection sous `<raw>/field_boundaries/fields.<ext>`
pub fn save(data: &FieldCollection, format: OutputFormat, config: &Config) -> Result<PathBuf> {
    let filename = format!("fields.{}", format.extension());
    let output_path = config.output_path(&filename, Some("field_boundaries"))?;

    match format {
        OutputFormat::GeoJson => geojson::export_to_geojson(data, &output_path)?,
        OutputFormat::Shapefile => shapefile::export_to_shapefile(data, &output_path)?,
    }

    info!("Saved {} fields to {}", data.len(), output_path.display());
    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("geojson".parse::<OutputFormat>(), Ok(OutputFormat::GeoJson));
        assert_eq!("GeoJSON".parse::<OutputFormat>(), Ok(OutputFormat::GeoJson));
        assert_eq!(
            "shapefile".parse::<OutputFormat>(),
            Ok(OutputFormat::Shapefile)
        );
        assert_eq!("shp".parse::<OutputFormat>(), Ok(OutputFormat::Shapefile));
    }

    #[test]
    fn test_output_format_rejects_unknown() {
        let err = "gpkg".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unsupported output format"));
        assert!(err.contains("geojson"));
        assert!(err.contains("shapefile"));
    }
}
